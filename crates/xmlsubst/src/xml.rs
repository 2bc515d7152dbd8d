//! Lossless XML parsing and writing

pub mod model;
pub mod parser;
pub mod writer;

pub use model::{Attribute, Content, Document, Element, Quote, Text};
pub use parser::{Config, Parser};
pub use writer::to_string;
