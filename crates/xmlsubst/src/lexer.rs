//! Byte-level scanning primitives shared by the XML parser

pub mod cursor;

pub use cursor::Cursor;
