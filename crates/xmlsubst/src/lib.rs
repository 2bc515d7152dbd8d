//! xmlsubst - tag-scoped variable substitution for XML configuration files
//!
//! A lossless XML parser and writer plus a substitution engine that rewrites
//! attribute names, attribute values and leaf text inside a caller-chosen set
//! of section elements (`appSettings`, `connectionStrings`, ...), leaving the
//! rest of the document byte for byte as it was.
//!
//! # Quick Start
//!
//! ```no_run
//! use xmlsubst::{substitute_xml_variables, SectionTagSet, VariableMap};
//! # fn main() -> Result<(), xmlsubst::SubstitutionError> {
//! let tags = SectionTagSet::config_sections();
//! let mut vars = VariableMap::new();
//! vars.insert("MyDB", "Server=prod;Database=app");
//! substitute_xml_variables("Web.config", &tags, &vars)?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span, SubstitutionError};

pub mod input;
pub use input::Input;

pub mod lexer;

pub mod xml;
pub use xml::{
    Attribute as XmlAttribute, Config as ParserConfig, Content as XmlContent,
    Document as XmlDocument, Element as XmlElement, Parser as XmlParser, Text as XmlText,
};

pub mod substitute;
pub use substitute::{
    substitute_xml_variables, MatchPolicy, SectionTagSet, SubstitutionConfig, Substitutions,
    Substitutor, VariableMap, DEFAULT_SECTION_TAGS,
};

/// Parse XML from string
pub fn from_xml_str(s: &str) -> Result<XmlDocument> {
    from_xml_bytes(s.as_bytes())
}

/// Parse XML from bytes, skipping a UTF-8 byte-order mark
pub fn from_xml_bytes(bytes: &[u8]) -> Result<XmlDocument> {
    parse_input(Input::from_bytes(bytes), ParserConfig::default())
}

/// Parse XML with custom configuration, skipping a UTF-8 byte-order mark
pub fn from_xml_str_with_config(s: &str, config: ParserConfig) -> Result<XmlDocument> {
    parse_input(Input::from_str(s), config)
}

fn parse_input(input: Input<'_>, config: ParserConfig) -> Result<XmlDocument> {
    input.check_encoding()?;
    let mut parser = XmlParser::with_config(input.as_bytes(), config);
    parser.parse()
}

/// Serialize a document back to XML text
pub fn to_xml_string(doc: &XmlDocument) -> String {
    xml::to_string(doc)
}

/// Substitute variables in an XML string, returning the rewritten text
pub fn substitute_str(
    input: &str,
    section_tags: &SectionTagSet,
    variables: &VariableMap,
) -> Result<String> {
    Substitutor::new(section_tags, variables)
        .apply_to_str(input)
        .map(|(output, _)| output)
}
