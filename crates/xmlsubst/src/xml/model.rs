//! XML data model
//!
//! The tree is lossless: next to names and decoded values it keeps the raw
//! markup details (quote style, spacing inside tags, entity spelling,
//! comments and declarations) so an untouched document writes back byte for
//! byte.

use crate::xml::writer::{escape_attribute, escape_text};

/// XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Declaration, comments, doctype and whitespace before the root element
    pub prolog: Vec<Content>,
    pub root: Element,
    /// Comments, processing instructions and whitespace after the root element
    pub epilog: Vec<Content>,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }
}

/// XML element
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Content>,
    /// Written as `<name/>` while it has no children
    pub self_closing: bool,
    /// Whitespace between the last attribute and `>` or `/>`
    pub(crate) open_tail: String,
    /// Whitespace between the name and `>` of the closing tag
    pub(crate) close_tail: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: true,
            open_tail: String::new(),
            close_tail: String::new(),
        }
    }

    /// Builder-style attribute append
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Builder-style child append
    #[must_use]
    pub fn with_child(mut self, child: Content) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Shortcut for the decoded value of an attribute
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(Attribute::value)
    }

    /// Child elements, skipping text and markup nodes
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            _ => None,
        })
    }

    /// An element with no child elements; its text is substitutable
    pub fn is_leaf(&self) -> bool {
        self.elements().next().is_none()
    }

    /// Concatenated decoded text and CDATA of direct children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Content::Text(text) => Some(text.value()),
                Content::CData(data) => Some(data.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Depth-first search for every element named `name`, this one included
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a Self> {
        let mut found = Vec::new();
        collect_named(self, name, &mut found);
        found
    }
}

fn collect_named<'a>(element: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    if element.name == name {
        found.push(element);
    }
    for child in element.elements() {
        collect_named(child, name, found);
    }
}

/// Quote character around an attribute value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Quote {
    #[default]
    Double,
    Single,
}

impl Quote {
    pub const fn as_char(self) -> char {
        match self {
            Self::Double => '"',
            Self::Single => '\'',
        }
    }
}

/// XML attribute
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub(crate) name: String,
    pub(crate) value: String,
    /// Value exactly as written between the quotes
    pub(crate) raw_value: String,
    pub(crate) quote: Quote,
    /// Whitespace before the name
    pub(crate) leading: String,
    /// `=` together with any whitespace around it
    pub(crate) equals: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            raw_value: escape_attribute(&value, Quote::Double),
            value,
            quote: Quote::Double,
            leading: " ".to_string(),
            equals: "=".to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Value as it appears in the markup, entities intact
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub const fn quote(&self) -> Quote {
        self.quote
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replace the value, re-escaping it for the existing quote style
    pub fn set_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.raw_value = escape_attribute(&value, self.quote);
        self.value = value;
    }

    /// Namespace prefix of the name, if any
    pub fn prefix(&self) -> Option<&str> {
        prefix_of(&self.name)
    }

    /// `xmlns` or `xmlns:*`
    pub fn is_namespace_declaration(&self) -> bool {
        is_namespace_declaration(&self.name)
    }

    /// Prefix bound by an `xmlns:p` declaration
    pub fn declared_prefix(&self) -> Option<&str> {
        self.name.strip_prefix("xmlns:")
    }
}

/// Character data with its raw spelling
#[derive(Clone, Debug, PartialEq)]
pub struct Text {
    pub(crate) value: String,
    pub(crate) raw: String,
}

impl Text {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            raw: escape_text(&value),
            value,
        }
    }

    /// Decoded text
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Text as it appears in the markup
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.raw = escape_text(&value);
        self.value = value;
    }

    /// Replace the trimmed core of the text, keeping the surrounding
    /// whitespace spelled as it was in the source
    pub fn replace_trimmed(&mut self, replacement: &str) {
        let value_lead = leading_whitespace(&self.value);
        let value_trail = trailing_whitespace(&self.value);
        let raw_lead = leading_whitespace(&self.raw);
        let raw_trail = trailing_whitespace(&self.raw);

        // whitespace written as character references has no literal spelling
        let lead = if raw_lead == value_lead {
            raw_lead.to_string()
        } else {
            escape_text(value_lead)
        };
        let trail = if raw_trail == value_trail {
            raw_trail.to_string()
        } else {
            escape_text(value_trail)
        };

        self.raw = format!("{lead}{}{trail}", escape_text(replacement));
        self.value = format!("{value_lead}{replacement}{value_trail}");
    }

    pub fn is_whitespace(&self) -> bool {
        self.value.trim().is_empty()
    }
}

fn leading_whitespace(s: &str) -> &str {
    s.get(..s.len() - s.trim_start().len()).unwrap_or_default()
}

fn trailing_whitespace(s: &str) -> &str {
    s.get(s.trim_end().len()..).unwrap_or_default()
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    Text(Text),
    /// Contents of `<![CDATA[...]]>`
    CData(String),
    /// Contents of `<!--...-->`
    Comment(String),
    /// Contents of `<?...?>`, the XML declaration included
    ProcessingInstruction(String),
    /// Everything between `<!DOCTYPE` and the closing `>`
    Doctype(String),
}

/// Namespace prefix of a qualified name
pub fn prefix_of(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}

pub fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

/// Whether `name` is a well-formed XML name with at most one prefix colon
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !is_name_start_char(first) {
        return false;
    }
    if !chars.all(is_name_char) {
        return false;
    }
    match name.split_once(':') {
        None => true,
        Some((prefix, local)) => !prefix.is_empty() && !local.is_empty() && !local.contains(':'),
    }
}

pub(crate) fn is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || !c.is_ascii()
}

pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c) || c.is_ascii_digit() || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("add"));
        assert!(is_valid_name("xdt:Transform"));
        assert!(is_valid_name("_private.key-1"));
        assert!(is_valid_name("paramètre"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1abc"));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name("a:b:c"));
        assert!(!is_valid_name(":local"));
        assert!(!is_valid_name("prefix:"));
    }

    #[test]
    fn test_attribute_prefixes() {
        let transform = Attribute::new("xdt:Transform", "Replace");
        assert_eq!(transform.prefix(), Some("xdt"));
        assert!(!transform.is_namespace_declaration());

        let decl = Attribute::new("xmlns:xdt", "http://schemas.microsoft.com/XML-Document-Transform");
        assert!(decl.is_namespace_declaration());
        assert_eq!(decl.declared_prefix(), Some("xdt"));
        assert!(Attribute::new("xmlns", "urn:x").is_namespace_declaration());
    }

    #[test]
    fn test_set_value_escapes_for_quote() {
        let mut attr = Attribute::new("value", "plain");
        attr.set_value("a \"b\" & <c>");
        assert_eq!(attr.value(), "a \"b\" & <c>");
        assert_eq!(attr.raw_value(), "a &quot;b&quot; &amp; &lt;c>");
    }

    #[test]
    fn test_element_queries() {
        let root = Element::new("configuration").with_child(Content::Element(
            Element::new("appSettings")
                .with_child(Content::Element(
                    Element::new("add")
                        .with_attribute("key", "a")
                        .with_attribute("value", "1"),
                ))
                .with_child(Content::Element(Element::new("add").with_attribute("key", "b"))),
        ));

        let adds = root.find_all("add");
        assert_eq!(adds.len(), 2);
        assert_eq!(adds.first().and_then(|e| e.attribute_value("value")), Some("1"));
        assert!(!root.is_leaf());
        assert!(adds.iter().all(|e| e.is_leaf()));
    }

    #[test]
    fn test_text_value() {
        let mut text = Text::new("a < b");
        assert_eq!(text.raw(), "a &lt; b");
        text.set_value("  ");
        assert!(text.is_whitespace());
    }

    #[test]
    fn test_replace_trimmed_keeps_raw_whitespace() {
        let mut text = Text {
            value: "\r\n      conntype\r\n    ".to_string(),
            raw: "\r\n      conntype\r\n    ".to_string(),
        };
        text.replace_trimmed("a&b");
        assert_eq!(text.raw(), "\r\n      a&amp;b\r\n    ");
        assert_eq!(text.value(), "\r\n      a&b\r\n    ");

        let mut text = Text {
            value: " x\n".to_string(),
            raw: "&#32;x\n".to_string(),
        };
        text.replace_trimmed("y");
        assert_eq!(text.raw(), " y\n");
    }
}
