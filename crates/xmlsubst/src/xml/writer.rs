//! XML serialization
//!
//! Writes the lossless tree back out. Nodes that were parsed and never
//! touched reproduce their source spelling exactly; values set through the
//! model setters are escaped here.

use std::fmt;

use crate::xml::model::{Attribute, Content, Document, Element, Quote};

/// Serialize a document to a string
pub fn to_string(doc: &Document) -> String {
    let mut output = String::new();
    write_document(doc, &mut output);
    output
}

/// Serialize a document, appending to `output`
pub fn write_document(doc: &Document, output: &mut String) {
    for item in &doc.prolog {
        write_content(item, output);
    }
    write_element(&doc.root, output);
    for item in &doc.epilog {
        write_content(item, output);
    }
}

/// Serialize a single element and its subtree
pub fn write_element(element: &Element, output: &mut String) {
    output.push('<');
    output.push_str(&element.name);
    for attr in &element.attributes {
        write_attribute(attr, output);
    }
    output.push_str(&element.open_tail);

    if element.self_closing && element.children.is_empty() {
        output.push_str("/>");
        return;
    }

    output.push('>');
    for child in &element.children {
        write_content(child, output);
    }
    output.push_str("</");
    output.push_str(&element.name);
    output.push_str(&element.close_tail);
    output.push('>');
}

fn write_attribute(attr: &Attribute, output: &mut String) {
    output.push_str(&attr.leading);
    output.push_str(&attr.name);
    output.push_str(&attr.equals);
    output.push(attr.quote.as_char());
    output.push_str(&attr.raw_value);
    output.push(attr.quote.as_char());
}

fn write_content(content: &Content, output: &mut String) {
    match content {
        Content::Element(element) => write_element(element, output),
        Content::Text(text) => output.push_str(&text.raw),
        Content::CData(data) => {
            output.push_str("<![CDATA[");
            output.push_str(data);
            output.push_str("]]>");
        }
        Content::Comment(comment) => {
            output.push_str("<!--");
            output.push_str(comment);
            output.push_str("-->");
        }
        Content::ProcessingInstruction(body) => {
            output.push_str("<?");
            output.push_str(body);
            output.push_str("?>");
        }
        Content::Doctype(body) => {
            output.push_str("<!DOCTYPE");
            output.push_str(body);
            output.push('>');
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_string(self))
    }
}

/// Escape a value for use between `quote` characters
pub(crate) fn escape_attribute(input: &str, quote: Quote) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '"' if quote == Quote::Double => escaped.push_str("&quot;"),
            '\'' if quote == Quote::Single => escaped.push_str("&apos;"),
            // literal whitespace would be normalized to spaces on the next read
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Escape character data
pub(crate) fn escape_text(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\r' => escaped.push_str("&#13;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::xml::model::Text;
    use crate::xml::parser::Parser;

    fn roundtrip(input: &str) -> Result<String> {
        let doc = Parser::new(input.as_bytes()).parse()?;
        Ok(to_string(&doc))
    }

    #[test]
    fn test_untouched_document_is_byte_identical() -> Result<()> {
        let input = concat!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n",
            "<!-- deployment config -->\r\n",
            "<configuration xmlns:xdt=\"http://schemas.microsoft.com/XML-Document-Transform\">\r\n",
            "  <appSettings>\r\n",
            "    <add key = 'Env'   value=\"Dev &amp; Test\" />\r\n",
            "    <add key=\"Mode\" value=\"&#x41;\"/>\r\n",
            "  </appSettings >\r\n",
            "  <system.web><![CDATA[<raw>]]></system.web>\r\n",
            "</configuration>\r\n",
            "<!-- trailer -->",
        );
        assert_eq!(roundtrip(input)?, input);
        Ok(())
    }

    #[test]
    fn test_doctype_roundtrip() -> Result<()> {
        let input = "<!DOCTYPE config [\n  <!ENTITY x \"y>\">\n]>\n<config/>";
        assert_eq!(roundtrip(input)?, input);
        Ok(())
    }

    #[test]
    fn test_self_closing_reopens_when_children_added() {
        let mut element = Element::new("add").with_attribute("key", "a");
        let mut output = String::new();
        write_element(&element, &mut output);
        assert_eq!(output, "<add key=\"a\"/>");

        element.children.push(Content::Text(Text::new("x")));
        output.clear();
        write_element(&element, &mut output);
        assert_eq!(output, "<add key=\"a\">x</add>");
    }

    #[test]
    fn test_escape_attribute_by_quote() {
        assert_eq!(escape_attribute("it's \"x\"", Quote::Double), "it's &quot;x&quot;");
        assert_eq!(escape_attribute("it's \"x\"", Quote::Single), "it&apos;s \"x\"");
        assert_eq!(escape_attribute("a\nb", Quote::Double), "a&#10;b");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }
}
