//! XML parser implementation

use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::lexer::cursor::is_whitespace;
use crate::lexer::Cursor;
use crate::xml::model::{Attribute, Content, Document, Element, Quote, Text};

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_size: 64 * 1024 * 1024, // 64 MB default
        }
    }
}

impl Config {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }
}

/// XML parser producing a lossless [`Document`]
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser with default configuration
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom configuration
    pub const fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        let size = self.cursor.remaining().len();
        if self.config.max_size > 0 && size > self.config.max_size {
            return Err(Error::at(
                ErrorKind::MaxSizeExceeded {
                    max: self.config.max_size,
                },
                self.cursor.position(),
            ));
        }

        let prolog = self.parse_misc(true)?;

        match (self.cursor.current(), self.cursor.peek(1)) {
            (None, _) => return Err(Error::at(ErrorKind::MissingRoot, self.cursor.position())),
            (Some(b'<'), Some(b)) if is_name_start(b) => {}
            _ => {
                return Err(self.error_here(
                    ErrorKind::Expected {
                        expected: "root element".to_string(),
                        found: self.describe_current(),
                    },
                    "expected root element",
                ))
            }
        }

        let root = self.parse_element()?;
        let epilog = self.parse_misc(false)?;

        if !self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::TrailingContent, "content after root element"));
        }

        Ok(Document {
            prolog,
            root,
            epilog,
        })
    }

    /// Whitespace, comments and processing instructions around the root
    fn parse_misc(&mut self, allow_doctype: bool) -> Result<Vec<Content>> {
        let mut items = Vec::new();
        loop {
            let start = self.cursor.pos();
            if self.cursor.skip_whitespace() > 0 {
                let raw = bytes_to_string(self.cursor.slice_from(start), self.cursor.position())?;
                items.push(Content::Text(Text {
                    value: raw.clone(),
                    raw,
                }));
            } else if self.cursor.consume_bytes(b"<?") {
                items.push(Content::ProcessingInstruction(
                    self.take_until(b"?>", "processing instruction")?,
                ));
            } else if self.cursor.consume_bytes(b"<!--") {
                items.push(Content::Comment(self.take_until(b"-->", "comment")?));
            } else if allow_doctype && self.cursor.consume_bytes(b"<!DOCTYPE") {
                items.push(Content::Doctype(self.parse_doctype()?));
            } else {
                break;
            }
        }
        Ok(items)
    }

    fn parse_element(&mut self) -> Result<Element> {
        self.depth = self.depth.saturating_add(1);
        if self.config.max_depth > 0 && self.depth > self.config.max_depth {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                self.cursor.position(),
            ));
        }

        self.expect_byte(b'<')?;
        let name = self.parse_name()?;

        let mut attributes: Vec<Attribute> = Vec::new();
        let (open_tail, self_closing) = loop {
            let ws_start = self.cursor.pos();
            let skipped = self.cursor.skip_whitespace();
            let leading = bytes_to_string(self.cursor.slice_from(ws_start), self.cursor.position())?;

            match self.cursor.current() {
                Some(b'/') => {
                    self.cursor.advance();
                    self.expect_byte(b'>')?;
                    break (leading, true);
                }
                Some(b'>') => {
                    self.cursor.advance();
                    break (leading, false);
                }
                Some(_) if skipped == 0 => {
                    return Err(self.error_here(
                        ErrorKind::Expected {
                            expected: "whitespace before attribute".to_string(),
                            found: self.describe_current(),
                        },
                        "attributes must be separated by whitespace",
                    ));
                }
                Some(_) => {
                    let start = self.cursor.position();
                    let attr = self.parse_attribute(leading)?;
                    if attributes.iter().any(|existing| existing.name == attr.name) {
                        return Err(Error::at(
                            ErrorKind::DuplicateAttribute { name: attr.name },
                            start,
                        ));
                    }
                    attributes.push(attr);
                }
                None => {
                    return Err(self.error_here(
                        ErrorKind::Unterminated {
                            construct: "start tag",
                        },
                        format!("unterminated start tag <{name}>"),
                    ))
                }
            }
        };

        let mut element = Element {
            name,
            attributes,
            children: Vec::new(),
            self_closing,
            open_tail,
            close_tail: String::new(),
        };

        if !self_closing {
            self.parse_children(&mut element)?;
        }

        self.depth = self.depth.saturating_sub(1);
        Ok(element)
    }

    fn parse_children(&mut self, element: &mut Element) -> Result<()> {
        loop {
            if self.cursor.is_eof() {
                return Err(self.error_here(
                    ErrorKind::Unterminated {
                        construct: "element",
                    },
                    format!("unterminated element <{}>", element.name),
                ));
            }

            if self.cursor.consume_bytes(b"</") {
                let close_pos = self.cursor.position();
                let close_name = self.parse_name()?;
                if close_name != element.name {
                    return Err(Error::at(
                        ErrorKind::MismatchedTag {
                            expected: element.name.clone(),
                            found: close_name,
                        },
                        close_pos,
                    ));
                }
                let ws_start = self.cursor.pos();
                self.cursor.skip_whitespace();
                element.close_tail =
                    bytes_to_string(self.cursor.slice_from(ws_start), self.cursor.position())?;
                self.expect_byte(b'>')?;
                return Ok(());
            }

            let child = if self.cursor.consume_bytes(b"<!--") {
                Content::Comment(self.take_until(b"-->", "comment")?)
            } else if self.cursor.consume_bytes(b"<![CDATA[") {
                Content::CData(self.take_until(b"]]>", "CDATA section")?)
            } else if self.cursor.consume_bytes(b"<?") {
                Content::ProcessingInstruction(self.take_until(b"?>", "processing instruction")?)
            } else if self.cursor.starts_with(b"<!") {
                return Err(self.error_here(ErrorKind::InvalidToken, "unexpected markup declaration"));
            } else if self.cursor.current() == Some(b'<') {
                Content::Element(self.parse_element()?)
            } else {
                Content::Text(self.parse_text()?)
            };
            element.children.push(child);
        }
    }

    fn parse_attribute(&mut self, leading: String) -> Result<Attribute> {
        let name = self.parse_name()?;

        let eq_start = self.cursor.pos();
        self.cursor.skip_whitespace();
        self.expect_byte(b'=')?;
        self.cursor.skip_whitespace();
        let equals = bytes_to_string(self.cursor.slice_from(eq_start), self.cursor.position())?;

        let (quote, quote_byte) = match self.cursor.current() {
            Some(b'"') => (Quote::Double, b'"'),
            Some(b'\'') => (Quote::Single, b'\''),
            _ => {
                return Err(self.error_here(
                    ErrorKind::Expected {
                        expected: "quoted attribute value".to_string(),
                        found: self.describe_current(),
                    },
                    format!("expected quoted value for attribute {name}"),
                ))
            }
        };
        self.cursor.advance();

        let value_pos = self.cursor.position();
        let start = self.cursor.pos();
        loop {
            match self.cursor.current() {
                Some(b) if b == quote_byte => break,
                Some(b'<') => {
                    return Err(self.error_here(
                        ErrorKind::InvalidToken,
                        format!("'<' is not allowed in the value of attribute {name}"),
                    ))
                }
                Some(_) => self.cursor.advance(),
                None => {
                    return Err(self.error_here(
                        ErrorKind::Unterminated {
                            construct: "attribute value",
                        },
                        format!("unterminated value for attribute {name}"),
                    ))
                }
            }
        }

        let raw_value = bytes_to_string(self.cursor.slice_from(start), value_pos)?;
        self.cursor.advance();
        let value = decode_entities(&raw_value, value_pos)?;

        Ok(Attribute {
            name,
            value,
            raw_value,
            quote,
            leading,
            equals,
        })
    }

    fn parse_text(&mut self) -> Result<Text> {
        let text_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = bytes_to_string(self.cursor.slice_from(start), text_pos)?;
        let value = decode_entities(&raw, text_pos)?;
        Ok(Text { value, raw })
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            _ => return Err(Error::at(ErrorKind::InvalidName, start_pos)),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start), start_pos)
    }

    /// Body of `<!DOCTYPE ...>`, cursor just past `<!DOCTYPE`
    fn parse_doctype(&mut self) -> Result<String> {
        let start = self.cursor.pos();
        let start_pos = self.cursor.position();
        let mut bracket_depth = 0usize;
        let mut quote: Option<u8> = None;

        while let Some(b) = self.cursor.current() {
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => bracket_depth += 1,
                (None, b']') => bracket_depth = bracket_depth.saturating_sub(1),
                (None, b'>') if bracket_depth == 0 => {
                    let body = bytes_to_string(self.cursor.slice_from(start), start_pos)?;
                    self.cursor.advance();
                    return Ok(body);
                }
                (None, _) => {}
            }
            self.cursor.advance();
        }

        Err(self.error_here(
            ErrorKind::Unterminated {
                construct: "doctype",
            },
            "unterminated doctype declaration",
        ))
    }

    /// Consume up to and including `pattern`, returning the text before it
    fn take_until(&mut self, pattern: &[u8], construct: &'static str) -> Result<String> {
        let start = self.cursor.pos();
        let start_pos = self.cursor.position();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                let body = bytes_to_string(self.cursor.slice_from(start), start_pos)?;
                self.cursor.advance_by(pattern.len());
                return Ok(body);
            }
            self.cursor.advance();
        }
        Err(self.error_here(
            ErrorKind::Unterminated { construct },
            format!("unterminated {construct}"),
        ))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            Err(self.error_here(
                ErrorKind::Expected {
                    expected: format!("'{}'", char::from(expected)),
                    found: self.describe_current(),
                },
                format!(
                    "expected '{}', found {}",
                    char::from(expected),
                    self.describe_current()
                ),
            ))
        }
    }

    fn describe_current(&self) -> String {
        match self.cursor.current() {
            None => "end of input".to_string(),
            Some(b) if b.is_ascii_graphic() => format!("'{}'", char::from(b)),
            Some(b) if is_whitespace(b) => "whitespace".to_string(),
            Some(b) => format!("byte 0x{b:02x}"),
        }
    }

    fn error_here(&self, kind: ErrorKind, message: impl Into<String>) -> Error {
        let pos = self.cursor.position();
        Error::with_message(kind, Span::point(pos), message)
    }
}

fn bytes_to_string(bytes: &[u8], at: Pos) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(ToString::to_string)
        .map_err(|_| Error::at(ErrorKind::InvalidUtf8, at))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str, at: Pos) -> Result<String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        let (before, after) = rest.split_at(amp);
        result.push_str(before);
        let after = after.get(1..).unwrap_or_default();

        let Some(end) = after.find(';') else {
            return Err(invalid_entity(after, at));
        };
        let entity = after.get(..end).unwrap_or_default();

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };

        match decoded {
            Some(ch) => result.push(ch),
            None => return Err(invalid_entity(entity, at)),
        }
        rest = after.get(end + 1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(result)
}

fn invalid_entity(entity: &str, at: Pos) -> Error {
    let entity: String = entity.chars().take(16).collect();
    Error::at(ErrorKind::InvalidEntity { entity }, at)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code).filter(|&ch| is_xml_char(ch))
}

/// The `Char` production of XML 1.0
const fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{9}' | '\u{A}' | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}
