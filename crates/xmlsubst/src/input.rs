//! Input abstraction handling byte-order marks

use crate::error::{Error, ErrorKind, Pos, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const UTF16_LE_BOM: &[u8] = b"\xFF\xFE";
const UTF16_BE_BOM: &[u8] = b"\xFE\xFF";

/// Input source abstraction
///
/// Documents are read as UTF-8. A leading UTF-8 byte-order mark is split off
/// so the parser never sees it, and remembered so the writer can put it back.
#[derive(Clone, Debug)]
pub struct Input<'a> {
    source: &'a [u8],
    bom: bool,
}

impl<'a> Input<'a> {
    /// Create from byte slice
    pub fn from_bytes(source: &'a [u8]) -> Self {
        match source.strip_prefix(UTF8_BOM) {
            Some(rest) => Self {
                source: rest,
                bom: true,
            },
            None => Self {
                source,
                bom: false,
            },
        }
    }

    /// Create from string
    pub fn from_str(source: &'a str) -> Self {
        Self::from_bytes(source.as_bytes())
    }

    /// Reject encodings the parser cannot read
    pub fn check_encoding(&self) -> Result<()> {
        let encoding = if self.source.starts_with(UTF16_LE_BOM) {
            "UTF-16LE"
        } else if self.source.starts_with(UTF16_BE_BOM) {
            "UTF-16BE"
        } else {
            return Ok(());
        };
        Err(Error::at(
            ErrorKind::UnsupportedEncoding {
                encoding: encoding.to_string(),
            },
            Pos::new(0, 1, 1),
        ))
    }

    /// Get source bytes, without the byte-order mark
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.source
    }

    /// Whether the original bytes started with a UTF-8 byte-order mark
    pub const fn has_bom(&self) -> bool {
        self.bom
    }

    /// The byte-order mark to prepend when writing the document back
    pub const fn bom(&self) -> &'static [u8] {
        if self.bom {
            UTF8_BOM
        } else {
            b""
        }
    }

    /// Get length in bytes
    pub const fn len(&self) -> usize {
        self.source.len()
    }

    /// Check if empty
    pub const fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(s: &'a str) -> Self {
        Self::from_str(s)
    }
}

impl<'a> From<&'a [u8]> for Input<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::from_bytes(b)
    }
}
