//! Tag-scoped variable substitution for `.config`-style XML files
//!
//! Only elements named in a [`SectionTagSet`], and everything below them,
//! are rewritten. Inside those subtrees every attribute name, attribute value
//! and trimmed leaf text that exactly equals a [`VariableMap`] key is replaced
//! by the mapped value. Transform directives such as `xdt:Transform` and
//! `xdt:Locator` get no special treatment: their names and values are
//! ordinary substitution slots.
//!
//! ```
//! use xmlsubst::{SectionTagSet, Substitutor, VariableMap};
//! # fn main() -> Result<(), xmlsubst::Error> {
//! let tags = SectionTagSet::config_sections();
//! let vars: VariableMap = [("DefaultConnection", "Prod")].into_iter().collect();
//! let input = r#"<configuration><connectionStrings><add name="DefaultConnection"/></connectionStrings></configuration>"#;
//! let (output, report) = Substitutor::new(&tags, &vars).apply_to_str(input)?;
//! assert!(output.contains(r#"<add name="Prod"/>"#));
//! assert_eq!(report.attribute_values, 1);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod file;
pub mod variables;

use std::path::Path;

pub use engine::{MatchPolicy, SubstitutionConfig, Substitutions, Substitutor};
pub use variables::{SectionTagSet, VariableMap, DEFAULT_SECTION_TAGS};

use crate::error::SubstitutionError;

/// Substitute variables in the XML file at `file_path`, rewriting it in place.
///
/// # Errors
///
/// [`SubstitutionError::NotFound`] if the file cannot be read,
/// [`SubstitutionError::MalformedXml`] if it is not well-formed UTF-8 XML
/// (the file is left untouched), and [`SubstitutionError::Write`] if the
/// rewritten document cannot be flushed.
pub fn substitute_xml_variables(
    file_path: impl AsRef<Path>,
    section_tags: &SectionTagSet,
    variables: &VariableMap,
) -> Result<(), SubstitutionError> {
    Substitutor::new(section_tags, variables)
        .apply_to_file(file_path.as_ref())
        .map(|_| ())
}
