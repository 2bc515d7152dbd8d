//! In-place substitution of one file on disk

use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::SubstitutionError;
use crate::input::Input;
use crate::substitute::engine::{Substitutions, Substitutor};
use crate::xml::parser::Parser;
use crate::xml::writer;

impl Substitutor<'_> {
    /// Substitute variables in the XML file at `path`, rewriting it in place.
    ///
    /// Nothing is written unless at least one slot changed, and nothing is
    /// written when the file cannot be read or parsed.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn apply_to_file(&self, path: &Path) -> Result<Substitutions, SubstitutionError> {
        let bytes = fs::read(path).map_err(|source| SubstitutionError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let malformed = |source| SubstitutionError::MalformedXml {
            path: path.to_path_buf(),
            source,
        };

        let input = Input::from_bytes(&bytes);
        input.check_encoding().map_err(malformed)?;
        let mut doc = Parser::with_config(input.as_bytes(), self.config.parser)
            .parse()
            .map_err(malformed)?;

        let report = self.apply(&mut doc);
        if report.is_empty() {
            debug!(skipped = report.skipped, "no variables matched, file left unchanged");
            return Ok(report);
        }

        let body = writer::to_string(&doc);
        let mut output = Vec::with_capacity(input.bom().len() + body.len());
        output.extend_from_slice(input.bom());
        output.extend_from_slice(body.as_bytes());

        fs::write(path, output).map_err(|source| SubstitutionError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            attribute_names = report.attribute_names,
            attribute_values = report.attribute_values,
            text_nodes = report.text_nodes,
            skipped = report.skipped,
            "xml variable substitution applied"
        );
        Ok(report)
    }
}
