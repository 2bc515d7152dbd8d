//! Tag-scoped substitution over a parsed document

use std::fmt;

use tracing::{debug, warn};

use crate::error::Result;
use crate::input::Input;
use crate::substitute::variables::{SectionTagSet, VariableMap};
use crate::xml::model::{
    is_namespace_declaration, is_valid_name, prefix_of, Content, Document, Element,
};
use crate::xml::parser::{Config as ParserConfig, Parser};
use crate::xml::writer;

/// Which attribute slots a key may match.
///
/// The default matches keys against both attribute names and values, so a
/// key that happens to equal an attribute name renames that attribute even
/// when the caller only meant to replace values. `ValuesOnly` opts out of
/// name substitution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MatchPolicy {
    #[default]
    NamesAndValues,
    ValuesOnly,
}

/// Configuration for a substitution run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SubstitutionConfig {
    pub match_policy: MatchPolicy,
    pub parser: ParserConfig,
}

impl SubstitutionConfig {
    pub const fn new(match_policy: MatchPolicy, parser: ParserConfig) -> Self {
        Self {
            match_policy,
            parser,
        }
    }

    #[must_use]
    pub const fn with_match_policy(mut self, match_policy: MatchPolicy) -> Self {
        self.match_policy = match_policy;
        self
    }
}

/// What a substitution run changed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Substitutions {
    pub attribute_names: usize,
    pub attribute_values: usize,
    pub text_nodes: usize,
    /// Renames refused because they would break well-formedness
    pub skipped: usize,
}

impl Substitutions {
    /// Number of slots actually rewritten
    pub const fn total(&self) -> usize {
        self.attribute_names + self.attribute_values + self.text_nodes
    }

    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Why an attribute rename was refused
#[derive(Clone, Debug, PartialEq, Eq)]
enum RenameRejection {
    InvalidName,
    Duplicate,
    UndeclaredPrefix(String),
    NamespaceDeclaration,
}

impl fmt::Display for RenameRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName => write!(f, "not a valid xml name"),
            Self::Duplicate => write!(f, "element already has an attribute with that name"),
            Self::UndeclaredPrefix(prefix) => write!(f, "namespace prefix '{prefix}' is not declared"),
            Self::NamespaceDeclaration => write!(f, "namespace declarations are never renamed"),
        }
    }
}

/// Substitution engine bound to one tag set and variable map
#[derive(Clone, Copy, Debug)]
pub struct Substitutor<'a> {
    pub(crate) tags: &'a SectionTagSet,
    pub(crate) variables: &'a VariableMap,
    pub(crate) config: SubstitutionConfig,
}

impl<'a> Substitutor<'a> {
    pub fn new(tags: &'a SectionTagSet, variables: &'a VariableMap) -> Self {
        Self::with_config(tags, variables, SubstitutionConfig::default())
    }

    pub const fn with_config(
        tags: &'a SectionTagSet,
        variables: &'a VariableMap,
        config: SubstitutionConfig,
    ) -> Self {
        Self {
            tags,
            variables,
            config,
        }
    }

    pub const fn config(&self) -> &SubstitutionConfig {
        &self.config
    }

    /// Parse `input`, substitute, and write it back out
    pub fn apply_to_str(&self, input: &str) -> Result<(String, Substitutions)> {
        let input = Input::from_str(input);
        let mut doc = Parser::with_config(input.as_bytes(), self.config.parser).parse()?;
        let report = self.apply(&mut doc);

        let mut output = String::new();
        if input.has_bom() {
            output.push('\u{feff}');
        }
        writer::write_document(&doc, &mut output);
        Ok((output, report))
    }

    /// Substitute in place over every section subtree of `doc`
    pub fn apply(&self, doc: &mut Document) -> Substitutions {
        let mut report = Substitutions::default();
        let mut namespaces = Vec::new();
        self.visit(&mut doc.root, false, &mut namespaces, &mut report);
        report
    }

    /// Elements outside every section are walked but never rewritten, so
    /// sections nested under unlisted ancestors are still found
    fn visit(
        &self,
        element: &mut Element,
        in_scope: bool,
        namespaces: &mut Vec<String>,
        report: &mut Substitutions,
    ) {
        let scope_len = namespaces.len();
        namespaces.extend(
            element
                .attributes
                .iter()
                .filter_map(|attr| attr.declared_prefix())
                .map(str::to_string),
        );

        let in_scope = in_scope || self.tags.contains(&element.name);
        if in_scope {
            self.substitute_attributes(element, namespaces, report);
            if element.is_leaf() {
                self.substitute_text(element, report);
            }
        }

        for child in &mut element.children {
            if let Content::Element(child) = child {
                self.visit(child, in_scope, namespaces, report);
            }
        }

        namespaces.truncate(scope_len);
    }

    fn substitute_attributes(
        &self,
        element: &mut Element,
        namespaces: &[String],
        report: &mut Substitutions,
    ) {
        for index in 0..element.attributes.len() {
            let Some(attr) = element.attributes.get(index) else {
                continue;
            };

            // both lookups use the slot's original contents
            let new_name = match self.config.match_policy {
                MatchPolicy::NamesAndValues => self.lookup(attr.name()),
                MatchPolicy::ValuesOnly => None,
            };
            let new_value = self.lookup(attr.value());
            if new_name.is_none() && new_value.is_none() {
                continue;
            }
            let original_name = attr.name().to_string();

            if let Some(new_name) = new_name {
                match check_rename(element, index, new_name, namespaces) {
                    Ok(()) => {
                        if let Some(attr) = element.attributes.get_mut(index) {
                            attr.set_name(new_name);
                        }
                        report.attribute_names += 1;
                        debug!(
                            element = %element.name,
                            key = %original_name,
                            "substituted attribute name"
                        );
                    }
                    Err(reason) => {
                        report.skipped += 1;
                        warn!(
                            element = %element.name,
                            attribute = %original_name,
                            replacement = %new_name,
                            "skipping attribute rename: {reason}"
                        );
                    }
                }
            }

            if let Some(new_value) = new_value {
                if let Some(attr) = element.attributes.get_mut(index) {
                    attr.set_value(new_value);
                }
                report.attribute_values += 1;
                debug!(
                    element = %element.name,
                    attribute = %original_name,
                    "substituted attribute value"
                );
            }
        }
    }

    fn substitute_text(&self, element: &mut Element, report: &mut Substitutions) {
        for child in &mut element.children {
            let Content::Text(text) = child else {
                continue;
            };
            let Some(replacement) = self.lookup(text.value().trim()) else {
                continue;
            };

            text.replace_trimmed(replacement);
            report.text_nodes += 1;
            debug!(element = %element.name, "substituted text content");
        }
    }

    /// Exact, case-sensitive lookup; an empty token never matches
    fn lookup(&self, token: &str) -> Option<&'a str> {
        if token.is_empty() {
            None
        } else {
            self.variables.get(token)
        }
    }
}

/// A rename must leave the element well-formed and namespace-valid
fn check_rename(
    element: &Element,
    index: usize,
    new_name: &str,
    namespaces: &[String],
) -> std::result::Result<(), RenameRejection> {
    let is_declaration = element
        .attributes
        .get(index)
        .is_some_and(|attr| attr.is_namespace_declaration());
    if is_declaration || is_namespace_declaration(new_name) {
        return Err(RenameRejection::NamespaceDeclaration);
    }
    if !is_valid_name(new_name) {
        return Err(RenameRejection::InvalidName);
    }
    let duplicate = element
        .attributes
        .iter()
        .enumerate()
        .any(|(other, attr)| other != index && attr.name() == new_name);
    if duplicate {
        return Err(RenameRejection::Duplicate);
    }
    match prefix_of(new_name) {
        Some(prefix) if prefix != "xml" && !namespaces.iter().any(|ns| ns == prefix) => {
            Err(RenameRejection::UndeclaredPrefix(prefix.to_string()))
        }
        _ => Ok(()),
    }
}
