//! Variable map and section tag set

use indexmap::IndexMap;

/// Section tags of a conventional `.config` file
pub const DEFAULT_SECTION_TAGS: [&str; 4] = [
    "applicationSettings",
    "appSettings",
    "connectionStrings",
    "configSections",
];

/// Flat key to value table driving one substitution call.
///
/// Keys are matched against attribute names, attribute values and trimmed
/// leaf text with exact, case-sensitive equality. There is no scoping: one
/// key applies to every slot in every section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VariableMap {
    vars: IndexMap<String, String>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable, returning the value it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.vars.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy every entry of `other` over this map
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for VariableMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Ordered list of element names whose subtrees may be rewritten
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SectionTagSet {
    tags: Vec<String>,
}

impl SectionTagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `applicationSettings`, `appSettings`, `connectionStrings`, `configSections`
    pub fn config_sections() -> Self {
        DEFAULT_SECTION_TAGS.into_iter().collect()
    }

    /// Append a tag, ignoring repeats
    pub fn push(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Exact match against a qualified element name
    pub fn contains(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag == name)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl<T: Into<String>> FromIterator<T> for SectionTagSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for tag in iter {
            set.push(tag);
        }
        set
    }
}
