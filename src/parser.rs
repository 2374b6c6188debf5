//! Parser for the delimited key/value lists found in the instance user-data.
//!
//! The user-data is read as `key<value separator>value` attributes joined by an attribute
//! separator, for instance `a:b;c:d`. There is no escaping mechanism: separators cannot be part
//! of keys or values.
use std::fmt::{Display, Formatter};
use thiserror::Error;
use tracing::trace;

/// Default separator between attributes.
pub const DEFAULT_ATTRIBUTE_SEPARATOR: char = ';';
/// Default separator between the key and the value of an attribute.
pub const DEFAULT_VALUE_SEPARATOR: char = ':';

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum SeparatorError {
    #[error("`{name}` must be exactly one character, got `{value}`")]
    NotSingleChar { name: &'static str, value: String },
    #[error("attribute and value separators must differ, both are `{0}`")]
    Identical(char),
}

/// Validated pair of separators used to split the user-data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separators {
    attribute: char,
    value: char,
}

impl Separators {
    pub fn try_new(attribute: char, value: char) -> Result<Self, SeparatorError> {
        if attribute == value {
            return Err(SeparatorError::Identical(attribute));
        }
        Ok(Self { attribute, value })
    }

    /// Builds the separators from their textual configuration, each of them must hold a single char.
    pub fn try_from_str(attribute: &str, value: &str) -> Result<Self, SeparatorError> {
        Self::try_new(
            single_char("attribute_separator", attribute)?,
            single_char("value_separator", value)?,
        )
    }

    pub fn attribute(&self) -> char {
        self.attribute
    }

    pub fn value(&self) -> char {
        self.value
    }
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            attribute: DEFAULT_ATTRIBUTE_SEPARATOR,
            value: DEFAULT_VALUE_SEPARATOR,
        }
    }
}

fn single_char(name: &'static str, value: &str) -> Result<char, SeparatorError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(SeparatorError::NotSingleChar {
            name,
            value: value.to_string(),
        }),
    }
}

/// A single configuration attribute read from the user-data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Display for ConfigEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Parses `text` into ordered entries.
///
/// Fragments without a value separator or with an empty key are skipped. Keys are unique in the
/// result: a repeated key keeps the position of its first appearance and the value of the last one.
pub fn parse(text: &str, separators: &Separators) -> Vec<ConfigEntry> {
    let mut entries: Vec<ConfigEntry> = Vec::new();

    for fragment in text.split(separators.attribute).filter(|f| !f.is_empty()) {
        let Some((key, value)) = fragment.split_once(separators.value) else {
            trace!(fragment, "skipping user-data fragment without value separator");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            trace!(fragment, "skipping user-data fragment with empty key");
            continue;
        }
        let value = value.trim();

        match entries.iter_mut().find(|entry| entry.key == key) {
            Some(existing) => existing.value = value.to_string(),
            None => entries.push(ConfigEntry::new(key, value)),
        }
    }

    entries
}
