//! Named configuration sources and the layered store they are registered in.
pub mod instance_data;
pub mod sources;

use crate::parser::ConfigEntry;

/// A named source of configuration properties.
pub trait PropertySource: Send + Sync {
    fn name(&self) -> &str;

    fn get_property(&self, key: &str) -> Option<String>;

    /// Names of the properties the source can enumerate, in their natural order.
    fn property_names(&self) -> Vec<String>;

    fn contains_property(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }
}

/// In-memory source keeping the insertion order of its entries.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPropertySource {
    name: String,
    entries: Vec<ConfigEntry>,
}

impl MapPropertySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Sets `key`, replacing the value in place if it already exists.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let entry = ConfigEntry::new(key, value);
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => existing.value = entry.value,
            None => self.entries.push(entry),
        }
    }

    pub fn from_entries(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = ConfigEntry>,
    ) -> Self {
        let mut source = Self::new(name);
        for entry in entries {
            source.insert(entry.key, entry.value);
        }
        source
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.clone())
    }

    fn property_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }
}
