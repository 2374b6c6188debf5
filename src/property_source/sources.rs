//! Layered store of [PropertySource]s.
//!
//! Sources are kept from highest to lowest precedence: a lookup returns the value of the first
//! source holding the key.
use super::PropertySource;
use tracing::debug;

#[derive(Default)]
pub struct PropertySources {
    sources: Vec<Box<dyn PropertySource>>,
}

impl PropertySources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `source` with the highest precedence, replacing any source with the same name.
    pub fn add_first(&mut self, source: impl PropertySource + 'static) {
        self.remove(source.name());
        debug!(source = source.name(), "adding property source with highest precedence");
        self.sources.insert(0, Box::new(source));
    }

    /// Registers `source` with the lowest precedence, replacing any source with the same name.
    pub fn add_last(&mut self, source: impl PropertySource + 'static) {
        self.remove(source.name());
        debug!(source = source.name(), "adding property source with lowest precedence");
        self.sources.push(Box::new(source));
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn PropertySource>> {
        let index = self.sources.iter().position(|s| s.name() == name)?;
        Some(self.sources.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&dyn PropertySource> {
        self.sources
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Source names from highest to lowest precedence.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get_property(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|s| s.get_property(key))
    }
}
