//! Property source backed by the instance user-data and metadata attributes.
use super::PropertySource;
use crate::http_client::HttpClient;
use crate::metadata::fetcher::MetadataFetcher;
use crate::parser::ConfigEntry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Name under which the instance data is registered.
pub const INSTANCE_DATA_SOURCE_NAME: &str = "instance-data";

/// Answers lookups from the parsed user-data entries first. Keys not present there are resolved
/// as well-known instance attributes (`instance-id`, `placement/availability-zone`...), each of
/// them fetched at most once.
pub struct InstanceDataPropertySource<C: HttpClient> {
    entries: Vec<ConfigEntry>,
    fetcher: Arc<MetadataFetcher<C>>,
    attributes: Mutex<HashMap<String, Option<String>>>,
}

impl<C: HttpClient> InstanceDataPropertySource<C> {
    pub fn new(entries: Vec<ConfigEntry>, fetcher: Arc<MetadataFetcher<C>>) -> Self {
        Self {
            entries,
            fetcher,
            attributes: Mutex::new(HashMap::new()),
        }
    }

    /// Entries parsed from the user-data, in order.
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    fn attribute(&self, name: &str) -> Option<String> {
        let mut attributes = self
            .attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        attributes
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(attribute = name, "resolving instance attribute");
                self.fetcher
                    .fetch_attribute(name)
                    .map(|document| document.body.trim().to_string())
            })
            .clone()
    }
}

impl<C> PropertySource for InstanceDataPropertySource<C>
where
    C: HttpClient + Send + Sync,
{
    fn name(&self) -> &str {
        INSTANCE_DATA_SOURCE_NAME
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.clone())
            .or_else(|| self.attribute(key))
    }

    /// Only the user-data keys are enumerable, instance attributes are resolved on lookup.
    fn property_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }
}
