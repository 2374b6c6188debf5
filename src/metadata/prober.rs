//! Detection of the cloud environment.
//!
//! The process is considered to run on a cloud instance when the metadata service answers the
//! instance-id path with a non-empty body. The outcome is memoized in a [DetectionCache]; the
//! process-wide one is shared by every prober built with [EnvironmentProber::new].
use super::fetcher::MetadataFetcher;
use super::INSTANCE_ID_PATH;
use crate::http_client::HttpClient;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Outcome of the cloud environment detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvironmentState {
    #[default]
    Unknown,
    Cloud,
    NotCloud,
}

static GLOBAL_DETECTION_CACHE: LazyLock<Arc<DetectionCache>> =
    LazyLock::new(|| Arc::new(DetectionCache::new()));

/// Holds the memoized [EnvironmentState].
///
/// The state only moves from `Unknown` to `Cloud` or `NotCloud`, the lock is held while the
/// detection runs so concurrent first callers wait for a single detection.
#[derive(Debug, Default)]
pub struct DetectionCache {
    state: Mutex<EnvironmentState>,
}

impl DetectionCache {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(EnvironmentState::Unknown),
        }
    }

    /// Cache shared by the whole process.
    pub fn global() -> Arc<Self> {
        GLOBAL_DETECTION_CACHE.clone()
    }

    pub fn state(&self) -> EnvironmentState {
        *self.lock()
    }

    /// Returns the memoized outcome, running `detect` if there is none yet.
    pub fn get_or_detect<F>(&self, detect: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let mut state = self.lock();
        if *state == EnvironmentState::Unknown {
            *state = if detect() {
                EnvironmentState::Cloud
            } else {
                EnvironmentState::NotCloud
            };
        }
        *state == EnvironmentState::Cloud
    }

    /// Forgets the memoized outcome so the next call detects again.
    pub fn reset(&self) {
        *self.lock() = EnvironmentState::Unknown;
    }

    // The state is a plain Copy value, a panic while holding the lock cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, EnvironmentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct EnvironmentProber<C: HttpClient> {
    fetcher: Arc<MetadataFetcher<C>>,
    cache: Arc<DetectionCache>,
}

impl<C: HttpClient> EnvironmentProber<C> {
    /// Returns a prober memoizing in the process-wide cache.
    pub fn new(fetcher: Arc<MetadataFetcher<C>>) -> Self {
        Self::with_cache(fetcher, DetectionCache::global())
    }

    pub fn with_cache(fetcher: Arc<MetadataFetcher<C>>, cache: Arc<DetectionCache>) -> Self {
        Self { fetcher, cache }
    }

    /// Probes the instance-id path on first call, afterwards the memoized result is returned.
    pub fn is_cloud_environment(&self) -> bool {
        self.cache.get_or_detect(|| {
            let detected = self.fetcher.fetch(INSTANCE_ID_PATH);
            match &detected {
                Some(document) => info!(
                    instance_id = document.body.trim(),
                    "cloud environment detected"
                ),
                None => debug!(
                    endpoint = self.fetcher.endpoint(),
                    "instance id not available, not a cloud environment"
                ),
            }
            detected.is_some()
        })
    }

    pub fn state(&self) -> EnvironmentState {
        self.cache.state()
    }

    pub fn reset_detection_cache(&self) {
        self.cache.reset()
    }
}
