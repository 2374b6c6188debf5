//! Startup sequence registering the instance data as a configuration source.
//!
//! ```text
//! Unconfigured --not cloud--> Inactive          (nothing registered, user-data never fetched)
//! Unconfigured --cloud------> Active { entries } (registered, possibly with zero entries)
//! ```
//!
//! The instance data is always registered as the lowest precedence source: any key set in
//! another source shadows it.
use crate::config::error::ConfigError;
use crate::config::InstanceDataConfig;
use crate::http_client::{HttpClient, HttpClientError};
use crate::metadata::fetcher::MetadataFetcher;
use crate::metadata::prober::{DetectionCache, EnvironmentProber};
use crate::metadata::USER_DATA_PATH;
use crate::parser::{parse, Separators};
use crate::property_source::instance_data::InstanceDataPropertySource;
use crate::property_source::sources::PropertySources;
use reqwest::blocking::Client;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("invalid configuration: `{0}`")]
    Config(#[from] ConfigError),
    #[error("could not build the metadata client: `{0}`")]
    HttpClient(#[from] HttpClientError),
}

/// Terminal state of the startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Not a cloud environment, no source has been registered.
    Inactive,
    /// The instance data source has been registered holding `entries` user-data entries.
    Active { entries: usize },
}

pub struct InstanceDataBootstrap<C: HttpClient> {
    prober: EnvironmentProber<C>,
    fetcher: Arc<MetadataFetcher<C>>,
    separators: Separators,
}

impl InstanceDataBootstrap<Client> {
    /// Validates `config` and builds the bootstrap over a reqwest client.
    /// Configuration errors are returned before any HTTP client is created.
    pub fn try_new(config: &InstanceDataConfig) -> Result<Self, BootstrapError> {
        config.validate()?;
        let separators = config.user_data.separators().map_err(ConfigError::from)?;
        let fetcher = Arc::new(MetadataFetcher::try_from_config(&config.metadata)?);
        Ok(Self::new(
            EnvironmentProber::new(fetcher.clone()),
            fetcher,
            separators,
        ))
    }
}

impl<C> InstanceDataBootstrap<C>
where
    C: HttpClient + Send + Sync + 'static,
{
    pub fn new(
        prober: EnvironmentProber<C>,
        fetcher: Arc<MetadataFetcher<C>>,
        separators: Separators,
    ) -> Self {
        Self {
            prober,
            fetcher,
            separators,
        }
    }

    /// Builds the bootstrap from a fetcher, memoizing the detection in `cache`.
    pub fn with_cache(
        fetcher: Arc<MetadataFetcher<C>>,
        cache: Arc<DetectionCache>,
        separators: Separators,
    ) -> Self {
        Self::new(
            EnvironmentProber::with_cache(fetcher.clone(), cache),
            fetcher,
            separators,
        )
    }

    pub fn prober(&self) -> &EnvironmentProber<C> {
        &self.prober
    }

    /// Runs the startup sequence, registering the instance data in `sources` on cloud environments.
    pub fn run(self, sources: &mut PropertySources) -> BootstrapState {
        if !self.prober.is_cloud_environment() {
            info!("not running on a cloud instance, instance data is not available");
            return BootstrapState::Inactive;
        }

        let entries = match self.fetcher.fetch(USER_DATA_PATH) {
            Some(document) => parse(&document.body, &self.separators),
            None => {
                debug!("no user-data available");
                Vec::new()
            }
        };

        let state = BootstrapState::Active {
            entries: entries.len(),
        };
        sources.add_last(InstanceDataPropertySource::new(entries, self.fetcher));
        info!(?state, "instance data registered");
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::tests::MockHttpClientMock;
    use crate::metadata::prober::EnvironmentState;
    use crate::metadata::INSTANCE_ID_PATH;
    use crate::parser::SeparatorError;
    use crate::property_source::instance_data::INSTANCE_DATA_SOURCE_NAME;
    use crate::property_source::MapPropertySource;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn bootstrap(
        client_mock: MockHttpClientMock,
        separators: Separators,
    ) -> InstanceDataBootstrap<MockHttpClientMock> {
        InstanceDataBootstrap::with_cache(
            Arc::new(MetadataFetcher::new(client_mock, "http://169.254.169.254")),
            Arc::new(DetectionCache::new()),
            separators,
        )
    }

    #[test]
    fn not_cloud_registers_nothing() {
        let mut client_mock = MockHttpClientMock::new();
        // only the probe is expected, user-data must never be requested
        client_mock.should_send_on(INSTANCE_ID_PATH, 200, "");

        let bootstrap = bootstrap(client_mock, Separators::default());
        let mut sources = PropertySources::new();

        assert_eq!(bootstrap.run(&mut sources), BootstrapState::Inactive);
        assert!(sources.is_empty());
    }

    #[test]
    fn not_cloud_state_is_memoized() {
        let mut client_mock = MockHttpClientMock::new();
        client_mock.should_fail_on(INSTANCE_ID_PATH);
        let cache = Arc::new(DetectionCache::new());

        let bootstrap = InstanceDataBootstrap::with_cache(
            Arc::new(MetadataFetcher::new(client_mock, "http://169.254.169.254")),
            cache.clone(),
            Separators::default(),
        );
        bootstrap.run(&mut PropertySources::new());

        assert_eq!(cache.state(), EnvironmentState::NotCloud);
    }

    #[test]
    fn cloud_registers_user_data() {
        let mut client_mock = MockHttpClientMock::new();
        client_mock.should_send_on(INSTANCE_ID_PATH, 200, "testInstanceId");
        client_mock.should_send_on(USER_DATA_PATH, 200, "a:b;c:d");

        let bootstrap = bootstrap(client_mock, Separators::default());
        let mut sources = PropertySources::new();

        assert_eq!(
            bootstrap.run(&mut sources),
            BootstrapState::Active { entries: 2 }
        );
        assert_eq!(sources.names(), vec![INSTANCE_DATA_SOURCE_NAME]);
        assert_eq!(sources.get_property("a"), Some("b".to_string()));
        assert_eq!(sources.get_property("c"), Some("d".to_string()));
    }

    #[test]
    fn cloud_without_user_data_registers_empty_source() {
        let mut client_mock = MockHttpClientMock::new();
        client_mock.should_send_on(INSTANCE_ID_PATH, 200, "testInstanceId");
        client_mock.should_send_on(USER_DATA_PATH, 404, "");

        let bootstrap = bootstrap(client_mock, Separators::default());
        let mut sources = PropertySources::new();

        assert_eq!(
            bootstrap.run(&mut sources),
            BootstrapState::Active { entries: 0 }
        );
        assert!(sources.contains(INSTANCE_DATA_SOURCE_NAME));
        assert_eq!(
            sources
                .get(INSTANCE_DATA_SOURCE_NAME)
                .unwrap()
                .property_names()
                .len(),
            0
        );
    }

    #[test]
    fn cloud_with_custom_separators() {
        let mut client_mock = MockHttpClientMock::new();
        client_mock.should_send_on(INSTANCE_ID_PATH, 200, "testInstanceId");
        client_mock.should_send_on(USER_DATA_PATH, 200, "a=b/c=d");

        let bootstrap = bootstrap(client_mock, Separators::try_new('/', '=').unwrap());
        let mut sources = PropertySources::new();

        assert_eq!(
            bootstrap.run(&mut sources),
            BootstrapState::Active { entries: 2 }
        );
        assert_eq!(sources.get_property("c"), Some("d".to_string()));
    }

    #[test]
    fn instance_data_has_lowest_precedence() {
        let mut client_mock = MockHttpClientMock::new();
        client_mock.should_send_on(INSTANCE_ID_PATH, 200, "testInstanceId");
        client_mock.should_send_on(USER_DATA_PATH, 200, "a:b;c:d");

        let mut sources = PropertySources::new();
        sources.add_last(MapPropertySource::new("application").with_property("a", "user"));

        bootstrap(client_mock, Separators::default()).run(&mut sources);

        assert_eq!(
            sources.names(),
            vec!["application", INSTANCE_DATA_SOURCE_NAME]
        );
        assert_eq!(sources.get_property("a"), Some("user".to_string()));
        assert_eq!(sources.get_property("c"), Some("d".to_string()));
    }

    #[test]
    fn invalid_separators_fail_before_any_request() {
        let mut config = InstanceDataConfig::default();
        config.user_data.value_separator = ";".to_string();
        // unroutable endpoint: the test would hang on the timeout if a request were sent
        config.metadata.endpoint = "http://10.255.255.1".to_string();

        let err = InstanceDataBootstrap::try_new(&config).err().unwrap();

        assert_matches!(
            err,
            BootstrapError::Config(ConfigError::InvalidSeparators(SeparatorError::Identical(
                ';'
            )))
        );
    }

    #[test]
    fn sub_second_token_ttl_is_a_configuration_error() {
        let mut config = InstanceDataConfig::default();
        config.metadata.token_ttl = Some(Duration::from_millis(500));

        let err = InstanceDataBootstrap::try_new(&config).err().unwrap();

        assert_matches!(err, BootstrapError::Config(ConfigError::InvalidTokenTtl(_)));
    }
}
