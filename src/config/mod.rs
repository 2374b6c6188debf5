//! Configuration of the instance data resolution.
pub mod error;
pub mod loader;

use crate::http_client::{DEFAULT_CLIENT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT};
use crate::logging::LoggingConfig;
use crate::metadata::DEFAULT_METADATA_ENDPOINT;
use crate::parser::{
    SeparatorError, Separators, DEFAULT_ATTRIBUTE_SEPARATOR, DEFAULT_VALUE_SEPARATOR,
};
use duration_str::{deserialize_duration, deserialize_option_duration};
use error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Longest session token lifetime accepted by the metadata service.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(21600);

#[derive(Debug, Deserialize, Default, PartialEq, Clone)]
pub struct InstanceDataConfig {
    #[serde(default)]
    pub user_data: UserDataConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub log: LoggingConfig,
}

impl InstanceDataConfig {
    /// Checks every value that could only fail later on, before anything is sent to the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.user_data.separators()?;
        if !(self.metadata.endpoint.starts_with("http://")
            || self.metadata.endpoint.starts_with("https://"))
        {
            return Err(ConfigError::InvalidEndpoint(self.metadata.endpoint.clone()));
        }
        if let Some(ttl) = self.metadata.token_ttl {
            // the ttl travels as an integer number of seconds.
            if ttl.subsec_nanos() != 0 || ttl < Duration::from_secs(1) || ttl > MAX_TOKEN_TTL {
                return Err(ConfigError::InvalidTokenTtl(ttl));
            }
        }
        Ok(())
    }
}

/// Separators used to split the user-data. They are kept as text so that empty or multi-character
/// values can be reported instead of silently truncated.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct UserDataConfig {
    #[serde(default = "default_attribute_separator")]
    pub attribute_separator: String,
    #[serde(default = "default_value_separator")]
    pub value_separator: String,
}

impl UserDataConfig {
    pub fn separators(&self) -> Result<Separators, SeparatorError> {
        Separators::try_from_str(&self.attribute_separator, &self.value_separator)
    }
}

impl Default for UserDataConfig {
    fn default() -> Self {
        Self {
            attribute_separator: default_attribute_separator(),
            value_separator: default_value_separator(),
        }
    }
}

fn default_attribute_separator() -> String {
    DEFAULT_ATTRIBUTE_SEPARATOR.to_string()
}

fn default_value_separator() -> String {
    DEFAULT_VALUE_SEPARATOR.to_string()
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct MetadataConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(
        default = "default_connect_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub connect_timeout: Duration,
    /// Enables IMDSv2 session tokens with the given time to live.
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub token_ttl: Option<Duration>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            token_ttl: None,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_METADATA_ENDPOINT.to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_CLIENT_TIMEOUT
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let config: InstanceDataConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config, InstanceDataConfig::default());
        assert_eq!(config.user_data.separators().unwrap(), Separators::default());
        assert_eq!(config.metadata.endpoint, "http://169.254.169.254");
        assert_eq!(config.metadata.timeout, Duration::from_secs(2));
        assert_eq!(config.metadata.token_ttl, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_config() {
        let config: InstanceDataConfig = serde_yaml::from_str(
            r#"
user_data:
  attribute_separator: "/"
  value_separator: "="
metadata:
  endpoint: http://127.0.0.1:8080
  timeout: 500ms
  connect_timeout: 1s
  token_ttl: 60s
log:
  level: debug
"#,
        )
        .unwrap();

        assert_eq!(
            config.user_data.separators().unwrap(),
            Separators::try_new('/', '=').unwrap()
        );
        assert_eq!(config.metadata.timeout, Duration::from_millis(500));
        assert_eq!(config.metadata.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.metadata.token_ttl, Some(Duration::from_secs(60)));
    }

    #[test]
    fn null_separator_fails_to_deserialize() {
        let result = serde_yaml::from_str::<InstanceDataConfig>(
            r#"
user_data:
  value_separator: ~
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn invalid_separators() {
        let config: InstanceDataConfig = serde_yaml::from_str(
            r#"
user_data:
  attribute_separator: ":"
"#,
        )
        .unwrap();

        assert_matches!(
            config.validate(),
            Err(ConfigError::InvalidSeparators(SeparatorError::Identical(
                ':'
            )))
        );
    }

    #[test]
    fn invalid_endpoint() {
        let config: InstanceDataConfig = serde_yaml::from_str(
            r#"
metadata:
  endpoint: 169.254.169.254
"#,
        )
        .unwrap();

        assert_matches!(config.validate(), Err(ConfigError::InvalidEndpoint(_)));
    }

    #[rstest]
    #[case::sub_second("500ms")]
    #[case::zero("0s")]
    #[case::fractional("1500ms")]
    #[case::above_maximum("21601s")]
    fn invalid_token_ttl(#[case] ttl: &str) {
        let config: InstanceDataConfig =
            serde_yaml::from_str(&format!("metadata:\n  token_ttl: {ttl}\n")).unwrap();

        assert_matches!(config.validate(), Err(ConfigError::InvalidTokenTtl(_)));
    }

    #[rstest]
    #[case::minimum("1s")]
    #[case::maximum("6h")]
    fn valid_token_ttl(#[case] ttl: &str) {
        let config: InstanceDataConfig =
            serde_yaml::from_str(&format!("metadata:\n  token_ttl: {ttl}\n")).unwrap();

        assert!(config.validate().is_ok());
    }
}
