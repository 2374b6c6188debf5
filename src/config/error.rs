use crate::parser::SeparatorError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("error loading config: `{0}`")]
    LoadConfigError(#[from] config::ConfigError),

    #[error("config file not found: `{0}`")]
    FileNotFound(String),

    #[error("invalid user-data separators: `{0}`")]
    InvalidSeparators(#[from] SeparatorError),

    #[error("invalid metadata endpoint `{0}`: must be an http(s) url")]
    InvalidEndpoint(String),

    #[error("invalid metadata token_ttl `{0:?}`: must be whole seconds between 1s and 6h")]
    InvalidTokenTtl(Duration),
}
