//! Retrieval of single metadata documents.
use super::{is_known_attribute, META_DATA_ROOT, TOKEN_PATH};
use crate::config::MetadataConfig;
use crate::http_client::{try_build_reqwest_client, HttpClient, HttpClientError};
use http::{HeaderMap, HeaderValue};
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub(crate) const TOKEN_HEADER: &str = "x-aws-ec2-metadata-token";
pub(crate) const TTL_TOKEN_HEADER: &str = "x-aws-ec2-metadata-token-ttl-seconds";

/// Body of a metadata document together with the path it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDocument {
    pub path: String,
    pub body: String,
}

/// Reasons for a document to be absent. They never leave the fetcher, they are only logged.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("`{0}`")]
    HttpError(#[from] HttpClientError),
    #[error("status code: `{0}`, canonical reason: `{1}`")]
    UnsuccessfulResponse(u16, String),
    #[error("body is not valid UTF-8: `{0}`")]
    InvalidBody(String),
    #[error("invalid session token: `{0}`")]
    InvalidToken(String),
}

/// The `MetadataFetcher` reads documents from the metadata service through an HTTP client
/// already configured with the request timeout.
pub struct MetadataFetcher<C: HttpClient> {
    http_client: C,
    endpoint: String,
    token_ttl: Option<Duration>,
}

impl MetadataFetcher<Client> {
    /// Builds a fetcher backed by a reqwest client with the configured timeouts.
    pub fn try_from_config(config: &MetadataConfig) -> Result<Self, HttpClientError> {
        let http_client = try_build_reqwest_client(config.timeout, config.connect_timeout)?;
        let fetcher = Self::new(http_client, config.endpoint.clone());
        Ok(match config.token_ttl {
            Some(ttl) => fetcher.with_token_ttl(ttl),
            None => fetcher,
        })
    }
}

impl<C: HttpClient> MetadataFetcher<C> {
    pub fn new(http_client: C, endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token_ttl: None,
        }
    }

    /// Requests an IMDSv2 session token with the given ttl before every fetch.
    pub fn with_token_ttl(self, ttl: Duration) -> Self {
        Self {
            token_ttl: Some(ttl),
            ..self
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the document at `path`, or `None` if it could not be read or it is blank.
    pub fn fetch(&self, path: &str) -> Option<MetadataDocument> {
        match self.try_fetch(path) {
            Ok(document) => document,
            Err(err) => {
                debug!(path, %err, "metadata document not available");
                None
            }
        }
    }

    /// Returns the instance attribute `name`, only for well-known attribute names.
    pub fn fetch_attribute(&self, name: &str) -> Option<MetadataDocument> {
        if !is_known_attribute(name) {
            return None;
        }
        self.fetch(&format!("{META_DATA_ROOT}/{name}"))
    }

    fn try_fetch(&self, path: &str) -> Result<Option<MetadataDocument>, FetchError> {
        let mut headers = HeaderMap::new();
        if let Some(ttl) = self.token_ttl {
            let token = self.get_token(ttl)?;
            let token = HeaderValue::from_str(&token)
                .map_err(|e| FetchError::InvalidToken(e.to_string()))?;
            headers.insert(TOKEN_HEADER, token);
        }

        let response = self
            .http_client
            .get(format!("{}{}", self.endpoint, path), headers)?;

        if response.status() == http::StatusCode::NOT_FOUND {
            debug!(path, "metadata document not found");
            return Ok(None);
        }
        // return error if status code is not within 200-299.
        if !response.status().is_success() {
            return Err(FetchError::UnsuccessfulResponse(
                response.status().as_u16(),
                response
                    .status()
                    .canonical_reason()
                    .unwrap_or_default()
                    .to_string(),
            ));
        }

        let body = String::from_utf8(response.into_body())
            .map_err(|e| FetchError::InvalidBody(e.to_string()))?;
        if body.trim().is_empty() {
            debug!(path, "metadata document is empty");
            return Ok(None);
        }

        Ok(Some(MetadataDocument {
            path: path.to_string(),
            body,
        }))
    }

    fn get_token(&self, ttl: Duration) -> Result<String, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(TTL_TOKEN_HEADER, HeaderValue::from(ttl.as_secs()));

        let response = self
            .http_client
            .put(format!("{}{}", self.endpoint, TOKEN_PATH), headers)?;

        if !response.status().is_success() {
            return Err(FetchError::UnsuccessfulResponse(
                response.status().as_u16(),
                "session token request rejected".to_string(),
            ));
        }

        String::from_utf8(response.into_body())
            .map_err(|err| FetchError::InvalidToken(format!("could not decode token {err}")))
    }
}
