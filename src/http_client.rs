//! HTTP client seam used to reach the instance metadata service.
use http::{HeaderMap, Request, Response};
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;

/// The default timeout for a whole metadata request.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(2);
/// The default timeout for establishing the connection with the metadata service.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// An enumeration of potential errors related to the HTTP client.
#[derive(Error, Debug)]
pub enum HttpClientError {
    /// Represents an error building the HttpClient or the request.
    #[error("could not build the HTTP client: `{0}`")]
    BuildingError(String),
    /// Represents HTTP Transport error, timeouts included.
    #[error("transport HTTP client error: `{0}`")]
    TransportError(String),
    /// Represents an error reading or converting the HTTP response.
    #[error("invalid HTTP response: `{0}`")]
    ResponseError(String),
}

impl From<reqwest::Error> for HttpClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::BuildingError(err.to_string())
        } else {
            Self::TransportError(err.to_string())
        }
    }
}

/// The `HttpClient` trait defines the HTTP send interface to be implemented
/// by HTTP clients.
pub trait HttpClient {
    /// Returns a `http::Response<Vec<u8>>` structure as the HTTP response or
    /// HttpClientError if an error was found.
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError>;

    /// Performs a get request with the provided url and headers.
    fn get(&self, url: String, headers: HeaderMap) -> Result<Response<Vec<u8>>, HttpClientError> {
        self.send(build_request("GET", url, headers)?)
    }

    /// Performs a put request with the provided url and headers and an empty body.
    fn put(&self, url: String, headers: HeaderMap) -> Result<Response<Vec<u8>>, HttpClientError> {
        self.send(build_request("PUT", url, headers)?)
    }
}

fn build_request(
    method: &str,
    url: String,
    headers: HeaderMap,
) -> Result<Request<Vec<u8>>, HttpClientError> {
    let mut request = Request::builder()
        .method(method)
        .uri(url)
        .body(Vec::new())
        .map_err(|e| HttpClientError::BuildingError(e.to_string()))?;
    request.headers_mut().extend(headers);
    Ok(request)
}

impl HttpClient for Client {
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError> {
        let request = reqwest::blocking::Request::try_from(request)?;
        try_build_response(self.execute(request)?)
    }
}

/// Builds the blocking reqwest client used against the metadata service.
/// The metadata service is link-local, so proxies configured in the environment are ignored.
pub fn try_build_reqwest_client(
    timeout: Duration,
    connect_timeout: Duration,
) -> Result<Client, HttpClientError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .no_proxy()
        .build()
        .map_err(|err| HttpClientError::BuildingError(err.to_string()))
}

/// Helper to build a [http::Response<Vec<u8>>] from a reqwest's blocking response.
/// It includes status, version and body. Headers are not included.
pub fn try_build_response(
    res: reqwest::blocking::Response,
) -> Result<Response<Vec<u8>>, HttpClientError> {
    let status = res.status();
    let version = res.version();
    let body: Vec<u8> = res
        .bytes()
        .map_err(|err| HttpClientError::ResponseError(err.to_string()))?
        .into();
    Response::builder()
        .status(status)
        .version(version)
        .body(body)
        .map_err(|err| HttpClientError::ResponseError(err.to_string()))
}
