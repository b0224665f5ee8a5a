//! Upstream client: sends query text to the graph endpoint and unwraps the
//! JSON envelope.

use std::future::Future;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use rmp_types::DecodeError;

pub const DEFAULT_ENDPOINT: &str = "https://www.ratemyprofessors.com/graphql";

/// Static credential the public site itself sends.
const CREDENTIALS: &str = "test:test";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),
}

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("upstream reported query errors: {0}")]
    QueryError(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no professor with id '{0}'")]
    UnknownId(String),

    #[error("unexpected response alias '{0}'")]
    UnexpectedAlias(String),

    #[error("response missing alias for index {0}")]
    MissingAlias(usize),
}

/// Moves query text to the upstream service and returns the raw body.
///
/// Implemented over HTTP by [`HttpTransport`]; tests substitute scripted
/// responses.
pub trait Transport: Send + Sync {
    fn post_query(&self, query: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

/// reqwest-backed transport with the fixed headers the endpoint expects.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers())
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn post_query(&self, query: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&QueryBody { query })
            .send()
            .await?;

        // Query errors arrive as 200 with an `errors` key; anything else
        // non-2xx has no usable envelope.
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// `Basic <base64(test:test)>`
pub fn authorization_value() -> String {
    format!("Basic {}", STANDARD.encode(CREDENTIALS))
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    // Base64 output is always a valid header value.
    if let Ok(auth) = HeaderValue::from_str(&authorization_value()) {
        headers.insert(AUTHORIZATION, auth);
    }
    headers
}

/// Unwrap the `{ "data": ..., "errors": ... }` envelope.
///
/// Any `errors` key wins over `data`, even when partial data is present.
pub fn parse_envelope(body: &[u8]) -> Result<Value, UpstreamError> {
    let envelope: Value =
        serde_json::from_slice(body).map_err(|e| UpstreamError::MalformedResponse(e.to_string()))?;

    let Value::Object(mut envelope) = envelope else {
        return Err(UpstreamError::MalformedResponse(
            "envelope is not an object".into(),
        ));
    };

    if let Some(errors) = envelope.get("errors") {
        return Err(UpstreamError::QueryError(errors.to_string()));
    }

    envelope
        .remove("data")
        .ok_or_else(|| UpstreamError::MalformedResponse("envelope has no data".into()))
}

/// Typed front of a [`Transport`]: one query in, one `data` payload out.
#[derive(Debug, Clone)]
pub struct UpstreamClient<T> {
    transport: T,
}

impl<T: Transport> UpstreamClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn execute(&self, query: &str) -> Result<Value, UpstreamError> {
        let body = self.transport.post_query(query).await?;
        parse_envelope(&body)
    }
}
