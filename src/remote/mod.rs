//! # Remote store client
//!
//! Thin HTTP layer over the remote store's endpoint scheme:
//!
//! ```text
//! {api_url}/{segment}/{operation}?field=value&field=value
//! ```
//!
//! `GET` requests carry their terms in the query string, `POST`/`PUT`
//! requests as an urlencoded form body. Responses are classified here so that
//! managers only ever see a value or a [`RemoteError`]:
//!
//! - `404` becomes [`RemoteError::NotFound`]
//! - any other non-2xx status becomes [`RemoteError::Status`]
//! - transport failures and timeouts become [`RemoteError::Network`]
//! - unparsable bodies become [`RemoteError::Decode`]
//!
//! Requests are never retried.

mod endpoint;

use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;

pub use endpoint::{Endpoint, Operation};

use crate::error::RemoteError;

#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    api_url: String,
}

impl RemoteClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn endpoint(&self, segment: &str, operation: Operation) -> Result<Endpoint, RemoteError> {
        Endpoint::new(&self.api_url, segment, operation)
    }

    /// Sends `endpoint` and returns the raw response body.
    pub async fn send(&self, endpoint: &Endpoint) -> Result<String, RemoteError> {
        let request = match endpoint.method() {
            Method::GET => self.http.get(endpoint.url()),
            method => self
                .http
                .request(method, endpoint.base_url().clone())
                .form(endpoint.terms()),
        };

        let response = request.send().await?;
        Self::body(response).await
    }

    /// Fetches a record list from an arbitrary read URL.
    ///
    /// A single object is accepted as a one-element list.
    pub async fn fetch_records(&self, url: Url) -> Result<Vec<Value>, RemoteError> {
        let response = self.http.get(url).send().await?;
        let body = Self::body(response).await?;

        match serde_json::from_str::<Value>(&body)? {
            Value::Array(records) => Ok(records),
            object @ Value::Object(_) => Ok(vec![object]),
            Value::Null => Ok(Vec::new()),
            other => Err(RemoteError::Decode(format!("expected records, got {other}"))),
        }
    }

    pub async fn fetch_count(&self, url: Url) -> Result<usize, RemoteError> {
        let response = self.http.get(url).send().await?;
        let body = Self::body(response).await?;
        body.trim()
            .parse()
            .map_err(|_| RemoteError::Decode(format!("expected a count, got {body:?}")))
    }

    /// Sends a create request and parses the identity assigned by the store.
    pub async fn create(&self, endpoint: &Endpoint) -> Result<i64, RemoteError> {
        let body = self.send(endpoint).await?;
        crate::utils::parse_id(&body)
            .ok_or_else(|| RemoteError::Decode(format!("expected an identity, got {body:?}")))
    }

    /// Sends a write request whose body carries nothing of interest.
    pub async fn execute(&self, endpoint: &Endpoint) -> Result<(), RemoteError> {
        self.send(endpoint).await.map(|_| ())
    }

    async fn body(response: reqwest::Response) -> Result<String, RemoteError> {
        match response.status() {
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound),
            status if !status.is_success() => Err(RemoteError::Status(status.as_u16())),
            _ => Ok(response.text().await?),
        }
    }
}
