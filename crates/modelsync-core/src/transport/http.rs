//! HTTP transport
//!
//! Maps reads to GET and writes to POST (create) or PUT (update) against a
//! base URL, with JSON bodies.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{Transport, WriteMethod};
use crate::error::TransportError;

const USER_AGENT: &str = concat!("modelsync/", env!("CARGO_PKG_VERSION"));

/// Transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| TransportError::Http {
                location: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL for a location
    pub fn url_for(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            return location.to_string();
        }
        format!("{}/{}", self.base_url, location.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: Method,
        location: &str,
        body: Option<&Value>,
    ) -> Result<String, TransportError> {
        let url = self.url_for(location);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| TransportError::Http {
            location: location.to_string(),
            source,
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound {
                location: location.to_string(),
            });
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| TransportError::Http {
            location: location.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn read(&self, location: &str) -> Result<Value, TransportError> {
        let body = self.send(Method::GET, location, None).await?;
        decode(location, &body)
    }

    async fn write(
        &self,
        location: &str,
        method: WriteMethod,
        payload: &Value,
    ) -> Result<Value, TransportError> {
        let http_method = match method {
            WriteMethod::Create => Method::POST,
            WriteMethod::Update => Method::PUT,
        };
        let body = self.send(http_method, location, Some(payload)).await?;

        // Servers that answer 204 or an empty 200 accepted the payload as sent
        if body.trim().is_empty() {
            return Ok(payload.clone());
        }
        decode(location, &body)
    }

    fn describe(&self) -> String {
        format!("http ({})", self.base_url)
    }
}

fn decode(location: &str, body: &str) -> Result<Value, TransportError> {
    serde_json::from_str(body).map_err(|e| TransportError::Malformed {
        location: location.to_string(),
        details: e.to_string(),
    })
}
