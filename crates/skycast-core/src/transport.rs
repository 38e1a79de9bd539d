//! HTTP GET seam shared by the lookup clients and the offline worker.
//!
//! Clients talk to a [`Transport`] rather than to `reqwest` directly so an
//! interceptor (the offline snapshot cache) can be slotted in front of the
//! network without either side knowing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{NetworkError, ReqwestErrorExt};

const USER_AGENT: &str = concat!("Skycast/", env!("CARGO_PKG_VERSION"));

/// A fully buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8, lossily
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NetworkError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| NetworkError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    /// Fail with `ServerError` unless the status is 2xx.
    pub fn error_for_status(self) -> Result<Self, NetworkError> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self.text().chars().take(200).collect();
        Err(NetworkError::ServerError {
            status: self.status,
            message,
        })
    }
}

/// Issues GET requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, NetworkError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(&self, url: &str) -> Result<HttpResponse, NetworkError> {
        (**self).get(url).await
    }
}

/// Network transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ReqwestErrorExt::into_network_error)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, NetworkError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
