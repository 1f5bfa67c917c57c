//! HTTP transport seam. `ReqwestTransport` talks to the real backend; tests
//! substitute a scripted transport.

use super::types::{ApiError, HttpMethod, OutboundRequest, TransportResponse};
use crate::config::Timeouts;

/// Executes one resolved request. Implementations classify nothing: any
/// status comes back as `Ok`, only transport failures are `Err`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] when no HTTP response was received.
    async fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse, ApiError>;
}

pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport. Unset timeouts keep reqwest's defaults.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot initialize.
    pub fn new(timeouts: Timeouts) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeouts.request {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = timeouts.connect {
            builder = builder.connect_timeout(timeout);
        }
        Ok(Self { http: builder.build()? })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse, ApiError> {
        let mut builder = self.http.request(reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}
