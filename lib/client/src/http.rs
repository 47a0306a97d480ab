//! reqwest-backed transport for the integrations API.

use crate::error::ClientError;
use async_trait::async_trait;
use dial_settings_integration::{ApiRequest, ApiResponse, IntegrationsApi, Method, TransportError};
use rootcause::prelude::Report;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Sends integrations API requests over HTTP.
#[derive(Debug, Clone)]
pub struct HttpIntegrationsApi {
    client: reqwest::Client,
}

impl HttpIntegrationsApi {
    /// Creates a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, Report<ClientError>> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::ClientBuild {
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Classifies a reqwest failure that produced no response.
pub(crate) fn send_error(endpoint: &str, err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else if err.is_builder() {
        TransportError::InvalidRequest {
            reason: err.to_string(),
        }
    } else {
        TransportError::ConnectionFailed {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl IntegrationsApi for HttpIntegrationsApi {
    #[instrument(skip(self, request), fields(method = %request.method, endpoint = %request.url))]
    async fn send(
        &self,
        request: &ApiRequest,
    ) -> dial_settings_core::Result<ApiResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest(request.method), &request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "integrations API request failed");
            send_error(&request.url, &e)
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::BodyUnreadable {
                endpoint: request.url.clone(),
                reason: e.to_string(),
            })?;

        debug!(status, "integrations API responded");
        Ok(ApiResponse::new(status, body))
    }
}
