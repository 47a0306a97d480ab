//! HTTP implementations of the discovery and connection-test collaborators.

use crate::error::ClientError;
use crate::http::send_error;
use async_trait::async_trait;
use dial_settings_integration::{
    ApiRequest, ApiResponse, CollaboratorError, ConnectionPayload, ConnectionSnapshot,
    ConnectionTest, Endpoints, IntegrationsApi, Method, ModelDiscovery,
};
use rootcause::prelude::Report;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Lists deployments of an Azure OpenAI compatible endpoint.
///
/// Calls `GET {api_base}/openai/models?api-version={v}` with the credential in
/// the `Api-Key` header.
#[derive(Debug, Clone)]
pub struct AzureModelDiscovery {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<Model>,
}

#[derive(Deserialize)]
struct Model {
    id: String,
}

impl AzureModelDiscovery {
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

#[async_trait]
impl ModelDiscovery for AzureModelDiscovery {
    #[instrument(skip(self, snapshot), fields(endpoint = %snapshot.params.base_url))]
    async fn discover(
        &self,
        snapshot: &ConnectionSnapshot,
    ) -> Result<Vec<String>, CollaboratorError> {
        let models_url = format!(
            "{}/openai/models",
            snapshot.params.base_url.trim_end_matches('/')
        );

        debug!(api_version = %snapshot.params.api_version, "discovering models");

        let response = self
            .client
            .get(&models_url)
            .query(&[("api-version", snapshot.params.api_version.as_str())])
            .header("Api-Key", snapshot.credential.expose())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to reach model discovery endpoint");
                CollaboratorError::from(send_error(&models_url, &e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(
                        status = %status,
                        error = %e,
                        "failed to read model discovery error body"
                    );
                    String::new()
                }
            };
            warn!(status = %status, "model discovery endpoint returned error");
            return Err(CollaboratorError::Rejected {
                response: ApiResponse::new(status.as_u16(), body),
            });
        }

        let models: ModelsResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "failed to parse models response");
            CollaboratorError::InvalidResponse {
                reason: e.to_string(),
            }
        })?;

        let names: Vec<String> = models.data.into_iter().map(|m| m.id).collect();
        info!(model_count = names.len(), "discovered models");
        Ok(names)
    }
}

/// Checks connection parameters through the integrations API's
/// `check_settings` endpoint.
#[derive(Clone)]
pub struct CheckSettingsTest {
    api: Arc<dyn IntegrationsApi>,
    endpoints: Endpoints,
    plugin_name: String,
}

impl CheckSettingsTest {
    #[must_use]
    pub fn new(
        api: Arc<dyn IntegrationsApi>,
        endpoints: Endpoints,
        plugin_name: impl Into<String>,
    ) -> Self {
        Self {
            api,
            endpoints,
            plugin_name: plugin_name.into(),
        }
    }
}

#[async_trait]
impl ConnectionTest for CheckSettingsTest {
    #[instrument(skip(self, snapshot), fields(plugin = %self.plugin_name))]
    async fn test(&self, snapshot: &ConnectionSnapshot) -> Result<(), CollaboratorError> {
        let body = serde_json::to_value(ConnectionPayload::new(snapshot)).map_err(|e| {
            CollaboratorError::InvalidRequest {
                reason: e.to_string(),
            }
        })?;
        let request = ApiRequest::new(
            Method::Post,
            self.endpoints.check_settings(&self.plugin_name),
            Some(body),
        );

        let response = self
            .api
            .send(&request)
            .await
            .map_err(|report| CollaboratorError::from(report.current_context().clone()))?;

        if response.is_success() {
            debug!("connection check passed");
            Ok(())
        } else {
            debug!(status = response.status, "connection check rejected");
            Err(CollaboratorError::Rejected { response })
        }
    }
}
