//! HTTP contract between the widget and the integrations backend.
//!
//! The widget only describes requests ([`ApiRequest`]) and interprets
//! responses ([`ApiResponse`]); sending them is the job of an
//! [`IntegrationsApi`] implementation supplied by the host.

use crate::collaborator::ConnectionSnapshot;
use crate::error::TransportError;
use crate::record::{IntegrationRecord, IntegrationStatus, Mode, OpaqueConfig, Secret};
use async_trait::async_trait;
use dial_settings_core::{IntegrationId, ProjectId};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to the integrations backend.
///
/// Bodies carry the API token, so `Debug` prints only the method and URL.
#[derive(Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<JsonValue>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>, body: Option<JsonValue>) -> Self {
        Self {
            method,
            url: url.into(),
            body,
        }
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// A response from the integrations backend, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Extracts the `id` of a newly created integration from the body.
    #[must_use]
    pub fn created_id(&self) -> Option<IntegrationId> {
        #[derive(Deserialize)]
        struct Created {
            id: Option<IntegrationId>,
        }

        serde_json::from_str::<Created>(&self.body)
            .ok()
            .and_then(|created| created.id)
    }
}

/// Sends requests to the integrations backend.
///
/// Non-success HTTP statuses are returned as `Ok` responses; `Err` means no
/// response was received at all.
#[async_trait]
pub trait IntegrationsApi: Send + Sync {
    /// Sends a request and returns the backend's response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be sent or the response
    /// could not be read.
    async fn send(
        &self,
        request: &ApiRequest,
    ) -> dial_settings_core::Result<ApiResponse, TransportError>;
}

/// URL layout of the integrations API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    /// Creates endpoints below `base`, e.g.
    /// `https://host/api/v1/integrations`.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// `POST {base}/integration/{plugin}`
    #[must_use]
    pub fn create(&self, plugin_name: &str) -> String {
        format!("{}/integration/{plugin_name}", self.base)
    }

    /// `PUT {base}/integration/{id}`
    #[must_use]
    pub fn update(&self, id: &IntegrationId) -> String {
        format!("{}/integration/{id}", self.base)
    }

    /// `DELETE {base}/integration/{project}/{id}`
    #[must_use]
    pub fn delete(&self, project_id: ProjectId, id: &IntegrationId) -> String {
        format!("{}/integration/{project_id}/{id}", self.base)
    }

    /// `POST {base}/check_settings/{plugin}`
    #[must_use]
    pub fn check_settings(&self, plugin_name: &str) -> String {
        format!("{}/check_settings/{plugin_name}", self.base)
    }
}

/// The API token in the shape the backend stored it.
#[derive(Debug)]
struct TokenPayload<'a>(&'a Secret);

impl Serialize for TokenPayload<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0.stored_field() {
            Some(field) => field.serialize(serializer),
            None => serializer.serialize_str(self.0.expose()),
        }
    }
}

/// Body of create and update requests.
#[derive(Debug, Serialize)]
pub struct SnapshotPayload<'a> {
    api_token: TokenPayload<'a>,
    api_base: &'a str,
    api_version: &'a str,
    models: &'a [String],
    project_id: ProjectId,
    config: &'a OpaqueConfig,
    is_default: bool,
    status: IntegrationStatus,
    mode: &'a Mode,
}

impl<'a> SnapshotPayload<'a> {
    #[must_use]
    pub fn new(record: &'a IntegrationRecord, project_id: ProjectId) -> Self {
        let params = record.connection_params();
        Self {
            api_token: TokenPayload(record.credential()),
            api_base: &params.base_url,
            api_version: &params.api_version,
            models: record.discovered_models(),
            project_id,
            config: record.opaque_config(),
            is_default: record.is_default(),
            status: record.status(),
            mode: record.mode(),
        }
    }
}

/// Body of connection checks.
#[derive(Debug, Serialize)]
pub struct ConnectionPayload<'a> {
    api_token: TokenPayload<'a>,
    api_base: &'a str,
    api_version: &'a str,
    project_id: ProjectId,
}

impl<'a> ConnectionPayload<'a> {
    #[must_use]
    pub fn new(snapshot: &'a ConnectionSnapshot) -> Self {
        Self {
            api_token: TokenPayload(&snapshot.credential),
            api_base: &snapshot.params.base_url,
            api_version: &snapshot.params.api_version,
            project_id: snapshot.project_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ConnectionParams;

    #[test]
    fn endpoint_layout() {
        let endpoints = Endpoints::new("https://host/api/v1/integrations/");
        let id = IntegrationId::new("42");
        assert_eq!(
            endpoints.create("ai_dial"),
            "https://host/api/v1/integrations/integration/ai_dial"
        );
        assert_eq!(
            endpoints.update(&id),
            "https://host/api/v1/integrations/integration/42"
        );
        assert_eq!(
            endpoints.delete(ProjectId::new(3), &id),
            "https://host/api/v1/integrations/integration/3/42"
        );
        assert_eq!(
            endpoints.check_settings("ai_dial"),
            "https://host/api/v1/integrations/check_settings/ai_dial"
        );
    }

    #[test]
    fn snapshot_payload_enumerates_contract_fields() {
        let record = IntegrationRecord::fresh(Mode::default())
            .with_credential(Secret::new("tok"))
            .with_models(vec!["gpt-4".to_string()])
            .with_default(true);
        let body = serde_json::to_value(SnapshotPayload::new(&record, ProjectId::new(1)))
            .expect("serialize");

        assert_eq!(
            body,
            serde_json::json!({
                "api_token": "tok",
                "api_base": "https://ai-proxy.lab.epam.com",
                "api_version": "2023-03-15-preview",
                "models": ["gpt-4"],
                "project_id": 1,
                "config": {},
                "is_default": true,
                "status": "success",
                "mode": "default"
            })
        );
    }

    #[test]
    fn connection_payload_is_a_subset() {
        let snapshot = ConnectionSnapshot {
            params: ConnectionParams::new("https://x", "v1"),
            credential: Secret::new("tok"),
            project_id: ProjectId::new(9),
        };
        let body = serde_json::to_value(ConnectionPayload::new(&snapshot)).expect("serialize");
        assert_eq!(
            body,
            serde_json::json!({
                "api_token": "tok",
                "api_base": "https://x",
                "api_version": "v1",
                "project_id": 9
            })
        );
    }

    #[test]
    fn stored_secret_field_is_sent_back_unchanged() {
        let credential: Secret = serde_json::from_value(serde_json::json!({
            "from_secrets": false,
            "value": "tok"
        }))
        .expect("deserialize");
        let record = IntegrationRecord::fresh(Mode::default()).with_credential(credential);

        let payload = SnapshotPayload::new(&record, ProjectId::new(1));
        assert!(!format!("{payload:?}").contains("tok"));

        let body = serde_json::to_value(payload).expect("serialize");
        assert_eq!(
            body["api_token"],
            serde_json::json!({"from_secrets": false, "value": "tok"})
        );
    }

    #[test]
    fn request_debug_hides_body() {
        let request = ApiRequest::new(
            Method::Post,
            "https://host/x",
            Some(serde_json::json!({"api_token": "sk-secret"})),
        );
        let debug = format!("{request:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("https://host/x"));
    }

    #[test]
    fn created_id_from_body() {
        assert_eq!(
            ApiResponse::new(201, r#"{"id": 42, "name": "ai_dial"}"#).created_id(),
            Some(IntegrationId::new("42"))
        );
        assert_eq!(ApiResponse::new(200, "").created_id(), None);
        assert_eq!(ApiResponse::new(200, "{}").created_id(), None);
    }

    #[test]
    fn success_range() {
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(422, "[]").is_success());
        assert!(!ApiResponse::new(302, "").is_success());
    }
}
