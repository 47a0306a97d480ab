//! Host wiring: a controller connected to its transport and collaborators.

use crate::collaborators::{AzureModelDiscovery, CheckSettingsTest};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::HttpIntegrationsApi;
use dial_settings_integration::{
    CollaboratorUpdate, ConnectionTest, ConnectionTestAction, DiscoveryAction, Endpoints,
    IntegrationLifecycleController, IntegrationsApi, ModelDiscovery, WidgetConfig, WidgetEvents,
};
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::debug;

/// A settings widget as a host page would hold it.
pub struct SettingsWidget {
    controller: IntegrationLifecycleController,
    events: WidgetEvents,
    discovery: DiscoveryAction,
    connection_test: ConnectionTestAction,
}

impl SettingsWidget {
    /// Builds a widget talking HTTP to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn connect(config: &ClientConfig) -> Result<Self, Report<ClientError>> {
        let api: Arc<dyn IntegrationsApi> =
            Arc::new(HttpIntegrationsApi::new(config.request_timeout())?);
        let discovery = Arc::new(AzureModelDiscovery::new(config.discovery_timeout())?);
        let connection_test = Arc::new(CheckSettingsTest::new(
            Arc::clone(&api),
            Endpoints::new(config.widget.integrations_url.clone()),
            config.widget.plugin_name.clone(),
        ));
        Ok(Self::with_parts(
            config.widget.clone(),
            api,
            discovery,
            connection_test,
        ))
    }

    /// Builds a widget from explicit parts.
    #[must_use]
    pub fn with_parts(
        config: WidgetConfig,
        api: Arc<dyn IntegrationsApi>,
        discovery: Arc<dyn ModelDiscovery>,
        connection_test: Arc<dyn ConnectionTest>,
    ) -> Self {
        let discovery = DiscoveryAction::new(discovery);
        let (controller, events) = IntegrationLifecycleController::new(config, api);
        Self {
            controller: controller.with_discovery(discovery.clone()),
            events,
            discovery,
            connection_test: ConnectionTestAction::new(connection_test),
        }
    }

    pub fn controller(&self) -> &IntegrationLifecycleController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut IntegrationLifecycleController {
        &mut self.controller
    }

    pub fn events_mut(&mut self) -> &mut WidgetEvents {
        &mut self.events
    }

    pub fn discovery(&self) -> &DiscoveryAction {
        &self.discovery
    }

    /// Runs model discovery for the current connection parameters and hands
    /// the result to the controller.
    ///
    /// Returns `None` if discovery was already running.
    pub async fn discover_models(&mut self) -> Option<CollaboratorUpdate> {
        let snapshot = self.controller.connection_snapshot();
        let result = self.discovery.run(&snapshot).await?;
        let update = self.controller.on_models_discovered(&snapshot, result);
        debug!(?update, "model discovery finished");
        Some(update)
    }

    /// Runs the connection test for the current connection parameters.
    ///
    /// Returns `None` if a test was already running.
    pub async fn test_connection(&mut self) -> Option<CollaboratorUpdate> {
        let snapshot = self.controller.connection_snapshot();
        let result = self.connection_test.run(&snapshot).await?;
        let update = self.controller.on_connection_tested(&snapshot, result);
        debug!(?update, "connection test finished");
        Some(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::{Json, Path};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use dial_settings_core::{IntegrationId, ProjectId};
    use dial_settings_integration::{
        CHECK_CONNECTION_FIELD, FieldErrorMap, Secret, SubmitOutcome, WidgetEvent,
    };
    use serde_json::{Value as JsonValue, json};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        format!("http://{addr}")
    }

    async fn create(
        Path(_plugin): Path<String>,
        Json(body): Json<JsonValue>,
    ) -> (StatusCode, Json<JsonValue>) {
        if body["api_token"] == "" {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!([{"loc": ["api_token"], "msg": "field required"}])),
            );
        }
        (StatusCode::OK, Json(json!({"id": 55})))
    }

    async fn update(Path(id): Path<String>) -> (StatusCode, String) {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("boom {id}"))
    }

    async fn models() -> Json<JsonValue> {
        Json(json!({"data": [{"id": "gpt-4"}]}))
    }

    async fn check(Json(_body): Json<JsonValue>) -> StatusCode {
        StatusCode::OK
    }

    async fn widget() -> SettingsWidget {
        let base = serve(
            Router::new()
                .route(
                    "/api/v1/integrations/integration/{key}",
                    post(create).put(update),
                )
                .route("/api/v1/integrations/check_settings/{plugin}", post(check))
                .route("/openai/models", get(models)),
        )
        .await;
        let mut config = ClientConfig::new(
            WidgetConfig::new(ProjectId::new(7))
                .with_integrations_url(format!("{base}/api/v1/integrations")),
        );
        config.request_timeout_secs = 5;
        let mut widget = SettingsWidget::connect(&config).expect("widget");
        widget.controller_mut().open_new();
        widget.controller_mut().set_base_url(base);
        widget
    }

    #[tokio::test]
    async fn create_round_trip_over_http() {
        let mut widget = widget().await;

        assert_eq!(widget.discover_models().await, Some(CollaboratorUpdate::Applied));
        assert_eq!(widget.controller().record().discovered_models(), ["gpt-4"]);

        let outcome = widget.controller_mut().create().await.expect("submitted");
        assert_eq!(
            outcome,
            SubmitOutcome::Invalid(FieldErrorMap::single("api_token", "field required"))
        );
        assert!(widget.controller().is_dialog_open());

        widget.controller_mut().set_credential(Secret::new("tok"));
        let outcome = widget.controller_mut().create().await.expect("submitted");
        let SubmitOutcome::Saved(saved) = outcome else {
            panic!("expected saved outcome, got {outcome:?}");
        };
        assert_eq!(saved.identity(), Some(&IntegrationId::new("55")));

        let events = widget.events_mut().drain();
        assert!(events.iter().any(|event| matches!(event, WidgetEvent::Changed(_))));
        assert!(!widget.controller().is_dialog_open());
    }

    #[tokio::test]
    async fn connection_test_clears_its_error() {
        let mut widget = widget().await;
        widget.controller_mut().handle_error(&dial_settings_integration::ApiResponse::new(
            400,
            r#"[{"loc": ["check_connection"], "msg": "unreachable"}]"#,
        ));
        assert!(widget.controller().field_errors().contains(CHECK_CONNECTION_FIELD));

        assert_eq!(widget.test_connection().await, Some(CollaboratorUpdate::Applied));
        assert!(widget.controller().field_errors().is_empty());
    }

    #[tokio::test]
    async fn server_error_on_update_raises_notification() {
        let mut widget = widget().await;
        let record = widget
            .controller()
            .record()
            .clone()
            .with_identity(IntegrationId::new("9"));
        widget.controller_mut().hydrate(record);
        widget.events_mut().drain();

        let outcome = widget.controller_mut().update().await.expect("submitted");

        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        let events = widget.events_mut().drain();
        assert!(
            events
                .iter()
                .any(|event| matches!(event, WidgetEvent::Notify(n) if n.message.contains("HTTP 500")))
        );
    }
}
