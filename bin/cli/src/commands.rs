//! Subcommand handlers.

use crate::cli::{Cli, Command, ConnectionArgs};
use crate::error::CliError;
use dial_settings_client::{ClientConfig, SettingsWidget};
use dial_settings_core::IntegrationId;
use dial_settings_integration::{
    CollaboratorUpdate, IntegrationLifecycleController, LifecycleError, PredictionSettings,
    SavedIntegration, Secret, SubmitOutcome, TokenLimits, WidgetEvent,
};
use rootcause::prelude::Report;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub async fn run(cli: Cli) -> Result<(), Report<CliError>> {
    match cli.command {
        Command::Create {
            connection,
            discover,
            default,
        } => {
            let (mut widget, _) = connect(cli.config.as_deref())?;
            widget.controller_mut().open_new();
            apply_connection(widget.controller_mut(), connection);
            widget.controller_mut().set_default(default);
            if discover {
                discover_models(&mut widget).await?;
            }
            let outcome = widget.controller_mut().create().await.map_err(rejected)?;
            print_events(&mut widget);
            finish(outcome)
        }
        Command::Update {
            saved,
            connection,
            discover,
        } => {
            let (mut widget, _) = connect(cli.config.as_deref())?;
            let saved: SavedIntegration = read_json(&saved)?;
            widget.controller_mut().hydrate_saved(saved);
            apply_connection(widget.controller_mut(), connection);
            if discover {
                discover_models(&mut widget).await?;
            }
            let outcome = widget.controller_mut().update().await.map_err(rejected)?;
            print_events(&mut widget);
            finish(outcome)
        }
        Command::Delete { id } => delete(cli.config.as_deref(), id).await,
        Command::Discover { connection } => {
            let (mut widget, config) = connect(cli.config.as_deref())?;
            widget.controller_mut().open_new();
            apply_connection(widget.controller_mut(), connection);
            discover_models(&mut widget).await?;

            let limits = token_limits(&config)?;
            for model in widget.controller().record().describe_models(&limits) {
                println!(
                    "{}\t{} tokens",
                    model.display_name(),
                    model.resolved_token_limit(&limits)
                );
            }
            Ok(())
        }
        Command::Test { connection } => {
            let (mut widget, _) = connect(cli.config.as_deref())?;
            widget.controller_mut().open_new();
            apply_connection(widget.controller_mut(), connection);
            match widget.test_connection().await {
                Some(CollaboratorUpdate::Applied) => {
                    println!("Connection OK");
                    Ok(())
                }
                _ => {
                    print_events(&mut widget);
                    Err(failed_with_field_errors(widget.controller()).into())
                }
            }
        }
        Command::ValidateSettings { file } => validate_settings(&file),
    }
}

fn connect(config_file: Option<&Path>) -> Result<(SettingsWidget, ClientConfig), Report<CliError>> {
    let config = ClientConfig::load(config_file).map_err(|e| CliError::Config {
        reason: e.to_string(),
    })?;
    debug!(
        integrations_url = %config.widget.integrations_url,
        project_id = %config.widget.project_id,
        "configuration loaded"
    );
    let widget = SettingsWidget::connect(&config).map_err(|e| CliError::Config {
        reason: e.to_string(),
    })?;
    Ok((widget, config))
}

fn apply_connection(controller: &mut IntegrationLifecycleController, connection: ConnectionArgs) {
    if let Some(api_base) = connection.api_base {
        controller.set_base_url(api_base);
    }
    if let Some(api_version) = connection.api_version {
        controller.set_api_version(api_version);
    }
    if let Some(api_token) = connection.api_token {
        controller.set_credential(Secret::new(api_token));
    }
}

#[instrument(skip(widget))]
async fn discover_models(widget: &mut SettingsWidget) -> Result<(), Report<CliError>> {
    match widget.discover_models().await {
        Some(CollaboratorUpdate::Applied) => {
            info!(
                model_count = widget.controller().record().discovered_models().len(),
                "models discovered"
            );
            Ok(())
        }
        _ => {
            print_events(widget);
            Err(failed_with_field_errors(widget.controller()).into())
        }
    }
}

#[instrument(skip(config_file))]
async fn delete(config_file: Option<&Path>, id: IntegrationId) -> Result<(), Report<CliError>> {
    let (mut widget, _) = connect(config_file)?;
    let outcome = widget
        .controller_mut()
        .delete_by_identity(id)
        .await
        .map_err(rejected)?;
    print_events(&mut widget);
    finish(outcome)
}

fn rejected(err: LifecycleError) -> CliError {
    CliError::Rejected {
        reason: err.to_string(),
    }
}

fn failed_with_field_errors(controller: &IntegrationLifecycleController) -> CliError {
    let reason = controller
        .field_errors()
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ");
    CliError::Failed {
        reason: if reason.is_empty() {
            "see notifications above".to_string()
        } else {
            reason
        },
    }
}

fn finish(outcome: SubmitOutcome) -> Result<(), Report<CliError>> {
    match outcome {
        SubmitOutcome::Saved(record) => {
            match record.identity() {
                Some(id) => println!("Integration {id} saved"),
                None => println!("Integration saved"),
            }
            Ok(())
        }
        SubmitOutcome::Deleted(_) => {
            println!("Integration deleted");
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => {
            for (field, message) in errors.iter() {
                println!("{field}: {message}");
            }
            Err(CliError::Failed {
                reason: format!("{} field(s) rejected", errors.len()),
            }
            .into())
        }
        SubmitOutcome::Failed { message } => Err(CliError::Failed { reason: message }.into()),
    }
}

fn print_events(widget: &mut SettingsWidget) {
    for event in widget.events_mut().drain() {
        match event {
            WidgetEvent::Notify(notification) => {
                println!("[{}] {}", notification.level, notification.message);
                if notification.reopen.is_some() {
                    println!("  rerun `update` with the saved integration to review it");
                }
            }
            WidgetEvent::Changed(changed) => {
                debug!(
                    section = %changed.section,
                    integration_id = ?changed.snapshot.identity(),
                    "integration changed"
                );
            }
            WidgetEvent::DialogShown | WidgetEvent::DialogHidden => {}
        }
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::Input {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = read_file(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Input {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn token_limits(config: &ClientConfig) -> Result<TokenLimits, CliError> {
    let Some(file) = &config.token_limits_file else {
        return Ok(TokenLimits::default());
    };
    let path = PathBuf::from(file);
    let overrides = TokenLimits::from_json(&read_file(&path)?).map_err(|e| CliError::Input {
        path: file.clone(),
        reason: e.to_string(),
    })?;
    Ok(TokenLimits::default().merged_with(overrides))
}

fn validate_settings(file: &Path) -> Result<(), Report<CliError>> {
    let value: JsonValue = read_json(file)?;
    match PredictionSettings::parse(value) {
        Ok(settings) => {
            println!(
                "Settings OK: model {} (max_tokens {}, temperature {}, top_p {})",
                settings.model_name, settings.max_tokens, settings.temperature, settings.top_p
            );
            Ok(())
        }
        Err(errors) => {
            for (field, message) in errors.iter() {
                println!("{field}: {message}");
            }
            Err(CliError::Failed {
                reason: format!("{} invalid setting(s)", errors.len()),
            }
            .into())
        }
    }
}
