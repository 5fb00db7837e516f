//! # Sentry Container
//!
//! Wires configuration, sandbox backends, the rotation engine and the
//! notifier into a ready `FindingHandler`.

pub mod config;

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use ns_01_blocklist_rotation::{BlocklistTarget, RotationError, RotationService, SystemClock};

pub use config::{ConfigError, SentryConfig, DEFAULT_REGION};

use crate::adapters::{LogNotifier, Notifier, NotifyError, Sandbox, SandboxError, WebhookNotifier};
use crate::handlers::FindingHandler;

/// Wiring errors.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Sandbox file unusable.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    /// Engine rejected its settings.
    #[error(transparent)]
    Rotation(#[from] RotationError),
    /// Notifier could not be built.
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Everything one invocation needs.
pub struct SentryContainer {
    /// Active configuration.
    pub config: SentryConfig,
    /// Backends.
    pub sandbox: Sandbox,
    /// Rotation engine.
    pub service: Arc<RotationService>,
    /// Inbound entry point.
    pub handler: FindingHandler,
}

impl SentryContainer {
    /// Wire a container over an already loaded sandbox.
    pub fn new(config: SentryConfig, sandbox: Sandbox) -> Result<Self, ContainerError> {
        let notifier: Arc<dyn Notifier> = if config.notify_via_webhook() {
            Arc::new(WebhookNotifier::new(&config.notify_topic, config.retry.clone())?)
        } else {
            Arc::new(LogNotifier::new(&config.notify_topic))
        };
        Self::with_notifier(config, sandbox, notifier)
    }

    /// Wire a container with an explicit notifier.
    pub fn with_notifier(
        config: SentryConfig,
        sandbox: Sandbox,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ContainerError> {
        config.validate()?;

        let service = Arc::new(RotationService::new(
            sandbox.rules.clone(),
            sandbox.store.clone(),
            vec![
                BlocklistTarget::new(&config.edge_ip_set_id, sandbox.edge.clone()),
                BlocklistTarget::new(&config.regional_ip_set_id, sandbox.regional.clone()),
            ],
            Arc::new(SystemClock),
            config.rotation_config()?,
        )?);

        let handler = FindingHandler::new(
            service.clone(),
            notifier,
            &config.edge_ip_set_id,
            &config.regional_ip_set_id,
        );

        info!(
            state_table = %config.state_table,
            reserved_range = %config.reserved_range,
            edge_ip_set_id = %config.edge_ip_set_id,
            regional_ip_set_id = %config.regional_ip_set_id,
            region = %config.region,
            sandbox = ?sandbox.path(),
            "Sentry container ready"
        );

        Ok(Self {
            config,
            sandbox,
            service,
            handler,
        })
    }

    /// Load the sandbox at `path` and wire a container.
    pub fn open(config: SentryConfig, path: impl AsRef<Path>) -> Result<Self, ContainerError> {
        let sandbox = Sandbox::load(path, &config.state_table)?;
        Self::new(config, sandbox)
    }

    /// Persist backend state.
    pub fn persist(&self) -> Result<(), ContainerError> {
        Ok(self.sandbox.save()?)
    }
}
