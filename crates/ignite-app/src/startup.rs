//! Runs the startup steps and decides what the frontend should show.

use crate::config::BootConfig;
use crate::services::AppServices;
use crate::steps::init_steps;
use ignite::{InitError, InitResult, InitializationManager, InitializationManagerBuilder};
use serde::Serialize;
use tracing::info;

/// What the frontend renders once startup is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AppStartup {
    /// Everything loaded.
    Ready,
    /// The app is usable; show a non-blocking banner for each warning.
    Degraded { warnings: Vec<InitError> },
    /// The app cannot be used; show the fatal error screen.
    Fatal { errors: Vec<InitError> },
}

impl AppStartup {
    /// Decides the startup screen from a run result.
    pub fn from_result(result: &InitResult) -> Self {
        if !result.success {
            AppStartup::Fatal {
                errors: result.fatal_errors.clone(),
            }
        } else if !result.warnings.is_empty() {
            AppStartup::Degraded {
                warnings: result.warnings.clone(),
            }
        } else {
            AppStartup::Ready
        }
    }

    /// Returns a short lowercase name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            AppStartup::Ready => "ready",
            AppStartup::Degraded { .. } => "degraded",
            AppStartup::Fatal { .. } => "fatal",
        }
    }

    /// Returns `true` if the main application can be rendered.
    pub fn is_usable(&self) -> bool {
        !matches!(self, AppStartup::Fatal { .. })
    }
}

impl From<&InitResult> for AppStartup {
    fn from(result: &InitResult) -> Self {
        Self::from_result(result)
    }
}

/// Returns a manager builder loaded with the application's steps.
///
/// Callers can attach a progress callback before building.
pub fn manager_builder(services: &AppServices, config: &BootConfig) -> InitializationManagerBuilder {
    let builder = InitializationManager::builder().add_steps(init_steps(services));
    match config.step_timeout {
        Some(timeout) => builder.default_timeout(timeout),
        None => builder,
    }
}

/// Runs the application's startup steps.
pub async fn bootstrap(services: &AppServices, config: &BootConfig) -> InitResult {
    let result = manager_builder(services, config)
        .build()
        .run_initialization()
        .await;
    info!(
        "Startup finished as {} in {:?}",
        AppStartup::from_result(&result).label(),
        result.elapsed
    );
    result
}
