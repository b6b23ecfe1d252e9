//! Shared application state filled in by the startup steps.

use crate::services::{Chat, Model, ModelProvider};
use serde::Serialize;
use std::time::SystemTime;
use tokio::sync::RwLock;

/// Provider catalog as known to the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderState {
    pub providers: Vec<ModelProvider>,
    /// `true` when the remote catalog was unreachable and the cache was used.
    pub from_cache: bool,
    /// Why the catalog is stale or empty, shown to the user.
    pub error: Option<String>,
    /// When the catalog was last fetched from the remote source.
    pub last_update: Option<SystemTime>,
}

/// Application state visible to the frontend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub models: Vec<Model>,
    pub chats: Vec<Chat>,
    /// `None` until a language preference was loaded.
    pub language: Option<String>,
    pub include_reasoning_content: bool,
    pub provider: ProviderState,
}

/// Store shared between the steps and the host.
#[derive(Debug, Default)]
pub struct AppStore {
    state: RwLock<AppState>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a change to the state.
    pub async fn update<F>(&self, change: F)
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().await;
        change(&mut state);
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }
}
