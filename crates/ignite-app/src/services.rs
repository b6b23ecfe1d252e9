//! Collaborators the startup steps call into, and the data they load.

use async_trait::async_trait;
use ignite::BoxError;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::store::AppStore;

/// Length of a generated master key, in bytes.
pub const MASTER_KEY_LEN: usize = 32;

/// Key protecting the model secrets at rest.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey(Vec<u8>);

impl MasterKey {
    /// Wraps existing key material.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Generates a fresh random key from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; MASTER_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Returns the key material.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the key holds no material.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKey(<{} bytes>)", self.0.len())
    }
}

/// A model configured by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub nickname: String,
    pub provider: String,
    pub model_name: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// A persisted chat, without its message history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
}

/// An LLM provider the user can configure models for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProvider {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub official_site: Option<String>,
    pub default_api_address: String,
}

/// Loads localisation resources.
#[async_trait]
pub trait LocaleLoader: Send + Sync {
    async fn init(&self) -> Result<(), BoxError>;
}

/// Secure storage for the master key.
#[async_trait]
pub trait KeyVault: Send + Sync {
    /// Returns the stored key, or `None` if none was stored yet.
    async fn load(&self) -> Result<Option<MasterKey>, BoxError>;

    /// Stores a key, replacing any previous one.
    async fn store(&self, key: &MasterKey) -> Result<(), BoxError>;
}

/// Persisted model configurations. Secrets are decrypted with the master key.
#[async_trait]
pub trait ModelRepository: Send + Sync {
    async fn load_models(&self, key: &MasterKey) -> Result<Vec<Model>, BoxError>;
}

/// Persisted chat list.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn load_chats(&self) -> Result<Vec<Chat>, BoxError>;
}

/// User preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn app_language(&self) -> Result<String, BoxError>;

    async fn include_reasoning_content(&self) -> Result<bool, BoxError>;
}

/// Provider catalog, fetched remotely with a local cache as fallback.
#[async_trait]
pub trait ProviderCatalog: Send + Sync {
    async fn fetch_remote(&self) -> Result<Vec<ModelProvider>, BoxError>;

    async fn load_cached(&self) -> Result<Vec<ModelProvider>, BoxError>;

    async fn save_cache(&self, providers: &[ModelProvider]) -> Result<(), BoxError>;
}

/// Everything the startup steps need, injected by the host.
#[derive(Clone)]
pub struct AppServices {
    pub locale: Arc<dyn LocaleLoader>,
    pub keys: Arc<dyn KeyVault>,
    pub models: Arc<dyn ModelRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub providers: Arc<dyn ProviderCatalog>,
    pub store: Arc<AppStore>,
}

impl fmt::Debug for AppServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppServices").finish_non_exhaustive()
    }
}
