//! Desktop startup with in-memory collaborators.
//!
//! The remote provider catalog is offline, so startup falls back to the
//! cached catalog and comes up degraded.
//!
//! ```sh
//! RUST_LOG=debug IGNITE_STEP_TIMEOUT_MS=2000 cargo run -p ignite-app --example desktop_boot
//! ```

use async_trait::async_trait;
use ignite::BoxError;
use ignite_app::{
    bootstrap, AppServices, AppStartup, AppStore, BootConfig, Chat, ChatRepository, KeyVault,
    LocaleLoader, MasterKey, Model, ModelProvider, ModelRepository, PreferenceStore,
    ProviderCatalog,
};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Desktop {
    key: Mutex<Option<MasterKey>>,
}

#[async_trait]
impl LocaleLoader for Desktop {
    async fn init(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

#[async_trait]
impl KeyVault for Desktop {
    async fn load(&self) -> Result<Option<MasterKey>, BoxError> {
        Ok(self.key.lock().map_err(|e| e.to_string())?.clone())
    }

    async fn store(&self, key: &MasterKey) -> Result<(), BoxError> {
        *self.key.lock().map_err(|e| e.to_string())? = Some(key.clone());
        Ok(())
    }
}

#[async_trait]
impl ModelRepository for Desktop {
    async fn load_models(&self, _key: &MasterKey) -> Result<Vec<Model>, BoxError> {
        Ok(vec![Model {
            id: "m1".to_string(),
            nickname: "daily".to_string(),
            provider: "deepseek".to_string(),
            model_name: "deepseek-chat".to_string(),
            created_at: "2025-01-01 10:00:00".to_string(),
            remark: None,
        }])
    }
}

#[async_trait]
impl ChatRepository for Desktop {
    async fn load_chats(&self) -> Result<Vec<Chat>, BoxError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl PreferenceStore for Desktop {
    async fn app_language(&self) -> Result<String, BoxError> {
        Ok("en".to_string())
    }

    async fn include_reasoning_content(&self) -> Result<bool, BoxError> {
        Ok(false)
    }
}

#[async_trait]
impl ProviderCatalog for Desktop {
    async fn fetch_remote(&self) -> Result<Vec<ModelProvider>, BoxError> {
        Err("network unreachable".into())
    }

    async fn load_cached(&self) -> Result<Vec<ModelProvider>, BoxError> {
        Ok(vec![ModelProvider {
            key: "deepseek".to_string(),
            name: "DeepSeek".to_string(),
            logo_url: None,
            official_site: Some("https://www.deepseek.com".to_string()),
            default_api_address: "https://api.deepseek.com".to_string(),
        }])
    }

    async fn save_cache(&self, _providers: &[ModelProvider]) -> Result<(), BoxError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = BootConfig::from_env()?;
    let desktop = Arc::new(Desktop::default());
    let services = AppServices {
        locale: desktop.clone(),
        keys: desktop.clone(),
        models: desktop.clone(),
        chats: desktop.clone(),
        preferences: desktop.clone(),
        providers: desktop,
        store: Arc::new(AppStore::new()),
    };

    let result = bootstrap(&services, &config).await;

    match AppStartup::from_result(&result) {
        AppStartup::Ready => println!("Ready"),
        AppStartup::Degraded { warnings } => {
            println!("Ready with {} warning(s):", warnings.len());
            for warning in warnings {
                println!("  {warning}");
            }
        }
        AppStartup::Fatal { errors } => {
            println!("Startup failed:");
            for error in errors {
                println!("  {error}");
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    println!("{}", serde_json::to_string_pretty(&services.store.snapshot().await)?);
    Ok(())
}
