//! The application's startup steps.

use crate::services::{
    AppServices, ChatRepository, KeyVault, LocaleLoader, MasterKey, ModelRepository,
    PreferenceStore, ProviderCatalog,
};
use crate::store::{AppStore, ProviderState};
use async_trait::async_trait;
use ignite::{InitError, Step, StepContext, StepError, StepName};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info, warn};

pub const I18N: &str = "i18n";
pub const MASTER_KEY: &str = "masterKey";
pub const MODELS: &str = "models";
pub const CHAT_LIST: &str = "chatList";
pub const APP_LANGUAGE: &str = "appLanguage";
pub const INCLUDE_REASONING_CONTENT: &str = "includeReasoningContent";
pub const MODEL_PROVIDER: &str = "modelProvider";

/// Builds the startup steps, in the order they are registered.
pub fn init_steps(services: &AppServices) -> Vec<Box<dyn Step>> {
    vec![
        Box::new(I18nStep {
            locale: services.locale.clone(),
        }),
        Box::new(MasterKeyStep {
            keys: services.keys.clone(),
        }),
        Box::new(ModelsStep {
            models: services.models.clone(),
            store: services.store.clone(),
        }),
        Box::new(ChatListStep {
            chats: services.chats.clone(),
            store: services.store.clone(),
        }),
        Box::new(AppLanguageStep {
            preferences: services.preferences.clone(),
            store: services.store.clone(),
        }),
        Box::new(IncludeReasoningContentStep {
            preferences: services.preferences.clone(),
            store: services.store.clone(),
        }),
        Box::new(ModelProviderStep {
            catalog: services.providers.clone(),
            store: services.store.clone(),
        }),
    ]
}

pub struct I18nStep {
    locale: Arc<dyn LocaleLoader>,
}

impl std::fmt::Debug for I18nStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I18nStep").finish()
    }
}

#[async_trait]
impl Step for I18nStep {
    async fn execute(&self, _ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        self.locale
            .init()
            .await
            .map_err(|e| StepError::from_source(I18N, e))
    }

    fn name(&self) -> StepName {
        StepName::new(I18N)
    }

    fn is_critical(&self) -> bool {
        true
    }

    fn on_error(&self, _error: &StepError) -> InitError {
        InitError::fatal("Failed to initialise localisation")
    }
}

/// Reads the master key, generating and storing one on first start.
pub struct MasterKeyStep {
    keys: Arc<dyn KeyVault>,
}

impl std::fmt::Debug for MasterKeyStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKeyStep").finish()
    }
}

#[async_trait]
impl Step for MasterKeyStep {
    async fn execute(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        let stored = self
            .keys
            .load()
            .await
            .map_err(|e| StepError::from_source(MASTER_KEY, e))?;

        let key = match stored {
            Some(key) if !key.is_empty() => key,
            _ => {
                warn!("Master key does not exist, generating a new one; previously encrypted secrets cannot be decrypted");
                let key = MasterKey::generate();
                self.keys
                    .store(&key)
                    .await
                    .map_err(|e| StepError::from_source(MASTER_KEY, e))?;
                key
            }
        };

        ctx.set_result(MASTER_KEY, key);
        Ok(())
    }

    fn name(&self) -> StepName {
        StepName::new(MASTER_KEY)
    }

    fn is_critical(&self) -> bool {
        true
    }

    fn on_error(&self, _error: &StepError) -> InitError {
        InitError::fatal("Failed to initialise the master key")
    }
}

pub struct ModelsStep {
    models: Arc<dyn ModelRepository>,
    store: Arc<AppStore>,
}

impl std::fmt::Debug for ModelsStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelsStep").finish()
    }
}

#[async_trait]
impl Step for ModelsStep {
    async fn execute(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        let key = ctx.require_result::<MasterKey>(MASTER_KEY)?;
        let models = self
            .models
            .load_models(key)
            .await
            .map_err(|e| StepError::from_source(MODELS, e))?;

        info!("Loaded {} models", models.len());
        self.store
            .update(|state| state.models = models.clone())
            .await;
        ctx.set_result(MODELS, models);
        Ok(())
    }

    fn name(&self) -> StepName {
        StepName::new(MODELS)
    }

    fn dependencies(&self) -> Vec<StepName> {
        vec![StepName::new(MASTER_KEY)]
    }

    fn on_error(&self, _error: &StepError) -> InitError {
        InitError::warning("Failed to load models")
    }
}

pub struct ChatListStep {
    chats: Arc<dyn ChatRepository>,
    store: Arc<AppStore>,
}

impl std::fmt::Debug for ChatListStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatListStep").finish()
    }
}

#[async_trait]
impl Step for ChatListStep {
    async fn execute(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        let chats = self
            .chats
            .load_chats()
            .await
            .map_err(|e| StepError::from_source(CHAT_LIST, e))?;

        self.store
            .update(|state| state.chats = chats.clone())
            .await;
        ctx.set_result(CHAT_LIST, chats);
        Ok(())
    }

    fn name(&self) -> StepName {
        StepName::new(CHAT_LIST)
    }

    fn on_error(&self, _error: &StepError) -> InitError {
        InitError::warning("Failed to load the chat list")
    }
}

pub struct AppLanguageStep {
    preferences: Arc<dyn PreferenceStore>,
    store: Arc<AppStore>,
}

impl std::fmt::Debug for AppLanguageStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppLanguageStep").finish()
    }
}

#[async_trait]
impl Step for AppLanguageStep {
    async fn execute(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        let language = self
            .preferences
            .app_language()
            .await
            .map_err(|e| StepError::from_source(APP_LANGUAGE, e))?;

        self.store
            .update(|state| state.language = Some(language.clone()))
            .await;
        ctx.set_result(APP_LANGUAGE, language);
        Ok(())
    }

    fn name(&self) -> StepName {
        StepName::new(APP_LANGUAGE)
    }

    fn dependencies(&self) -> Vec<StepName> {
        vec![StepName::new(I18N)]
    }

    fn on_error(&self, _error: &StepError) -> InitError {
        InitError::warning("Failed to load the application language")
    }
}

pub struct IncludeReasoningContentStep {
    preferences: Arc<dyn PreferenceStore>,
    store: Arc<AppStore>,
}

impl std::fmt::Debug for IncludeReasoningContentStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncludeReasoningContentStep").finish()
    }
}

#[async_trait]
impl Step for IncludeReasoningContentStep {
    async fn execute(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        let include = self
            .preferences
            .include_reasoning_content()
            .await
            .map_err(|e| StepError::from_source(INCLUDE_REASONING_CONTENT, e))?;

        self.store
            .update(|state| state.include_reasoning_content = include)
            .await;
        ctx.set_result(INCLUDE_REASONING_CONTENT, include);
        Ok(())
    }

    fn name(&self) -> StepName {
        StepName::new(INCLUDE_REASONING_CONTENT)
    }

    fn on_error(&self, _error: &StepError) -> InitError {
        InitError::ignorable("Failed to load the reasoning content preference")
    }
}

/// Fetches the provider catalog, falling back to the local cache.
///
/// Falling back still counts as a failure so the user is warned that the
/// catalog may be outdated, but the cached providers are published first.
pub struct ModelProviderStep {
    catalog: Arc<dyn ProviderCatalog>,
    store: Arc<AppStore>,
}

impl std::fmt::Debug for ModelProviderStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelProviderStep").finish()
    }
}

#[async_trait]
impl Step for ModelProviderStep {
    async fn execute(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        let remote = match self.catalog.fetch_remote().await {
            Ok(providers) => {
                if let Err(e) = self.catalog.save_cache(&providers).await {
                    warn!("Failed to cache the provider catalog: {}", e);
                }
                let state = ProviderState {
                    providers,
                    from_cache: false,
                    error: None,
                    last_update: Some(SystemTime::now()),
                };
                self.publish(ctx, state).await;
                return Ok(());
            }
            Err(remote) => remote,
        };

        warn!("Remote provider catalog unavailable: {}", remote);
        match self.catalog.load_cached().await {
            Ok(cached) => {
                let state = ProviderState {
                    providers: cached,
                    from_cache: true,
                    error: Some(format!("Remote catalog unavailable, using cache: {remote}")),
                    last_update: None,
                };
                self.publish(ctx, state).await;
                Err(StepError::from_source(MODEL_PROVIDER, remote))
            }
            Err(e) => {
                let details = format!("remote catalog unavailable ({remote}) and no cache ({e})");
                let state = ProviderState {
                    error: Some(details.clone()),
                    ..ProviderState::default()
                };
                self.publish(ctx, state).await;
                Err(StepError::failed(MODEL_PROVIDER, details))
            }
        }
    }

    fn name(&self) -> StepName {
        StepName::new(MODEL_PROVIDER)
    }

    fn on_error(&self, error: &StepError) -> InitError {
        match error {
            StepError::Source { .. } => {
                InitError::warning("Provider catalog could not be refreshed, using cached data")
            }
            _ => InitError::warning("Failed to load model providers"),
        }
    }
}

impl ModelProviderStep {
    async fn publish(&self, ctx: &mut StepContext<'_>, state: ProviderState) {
        ctx.set_result(MODEL_PROVIDER, state.providers.clone());
        self.store.update(|current| current.provider = state).await;
    }
}
