//! Startup sequence of the multi-model chat desktop application.
//!
//! The host injects its storage and network collaborators through
//! [`AppServices`]; [`bootstrap`] runs the seven startup steps and returns the
//! report, and [`AppStartup`] turns that report into the screen to show.
//!
//! | Step                      | Depends on  | Critical | Severity  |
//! |---------------------------|-------------|----------|-----------|
//! | `i18n`                    |             | yes      | fatal     |
//! | `masterKey`               |             | yes      | fatal     |
//! | `models`                  | `masterKey` | no       | warning   |
//! | `chatList`                |             | no       | warning   |
//! | `appLanguage`             | `i18n`      | no       | warning   |
//! | `includeReasoningContent` |             | no       | ignorable |
//! | `modelProvider`           |             | no       | warning   |

pub mod config;
pub mod services;
pub mod startup;
pub mod steps;
pub mod store;

pub use config::{BootConfig, ConfigError, STEP_TIMEOUT_ENV};
pub use services::{
    AppServices, Chat, ChatRepository, KeyVault, LocaleLoader, MasterKey, Model, ModelProvider,
    ModelRepository, PreferenceStore, ProviderCatalog, MASTER_KEY_LEN,
};
pub use startup::{bootstrap, manager_builder, AppStartup};
pub use steps::init_steps;
pub use store::{AppState, AppStore, ProviderState};
