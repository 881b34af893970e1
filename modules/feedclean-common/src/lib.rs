pub mod config;
pub mod error;
pub mod prompt;
pub mod types;

pub use config::{EnvSettings, MemorySettings, SettingKey, SettingValue, Settings, SettingsSource};
pub use error::FeedCleanError;
pub use prompt::DEFAULT_PROMPT;
pub use types::*;
