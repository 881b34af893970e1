use std::collections::HashMap;
use std::env;

use tracing::{info, warn};

use crate::prompt::DEFAULT_PROMPT;
use crate::types::FilterMode;

/// The four values the settings collaborator exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Credential,
    PromptTemplate,
    FilterMode,
    MuteTerms,
}

impl SettingKey {
    pub fn env_var(&self) -> &'static str {
        match self {
            SettingKey::Credential => "GEMINI_API_KEY",
            SettingKey::PromptTemplate => "FEEDCLEAN_PROMPT",
            SettingKey::FilterMode => "FEEDCLEAN_FILTER_MODE",
            SettingKey::MuteTerms => "FEEDCLEAN_MUTE_WORDS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Text(String),
    List(Vec<String>),
}

impl SettingValue {
    fn into_text(self) -> String {
        match self {
            SettingValue::Text(s) => s,
            SettingValue::List(items) => items.join(","),
        }
    }
}

/// Read side of the persisted-settings collaborator.
pub trait SettingsSource {
    fn get(&self, key: SettingKey) -> Option<SettingValue>;
}

/// Settings taken from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettings;

impl SettingsSource for EnvSettings {
    fn get(&self, key: SettingKey) -> Option<SettingValue> {
        env::var(key.env_var()).ok().map(SettingValue::Text)
    }
}

/// In-memory settings store with get and set.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: HashMap<SettingKey, SettingValue>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: SettingKey, value: SettingValue) {
        self.values.insert(key, value);
    }

    pub fn with(mut self, key: SettingKey, value: SettingValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_text(self, key: SettingKey, value: impl Into<String>) -> Self {
        self.with(key, SettingValue::Text(value.into()))
    }
}

impl SettingsSource for MemorySettings {
    fn get(&self, key: SettingKey) -> Option<SettingValue> {
        self.values.get(&key).cloned()
    }
}

/// Run configuration. Read once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credential: Option<String>,
    pub prompt_template: String,
    pub filter_mode: FilterMode,
    pub mute_terms: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credential: None,
            prompt_template: DEFAULT_PROMPT.to_string(),
            filter_mode: FilterMode::Hide,
            mute_terms: Vec::new(),
        }
    }
}

impl Settings {
    /// Read the four settings from `source`, filling defaults for anything
    /// missing or empty.
    pub fn load(source: &impl SettingsSource) -> Self {
        let credential = source
            .get(SettingKey::Credential)
            .map(|v| v.into_text().trim().to_string())
            .filter(|s| !s.is_empty());

        let prompt_template = source
            .get(SettingKey::PromptTemplate)
            .map(SettingValue::into_text)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

        let filter_mode = match source.get(SettingKey::FilterMode).map(SettingValue::into_text) {
            Some(raw) if !raw.trim().is_empty() => raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to hide mode");
                FilterMode::Hide
            }),
            _ => FilterMode::Hide,
        };

        let mute_terms = source
            .get(SettingKey::MuteTerms)
            .map(normalize_mute_terms)
            .unwrap_or_default();

        Self {
            credential,
            prompt_template,
            filter_mode,
            mute_terms,
        }
    }

    pub fn from_env() -> Self {
        Self::load(&EnvSettings)
    }

    /// Log the loaded configuration without the credential.
    pub fn log_redacted(&self) {
        info!(
            credential = if self.credential.is_some() { "<redacted>" } else { "<unset>" },
            custom_prompt = self.prompt_template != DEFAULT_PROMPT,
            filter_mode = %self.filter_mode,
            mute_terms = self.mute_terms.len(),
            "Settings loaded"
        );
    }
}

/// Mute terms arrive either as a list or as one comma-separated string.
/// Either way the result is trimmed, lowercased and free of empties.
pub fn normalize_mute_terms(value: SettingValue) -> Vec<String> {
    let raw: Vec<String> = match value {
        SettingValue::List(items) => items,
        SettingValue::Text(s) => s.split(',').map(str::to_string).collect(),
    };
    raw.into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_uses_defaults() {
        let settings = Settings::load(&MemorySettings::new());
        assert!(settings.credential.is_none());
        assert_eq!(settings.prompt_template, DEFAULT_PROMPT);
        assert_eq!(settings.filter_mode, FilterMode::Hide);
        assert!(settings.mute_terms.is_empty());
    }

    #[test]
    fn test_mute_terms_from_comma_string() {
        let source = MemorySettings::new().with_text(SettingKey::MuteTerms, " Crypto, ,NFT ,web3");
        let settings = Settings::load(&source);
        assert_eq!(settings.mute_terms, vec!["crypto", "nft", "web3"]);
    }

    #[test]
    fn test_mute_terms_from_list() {
        let source = MemorySettings::new().with(
            SettingKey::MuteTerms,
            SettingValue::List(vec!["  Hiring ".into(), "".into(), "AI".into()]),
        );
        let settings = Settings::load(&source);
        assert_eq!(settings.mute_terms, vec!["hiring", "ai"]);
    }

    #[test]
    fn test_blank_credential_is_unset() {
        let source = MemorySettings::new().with_text(SettingKey::Credential, "   ");
        assert!(Settings::load(&source).credential.is_none());
    }

    #[test]
    fn test_blank_prompt_falls_back_to_default() {
        let source = MemorySettings::new().with_text(SettingKey::PromptTemplate, "\n");
        assert_eq!(Settings::load(&source).prompt_template, DEFAULT_PROMPT);
    }

    #[test]
    fn test_unknown_filter_mode_hides() {
        let source = MemorySettings::new().with_text(SettingKey::FilterMode, "fade");
        assert_eq!(Settings::load(&source).filter_mode, FilterMode::Hide);

        let source = MemorySettings::new().with_text(SettingKey::FilterMode, "blur");
        assert_eq!(Settings::load(&source).filter_mode, FilterMode::Blur);
    }

    #[test]
    fn test_memory_settings_set_overwrites() {
        let mut source = MemorySettings::new().with_text(SettingKey::Credential, "old");
        source.set(SettingKey::Credential, SettingValue::Text("new".into()));
        assert_eq!(Settings::load(&source).credential.as_deref(), Some("new"));
    }
}
