use crate::ai::prompts::SoundPrompts;
use crate::ai::tts::TtsPrompts;
use crate::domain::call::Language;
use crate::domain::fields::{default_service_fields, FieldDescriptor};
use crate::domain::schema::{synthesize, GeneratedSchema};
use crate::error::{CallCenterError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.json";

pub const SERVICE_SCHEMA_NAME: &str = "ServiceEntryModel";

pub const PROSODY_RATE_MIN: f64 = 0.75;
pub const PROSODY_RATE_MAX: f64 = 1.25;

static FALLBACK_LANGUAGE: Lazy<Language> =
    Lazy::new(|| Language::new("en-US", "English", "en-US-AvaMultilingualNeural"));

/// Speech rate multiplier, bounded to what the voice engine renders naturally.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ProsodyRate(f64);

impl ProsodyRate {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for ProsodyRate {
    type Error = CallCenterError;

    fn try_from(rate: f64) -> Result<Self> {
        if (PROSODY_RATE_MIN..=PROSODY_RATE_MAX).contains(&rate) {
            Ok(Self(rate))
        } else {
            Err(CallCenterError::ConfigError(format!(
                "prosody_rate {rate} outside [{PROSODY_RATE_MIN}, {PROSODY_RATE_MAX}]"
            )))
        }
    }
}

impl From<ProsodyRate> for f64 {
    fn from(rate: ProsodyRate) -> Self {
        rate.0
    }
}

impl Default for ProsodyRate {
    fn default() -> Self {
        Self(1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    #[serde(default = "default_short_code")]
    pub default_short_code: String,
    #[serde(default = "default_languages")]
    pub availables: Vec<Language>,
}

fn default_short_code() -> String {
    "en-US".to_string()
}

fn default_languages() -> Vec<Language> {
    vec![
        FALLBACK_LANGUAGE.clone(),
        Language::new("fr-FR", "French", "fr-FR-VivienneMultilingualNeural"),
        Language::new("es-ES", "Spanish", "es-ES-ArabellaMultilingualNeural"),
        Language::new("zh-CN", "Chinese", "zh-CN-XiaoxiaoMultilingualNeural"),
    ]
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default_short_code: default_short_code(),
            availables: default_languages(),
        }
    }
}

impl LanguageConfig {
    pub fn find(&self, short_code: &str) -> Option<&Language> {
        self.availables.iter().find(|l| l.short_code == short_code)
    }

    pub fn default_lang(&self) -> &Language {
        self.find(&self.default_short_code)
            .or_else(|| self.availables.first())
            .unwrap_or(&FALLBACK_LANGUAGE)
    }

    pub fn validate(&self) -> Result<()> {
        if self.availables.is_empty() {
            return Err(CallCenterError::ConfigError("lang.availables is empty".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.availables.iter().find(|l| !seen.insert(l.short_code.as_str())) {
            return Err(CallCenterError::ConfigError(format!(
                "language '{}' declared twice",
                dup.short_code
            )));
        }
        if self.find(&self.default_short_code).is_none() {
            return Err(CallCenterError::ConfigError(format!(
                "default language '{}' is not in lang.availables",
                self.default_short_code
            )));
        }
        Ok(())
    }
}

/// Per-deployment conversation setup, copied into every new call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInitiate {
    pub agent_phone_number: String,
    #[serde(default = "default_bot_company")]
    pub bot_company: String,
    pub bot_name: String,
    pub bot_phone_number: String,
    #[serde(default = "default_service_fields")]
    pub service_fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub lang: LanguageConfig,
    #[serde(default)]
    pub prosody_rate: ProsodyRate,
    #[serde(default = "default_task")]
    pub task: String,
}

fn default_bot_company() -> String {
    "More".to_string()
}

fn default_task() -> String {
    "Assist the customer with telecom inquiries, such as address verification, \
     checking nbn® availability, setting up services, or answering questions about broadband and mobile plans. \
     The conversation ends when the necessary information is gathered or the customer is satisfied."
        .to_string()
}

impl Default for WorkflowInitiate {
    fn default() -> Self {
        Self {
            agent_phone_number: "+61200000000".to_string(),
            bot_company: default_bot_company(),
            bot_name: "Amelie".to_string(),
            bot_phone_number: "+61299999999".to_string(),
            service_fields: default_service_fields(),
            lang: LanguageConfig::default(),
            prosody_rate: ProsodyRate::default(),
            task: default_task(),
        }
    }
}

impl WorkflowInitiate {
    pub fn service_schema(&self) -> Result<GeneratedSchema> {
        synthesize(SERVICE_SCHEMA_NAME, &self.service_fields)
    }

    pub fn validate(&self) -> Result<()> {
        self.service_schema()?;
        self.lang.validate()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationConfig {
    #[serde(default)]
    pub initiate: WorkflowInitiate,
}

/// Secret that never shows up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: &str) -> Self {
        Self(key.to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformMode {
    AzureOpenai,
    Openai,
}

/// Settings shared by every LLM platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub context: u32,
    pub endpoint: String,
    pub model: String,
    #[serde(default = "default_seed")]
    pub seed: i64,
    pub streaming: bool,
    #[serde(default)]
    pub temperature: f32,
}

fn default_seed() -> i64 {
    42
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureOpenaiPlatform {
    #[serde(flatten)]
    pub settings: ModelSettings,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    pub deployment: String,
    pub api_key: ApiKey,
}

fn default_api_version() -> String {
    "2024-06-01".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenaiPlatform {
    #[serde(flatten)]
    pub settings: ModelSettings,
    pub api_key: ApiKey,
}

/// On-disk shape: a mode plus one optional section per platform.
#[derive(Serialize, Deserialize)]
pub struct PlatformSelection {
    pub mode: PlatformMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_openai: Option<AzureOpenaiPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenaiPlatform>,
}

/// The platform a selection resolves to. A selection missing its section does not deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlatformSelection", into = "PlatformSelection")]
pub enum Platform {
    AzureOpenai(AzureOpenaiPlatform),
    Openai(OpenaiPlatform),
}

impl TryFrom<PlatformSelection> for Platform {
    type Error = CallCenterError;

    fn try_from(selection: PlatformSelection) -> Result<Self> {
        match selection.mode {
            PlatformMode::AzureOpenai => selection
                .azure_openai
                .map(Platform::AzureOpenai)
                .ok_or_else(|| CallCenterError::ConfigError("Azure OpenAI config required".into())),
            PlatformMode::Openai => selection
                .openai
                .map(Platform::Openai)
                .ok_or_else(|| CallCenterError::ConfigError("OpenAI config required".into())),
        }
    }
}

impl From<Platform> for PlatformSelection {
    fn from(platform: Platform) -> Self {
        let mode = platform.mode();
        match platform {
            Platform::AzureOpenai(p) => Self { mode, azure_openai: Some(p), openai: None },
            Platform::Openai(p) => Self { mode, azure_openai: None, openai: Some(p) },
        }
    }
}

impl Platform {
    pub fn mode(&self) -> PlatformMode {
        match self {
            Platform::AzureOpenai(_) => PlatformMode::AzureOpenai,
            Platform::Openai(_) => PlatformMode::Openai,
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        match self {
            Platform::AzureOpenai(p) => &p.settings,
            Platform::Openai(p) => &p.settings,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(alias = "backup")]
    pub fast: Platform,
    #[serde(alias = "primary")]
    pub slow: Platform,
}

impl LlmConfig {
    pub fn selected(&self, is_fast: bool) -> &Platform {
        if is_fast { &self.fast } else { &self.slow }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    pub endpoint: String,
    pub api_key: ApiKey,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    #[serde(default)]
    pub sounds: SoundPrompts,
    #[serde(default)]
    pub tts: TtsPrompts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub conversation: ConversationConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub translation: Option<TranslationConfig>,
}

impl AppConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading configuration from {}", path.display());
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Loads the file named by `CONFIG_PATH`, `config.json` when unset.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(path)
    }

    pub fn validate(&self) -> Result<()> {
        self.conversation.initiate.validate()?;
        self.prompts.tts.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn platform_json(mode: &str) -> serde_json::Value {
        json!({
            "mode": mode,
            "azure_openai": {
                "context": 128000,
                "endpoint": "https://example.openai.azure.com",
                "model": "gpt-4o-mini",
                "streaming": true,
                "deployment": "gpt-4o-mini",
                "api_key": "azure-key"
            }
        })
    }

    fn config_json() -> serde_json::Value {
        json!({
            "conversation": {
                "initiate": {
                    "agent_phone_number": "+61200000000",
                    "bot_name": "Amelie",
                    "bot_phone_number": "+61299999999"
                }
            },
            "llm": { "backup": platform_json("azure_openai"), "primary": platform_json("azure_openai") }
        })
    }

    #[test]
    fn test_load_minimal_config_with_defaults() {
        let config = AppConfig::from_json(&config_json().to_string()).unwrap();
        let initiate = &config.conversation.initiate;
        assert_eq!(initiate.bot_company, "More");
        assert_eq!(initiate.service_fields.len(), 8);
        assert_eq!(initiate.prosody_rate.value(), 1.0);
        assert_eq!(config.llm.selected(true).mode(), PlatformMode::AzureOpenai);
        match config.llm.selected(false) {
            Platform::AzureOpenai(p) => {
                assert_eq!(p.api_version, "2024-06-01");
                assert_eq!(p.settings.seed, 42);
            }
            other => panic!("unexpected platform {other:?}"),
        }
    }

    #[test]
    fn test_prosody_rate_bounds() {
        assert!(ProsodyRate::try_from(0.75).is_ok());
        assert!(ProsodyRate::try_from(1.25).is_ok());
        assert!(ProsodyRate::try_from(0.74).is_err());
        assert!(ProsodyRate::try_from(1.3).is_err());

        let mut raw = config_json();
        raw["conversation"]["initiate"]["prosody_rate"] = json!(2.0);
        assert!(AppConfig::from_json(&raw.to_string()).is_err());
    }

    #[test]
    fn test_selection_missing_its_section_is_rejected() {
        let mut raw = config_json();
        raw["llm"]["primary"] = platform_json("openai");
        let err = AppConfig::from_json(&raw.to_string()).unwrap_err();
        assert!(err.to_string().contains("OpenAI config required"));
    }

    #[test]
    fn test_unknown_field_type_fails_at_load() {
        let mut raw = config_json();
        raw["conversation"]["initiate"]["service_fields"] =
            json!([{ "name": "plan", "description": "Plan", "type": "MONEY" }]);
        let err = AppConfig::from_json(&raw.to_string()).unwrap_err();
        assert!(matches!(err, CallCenterError::UnknownFieldType(_)));
    }

    #[test]
    fn test_default_language_must_exist() {
        let mut raw = config_json();
        raw["conversation"]["initiate"]["lang"] = json!({ "default_short_code": "de-DE" });
        assert!(AppConfig::from_json(&raw.to_string()).is_err());
    }

    #[test]
    fn test_config_survives_serialization() {
        let mut raw = config_json();
        raw["llm"]["backup"] = json!({
            "mode": "openai",
            "openai": {
                "context": 16000,
                "endpoint": "https://api.openai.com/v1",
                "model": "gpt-4o-mini",
                "streaming": false,
                "api_key": "sk-test"
            }
        });
        let config = AppConfig::from_json(&raw.to_string()).unwrap();

        let saved = serde_json::to_value(&config).unwrap();
        assert_eq!(saved["llm"]["fast"]["mode"], "openai");
        assert!(saved["llm"]["fast"].get("azure_openai").is_none());
        assert_eq!(saved["llm"]["slow"]["mode"], "azure_openai");

        let reloaded = AppConfig::from_json(&saved.to_string()).unwrap();
        assert_eq!(reloaded.llm.fast, config.llm.fast);
        assert_eq!(reloaded.llm.slow, config.llm.slow);
        assert_eq!(serde_json::to_value(&reloaded).unwrap(), saved);
    }

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::new("sk-live-secret");
        assert!(!format!("{key:?}").contains("secret"));
        assert_eq!(key.expose(), "sk-live-secret");
    }
}
