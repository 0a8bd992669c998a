//! Configuration resolution for vaidya-hub
//!
//! The API key is resolved Database → ENV → TOML. Everything else comes
//! from the TOML file with compiled defaults.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::{Pool, Sqlite};
use tracing::{info, warn};
use vaidya_common::config::TomlConfig;
use vaidya_common::{Error, Result};

use crate::store::RemedyBackend;

pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_GENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GENAI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Environment variable carrying the API key
pub const GENAI_API_KEY_ENV: &str = "VAIDYA_GENAI_API_KEY";

/// Whether submissions go through the verification collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerificationMode {
    #[default]
    Required,
    /// Every submission is treated as plausible
    Bypass,
}

impl FromStr for VerificationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "required" | "" => Ok(VerificationMode::Required),
            "bypass" | "off" => Ok(VerificationMode::Bypass),
            other => Err(Error::Config(format!("Unknown verification mode: {}", other))),
        }
    }
}

/// Transcript matching strategy of the pronunciation game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatcherKind {
    #[default]
    Exact,
    Fuzzy,
}

impl FromStr for MatcherKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" | "" => Ok(MatcherKind::Exact),
            "fuzzy" => Ok(MatcherKind::Fuzzy),
            other => Err(Error::Config(format!("Unknown pronunciation matcher: {}", other))),
        }
    }
}

/// Debounce and settle delays of the pronunciation game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameTiming {
    pub debounce: Duration,
    pub settle: Duration,
}

impl Default for GameTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            settle: Duration::from_millis(1000),
        }
    }
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub port: u16,
    pub remedy_backend: RemedyBackend,
    pub verification: VerificationMode,
    pub matcher: MatcherKind,
    pub genai_base_url: String,
    pub genai_model: String,
    pub speech_model: String,
    pub game_timing: GameTiming,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            remedy_backend: RemedyBackend::default(),
            verification: VerificationMode::default(),
            matcher: MatcherKind::default(),
            genai_base_url: DEFAULT_GENAI_BASE_URL.to_string(),
            genai_model: DEFAULT_GENAI_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            game_timing: GameTiming::default(),
        }
    }
}

impl HubConfig {
    /// Build from the TOML file; unknown enum values are configuration errors
    pub fn from_toml(toml_config: &TomlConfig) -> Result<Self> {
        let defaults = Self::default();

        let remedy_backend = match &toml_config.remedy_backend {
            Some(value) => value.parse()?,
            None => defaults.remedy_backend,
        };
        let verification = match &toml_config.verification {
            Some(value) => value.parse()?,
            None => defaults.verification,
        };
        let matcher = match &toml_config.pronunciation_matcher {
            Some(value) => value.parse()?,
            None => defaults.matcher,
        };

        Ok(Self {
            port: toml_config.port.unwrap_or(defaults.port),
            remedy_backend,
            verification,
            matcher,
            genai_base_url: toml_config
                .genai_base_url
                .clone()
                .unwrap_or(defaults.genai_base_url),
            genai_model: toml_config.genai_model.clone().unwrap_or(defaults.genai_model),
            speech_model: toml_config.speech_model.clone().unwrap_or(defaults.speech_model),
            game_timing: defaults.game_timing,
        })
    }

    /// Apply timing overrides stored in the settings table
    pub async fn load_game_timing(mut self, db: &Pool<Sqlite>) -> Result<Self> {
        self.game_timing = GameTiming {
            debounce: Duration::from_millis(
                crate::db::settings::get_translation_debounce_ms(db).await?,
            ),
            settle: Duration::from_millis(crate::db::settings::get_evaluation_settle_ms(db).await?),
        };
        Ok(self)
    }
}

/// Resolve the generative-language API key
///
/// **Priority:** Database → ENV → TOML. Returns `None` when no source has a
/// usable key; the service then starts without AI collaborators.
pub async fn resolve_genai_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<Option<String>> {
    let mut sources = Vec::new();

    // Tier 1: Database (authoritative)
    let db_key = crate::db::settings::get_genai_api_key(db)
        .await?
        .filter(|k| is_valid_key(k));
    if db_key.is_some() {
        sources.push("database");
    }

    // Tier 2: Environment variable
    let env_key = std::env::var(GENAI_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k));
    if env_key.is_some() {
        sources.push("environment");
    }

    // Tier 3: TOML config
    let toml_key = toml_config
        .genai_api_key
        .clone()
        .filter(|k| is_valid_key(k));
    if toml_key.is_some() {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "GenAI API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key {
        info!("GenAI API key loaded from database");
        return Ok(Some(key));
    }
    if let Some(key) = env_key {
        info!("GenAI API key loaded from environment variable");
        return Ok(Some(key));
    }
    if let Some(key) = toml_key {
        info!("GenAI API key loaded from TOML config");
        return Ok(Some(key));
    }

    warn!(
        "GenAI API key not configured. Set it via POST /api/settings/genai_api_key, \
         {}=your-key, or genai_api_key in the TOML config",
        GENAI_API_KEY_ENV
    );
    Ok(None)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Sync settings from database to TOML file
///
/// Best effort: the database stays authoritative when the write fails.
pub async fn sync_settings_to_toml(
    settings: HashMap<String, String>,
    toml_path: &Path,
) -> Result<()> {
    let mut config = if toml_path.exists() {
        vaidya_common::config::load_toml_config(toml_path)?
    } else {
        TomlConfig::default()
    };

    if let Some(key) = settings.get(crate::db::settings::GENAI_API_KEY) {
        config.genai_api_key = Some(key.clone());
    }

    match vaidya_common::config::write_toml_config(&config, toml_path) {
        Ok(()) => {
            info!("Settings synced to TOML: {}", toml_path.display());
            Ok(())
        }
        Err(e) => {
            warn!("TOML write failed (database write succeeded): {}", e);
            Ok(())
        }
    }
}
