//! Persisted user preferences.
//!
//! The document is plain JSON. API keys are base64 encoded on disk so they
//! don't sit in the file as readable text; this is obfuscation only.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hotkey::{normalize_hotkey, HotkeyError, DEFAULT_HOTKEY};
use crate::rewriter::Backend;
use crate::utils::logger::*;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_NUM_ALTERNATIVES: usize = 3;
pub const MIN_ALTERNATIVES: usize = 1;
pub const MAX_ALTERNATIVES: usize = 5;
pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 1.0;

const APP_DIR: &str = "lexia";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,

    #[error("Temperature must be between 0.0 and 1.0, got {0}")]
    InvalidTemperature(f32),

    #[error("Number of alternatives must be between 1 and 5, got {0}")]
    InvalidAlternativeCount(usize),

    #[error("Invalid hotkey: {0}")]
    InvalidHotkey(#[from] HotkeyError),

    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Stored credentials, one optional key per backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiKeys {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "encode_key",
        deserialize_with = "decode_key"
    )]
    pub openai: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "encode_key",
        deserialize_with = "decode_key"
    )]
    pub groq: Option<String>,
}

impl ApiKeys {
    /// Non-blank key for `backend`
    pub fn get(&self, backend: Backend) -> Option<&str> {
        let slot = match backend {
            Backend::OpenAi => &self.openai,
            Backend::Groq => &self.groq,
        };
        slot.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Store a key; blank input clears it
    pub fn set(&mut self, backend: Backend, key: Option<String>) {
        let key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        match backend {
            Backend::OpenAi => self.openai = key,
            Backend::Groq => self.groq = key,
        }
    }

    pub fn configured(&self) -> Vec<Backend> {
        Backend::ALL
            .into_iter()
            .filter(|b| self.get(*b).is_some())
            .collect()
    }
}

pub fn obfuscate(plain: &str) -> String {
    STANDARD.encode(plain.as_bytes())
}

/// Inverse of [`obfuscate`]. Values that aren't valid base64 text were
/// written by hand and are returned unchanged.
pub fn deobfuscate(stored: &str) -> String {
    STANDARD
        .decode(stored.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| stored.to_string())
}

fn encode_key<S: Serializer>(key: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match key {
        Some(k) => serializer.serialize_str(&obfuscate(k)),
        None => serializer.serialize_none(),
    }
}

fn decode_key<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|s| deobfuscate(&s))
        .filter(|s| !s.trim().is_empty()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub hotkey: String,
    /// Backend id; the field name is kept for compatibility with existing files
    pub model: Backend,
    pub temperature: f32,
    pub num_alternatives: usize,
    pub api_keys: ApiKeys,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: DEFAULT_HOTKEY.to_string(),
            model: Backend::default(),
            temperature: DEFAULT_TEMPERATURE,
            num_alternatives: DEFAULT_NUM_ALTERNATIVES,
            api_keys: ApiKeys::default(),
        }
    }
}

impl Settings {
    /// Build settings from a parsed document. Each field is read on its own:
    /// missing or mistyped fields fall back to defaults and numbers are clamped.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Settings::default();

        let hotkey = value
            .get("hotkey")
            .and_then(|v| v.as_str())
            .filter(|h| normalize_hotkey(h).is_ok())
            .map(str::to_string)
            .unwrap_or(defaults.hotkey);

        let model = value
            .get("model")
            .and_then(|v| serde_json::from_value::<Backend>(v.clone()).ok())
            .unwrap_or(defaults.model);

        let temperature = value
            .get("temperature")
            .and_then(|v| v.as_f64())
            .map(|t| t as f32)
            .filter(|t| t.is_finite())
            .map(|t| t.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE))
            .unwrap_or(defaults.temperature);

        let num_alternatives = value
            .get("num_alternatives")
            .and_then(|v| v.as_f64())
            .filter(|n| n.is_finite())
            .map(|n| (n.round().max(0.0) as usize).clamp(MIN_ALTERNATIVES, MAX_ALTERNATIVES))
            .unwrap_or(defaults.num_alternatives);

        let api_keys = value
            .get("api_keys")
            .and_then(|v| serde_json::from_value::<ApiKeys>(v.clone()).ok())
            .unwrap_or(defaults.api_keys);

        Self {
            hotkey,
            model,
            temperature,
            num_alternatives,
            api_keys,
        }
    }

    /// Reject values a save must not persist
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.temperature.is_finite()
            || !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&self.temperature)
        {
            return Err(SettingsError::InvalidTemperature(self.temperature));
        }
        if !(MIN_ALTERNATIVES..=MAX_ALTERNATIVES).contains(&self.num_alternatives) {
            return Err(SettingsError::InvalidAlternativeCount(self.num_alternatives));
        }
        normalize_hotkey(&self.hotkey)?;
        Ok(())
    }

    /// Accelerator form of the stored hotkey, falling back to the default
    pub fn accelerator(&self) -> String {
        normalize_hotkey(&self.hotkey)
            .or_else(|_| normalize_hotkey(DEFAULT_HOTKEY))
            .unwrap_or_else(|_| "CommandOrControl+Shift+R".to_string())
    }
}

/// Mask all but the last four characters of a key
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

/// JSON file holding [`Settings`]
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/lexia/settings.json`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
            .ok_or(SettingsError::NoConfigDir)
    }

    pub fn open_default() -> Result<Self, SettingsError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or unreadable document yields defaults
    pub fn load(&self) -> Settings {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings file at {:?}, using defaults", self.path);
                return Settings::default();
            }
            Err(e) => {
                log_file_operation(
                    "READ_SETTINGS",
                    &self.path.to_string_lossy(),
                    false,
                    None,
                    Some(&e.to_string()),
                );
                return Settings::default();
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(value) => {
                log_file_operation(
                    "READ_SETTINGS",
                    &self.path.to_string_lossy(),
                    true,
                    Some(contents.len() as u64),
                    None,
                );
                Settings::from_value(&value)
            }
            Err(e) => {
                log::warn!(
                    "Settings file {:?} is not valid JSON ({}), using defaults",
                    self.path,
                    e
                );
                Settings::default()
            }
        }
    }

    /// Validate, then write through a temporary file and rename into place
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        settings.validate()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            log_file_operation(
                "WRITE_SETTINGS",
                &self.path.to_string_lossy(),
                false,
                None,
                Some(&e.to_string()),
            );
            return Err(e.into());
        }

        log_file_operation(
            "WRITE_SETTINGS",
            &self.path.to_string_lossy(),
            true,
            Some(json.len() as u64),
            None,
        );
        Ok(())
    }

    /// Load, apply `change`, save
    pub fn update<F>(&self, change: F) -> Result<Settings, SettingsError>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.load();
        change(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}
