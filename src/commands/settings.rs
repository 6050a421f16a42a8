use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Emitter, State};

use crate::rewriter::{Backend, PresetTone};
use crate::settings::{ApiKeys, Settings};
use crate::shortcut::PluginRegistry;
use crate::state::AppState;

/// Settings as the settings view edits them: keys in plain text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsForm {
    pub hotkey: String,
    pub model: Backend,
    pub temperature: f32,
    pub num_alternatives: usize,
    #[serde(default)]
    pub openai_key: String,
    #[serde(default)]
    pub groq_key: String,
}

impl From<&Settings> for SettingsForm {
    fn from(settings: &Settings) -> Self {
        Self {
            hotkey: settings.hotkey.clone(),
            model: settings.model,
            temperature: settings.temperature,
            num_alternatives: settings.num_alternatives,
            openai_key: settings.api_keys.openai.clone().unwrap_or_default(),
            groq_key: settings.api_keys.groq.clone().unwrap_or_default(),
        }
    }
}

impl From<SettingsForm> for Settings {
    fn from(form: SettingsForm) -> Self {
        let mut api_keys = ApiKeys::default();
        api_keys.set(Backend::OpenAi, Some(form.openai_key));
        api_keys.set(Backend::Groq, Some(form.groq_key));
        Self {
            hotkey: form.hotkey.trim().to_string(),
            model: form.model,
            temperature: form.temperature,
            num_alternatives: form.num_alternatives,
            api_keys,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendOption {
    pub id: &'static str,
    pub label: &'static str,
}

#[tauri::command]
pub async fn get_settings(state: State<'_, AppState>) -> Result<SettingsForm, String> {
    Ok(SettingsForm::from(&state.settings_snapshot()))
}

#[tauri::command]
pub async fn save_settings(
    app: AppHandle,
    state: State<'_, AppState>,
    settings: SettingsForm,
) -> Result<(), String> {
    let new_settings = Settings::from(settings);
    let hotkey = new_settings.hotkey.clone();

    let hotkey_changed = state.apply_settings(new_settings, &PluginRegistry::new(&app))?;
    if hotkey_changed {
        crate::menu::refresh_tray(&app, &hotkey);
    }

    if let Err(e) = app.emit("settings-changed", ()) {
        log::warn!("Failed to emit settings-changed event: {}", e);
    }
    log::info!("Settings saved");
    Ok(())
}

#[tauri::command]
pub async fn get_tone_presets() -> Vec<&'static str> {
    PresetTone::ALL.iter().map(|t| t.label()).collect()
}

#[tauri::command]
pub async fn get_backends() -> Vec<BackendOption> {
    Backend::ALL
        .iter()
        .map(|b| BackendOption {
            id: b.id(),
            label: b.display_name(),
        })
        .collect()
}
