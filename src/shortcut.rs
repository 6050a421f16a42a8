//! Global hotkey registration and the press handler.

use serde_json::json;
use std::time::Instant;
use tauri::{AppHandle, Emitter, Manager, Runtime};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

use crate::clipboard::{capture_selection, SystemClipboard};
use crate::commands::window::show_popup;
use crate::hotkey::{normalize_hotkey, replace_hotkey, ShortcutRegistry, DEFAULT_HOTKEY};
use crate::state::{AppState, GateDecision};
use crate::utils::logger::*;

/// [`ShortcutRegistry`] backed by the global-shortcut plugin
pub struct PluginRegistry<'a, R: Runtime> {
    app: &'a AppHandle<R>,
}

impl<'a, R: Runtime> PluginRegistry<'a, R> {
    pub fn new(app: &'a AppHandle<R>) -> Self {
        Self { app }
    }
}

fn parse_shortcut(accelerator: &str) -> Result<Shortcut, String> {
    accelerator.parse().map_err(|e| {
        log::error!("Failed to parse hotkey '{}': {}", accelerator, e);
        format!("Invalid hotkey '{}'", accelerator)
    })
}

impl<R: Runtime> ShortcutRegistry for PluginRegistry<'_, R> {
    fn register(&self, accelerator: &str) -> Result<(), String> {
        let shortcut = parse_shortcut(accelerator)?;
        self.app
            .global_shortcut()
            .register(shortcut)
            .map_err(|e| e.to_string())
    }

    fn unregister(&self, accelerator: &str) -> Result<(), String> {
        let shortcut = parse_shortcut(accelerator)?;
        self.app
            .global_shortcut()
            .unregister(shortcut)
            .map_err(|e| e.to_string())
    }
}

/// Register `accelerator`, replacing whatever hotkey was registered before
pub fn register_hotkey<R: Runtime>(app: &AppHandle<R>, accelerator: &str) -> Result<(), String> {
    let state = app.state::<AppState>();
    let started = Instant::now();

    let registry = PluginRegistry::new(app);
    if let Err(e) = replace_hotkey(&registry, &state.registered_hotkey, accelerator) {
        log_failed("HOTKEY_REGISTRATION", &e);
        return Err(e);
    }

    log_complete("HOTKEY_REGISTRATION", started.elapsed().as_millis() as u64);
    log_with_context(log::Level::Info, "Hotkey registered", &[("hotkey", accelerator)]);
    Ok(())
}

/// Startup registration: the configured hotkey, then the default. Failures
/// are reported to the UI and the app keeps running.
pub fn register_initial_hotkey<R: Runtime>(app: &AppHandle<R>, accelerator: &str) {
    let error = match register_hotkey(app, accelerator) {
        Ok(()) => return,
        Err(e) => e,
    };
    log::error!("Hotkey '{}' unavailable: {}", accelerator, error);

    let fallback = normalize_hotkey(DEFAULT_HOTKEY).ok();
    let fell_back = match fallback.as_deref() {
        Some(default) if default != accelerator => register_hotkey(app, default).is_ok(),
        _ => false,
    };

    let fallback = if fell_back { fallback } else { None };
    let payload = json!({
        "hotkey": accelerator,
        "error": error,
        "fallback": fallback,
        "suggestion":
            "Please choose a different hotkey in settings or close conflicting applications",
    });
    if let Err(e) = app.emit("hotkey-registration-failed", payload) {
        log::warn!("Failed to emit hotkey-registration-failed: {}", e);
    }
}

pub fn handle_shortcut<R: Runtime>(app: &AppHandle<R>, _shortcut: &Shortcut, state: ShortcutState) {
    if !matches!(state, ShortcutState::Pressed) {
        return;
    }

    let app_state = app.state::<AppState>();
    let decision = match app_state.gate.lock() {
        Ok(mut gate) => gate.trigger(Instant::now()),
        Err(e) => {
            log::error!("Hotkey gate lock poisoned: {}", e);
            return;
        }
    };
    if decision != GateDecision::Accepted {
        log::debug!("Hotkey ignored: {:?}", decision);
        return;
    }

    // Capture sleeps while the focused app copies; keep it off the event loop
    let app = app.clone();
    tauri::async_runtime::spawn_blocking(move || capture_and_show(&app));
}

fn capture_and_show<R: Runtime>(app: &AppHandle<R>) {
    let state = app.state::<AppState>();
    let captured =
        SystemClipboard::new().and_then(|mut clipboard| capture_selection(&mut clipboard));

    let text = match captured {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => {
            log::info!("No text selected");
            release_gate(&state);
            return;
        }
        Err(e) => {
            log_failed("CAPTURE_SELECTION", &e.to_string());
            release_gate(&state);
            return;
        }
    };

    log::info!("Captured selection ({} chars)", text.len());
    state.set_captured_text(Some(text.clone()));

    if let Err(e) = show_popup(app) {
        log::error!("Failed to show popup: {}", e);
        state.close_popup();
        return;
    }
    if let Err(e) = app.emit("selection-captured", json!({ "text": text })) {
        log::warn!("Failed to emit selection-captured: {}", e);
    }
}

fn release_gate(state: &AppState) {
    if let Ok(mut gate) = state.gate.lock() {
        gate.release();
    }
}
