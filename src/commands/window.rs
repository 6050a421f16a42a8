use tauri::{AppHandle, Emitter, Manager, Runtime, State};

use crate::state::AppState;
use crate::utils::logger::*;

pub const POPUP_WINDOW: &str = "popup";
pub const MAIN_WINDOW: &str = "main";

/// Bring up the rewrite popup on top of everything
pub fn show_popup<R: Runtime>(app: &AppHandle<R>) -> Result<(), String> {
    let window = app
        .get_webview_window(POPUP_WINDOW)
        .ok_or_else(|| "Popup window not found".to_string())?;
    window.show().map_err(|e| e.to_string())?;
    let _ = window.unminimize();
    window.set_focus().map_err(|e| e.to_string())?;
    log_with_context(log::Level::Debug, "Window shown", &[("window", POPUP_WINDOW)]);
    Ok(())
}

/// Show the main window on `view` ("settings" or "about")
pub fn show_main_view<R: Runtime>(app: &AppHandle<R>, view: &str) {
    match app.get_webview_window(MAIN_WINDOW) {
        Some(window) => {
            let _ = window.show();
            let _ = window.set_focus();
            if let Err(e) = app.emit_to(MAIN_WINDOW, "navigate", view) {
                log::warn!("Failed to navigate main window to {}: {}", view, e);
            }
        }
        None => log::error!("Main window not found"),
    }
}

/// Hide the popup and reset the per-popup state
pub fn hide_popup<R: Runtime>(app: &AppHandle<R>, state: &AppState) {
    if let Some(window) = app.get_webview_window(POPUP_WINDOW) {
        if let Err(e) = window.hide() {
            log::warn!("Failed to hide popup: {}", e);
        }
    }
    state.close_popup();
}

#[tauri::command]
pub async fn close_popup(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    hide_popup(&app, &state);
    log::debug!("Popup closed");
    Ok(())
}

#[tauri::command]
pub async fn open_settings(app: AppHandle) -> Result<(), String> {
    show_main_view(&app, "settings");
    Ok(())
}
