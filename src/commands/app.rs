use tauri::AppHandle;
use tauri_plugin_opener::OpenerExt;

use crate::updates::{self, AppInfo, UpdateStatus};

#[tauri::command]
pub async fn get_app_info() -> AppInfo {
    AppInfo::current()
}

#[tauri::command]
pub async fn check_for_updates() -> Result<UpdateStatus, String> {
    let client = updates::http_client().map_err(|e| e.to_string())?;
    updates::check_for_updates(&client, updates::RELEASE_API_URL, env!("CARGO_PKG_VERSION"))
        .await
        .map_err(|e| {
            log::warn!("Update check failed: {}", e);
            e.to_string()
        })
}

/// Open the project or release page in the default browser
#[tauri::command]
pub async fn open_release_page(app: AppHandle, url: Option<String>) -> Result<(), String> {
    let url = url.unwrap_or_else(|| format!("{}/releases/latest", updates::GITHUB_URL));
    if !url.starts_with(updates::GITHUB_URL) {
        return Err("Refusing to open a non-project URL".to_string());
    }
    app.opener()
        .open_url(url, None::<&str>)
        .map_err(|e| e.to_string())
}
