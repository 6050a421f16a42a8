use tauri::menu::{Menu, MenuBuilder, MenuEvent, MenuItem, PredefinedMenuItem};
use tauri::tray::{TrayIcon, TrayIconBuilder};
use tauri::{AppHandle, Runtime};

use crate::commands::window::show_main_view;
use crate::hotkey::display_hotkey;

pub const TRAY_ID: &str = "main";

pub fn build_tray_menu<R: Runtime>(app: &AppHandle<R>, hotkey: &str) -> tauri::Result<Menu<R>> {
    let title = MenuItem::with_id(
        app,
        "title",
        format!("Lexia - Press {}", display_hotkey(hotkey)),
        false,
        None::<&str>,
    )?;
    let separator1 = PredefinedMenuItem::separator(app)?;
    let settings_i = MenuItem::with_id(app, "settings", "Settings", true, None::<&str>)?;
    let about_i = MenuItem::with_id(app, "about", "About", true, None::<&str>)?;
    let separator2 = PredefinedMenuItem::separator(app)?;
    let quit_i = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;

    MenuBuilder::new(app)
        .item(&title)
        .item(&separator1)
        .item(&settings_i)
        .item(&about_i)
        .item(&separator2)
        .item(&quit_i)
        .build()
}

pub fn handle_menu_event<R: Runtime>(app: &AppHandle<R>, event: MenuEvent) {
    log::info!("Tray menu event: {:?}", event.id);
    match event.id.as_ref() {
        "settings" => show_main_view(app, "settings"),
        "about" => show_main_view(app, "about"),
        "quit" => {
            crate::utils::logger::log_lifecycle_event("APPLICATION_QUIT", None, Some("tray"));
            app.exit(0);
        }
        other => log::debug!("Unhandled tray item: {}", other),
    }
}

pub fn create_tray<R: Runtime>(app: &AppHandle<R>, hotkey: &str) -> tauri::Result<TrayIcon<R>> {
    let menu = build_tray_menu(app, hotkey)?;

    let mut builder = TrayIconBuilder::with_id(TRAY_ID)
        .tooltip(format!("Lexia - Press {}", display_hotkey(hotkey)))
        .menu(&menu)
        .on_menu_event(handle_menu_event);

    match app.default_window_icon() {
        Some(icon) => builder = builder.icon(icon.clone()),
        None => log::warn!("Default window icon not found, tray will use the platform default"),
    }

    builder.build(app)
}

/// Rebuild the menu after the hotkey changed so the title stays accurate
pub fn refresh_tray<R: Runtime>(app: &AppHandle<R>, hotkey: &str) {
    let Some(tray) = app.tray_by_id(TRAY_ID) else {
        return;
    };
    match build_tray_menu(app, hotkey) {
        Ok(menu) => {
            if let Err(e) = tray.set_menu(Some(menu)) {
                log::warn!("Failed to update tray menu: {}", e);
            }
            let _ = tray.set_tooltip(Some(format!("Lexia - Press {}", display_hotkey(hotkey))));
        }
        Err(e) => log::warn!("Failed to rebuild tray menu: {}", e),
    }
}
