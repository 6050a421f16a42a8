//! Lexia: rewrite the selected text with an LLM and pick one of several
//! alternatives.
//!
//! The library is usable headless (see the `lexia-cli` binary). The tray
//! app with the global hotkey and popup is built with the `desktop` feature.

pub mod cli;
pub mod clipboard;
pub mod hotkey;
pub mod instance_lock;
pub mod rewriter;
pub mod settings;
pub mod state;
pub mod updates;
pub mod utils;
pub mod worker;

#[cfg(feature = "desktop")]
mod commands;
#[cfg(feature = "desktop")]
mod menu;
#[cfg(feature = "desktop")]
mod shortcut;

#[cfg(test)]
mod tests;

pub use rewriter::{Backend, RewriteError, RewriteOutcome, RewriteRequest, Rewriter, Tone};
pub use settings::{Settings, SettingsStore};

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use chrono::Local;
    use std::time::Instant;
    use tauri::Manager;
    use tauri_plugin_log::{Builder as LogBuilder, RotationStrategy, Target, TargetKind};

    use crate::commands::{
        app::{check_for_updates, get_app_info, open_release_page},
        rewrite::{
            copy_selected_alternative, get_captured_text, get_job_state, select_alternative,
            start_rewrite,
        },
        settings::{get_backends, get_settings, get_tone_presets, save_settings},
        window::{close_popup, hide_popup, open_settings, show_main_view, MAIN_WINDOW, POPUP_WINDOW},
    };
    use crate::instance_lock::InstanceLock;
    use crate::rewriter::Backend;
    use crate::settings::{Settings, SettingsStore};
    use crate::state::AppState;
    use crate::utils::logger::*;

    // Daily log file next to stdout output
    fn setup_logging() -> tauri_plugin_log::Builder {
        let today = Local::now().format("%Y-%m-%d").to_string();

        LogBuilder::default()
            .targets([
                Target::new(TargetKind::Stdout),
                Target::new(TargetKind::LogDir {
                    file_name: Some(format!("lexia-{}", today)),
                }),
            ])
            .rotation_strategy(RotationStrategy::KeepAll)
            .max_file_size(10_000_000)
            .level(if cfg!(debug_assertions) {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            })
    }

    fn install_panic_hook() {
        std::panic::set_hook(Box::new(|panic_info| {
            let location = panic_info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown location".to_string());

            let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic payload".to_string()
            };

            log::error!("💥 PANIC at {}: {}", location, message);
            log_with_context(
                log::Level::Error,
                "Panic details",
                &[("panic_location", &location), ("panic_message", &message)],
            );
            eprintln!("Application panic at {}: {}", location, message);
        }));
    }

    /// Stored keys or environment variables
    fn has_any_credential(settings: &Settings) -> bool {
        Backend::ALL.into_iter().any(|b| {
            settings.api_keys.get(b).is_some()
                || std::env::var(b.env_var())
                    .map(|v| !v.trim().is_empty())
                    .unwrap_or(false)
        })
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let app_start = Instant::now();
        let app_version = env!("CARGO_PKG_VERSION");
        log_lifecycle_event("APPLICATION_START", Some(app_version), None);

        // .env is a development convenience for the API key variables
        match dotenv::dotenv() {
            Ok(path) => log_file_operation("LOAD", &format!("{:?}", path), true, None, None),
            Err(e) => log::info!("No .env file loaded: {}", e),
        }

        let store = SettingsStore::open_default()?;
        let lock_path = store
            .path()
            .parent()
            .map(|dir| dir.join(crate::instance_lock::LOCK_FILE))
            .ok_or("Settings path has no parent directory")?;
        let mut instance_lock = Some(InstanceLock::acquire(&lock_path).map_err(|e| {
            eprintln!("{}", e);
            e
        })?);

        let settings = store.load();
        for backend in Backend::ALL {
            if settings.api_keys.get(backend).is_some() {
                log::info!("✓ {} API key configured", backend.credential_key());
            }
        }
        let first_run = !has_any_credential(&settings);
        let accelerator = settings.accelerator();
        let hotkey_label = settings.hotkey.clone();

        tauri::Builder::default()
            .plugin(setup_logging().build())
            .plugin(tauri_plugin_opener::init())
            .plugin(
                tauri_plugin_global_shortcut::Builder::new()
                    .with_handler(|app, shortcut, event| {
                        crate::shortcut::handle_shortcut(app, shortcut, event.state());
                    })
                    .build(),
            )
            .manage(AppState::new(store, settings))
            .setup(move |app| {
                let setup_start = Instant::now();
                log::info!("🚀 App setup START - version: {}", app_version);
                install_panic_hook();

                #[cfg(target_os = "macos")]
                app.set_activation_policy(tauri::ActivationPolicy::Accessory);

                crate::menu::create_tray(app.handle(), &hotkey_label)?;

                log_start("HOTKEY_SETUP");
                crate::shortcut::register_initial_hotkey(app.handle(), &accelerator);

                if first_run {
                    log::info!("👋 No API key configured, opening settings");
                    show_main_view(app.handle(), "settings");
                }

                log_performance(
                    "APP_SETUP_COMPLETE",
                    setup_start.elapsed().as_millis() as u64,
                    None,
                );
                Ok(())
            })
            .invoke_handler(tauri::generate_handler![
                get_settings,
                save_settings,
                get_tone_presets,
                get_backends,
                get_captured_text,
                get_job_state,
                start_rewrite,
                select_alternative,
                copy_selected_alternative,
                close_popup,
                open_settings,
                check_for_updates,
                get_app_info,
                open_release_page,
            ])
            .on_window_event(|window, event| {
                if let tauri::WindowEvent::CloseRequested { api, .. } = event {
                    // Windows are reused; closing hides them
                    api.prevent_close();
                    let _ = window.hide();
                    if window.label() == POPUP_WINDOW {
                        let state = window.app_handle().state::<AppState>();
                        hide_popup(window.app_handle(), &state);
                    } else if window.label() == MAIN_WINDOW {
                        log::debug!("Main window hidden");
                    }
                }
            })
            .build(tauri::generate_context!())
            .map_err(|e| -> Box<dyn std::error::Error> {
                log_failed("APPLICATION_BUILD", &e.to_string());
                log_with_context(
                    log::Level::Error,
                    "Application build failed",
                    &[("total_startup_time_ms", &app_start.elapsed().as_millis().to_string())],
                );
                eprintln!("Lexia failed to start: {}", e);
                Box::new(e)
            })?
            .run(move |_app_handle, event| {
                if let tauri::RunEvent::Exit = event {
                    log_lifecycle_event("APPLICATION_EXIT", Some(app_version), None);
                    // Removes the lock file before the event loop ends the process
                    instance_lock.take();
                }
            });

        Ok(())
    }
}
