use serde_json::json;
use tauri::{AppHandle, Emitter, State};

use crate::clipboard::copy_to_system;
use crate::commands::window::hide_popup;
use crate::rewriter::{Backend, HttpChatClient, RewriteOutcome, Rewriter, Tone};
use crate::state::{AppState, JobId, JobPhase};
use crate::utils::logger::*;
use crate::worker::{run_job, JobInput, JobReport};

#[tauri::command]
pub async fn get_captured_text(state: State<'_, AppState>) -> Result<Option<String>, String> {
    Ok(state.captured_text())
}

#[tauri::command]
pub async fn get_job_state(state: State<'_, AppState>) -> Result<JobPhase, String> {
    Ok(state.jobs.phase())
}

/// Start a rewrite of `text` (or the captured selection). Returns the job
/// id, or `None` when a rewrite is already running.
#[tauri::command]
pub async fn start_rewrite(
    app: AppHandle,
    state: State<'_, AppState>,
    tone: String,
    backend: Option<Backend>,
    text: Option<String>,
) -> Result<Option<JobId>, String> {
    let text = text.or_else(|| state.captured_text()).unwrap_or_default();

    let Some((ticket, settings)) = state.begin_rewrite(backend) else {
        log::info!("Rewrite already in progress, ignoring request");
        return Ok(None);
    };
    let job_id = ticket.id();

    let input = JobInput {
        text,
        tone: Tone::parse(&tone),
        count: settings.num_alternatives,
        backend: settings.model,
    };

    if let Err(e) = app.emit("rewrite-started", json!({ "job_id": job_id })) {
        log::warn!("Failed to emit rewrite-started: {}", e);
    }

    tauri::async_runtime::spawn(async move {
        let report = match HttpChatClient::new() {
            Ok(client) => {
                let rewriter = Rewriter::new(client, settings);
                run_job(ticket, &rewriter, input).await
            }
            Err(e) => {
                log_failed("REWRITE_JOB", &e.to_string());
                let outcome = RewriteOutcome::from_error(&e);
                let recorded = ticket.finish(outcome.clone());
                JobReport {
                    job_id,
                    outcome,
                    recorded,
                }
            }
        };

        if !report.recorded {
            log::debug!("Job {} finished after the popup closed", report.job_id);
            return;
        }
        if let Err(e) = app.emit("rewrite-finished", &report) {
            log::error!("Failed to emit rewrite-finished: {}", e);
        }
    });

    Ok(Some(job_id))
}

#[tauri::command]
pub async fn select_alternative(
    state: State<'_, AppState>,
    index: usize,
) -> Result<String, String> {
    state
        .jobs
        .select(index)
        .ok_or_else(|| format!("No alternative {} to select", index + 1))
}

/// Copy the chosen alternative and close the popup
#[tauri::command]
pub async fn copy_selected_alternative(
    app: AppHandle,
    state: State<'_, AppState>,
    index: Option<usize>,
) -> Result<(), String> {
    if let Some(index) = index {
        state
            .jobs
            .select(index)
            .ok_or_else(|| format!("No alternative {} to select", index + 1))?;
    }

    let text = state
        .jobs
        .selected_alternative()
        .ok_or_else(|| "No alternative selected".to_string())?;

    copy_to_system(&text).map_err(|e| {
        log_failed("COPY_ALTERNATIVE", &e.to_string());
        e.to_string()
    })?;
    log::info!("Copied alternative ({} chars) to clipboard", text.len());

    hide_popup(&app, &state);
    Ok(())
}
