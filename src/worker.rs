//! Background rewrite job.
//!
//! The worker owns its [`JobTicket`] for the whole run. It never touches UI
//! state; it hands back a [`JobReport`] and the caller decides what to emit.

use serde::Serialize;
use std::time::Instant;

use crate::rewriter::{Backend, ChatClient, RewriteOutcome, Rewriter, Tone};
use crate::state::{JobId, JobTicket};
use crate::utils::logger::*;

/// Payload of the `rewrite-finished` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    pub job_id: JobId,
    pub outcome: RewriteOutcome,
    /// False when the popup was dismissed before the job finished
    pub recorded: bool,
}

/// Inputs captured when the job was started
#[derive(Debug, Clone)]
pub struct JobInput {
    pub text: String,
    pub tone: Tone,
    pub count: usize,
    pub backend: Backend,
}

pub async fn run_job<C: ChatClient>(
    ticket: JobTicket,
    rewriter: &Rewriter<C>,
    input: JobInput,
) -> JobReport {
    let started = Instant::now();
    let job_id = ticket.id();
    log_start("REWRITE_JOB");

    let outcome = rewriter
        .rewrite_text(&input.text, input.tone, input.count, input.backend)
        .await;

    log_with_context(
        log::Level::Debug,
        "Rewrite job done",
        &[
            ("job", &job_id.to_string()),
            ("success", &outcome.is_success().to_string()),
        ],
    );
    log_complete("REWRITE_JOB", started.elapsed().as_millis() as u64);

    let recorded = ticket.finish(outcome.clone());
    JobReport {
        job_id,
        outcome,
        recorded,
    }
}
