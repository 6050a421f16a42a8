//! Controller state shared between the hotkey handler, commands and the
//! rewrite worker.
//!
//! At most one rewrite runs at a time. [`JobSlot::try_begin`] hands out a
//! [`JobTicket`]; the slot stays busy until that ticket is finished or
//! dropped, so a worker that errors out or panics still frees it.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::hotkey::{replace_hotkey, ShortcutRegistry};
use crate::rewriter::{Backend, RewriteOutcome};
use crate::settings::{Settings, SettingsStore};
use crate::utils::logger::*;

pub type JobId = u64;

/// Minimum spacing between two accepted hotkey presses
pub const HOTKEY_DEBOUNCE: Duration = Duration::from_secs(1);

const INTERRUPTED_MESSAGE: &str = "Error: the rewrite stopped before producing a result.";

/// Snapshot of the job the popup is showing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum JobPhase {
    Idle,
    Running {
        id: JobId,
    },
    Finished {
        id: JobId,
        outcome: RewriteOutcome,
        selected: Option<usize>,
    },
}

#[derive(Debug)]
struct JobRecord {
    id: JobId,
    outcome: Option<RewriteOutcome>,
    selected: Option<usize>,
}

#[derive(Debug, Default)]
struct SlotInner {
    next_id: JobId,
    /// Job holding the latch
    active: Option<JobId>,
    /// Job whose result the popup displays
    current: Option<JobRecord>,
}

#[derive(Debug, Default)]
pub struct JobSlot {
    inner: Mutex<SlotInner>,
}

impl JobSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim the slot. `None` while another job is running; the trigger is
    /// dropped, not queued.
    pub fn try_begin(self: &Arc<Self>) -> Option<JobTicket> {
        let mut inner = self.lock();
        if let Some(active) = inner.active {
            let reason = format!("job {} busy", active);
            log_state_transition("JOB_SLOT", "running", "running", false, Some(&reason));
            return None;
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.active = Some(id);
        inner.current = Some(JobRecord {
            id,
            outcome: None,
            selected: None,
        });
        drop(inner);

        log_state_transition("JOB_SLOT", "idle", "running", true, Some(&format!("job {}", id)));
        Some(JobTicket {
            slot: Arc::clone(self),
            id,
            finished: false,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.lock().active.is_some()
    }

    pub fn phase(&self) -> JobPhase {
        match &self.lock().current {
            None => JobPhase::Idle,
            Some(JobRecord {
                id, outcome: None, ..
            }) => JobPhase::Running { id: *id },
            Some(JobRecord {
                id,
                outcome: Some(outcome),
                selected,
            }) => JobPhase::Finished {
                id: *id,
                outcome: outcome.clone(),
                selected: *selected,
            },
        }
    }

    /// Mark alternative `index` of the finished job as chosen
    pub fn select(&self, index: usize) -> Option<String> {
        let mut inner = self.lock();
        let record = inner.current.as_mut()?;
        let chosen = match &record.outcome {
            Some(RewriteOutcome::Alternatives(list)) => list.get(index)?.clone(),
            _ => return None,
        };
        record.selected = Some(index);
        Some(chosen)
    }

    pub fn selected_alternative(&self) -> Option<String> {
        let inner = self.lock();
        let record = inner.current.as_ref()?;
        match (&record.outcome, record.selected) {
            (Some(RewriteOutcome::Alternatives(list)), Some(i)) => list.get(i).cloned(),
            _ => None,
        }
    }

    /// Forget the displayed job. A job still running keeps the latch and its
    /// eventual result is discarded.
    pub fn dismiss(&self) {
        let mut inner = self.lock();
        if let Some(record) = inner.current.take() {
            log::debug!("Dismissed job {}", record.id);
        }
    }

    fn complete(&self, id: JobId, outcome: Option<RewriteOutcome>) -> bool {
        let mut inner = self.lock();
        if inner.active == Some(id) {
            inner.active = None;
        }

        match inner.current.as_mut() {
            Some(record) if record.id == id && record.outcome.is_none() => {
                record.outcome = Some(outcome.unwrap_or_else(|| {
                    RewriteOutcome::Failed(INTERRUPTED_MESSAGE.to_string())
                }));
                let detail = format!("job {}", id);
                log_state_transition("JOB_SLOT", "running", "finished", true, Some(&detail));
                true
            }
            _ => {
                log::debug!("Discarding stale completion of job {}", id);
                false
            }
        }
    }
}

/// Proof of holding the job slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct JobTicket {
    slot: Arc<JobSlot>,
    id: JobId,
    finished: bool,
}

impl JobTicket {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Record the outcome. Returns false when the job was dismissed meanwhile.
    pub fn finish(mut self, outcome: RewriteOutcome) -> bool {
        self.finished = true;
        self.slot.complete(self.id, Some(outcome))
    }
}

impl Drop for JobTicket {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!("Job {} ended without a result", self.id);
            self.slot.complete(self.id, None);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Accepted,
    /// Too soon after the previous accepted press
    Debounced,
    /// The popup (or a capture for it) is already in progress
    PopupOpen,
}

/// Filters hotkey presses before any selection capture happens
#[derive(Debug)]
pub struct HotkeyGate {
    debounce: Duration,
    last_accepted: Option<Instant>,
    engaged: bool,
}

impl Default for HotkeyGate {
    fn default() -> Self {
        Self::new(HOTKEY_DEBOUNCE)
    }
}

impl HotkeyGate {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_accepted: None,
            engaged: false,
        }
    }

    /// Popup check first, then debounce. An accepted press engages the gate
    /// until [`release`](Self::release).
    pub fn trigger(&mut self, now: Instant) -> GateDecision {
        if self.engaged {
            return GateDecision::PopupOpen;
        }
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.debounce {
                return GateDecision::Debounced;
            }
        }
        self.last_accepted = Some(now);
        self.engaged = true;
        GateDecision::Accepted
    }

    /// Popup closed, or the capture found nothing to show
    pub fn release(&mut self) {
        self.engaged = false;
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}

/// Everything the desktop shell keeps between events
pub struct AppState {
    pub store: SettingsStore,
    pub settings: Mutex<Settings>,
    pub captured_text: Mutex<Option<String>>,
    pub gate: Mutex<HotkeyGate>,
    pub jobs: Arc<JobSlot>,
    /// Accelerator currently registered with the OS
    pub registered_hotkey: Mutex<Option<String>>,
}

impl AppState {
    pub fn new(store: SettingsStore, settings: Settings) -> Self {
        Self {
            store,
            settings: Mutex::new(settings),
            captured_text: Mutex::new(None),
            gate: Mutex::new(HotkeyGate::default()),
            jobs: JobSlot::new(),
            registered_hotkey: Mutex::new(None),
        }
    }

    fn settings_guard(&self) -> MutexGuard<'_, Settings> {
        self.settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn settings_snapshot(&self) -> Settings {
        self.settings_guard().clone()
    }

    /// Validate and persist `new`, registering its hotkey first when it
    /// changed. A failed save puts the previous hotkey back and leaves the
    /// in-memory settings untouched. Returns whether the hotkey changed.
    pub fn apply_settings(
        &self,
        new: Settings,
        registry: &dyn ShortcutRegistry,
    ) -> Result<bool, String> {
        new.validate().map_err(|e| e.to_string())?;

        let previous = self.settings_snapshot();
        let hotkey_changed = previous.accelerator() != new.accelerator();
        if hotkey_changed {
            log::info!("Hotkey changed: {} -> {}", previous.hotkey, new.hotkey);
            replace_hotkey(registry, &self.registered_hotkey, &new.accelerator())?;
        }

        if let Err(e) = self.store.save(&new) {
            log_failed("SAVE_SETTINGS", &e.to_string());
            if hotkey_changed {
                let accelerator = previous.accelerator();
                let restored = replace_hotkey(registry, &self.registered_hotkey, &accelerator);
                if let Err(restore) = restored {
                    log::error!("Failed to restore hotkey {}: {}", accelerator, restore);
                }
            }
            return Err(e.to_string());
        }

        *self.settings_guard() = new;
        Ok(hotkey_changed)
    }

    /// Claim the job slot for a popup-triggered rewrite. A backend picked in
    /// the popup is used for the job and becomes the saved default, but only
    /// once the slot is ours; a busy slot changes nothing.
    pub fn begin_rewrite(&self, backend: Option<Backend>) -> Option<(JobTicket, Settings)> {
        let ticket = self.jobs.try_begin()?;

        let mut settings = self.settings_guard();
        let mut effective = settings.clone();
        if let Some(backend) = backend.filter(|b| *b != settings.model) {
            effective.model = backend;
            match self.store.save(&effective) {
                Ok(()) => {
                    settings.model = backend;
                    log::info!("Default backend changed to {}", backend.id());
                }
                Err(e) => log::warn!("Failed to persist backend choice: {}", e),
            }
        }
        drop(settings);

        Some((ticket, effective))
    }

    pub fn set_captured_text(&self, text: Option<String>) {
        match self.captured_text.lock() {
            Ok(mut guard) => *guard = text,
            Err(poisoned) => *poisoned.into_inner() = text,
        }
    }

    pub fn captured_text(&self) -> Option<String> {
        self.captured_text
            .lock()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Popup hidden: free the hotkey and forget the shown job
    pub fn close_popup(&self) {
        match self.gate.lock() {
            Ok(mut gate) => gate.release(),
            Err(poisoned) => poisoned.into_inner().release(),
        }
        self.jobs.dismiss();
        self.set_captured_text(None);
    }
}
