//! An [`IntervalTimer`] bound to device-local storage.
//!
//! A study-room session for a plan persists its full snapshot under
//! `study_room_state_<planId>` on every state change, so closing and
//! reopening the app resumes it (time spent closed is counted by the first
//! tick after restore). The snapshot is cleared when the last session
//! completes or the session is discarded.
//!
//! The classic timer has no plan. It remembers only its last-used settings
//! under `classic_focus_state`, never a resumable session.

use std::sync::Arc;

use satprep_core::error::CoreError;
use satprep_core::timer::{IntervalTimer, TimerEvent, TimerMode, TimerSettings, TimerSnapshot};
use satprep_core::types::{DbId, Timestamp};

use crate::local_store::{load_json, save_json, study_room_key, KeyValueStore, StorageError, CLASSIC_FOCUS_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBinding {
    /// The study room of one plan.
    Plan(DbId),
    /// The standalone timer.
    Classic,
}

#[derive(Debug, thiserror::Error)]
pub enum FocusError {
    #[error(transparent)]
    Timer(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct FocusSession {
    store: Arc<dyn KeyValueStore>,
    binding: SessionBinding,
    timer: IntervalTimer,
}

impl FocusSession {
    /// Open the session for `binding`, resuming whatever was persisted.
    ///
    /// Unreadable saved state is discarded with a warning and the session
    /// starts from `defaults`.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        binding: SessionBinding,
        defaults: TimerSettings,
    ) -> Result<Self, FocusError> {
        let key = storage_key(binding);

        let timer = match binding {
            SessionBinding::Plan(plan_id) => match load_json::<TimerSnapshot>(store.as_ref(), &key) {
                Ok(Some(snapshot)) => {
                    tracing::debug!(%plan_id, mode = ?snapshot.mode, "Resuming study room timer");
                    IntervalTimer::restore(&snapshot)
                }
                Ok(None) => IntervalTimer::new(defaults),
                Err(StorageError::Json(e)) => {
                    tracing::warn!(%plan_id, error = %e, "Discarding unreadable timer state");
                    store.remove(&key)?;
                    IntervalTimer::new(defaults)
                }
                Err(e) => return Err(e.into()),
            },
            SessionBinding::Classic => match load_json::<TimerSettings>(store.as_ref(), &key) {
                Ok(saved) => IntervalTimer::new(saved.unwrap_or(defaults)),
                Err(StorageError::Json(e)) => {
                    tracing::warn!(error = %e, "Discarding unreadable classic timer settings");
                    store.remove(&key)?;
                    IntervalTimer::new(defaults)
                }
                Err(e) => return Err(e.into()),
            },
        };

        Ok(Self {
            store,
            binding,
            timer,
        })
    }

    pub fn binding(&self) -> SessionBinding {
        self.binding
    }

    pub fn timer(&self) -> &IntervalTimer {
        &self.timer
    }

    pub fn start(&mut self, settings: TimerSettings, now: Timestamp) -> Result<(), FocusError> {
        self.timer.start(settings, now)?;
        self.save_settings()?;
        self.save_snapshot()
    }

    /// Advance the countdown. State is persisted before the events are
    /// handed back.
    pub fn tick(&mut self, now: Timestamp) -> Result<Vec<TimerEvent>, FocusError> {
        let before = self.timer.snapshot();
        let events = self.timer.tick(now);
        self.after_change(&before, &events)?;
        Ok(events)
    }

    pub fn toggle(&mut self, now: Timestamp) -> Result<Vec<TimerEvent>, FocusError> {
        let before = self.timer.snapshot();
        let events = self.timer.toggle(now);
        self.after_change(&before, &events)?;
        Ok(events)
    }

    pub fn reset(&mut self, target: TimerMode) -> Result<(), FocusError> {
        self.timer.reset(target);
        self.save_snapshot()
    }

    pub fn reconfigure(
        &mut self,
        settings: TimerSettings,
        now: Timestamp,
    ) -> Result<Vec<TimerEvent>, FocusError> {
        let before = self.timer.snapshot();
        let events = self.timer.reconfigure(settings, now)?;
        self.save_settings()?;
        self.after_change(&before, &events)?;
        Ok(events)
    }

    /// Abandon the session and forget any saved plan state.
    pub fn discard(self) -> Result<(), FocusError> {
        if let SessionBinding::Plan(plan_id) = self.binding {
            self.store.remove(&study_room_key(plan_id))?;
            tracing::debug!(%plan_id, "Study room timer discarded");
        }
        Ok(())
    }

    fn after_change(
        &self,
        before: &TimerSnapshot,
        events: &[TimerEvent],
    ) -> Result<(), FocusError> {
        if events.contains(&TimerEvent::AllSessionsComplete) {
            if let SessionBinding::Plan(plan_id) = self.binding {
                self.store.remove(&study_room_key(plan_id))?;
                tracing::info!(%plan_id, "Study room sessions complete");
            }
            return Ok(());
        }
        if self.timer.snapshot() != *before {
            self.save_snapshot()?;
        }
        Ok(())
    }

    fn save_snapshot(&self) -> Result<(), FocusError> {
        if let SessionBinding::Plan(plan_id) = self.binding {
            save_json(self.store.as_ref(), &study_room_key(plan_id), &self.timer.snapshot())?;
        }
        Ok(())
    }

    fn save_settings(&self) -> Result<(), FocusError> {
        if self.binding == SessionBinding::Classic {
            save_json(self.store.as_ref(), CLASSIC_FOCUS_KEY, &self.timer.settings())?;
        }
        Ok(())
    }
}

fn storage_key(binding: SessionBinding) -> String {
    match binding {
        SessionBinding::Plan(plan_id) => study_room_key(plan_id),
        SessionBinding::Classic => CLASSIC_FOCUS_KEY.to_string(),
    }
}
