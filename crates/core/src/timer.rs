//! Focus/break interval timer.
//!
//! ```text
//! idle --start--> focus --0--> break --0--> focus --0--> ... --0 (last)--> idle
//! ```
//!
//! The countdown is driven by wall-clock deltas: every [`IntervalTimer::tick`]
//! subtracts the whole seconds elapsed since the previous tick, so a
//! throttled or backgrounded ticker neither drifts nor fast-forwards.
//! Sub-second remainders carry over to the next tick.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Default focus length in minutes.
pub const DEFAULT_FOCUS_MINUTES: u32 = 25;

/// Default break length in minutes.
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// Default number of focus sessions per cycle.
pub const DEFAULT_SESSIONS: u32 = 4;

/// Immutable timer configuration, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TimerSettings {
    #[serde(rename = "focus")]
    #[validate(range(min = 1, max = 240))]
    pub focus_minutes: u32,
    #[serde(rename = "break")]
    #[validate(range(min = 1, max = 120))]
    pub break_minutes: u32,
    #[validate(range(min = 1, max = 24))]
    pub sessions: u32,
}

impl TimerSettings {
    pub fn focus_secs(&self) -> u64 {
        u64::from(self.focus_minutes) * 60
    }

    pub fn break_secs(&self) -> u64 {
        u64::from(self.break_minutes) * 60
    }

    fn checked(self) -> Result<Self, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(format!("Invalid timer settings: {e}")))?;
        Ok(self)
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            sessions: DEFAULT_SESSIONS,
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Idle,
    Focus,
    Break,
}

/// Side effects the owner of the timer should perform (sound, callback).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A focus session ended and a break began.
    SessionComplete { session: u32 },
    /// A break ended and the next focus session began.
    BreakComplete { next_session: u32 },
    /// The final focus session ended; the timer is idle again.
    AllSessionsComplete,
}

/// Persisted form of a timer, written on every state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub time_left: u64,
    pub mode: TimerMode,
    pub current_session: u32,
    pub settings: TimerSettings,
    pub is_completed: bool,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub last_tick: Option<Timestamp>,
}

/// The interval timer state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTimer {
    mode: TimerMode,
    time_left: u64,
    current_session: u32,
    settings: TimerSettings,
    running: bool,
    last_tick: Option<Timestamp>,
    completed: bool,
}

impl IntervalTimer {
    /// An idle timer holding `settings` for display.
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            mode: TimerMode::Idle,
            time_left: settings.focus_secs(),
            current_session: 1,
            settings,
            running: false,
            last_tick: None,
            completed: false,
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn current_session(&self) -> u32 {
        self.current_session
    }

    pub fn settings(&self) -> TimerSettings {
        self.settings
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Begin the first focus session.
    pub fn start(&mut self, settings: TimerSettings, now: Timestamp) -> Result<(), CoreError> {
        if self.mode != TimerMode::Idle {
            return Err(CoreError::Conflict(
                "Timer already has an active session".into(),
            ));
        }
        let settings = settings.checked()?;
        self.settings = settings;
        self.mode = TimerMode::Focus;
        self.time_left = settings.focus_secs();
        self.current_session = 1;
        self.running = true;
        self.last_tick = Some(now);
        self.completed = false;
        Ok(())
    }

    /// Apply the wall-clock time elapsed since the previous tick.
    pub fn tick(&mut self, now: Timestamp) -> Vec<TimerEvent> {
        if !self.running || self.mode == TimerMode::Idle {
            return Vec::new();
        }
        let Some(last) = self.last_tick else {
            self.last_tick = Some(now);
            return Vec::new();
        };

        let elapsed = (now - last).num_seconds();
        if elapsed < 0 {
            // Clock moved backwards; re-anchor without counting.
            self.last_tick = Some(now);
            return Vec::new();
        }
        if elapsed == 0 {
            return Vec::new();
        }

        self.last_tick = Some(last + Duration::seconds(elapsed));
        self.time_left = self.time_left.saturating_sub(elapsed.unsigned_abs());

        if self.time_left == 0 {
            self.advance_phase(now).into_iter().collect()
        } else {
            Vec::new()
        }
    }

    /// Pause a running timer or resume a paused one.
    ///
    /// Pausing first applies the time elapsed up to `now`; resuming starts
    /// counting from `now`. Neither changes the mode or resets the countdown.
    pub fn toggle(&mut self, now: Timestamp) -> Vec<TimerEvent> {
        if self.mode == TimerMode::Idle {
            return Vec::new();
        }
        if self.running {
            let events = self.tick(now);
            if self.mode != TimerMode::Idle {
                self.running = false;
                self.last_tick = None;
            }
            events
        } else {
            self.running = true;
            self.last_tick = Some(now);
            Vec::new()
        }
    }

    /// Stop the timer and restore the focus duration and first session.
    pub fn reset(&mut self, target: TimerMode) {
        self.running = false;
        self.last_tick = None;
        self.time_left = self.settings.focus_secs();
        self.current_session = 1;
        self.mode = target;
        self.completed = false;
    }

    /// Replace the settings of a timer, possibly mid-session.
    ///
    /// Seconds already spent in the current phase are kept: the remaining
    /// time becomes the new phase length minus that elapsed time (floored at
    /// zero, which completes the phase). The session counter is clamped to
    /// the new session count.
    pub fn reconfigure(
        &mut self,
        settings: TimerSettings,
        now: Timestamp,
    ) -> Result<Vec<TimerEvent>, CoreError> {
        let settings = settings.checked()?;

        if self.mode == TimerMode::Idle {
            self.settings = settings;
            self.time_left = settings.focus_secs();
            return Ok(Vec::new());
        }

        let mut events = self.tick(now);
        if self.mode == TimerMode::Idle {
            self.settings = settings;
            return Ok(events);
        }

        let elapsed = self.phase_length().saturating_sub(self.time_left);
        self.settings = settings;
        self.current_session = self.current_session.min(settings.sessions);
        self.time_left = self.phase_length().saturating_sub(elapsed);

        if self.time_left == 0 {
            events.extend(self.advance_phase(now));
        }
        Ok(events)
    }

    /// Capture the persisted form.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            time_left: self.time_left,
            mode: self.mode,
            current_session: self.current_session,
            settings: self.settings,
            is_completed: self.completed,
            is_running: self.running,
            last_tick: self.last_tick,
        }
    }

    /// Rebuild a timer from a persisted snapshot.
    ///
    /// A snapshot saved while running keeps its last tick, so the first
    /// tick after restoring accounts for the time the app was closed.
    pub fn restore(snapshot: &TimerSnapshot) -> Self {
        let running = snapshot.is_running && snapshot.mode != TimerMode::Idle;
        Self {
            mode: snapshot.mode,
            time_left: snapshot.time_left,
            current_session: snapshot.current_session.max(1),
            settings: snapshot.settings,
            running,
            last_tick: if running { snapshot.last_tick } else { None },
            completed: snapshot.is_completed,
        }
    }

    fn phase_length(&self) -> u64 {
        match self.mode {
            TimerMode::Break => self.settings.break_secs(),
            TimerMode::Focus | TimerMode::Idle => self.settings.focus_secs(),
        }
    }

    fn advance_phase(&mut self, now: Timestamp) -> Option<TimerEvent> {
        match self.mode {
            TimerMode::Focus if self.current_session < self.settings.sessions => {
                self.mode = TimerMode::Break;
                self.time_left = self.settings.break_secs();
                self.last_tick = Some(now);
                Some(TimerEvent::SessionComplete {
                    session: self.current_session,
                })
            }
            TimerMode::Focus => {
                self.mode = TimerMode::Idle;
                self.running = false;
                self.last_tick = None;
                self.time_left = 0;
                self.completed = true;
                Some(TimerEvent::AllSessionsComplete)
            }
            TimerMode::Break => {
                self.mode = TimerMode::Focus;
                self.current_session += 1;
                self.time_left = self.settings.focus_secs();
                self.last_tick = Some(now);
                Some(TimerEvent::BreakComplete {
                    next_session: self.current_session,
                })
            }
            TimerMode::Idle => None,
        }
    }
}

impl Default for IntervalTimer {
    fn default() -> Self {
        Self::new(TimerSettings::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
