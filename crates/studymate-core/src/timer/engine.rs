//! Study/break cycle state machine.
//!
//! The timer is tick-driven: it has no clock of its own. Whoever owns it
//! calls `tick()` once per second while it is running (see
//! [`super::TimerDriver`]).
//!
//! ## State Transitions
//!
//! ```text
//! Idle(Study) <-> Running(Study) --0--> Running(Break) --0--> Running(Study) (+1 cycle)
//!      ^              |                     |
//!      +--- reset ----+---------------------+
//! ```
//!
//! ## Usage
//!
//! ```
//! use studymate_core::timer::{CycleTimer, Phase};
//!
//! let mut timer = CycleTimer::new(1, 1);
//! timer.start();
//! for _ in 0..60 {
//!     timer.tick();
//! }
//! assert_eq!(timer.phase(), Phase::Break);
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;

pub const MIN_STUDY_MINUTES: u32 = 1;
pub const MAX_STUDY_MINUTES: u32 = 60;
pub const MIN_BREAK_MINUTES: u32 = 1;
pub const MAX_BREAK_MINUTES: u32 = 30;
pub const DEFAULT_STUDY_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Study,
    Break,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Study => "Study",
            Phase::Break => "Break",
        }
    }
}

/// The parameters that govern the tick interval. The driver recreates its
/// interval whenever these change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickParams {
    pub running: bool,
    pub phase: Phase,
    pub study_minutes: u32,
    pub break_minutes: u32,
}

/// Pomodoro cycle timer.
///
/// `seconds_remaining` always stays within `0..=max(study, break) * 60`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredTimer")]
pub struct CycleTimer {
    study_minutes: u32,
    break_minutes: u32,
    seconds_remaining: u32,
    running: bool,
    phase: Phase,
    completed_cycles: u32,
}

/// Serialized form of [`CycleTimer`]. Loaded values go through the same
/// clamps as commands do.
#[derive(Deserialize)]
struct StoredTimer {
    study_minutes: u32,
    break_minutes: u32,
    seconds_remaining: u32,
    #[serde(default)]
    running: bool,
    phase: Phase,
    #[serde(default)]
    completed_cycles: u32,
}

impl From<StoredTimer> for CycleTimer {
    fn from(stored: StoredTimer) -> Self {
        let mut timer = CycleTimer::new(stored.study_minutes, stored.break_minutes);
        let phase_seconds = match stored.phase {
            Phase::Study => timer.study_minutes * 60,
            Phase::Break => timer.break_minutes * 60,
        };
        timer.phase = stored.phase;
        timer.seconds_remaining = stored.seconds_remaining.min(phase_seconds);
        timer.running = stored.running;
        timer.completed_cycles = stored.completed_cycles;
        timer
    }
}

impl Default for CycleTimer {
    fn default() -> Self {
        Self::new(DEFAULT_STUDY_MINUTES, DEFAULT_BREAK_MINUTES)
    }
}

impl CycleTimer {
    /// Create an idle timer in the study phase. Durations are clamped.
    pub fn new(study_minutes: u32, break_minutes: u32) -> Self {
        let study_minutes = clamp_study(study_minutes);
        let break_minutes = clamp_break(break_minutes);
        Self {
            study_minutes,
            break_minutes,
            seconds_remaining: study_minutes * 60,
            running: false,
            phase: Phase::Study,
            completed_cycles: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn study_minutes(&self) -> u32 {
        self.study_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn completed_cycles(&self) -> u32 {
        self.completed_cycles
    }

    pub fn tick_params(&self) -> TickParams {
        TickParams {
            running: self.running,
            phase: self.phase,
            study_minutes: self.study_minutes,
            break_minutes: self.break_minutes,
        }
    }

    /// Remaining time as `MM:SS`.
    pub fn clock(&self) -> String {
        format_clock(self.seconds_remaining)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            running: self.running,
            clock: self.clock(),
            seconds_remaining: self.seconds_remaining,
            study_minutes: self.study_minutes,
            break_minutes: self.break_minutes,
            completed_cycles: self.completed_cycles,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.running {
            return None;
        }
        self.running = true;
        Some(Event::TimerStarted {
            phase: self.phase,
            seconds_remaining: self.seconds_remaining,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        Some(Event::TimerPaused {
            phase: self.phase,
            seconds_remaining: self.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Start when idle, pause when running.
    pub fn toggle(&mut self) -> Option<Event> {
        if self.running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Back to an idle study phase at full length. Keeps `completed_cycles`.
    pub fn reset(&mut self) -> Option<Event> {
        self.running = false;
        self.phase = Phase::Study;
        self.seconds_remaining = self.study_minutes * 60;
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Call once per second. Returns `Some(Event::PhaseChanged)` when the
    /// countdown reaches zero and the other phase begins.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        self.advance_if_elapsed()
    }

    /// Flip the phase if the countdown is at zero while running.
    /// The next phase starts immediately; `running` is left as is.
    pub fn advance_if_elapsed(&mut self) -> Option<Event> {
        if !self.running || self.seconds_remaining > 0 {
            return None;
        }
        let from = self.phase;
        match self.phase {
            Phase::Break => {
                self.completed_cycles += 1;
                self.phase = Phase::Study;
                self.seconds_remaining = self.study_minutes * 60;
            }
            Phase::Study => {
                self.phase = Phase::Break;
                self.seconds_remaining = self.break_minutes * 60;
            }
        }
        Some(Event::PhaseChanged {
            from,
            to: self.phase,
            seconds_remaining: self.seconds_remaining,
            completed_cycles: self.completed_cycles,
            at: Utc::now(),
        })
    }

    /// Set the study length (clamped to 1..=60). Rejected while running.
    pub fn set_study_minutes(&mut self, minutes: u32) -> Option<Event> {
        if self.running {
            return None;
        }
        self.study_minutes = clamp_study(minutes);
        if self.phase == Phase::Study {
            self.seconds_remaining = self.study_minutes * 60;
        }
        Some(self.adjusted())
    }

    /// Set the break length (clamped to 1..=30). Rejected while running.
    pub fn set_break_minutes(&mut self, minutes: u32) -> Option<Event> {
        if self.running {
            return None;
        }
        self.break_minutes = clamp_break(minutes);
        if self.phase == Phase::Break {
            self.seconds_remaining = self.break_minutes * 60;
        }
        Some(self.adjusted())
    }

    /// Shift the study length by `delta` minutes.
    pub fn adjust_study_minutes(&mut self, delta: i32) -> Option<Event> {
        self.set_study_minutes(offset(self.study_minutes, delta))
    }

    /// Shift the break length by `delta` minutes.
    pub fn adjust_break_minutes(&mut self, delta: i32) -> Option<Event> {
        self.set_break_minutes(offset(self.break_minutes, delta))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn adjusted(&self) -> Event {
        Event::DurationsAdjusted {
            study_minutes: self.study_minutes,
            break_minutes: self.break_minutes,
            seconds_remaining: self.seconds_remaining,
            at: Utc::now(),
        }
    }
}

fn clamp_study(minutes: u32) -> u32 {
    minutes.clamp(MIN_STUDY_MINUTES, MAX_STUDY_MINUTES)
}

fn clamp_break(minutes: u32) -> u32 {
    minutes.clamp(MIN_BREAK_MINUTES, MAX_BREAK_MINUTES)
}

fn offset(current: u32, delta: i32) -> u32 {
    (i64::from(current) + i64::from(delta)).clamp(0, i64::from(u32::MAX)) as u32
}

/// Format seconds as zero-padded `MM:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_values_are_clamped_on_load() {
        let json = r#"{"study_minutes":500,"break_minutes":0,"seconds_remaining":99999,
            "running":false,"phase":"study","completed_cycles":3}"#;
        let timer: CycleTimer = serde_json::from_str(json).unwrap();
        assert_eq!(timer.study_minutes(), MAX_STUDY_MINUTES);
        assert_eq!(timer.break_minutes(), MIN_BREAK_MINUTES);
        assert_eq!(timer.seconds_remaining(), MAX_STUDY_MINUTES * 60);
        assert_eq!(timer.completed_cycles(), 3);

        let json = r#"{"study_minutes":25,"break_minutes":5,"seconds_remaining":1000,
            "running":true,"phase":"break","completed_cycles":0}"#;
        let timer: CycleTimer = serde_json::from_str(json).unwrap();
        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.seconds_remaining(), 300);
        assert!(timer.is_running());
    }

    #[test]
    fn valid_state_survives_a_round_trip() {
        let mut timer = CycleTimer::new(20, 5);
        timer.start();
        for _ in 0..90 {
            timer.tick();
        }
        let back: CycleTimer = serde_json::from_str(&serde_json::to_string(&timer).unwrap()).unwrap();
        assert_eq!(back, timer);
    }

    fn run_to_zero(timer: &mut CycleTimer) -> Option<Event> {
        let mut last = None;
        for _ in 0..timer.seconds_remaining() {
            last = timer.tick();
        }
        last
    }

    #[test]
    fn starts_idle_in_study_phase() {
        let timer = CycleTimer::default();
        assert!(!timer.is_running());
        assert_eq!(timer.phase(), Phase::Study);
        assert_eq!(timer.seconds_remaining(), 25 * 60);
        assert_eq!(timer.completed_cycles(), 0);
    }

    #[test]
    fn start_pause_keep_remaining_and_phase() {
        let mut timer = CycleTimer::new(10, 2);
        assert!(timer.start().is_some());
        assert!(timer.start().is_none());
        timer.tick();
        timer.tick();
        assert!(timer.pause().is_some());
        assert_eq!(timer.seconds_remaining(), 10 * 60 - 2);
        assert_eq!(timer.phase(), Phase::Study);
        assert!(timer.tick().is_none());
        assert_eq!(timer.seconds_remaining(), 10 * 60 - 2);
    }

    #[test]
    fn study_to_break_keeps_cycles_and_running() {
        let mut timer = CycleTimer::new(1, 3);
        timer.start();
        let event = run_to_zero(&mut timer);
        assert!(matches!(
            event,
            Some(Event::PhaseChanged { from: Phase::Study, to: Phase::Break, .. })
        ));
        assert!(timer.is_running());
        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.seconds_remaining(), 3 * 60);
        assert_eq!(timer.completed_cycles(), 0);
    }

    #[test]
    fn break_to_study_counts_a_cycle() {
        let mut timer = CycleTimer::new(1, 1);
        timer.start();
        run_to_zero(&mut timer);
        run_to_zero(&mut timer);
        assert_eq!(timer.phase(), Phase::Study);
        assert_eq!(timer.seconds_remaining(), 60);
        assert_eq!(timer.completed_cycles(), 1);
    }

    #[test]
    fn reset_keeps_completed_cycles() {
        let mut timer = CycleTimer::new(1, 1);
        timer.start();
        run_to_zero(&mut timer);
        run_to_zero(&mut timer);
        run_to_zero(&mut timer);
        timer.reset();
        assert!(!timer.is_running());
        assert_eq!(timer.phase(), Phase::Study);
        assert_eq!(timer.seconds_remaining(), 60);
        assert_eq!(timer.completed_cycles(), 1);
    }

    #[test]
    fn adjust_clamps_and_recomputes_displayed_phase() {
        let mut timer = CycleTimer::new(25, 5);
        timer.adjust_study_minutes(50);
        assert_eq!(timer.study_minutes(), 60);
        assert_eq!(timer.seconds_remaining(), 3600);
        timer.adjust_study_minutes(-100);
        assert_eq!(timer.study_minutes(), 1);
        assert_eq!(timer.seconds_remaining(), 60);

        // Break is not displayed: remaining stays on the study length.
        timer.set_break_minutes(99);
        assert_eq!(timer.break_minutes(), 30);
        assert_eq!(timer.seconds_remaining(), 60);
        timer.set_break_minutes(0);
        assert_eq!(timer.break_minutes(), 1);
    }

    #[test]
    fn adjust_in_break_phase_recomputes_break() {
        let mut timer = CycleTimer::new(1, 5);
        timer.start();
        run_to_zero(&mut timer);
        timer.pause();
        assert_eq!(timer.phase(), Phase::Break);
        timer.set_break_minutes(7);
        assert_eq!(timer.seconds_remaining(), 7 * 60);
        timer.set_study_minutes(30);
        assert_eq!(timer.seconds_remaining(), 7 * 60);
    }

    #[test]
    fn adjust_is_rejected_while_running() {
        let mut timer = CycleTimer::new(25, 5);
        timer.start();
        assert!(timer.set_study_minutes(40).is_none());
        assert!(timer.adjust_break_minutes(1).is_none());
        assert_eq!(timer.study_minutes(), 25);
        assert_eq!(timer.break_minutes(), 5);
    }

    #[test]
    fn clock_is_zero_padded() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let timer = CycleTimer::new(20, 5);
        match timer.snapshot() {
            Event::StateSnapshot {
                phase,
                running,
                clock,
                seconds_remaining,
                ..
            } => {
                assert_eq!(phase, Phase::Study);
                assert!(!running);
                assert_eq!(clock, "20:00");
                assert_eq!(seconds_remaining, 1200);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}
