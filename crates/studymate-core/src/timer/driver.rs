//! Once-per-second tick source for the shared session.
//!
//! The driver owns a single tokio task. While the timer is running the task
//! holds a 1 s interval; whenever the running flag, the phase or a duration
//! changes, that interval is dropped and a fresh one is armed. Dropping the
//! driver aborts the task, so no tick outlives its owner.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::engine::CycleTimer;
use crate::events::Event;
use crate::session::SessionHandle;

const TICK: Duration = Duration::from_secs(1);

pub struct TimerDriver {
    task: JoinHandle<()>,
}

impl TimerDriver {
    /// Start driving `session`. Must be called inside a tokio runtime.
    pub fn spawn(session: SessionHandle) -> Self {
        Self {
            task: tokio::spawn(drive(session)),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn drive(session: SessionHandle) {
    let mut rx = session.subscribe();
    loop {
        let params = rx.borrow_and_update().timer.tick_params();
        if !params.running {
            if rx.changed().await.is_err() {
                return;
            }
            continue;
        }

        debug!(phase = ?params.phase, "arming tick interval");
        let mut interval = interval_at(Instant::now() + TICK, TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Some(Event::PhaseChanged { to, completed_cycles, .. }) =
                        session.timer(CycleTimer::tick)
                    {
                        info!(phase = to.label(), completed_cycles, "phase changed");
                    }
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if rx.borrow_and_update().timer.tick_params() != params {
                        break;
                    }
                }
            }
        }
    }
}
