use clap::Subcommand;
use studymate_core::timer::{format_clock, CycleTimer, TimerDriver};
use studymate_core::{Config, Event, SessionHandle};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{sleep, Duration};

use super::{open_companion, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Start the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Start if paused, pause if running
    Toggle,
    /// Back to an idle study phase
    Reset,
    /// Set the study length in minutes (1-60)
    Study { minutes: u32 },
    /// Set the break length in minutes (1-30)
    Break { minutes: u32 },
    /// Run the timer in the foreground until Ctrl-C
    Run {
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
}

pub async fn run(action: TimerAction) -> CmdResult {
    let app = open_companion(&Config::load()?).await?;
    let session = app.session().clone();

    let event = match action {
        TimerAction::Status => Some(session.snapshot().timer.snapshot()),
        TimerAction::Start => session.timer(CycleTimer::start),
        TimerAction::Pause => session.timer(CycleTimer::pause),
        TimerAction::Toggle => session.timer(CycleTimer::toggle),
        TimerAction::Reset => session.timer(CycleTimer::reset),
        TimerAction::Study { minutes } => durations(&session, |t| t.set_study_minutes(minutes)),
        TimerAction::Break { minutes } => durations(&session, |t| t.set_break_minutes(minutes)),
        TimerAction::Run { seconds } => {
            let mut events = app.subscribe();
            session.timer(CycleTimer::start);
            let driver = TimerDriver::spawn(session.clone());
            let mut watcher = session.subscribe();
            let stop = async {
                match seconds {
                    Some(s) => sleep(Duration::from_secs(s)).await,
                    None => {
                        let _ = tokio::signal::ctrl_c().await;
                    }
                }
            };
            tokio::pin!(stop);

            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    changed = watcher.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let timer = watcher.borrow_and_update().timer.clone();
                        eprint!("\r{} {}  ", timer.phase().label(), format_clock(timer.seconds_remaining()));
                    }
                    event = events.recv() => match event {
                        Ok(event @ Event::PhaseChanged { .. }) => {
                            eprintln!();
                            println!("{}", serde_json::to_string(&event)?);
                        }
                        Ok(_) | Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            eprintln!();
            drop(driver);
            Some(session.snapshot().timer.snapshot())
        }
    };

    app.save_session()?;
    if matches!(event, Some(Event::TimerStarted { .. })) {
        eprintln!("hint: the countdown only advances while `studymate timer run` is active");
    }
    match event {
        Some(event) => print_json(&event),
        None => {
            // Rejected (e.g. durations while running) or already in that state.
            print_json(&session.snapshot().timer.snapshot())
        }
    }
}

/// Run a duration command, with a hint when a running timer rejected it.
fn durations(
    session: &SessionHandle,
    command: impl FnOnce(&mut CycleTimer) -> Option<Event>,
) -> Option<Event> {
    let event = session.timer(command);
    if event.is_none() && session.snapshot().timer.is_running() {
        eprintln!("hint: the timer is running; `studymate timer pause` before changing durations");
    }
    event
}
