mod driver;
mod engine;

pub use driver::TimerDriver;
pub use engine::{
    format_clock, CycleTimer, Phase, TickParams, DEFAULT_BREAK_MINUTES, DEFAULT_STUDY_MINUTES,
    MAX_BREAK_MINUTES, MAX_STUDY_MINUTES, MIN_BREAK_MINUTES, MIN_STUDY_MINUTES,
};
