//! Cycle properties of the study timer.

use proptest::prelude::*;
use studymate_core::timer::{
    CycleTimer, Phase, MAX_BREAK_MINUTES, MAX_STUDY_MINUTES, MIN_BREAK_MINUTES, MIN_STUDY_MINUTES,
};
use studymate_core::Event;

fn run_phase_to_zero(timer: &mut CycleTimer) -> Option<Event> {
    let mut last = None;
    for _ in 0..timer.seconds_remaining() {
        last = timer.tick();
    }
    last
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn full_cycle_counts_exactly_once(
        study in MIN_STUDY_MINUTES..=MAX_STUDY_MINUTES,
        brk in MIN_BREAK_MINUTES..=MAX_BREAK_MINUTES,
    ) {
        let mut timer = CycleTimer::new(study, brk);
        timer.start();

        let event = run_phase_to_zero(&mut timer);
        prop_assert!(
            matches!(event, Some(Event::PhaseChanged { .. })),
            "study phase should end with a phase change"
        );
        prop_assert_eq!(timer.phase(), Phase::Break);
        prop_assert_eq!(timer.seconds_remaining(), brk * 60);
        prop_assert_eq!(timer.completed_cycles(), 0);
        prop_assert!(timer.is_running());

        run_phase_to_zero(&mut timer);
        prop_assert_eq!(timer.phase(), Phase::Study);
        prop_assert_eq!(timer.seconds_remaining(), study * 60);
        prop_assert_eq!(timer.completed_cycles(), 1);
    }

    #[test]
    fn reset_always_returns_to_idle_study(
        study in MIN_STUDY_MINUTES..=MAX_STUDY_MINUTES,
        brk in MIN_BREAK_MINUTES..=MAX_BREAK_MINUTES,
        ticks in 0u32..5000,
        running in any::<bool>(),
    ) {
        let mut timer = CycleTimer::new(study, brk);
        timer.start();
        for _ in 0..ticks {
            timer.tick();
        }
        if !running {
            timer.pause();
        }
        let cycles = timer.completed_cycles();

        timer.reset();
        prop_assert!(!timer.is_running());
        prop_assert_eq!(timer.phase(), Phase::Study);
        prop_assert_eq!(timer.seconds_remaining(), study * 60);
        prop_assert_eq!(timer.completed_cycles(), cycles);
    }

    #[test]
    fn remaining_stays_within_bounds(
        study in 0u32..100,
        brk in 0u32..100,
        ticks in 0u32..8000,
    ) {
        let mut timer = CycleTimer::new(study, brk);
        let ceiling = timer.study_minutes().max(timer.break_minutes()) * 60;
        timer.start();
        for _ in 0..ticks {
            timer.tick();
            prop_assert!(timer.seconds_remaining() <= ceiling);
        }
    }
}

#[test]
fn paused_timer_does_not_advance() {
    let mut timer = CycleTimer::new(1, 1);
    assert!(timer.tick().is_none());
    assert_eq!(timer.seconds_remaining(), 60);
}
