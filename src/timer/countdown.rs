//! Countdown timer wired to its tick source and completion sound

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    services::SoundPlayer,
    state::timer_state::{TickOutcome, TimerState, TimerView, Toggle},
};
use super::scheduler::{TickScheduler, TickStream};

/// Countdown timer owning its state and capabilities
///
/// Every transition that stops the timer also stops the tick stream, and
/// every start opens a fresh one, so at most one stream ever decrements the
/// counter.
pub struct Countdown {
    state: TimerState,
    sound: Arc<dyn SoundPlayer>,
    scheduler: Box<dyn TickScheduler>,
    next_stream: u64,
    active_stream: Option<TickStream>,
    muted: bool,
}

impl Countdown {
    pub fn new(
        initial_seconds: u64,
        sound: Arc<dyn SoundPlayer>,
        scheduler: Box<dyn TickScheduler>,
    ) -> Self {
        Self {
            state: TimerState::new(initial_seconds),
            sound,
            scheduler,
            next_stream: 0,
            active_stream: None,
            muted: false,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Snapshot for the clock face
    pub fn view(&self) -> TimerView {
        TimerView::new(&self.state, self.muted)
    }

    /// Stream currently allowed to tick, if running
    pub fn active_stream(&self) -> Option<TickStream> {
        self.active_stream
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Silence (or restore) the completion sound
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Start or pause
    pub fn toggle(&mut self) -> Toggle {
        let toggle = self.state.toggle();
        match toggle {
            Toggle::Started => {
                self.next_stream += 1;
                let stream = TickStream(self.next_stream);
                self.active_stream = Some(stream);
                self.scheduler.start(stream);
                info!("Timer started at {}", self.state.display());
            }
            Toggle::Paused => {
                self.stop_ticking();
                info!("Timer paused at {}", self.state.display());
            }
            Toggle::Ignored => debug!("Toggle ignored, no time left on the clock"),
        }
        toggle
    }

    /// Apply one tick from `stream`
    pub fn tick(&mut self, stream: TickStream) -> TickOutcome {
        if self.active_stream != Some(stream) {
            debug!("Dropping tick from stale stream {}", stream.id());
            return TickOutcome::Ignored;
        }

        let outcome = self.state.tick();
        match outcome {
            TickOutcome::Completed => {
                info!("Countdown finished, rewinding to {}", self.state.display());
                self.stop_ticking();
                if self.muted {
                    debug!("Completion sound muted");
                } else {
                    self.sound.play();
                }
            }
            TickOutcome::Counted(remaining) => debug!("Tick: {}s remaining", remaining),
            TickOutcome::Ignored => {}
        }
        outcome
    }

    /// Stop and rewind; always allowed
    pub fn reset(&mut self) {
        self.state.reset();
        self.stop_ticking();
        info!("Timer reset to {}", self.state.display());
    }

    /// Change the duration while paused; `false` when rejected
    pub fn adjust_duration(&mut self, delta: i64) -> bool {
        let adjusted = self.state.adjust_duration(delta);
        if adjusted {
            info!("Timer duration adjusted by {}s to {}", delta, self.state.display());
        } else {
            debug!("Duration adjustment of {}s rejected while running", delta);
        }
        adjusted
    }

    fn stop_ticking(&mut self) {
        if let Some(stream) = self.active_stream.take() {
            self.scheduler.stop(stream);
        }
    }
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Countdown")
            .field("state", &self.state)
            .field("active_stream", &self.active_stream)
            .field("muted", &self.muted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ManualScheduler, RecordingSoundPlayer};

    fn countdown(initial: u64) -> (Countdown, Arc<RecordingSoundPlayer>, ManualScheduler) {
        let sound = Arc::new(RecordingSoundPlayer::default());
        let scheduler = ManualScheduler::default();
        let countdown = Countdown::new(initial, sound.clone(), Box::new(scheduler.clone()));
        (countdown, sound, scheduler)
    }

    fn tick_active(countdown: &mut Countdown) -> TickOutcome {
        let stream = countdown.active_stream().expect("timer should be running");
        countdown.tick(stream)
    }

    #[test]
    fn test_thirty_second_run_plays_sound_once() {
        let (mut countdown, sound, scheduler) = countdown(30);
        assert_eq!(countdown.toggle(), Toggle::Started);
        assert_eq!(scheduler.active(), countdown.active_stream());

        for expected in (0..30).rev() {
            let outcome = tick_active(&mut countdown);
            if expected == 0 {
                assert_eq!(outcome, TickOutcome::Completed);
            } else {
                assert_eq!(outcome, TickOutcome::Counted(expected));
            }
        }

        assert_eq!(sound.plays(), 1);
        assert!(!countdown.state().is_running());
        assert_eq!(countdown.state().remaining_seconds(), 30);
        assert_eq!(countdown.active_stream(), None);
        assert_eq!(scheduler.active(), None);
    }

    #[test]
    fn test_pause_stops_stream_and_resume_opens_new_one() {
        let (mut countdown, _, scheduler) = countdown(10);
        countdown.toggle();
        let first = countdown.active_stream().unwrap();

        assert_eq!(countdown.toggle(), Toggle::Paused);
        assert_eq!(scheduler.active(), None);

        countdown.toggle();
        let second = countdown.active_stream().unwrap();
        assert_ne!(first, second);
        assert_eq!(scheduler.starts(), 2);

        // a straggler from the first run must not count
        assert_eq!(countdown.tick(first), TickOutcome::Ignored);
        assert_eq!(countdown.state().remaining_seconds(), 10);
        assert_eq!(countdown.tick(second), TickOutcome::Counted(9));
    }

    #[test]
    fn test_reset_stops_stream() {
        let (mut countdown, sound, scheduler) = countdown(10);
        countdown.toggle();
        let stream = countdown.active_stream().unwrap();
        tick_active(&mut countdown);

        countdown.reset();
        assert_eq!(scheduler.active(), None);
        assert_eq!(countdown.tick(stream), TickOutcome::Ignored);
        assert_eq!(countdown.state().remaining_seconds(), 10);
        assert_eq!(sound.plays(), 0);
    }

    #[test]
    fn test_adjust_rejected_while_running() {
        let (mut countdown, _, _) = countdown(30);
        countdown.toggle();
        assert!(!countdown.adjust_duration(5));
        assert_eq!(countdown.state().initial_seconds(), 30);
        assert_eq!(countdown.state().remaining_seconds(), 30);
        assert!(countdown.state().is_running());
    }

    #[test]
    fn test_toggle_at_zero_does_not_schedule() {
        let (mut countdown, _, scheduler) = countdown(5);
        countdown.adjust_duration(-5);
        assert_eq!(countdown.toggle(), Toggle::Ignored);
        assert_eq!(scheduler.starts(), 0);
        assert_eq!(countdown.active_stream(), None);
    }

    #[test]
    fn test_muted_completion_is_silent() {
        let (mut countdown, sound, _) = countdown(2);
        countdown.set_muted(true);
        countdown.toggle();
        tick_active(&mut countdown);
        assert_eq!(tick_active(&mut countdown), TickOutcome::Completed);
        assert_eq!(sound.plays(), 0);
    }
}
