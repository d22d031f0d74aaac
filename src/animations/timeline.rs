use super::common::ramp;
use crate::config::TimelineConfig;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

/// The values the reveal timeline produces on a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RevealFrame {
    pub(crate) elapsed_ms: f32,
    pub(crate) horizon_opacity: f32,
    pub(crate) reveal_progress: f32,
    /// Only present once the stars' delay has passed.
    pub(crate) stars_opacity: Option<f32>,
    /// Whether the timeline has run its full course and needs no more ticks.
    pub(crate) finished: bool,
}

/// The one-shot reveal: the horizon unfurls and fades in, then the stars fade in.
///
/// The timeline is started once and never resets; after it finishes it keeps reporting its final
/// values.
#[derive(Clone, Debug)]
pub(crate) struct RevealTimeline {
    config: TimelineConfig,
    start: Option<Duration>,
    elapsed_ms: f32,
    horizon_opacity: f32,
    stars_opacity: f32,
}

impl RevealTimeline {
    pub(crate) fn new(config: TimelineConfig) -> Self {
        Self { config, start: None, elapsed_ms: 0.0, horizon_opacity: 0.0, stars_opacity: 0.0 }
    }

    /// Marks the start of the timeline. Starting twice has no effect.
    pub(crate) fn start(&mut self, now: Duration) {
        if self.start.is_none() {
            self.start = Some(now);
        }
    }

    pub(crate) fn is_started(&self) -> bool {
        self.start.is_some()
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.is_started() && self.elapsed_ms >= self.total_ms()
    }

    /// Horizon duration, then the stars' delay and fade on top of it.
    pub(crate) fn total_ms(&self) -> f32 {
        let config = &self.config;
        (config.horizon_duration_ms + config.stars_delay_ms + config.stars_fade_ms) as f32
    }

    pub(crate) fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    pub(crate) fn horizon_opacity(&self) -> f32 {
        self.horizon_opacity
    }

    pub(crate) fn stars_opacity(&self) -> f32 {
        self.stars_opacity
    }

    /// Computes the values for the tick happening at `now`.
    ///
    /// Returns `None` if the timeline hasn't been started.
    pub(crate) fn advance(&mut self, now: Duration) -> Option<RevealFrame> {
        let start = self.start?;
        let elapsed_ms = now.saturating_sub(start).as_micros() as f32 / 1000.0;
        self.elapsed_ms = self.elapsed_ms.max(elapsed_ms);

        let elapsed = self.elapsed_ms;
        let progress = ramp(elapsed, 0.0, self.config.horizon_duration_ms as f32);
        self.horizon_opacity = progress;

        let stars_delay = self.config.stars_delay_ms as f32;
        let stars_opacity = (elapsed >= stars_delay).then(|| {
            let opacity = ramp(elapsed, stars_delay, self.config.stars_fade_ms as f32);
            self.stars_opacity = opacity;
            opacity
        });

        Some(RevealFrame {
            elapsed_ms: elapsed,
            horizon_opacity: progress,
            reveal_progress: progress,
            stars_opacity,
            finished: elapsed >= self.total_ms(),
        })
    }
}

/// A flag that goes up once the stars start showing and never comes down.
///
/// Clones share the flag, so the page hosting the animation can hold one to know when to show its
/// own content.
#[derive(Clone, Debug, Default)]
pub(crate) struct RevealSignal {
    revealed: Arc<AtomicBool>,
}

impl RevealSignal {
    /// Raises the flag, returning whether this call is the one that raised it.
    pub(crate) fn fire(&self) -> bool {
        !self.revealed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_revealed(&self) -> bool {
        self.revealed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn started() -> RevealTimeline {
        let mut timeline = RevealTimeline::new(TimelineConfig::default());
        timeline.start(ms(1000));
        timeline
    }

    #[test]
    fn idle_until_started() {
        let mut timeline = RevealTimeline::new(TimelineConfig::default());
        assert_eq!(timeline.advance(ms(5000)), None);
        assert!(!timeline.is_finished());
    }

    #[test]
    fn horizon_ramps_to_one_and_holds() {
        let mut timeline = started();
        let mut previous = 0.0;
        for elapsed in (0..=3000).step_by(50) {
            let frame = timeline.advance(ms(1000 + elapsed)).unwrap();
            assert!(frame.horizon_opacity >= previous);
            assert!(frame.horizon_opacity <= 1.0);
            assert_eq!(frame.horizon_opacity, frame.reveal_progress);
            previous = frame.horizon_opacity;
        }
        let mut timeline = started();
        assert_eq!(timeline.advance(ms(2200)).unwrap().horizon_opacity, 1.0);
        assert_eq!(timeline.advance(ms(1600)).unwrap().horizon_opacity, 1.0);
    }

    #[test]
    fn stars_wait_for_their_delay() {
        let mut timeline = started();
        for elapsed in (0..800).step_by(20) {
            let frame = timeline.advance(ms(1000 + elapsed)).unwrap();
            assert_eq!(frame.stars_opacity, None);
            assert_eq!(timeline.stars_opacity(), 0.0);
        }
        assert_eq!(timeline.advance(ms(1800)).unwrap().stars_opacity, Some(0.0));
        assert_eq!(timeline.advance(ms(2200)).unwrap().stars_opacity, Some(0.5));
        assert_eq!(timeline.advance(ms(2600)).unwrap().stars_opacity, Some(1.0));
        assert_eq!(timeline.advance(ms(9000)).unwrap().stars_opacity, Some(1.0));
    }

    #[test]
    fn finishes_after_the_whole_choreography() {
        let mut timeline = started();
        assert!(!timeline.advance(ms(3799)).unwrap().finished);
        assert!(timeline.advance(ms(3800)).unwrap().finished);
        assert!(timeline.is_finished());
        assert_eq!(timeline.total_ms(), 2800.0);
    }

    #[test]
    fn restarting_is_ignored() {
        let mut timeline = started();
        timeline.start(ms(5000));
        assert_eq!(timeline.advance(ms(2200)).unwrap().elapsed_ms, 1200.0);
    }

    #[test]
    fn signal_fires_once() {
        let signal = RevealSignal::default();
        let observer = signal.clone();
        assert!(!observer.is_revealed());
        assert!(signal.fire());
        assert!(!signal.fire());
        assert!(observer.is_revealed());
    }
}
