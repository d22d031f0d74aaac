use crate::{
    animations::{ease_out, lerp, ramp, timeline::RevealSignal},
    config::TitleConfig,
};
use std::time::Duration;

/// The title and call to action that fade in once the stars show up.
///
/// The card watches a [RevealSignal] and starts its own transitions from the moment it first sees the
/// flag raised. If the flag never goes up, the card simply stays hidden.
#[derive(Debug)]
pub(crate) struct TitleCard {
    config: TitleConfig,
    signal: RevealSignal,
    shown_at: Option<Duration>,
}

impl TitleCard {
    pub(crate) fn new(config: TitleConfig, signal: RevealSignal) -> Self {
        Self { config, signal, shown_at: None }
    }

    /// Checks the signal. Returns true the first time it is seen raised.
    pub(crate) fn observe(&mut self, now: Duration) -> bool {
        if self.shown_at.is_none() && self.signal.is_revealed() {
            self.shown_at = Some(now);
            return true;
        }
        false
    }

    pub(crate) fn config(&self) -> &TitleConfig {
        &self.config
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.shown_at.is_some()
    }

    pub(crate) fn title_opacity(&self, now: Duration) -> f32 {
        ease_out(self.title_progress(now))
    }

    /// Vertical offset of the title from its resting place; negative is up.
    pub(crate) fn title_offset(&self, now: Duration) -> f32 {
        lerp(-self.config.title_rise, 0.0, ease_out(self.title_progress(now)))
    }

    pub(crate) fn button_opacity(&self, now: Duration) -> f32 {
        ease_out(self.button_progress(now))
    }

    pub(crate) fn button_scale(&self, now: Duration) -> f32 {
        lerp(self.config.button_initial_scale, 1.0, ease_out(self.button_progress(now)))
    }

    /// Whether every transition has completed.
    pub(crate) fn is_settled(&self, now: Duration) -> bool {
        self.title_progress(now) >= 1.0 && self.button_progress(now) >= 1.0
    }

    fn title_progress(&self, now: Duration) -> f32 {
        self.progress(now, self.config.title_delay_ms, self.config.title_duration_ms)
    }

    fn button_progress(&self, now: Duration) -> f32 {
        self.progress(now, self.config.button_delay_ms, self.config.button_duration_ms)
    }

    fn progress(&self, now: Duration, delay_ms: u64, duration_ms: u64) -> f32 {
        let Some(shown_at) = self.shown_at else {
            return 0.0;
        };
        let elapsed = now.saturating_sub(shown_at).as_micros() as f32 / 1000.0;
        ramp(elapsed, delay_ms as f32, duration_ms as f32)
    }
}
