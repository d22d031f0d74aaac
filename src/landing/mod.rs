pub(crate) mod title;

use crate::{
    animations::{
        horizon::HorizonPainter,
        starfield::Starfield,
        timeline::{RevealSignal, RevealTimeline},
    },
    config::Config,
    render::{
        host::{Component, Host, ListenerHandle, PollableState},
        properties::CanvasSize,
        scheduler::{FrameHandle, TimerHandle},
        surface::Surface,
    },
};
use tracing::debug;

/// The work the landing animation schedules on its host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LandingTask {
    /// One frame of the never ending star twinkle.
    Twinkle,
    /// The initial delay elapsed: start the reveal.
    BeginReveal,
    /// One frame of the reveal.
    Reveal,
    /// The window changed size.
    Resize,
}

/// The two canvases the landing animation paints on, back to front.
#[derive(Clone, Debug)]
pub(crate) struct LandingLayers {
    pub(crate) starfield: Surface,
    pub(crate) horizon: Surface,
}

impl LandingLayers {
    pub(crate) fn new(size: CanvasSize) -> Self {
        Self { starfield: Surface::new(size), horizon: Surface::new(size) }
    }

    fn resize(&mut self, size: CanvasSize) {
        self.starfield.resize(size);
        self.horizon.resize(size);
    }
}

#[derive(Debug, Default)]
struct Registrations {
    twinkle: Option<FrameHandle>,
    reveal: Option<FrameHandle>,
    delay: Option<TimerHandle>,
    resize: Option<ListenerHandle>,
}

/// The landing page reveal.
///
/// Once activated it runs two loops on its host: the star twinkle, every frame for as long as the
/// animator is active, and, after an initial delay, the one-shot reveal that unfurls the horizon and
/// fades the stars in. Both loops only ever run on the host's thread, one task at a time.
pub(crate) struct TimedRevealAnimator {
    config: Config,
    rng: fastrand::Rng,
    layers: Option<LandingLayers>,
    starfield: Option<Starfield>,
    timeline: RevealTimeline,
    signal: RevealSignal,
    registrations: Registrations,
}

impl TimedRevealAnimator {
    pub(crate) fn new(config: Config, rng: fastrand::Rng) -> Self {
        let timeline = RevealTimeline::new(config.timeline.clone());
        Self {
            config,
            rng,
            layers: None,
            starfield: None,
            timeline,
            signal: RevealSignal::default(),
            registrations: Registrations::default(),
        }
    }

    /// Starts the animation on the given canvases.
    ///
    /// Without canvases there is nothing to animate and activation does nothing at all.
    pub(crate) fn activate(&mut self, host: &mut Host<LandingTask>, layers: Option<LandingLayers>) {
        let Some(mut layers) = layers else {
            debug!("no canvases to draw on, landing animation disabled");
            return;
        };
        if self.is_active() {
            return;
        }
        // Every activation plays the reveal from scratch.
        self.timeline = RevealTimeline::new(self.config.timeline.clone());
        self.signal = RevealSignal::default();

        let size = CanvasSize::for_window(host.window(), self.config.canvas.min_width);
        layers.resize(size);
        let starfield = Starfield::generate(size, &self.config.stars, &mut self.rng);
        debug!(
            "placed {} of {} stars on a {}x{} canvas",
            starfield.len(),
            self.config.stars.count,
            size.width,
            size.height
        );
        self.layers = Some(layers);
        self.starfield = Some(starfield);

        self.twinkle(host);
        let delay = self.config.timeline.initial_delay();
        self.registrations.delay = Some(host.set_timeout(delay, LandingTask::BeginReveal));
        self.registrations.resize = Some(host.add_resize_listener(LandingTask::Resize));
    }

    /// Stops the animation, releasing everything registered on the host.
    ///
    /// This is safe at any point, including before the reveal started, and calling it twice is
    /// harmless. The canvases are handed back to the caller.
    pub(crate) fn deactivate(&mut self, host: &mut Host<LandingTask>) -> Option<LandingLayers> {
        let registrations = std::mem::take(&mut self.registrations);
        if let Some(handle) = registrations.twinkle {
            host.cancel_animation_frame(handle);
        }
        if let Some(handle) = registrations.reveal {
            host.cancel_animation_frame(handle);
        }
        if let Some(handle) = registrations.delay {
            host.clear_timeout(handle);
        }
        if let Some(handle) = registrations.resize {
            host.remove_resize_listener(handle);
        }
        self.starfield = None;
        let layers = self.layers.take();
        if layers.is_some() {
            debug!(
                "landing animation torn down, {} frames and {} timers left on the host",
                host.pending_frames(),
                host.pending_timers()
            );
        }
        layers
    }

    pub(crate) fn is_active(&self) -> bool {
        self.layers.is_some()
    }

    /// A handle on the "stars revealed" flag.
    ///
    /// Each activation raises a fresh flag, so take the handle after activating.
    pub(crate) fn signal(&self) -> RevealSignal {
        self.signal.clone()
    }

    pub(crate) fn layers(&self) -> Option<&LandingLayers> {
        self.layers.as_ref()
    }

    pub(crate) fn starfield(&self) -> Option<&Starfield> {
        self.starfield.as_ref()
    }

    pub(crate) fn timeline(&self) -> &RevealTimeline {
        &self.timeline
    }

    fn twinkle(&mut self, host: &mut Host<LandingTask>) -> PollableState {
        let (Some(layers), Some(starfield)) = (self.layers.as_mut(), self.starfield.as_mut()) else {
            return PollableState::Done;
        };
        starfield.tick();
        starfield.draw(&mut layers.starfield, self.timeline.stars_opacity());
        self.registrations.twinkle = Some(host.request_animation_frame(LandingTask::Twinkle));
        PollableState::Modified
    }

    fn begin_reveal(&mut self, host: &mut Host<LandingTask>) -> PollableState {
        self.registrations.delay = None;
        self.timeline.start(host.now());
        debug!("reveal started at {:?}", host.now());
        self.reveal(host)
    }

    fn reveal(&mut self, host: &mut Host<LandingTask>) -> PollableState {
        self.registrations.reveal = None;
        let Some(layers) = self.layers.as_mut() else {
            return PollableState::Done;
        };
        let Some(frame) = self.timeline.advance(host.now()) else {
            return PollableState::Unmodified;
        };
        let painter = HorizonPainter::new(&self.config.horizon);
        painter.draw(&mut layers.horizon, frame.horizon_opacity, frame.reveal_progress);

        if let Some(stars_opacity) = frame.stars_opacity {
            if stars_opacity > 0.0 && self.signal.fire() {
                debug!("stars revealed after {}ms", frame.elapsed_ms);
            }
        }

        if frame.finished {
            debug!("reveal finished after {}ms", frame.elapsed_ms);
        } else {
            self.registrations.reveal = Some(host.request_animation_frame(LandingTask::Reveal));
        }
        PollableState::Modified
    }

    fn resize(&mut self, host: &mut Host<LandingTask>) -> PollableState {
        let Some(layers) = self.layers.as_mut() else {
            return PollableState::Unmodified;
        };
        let size = CanvasSize::for_window(host.window(), self.config.canvas.min_width);
        debug!("resizing canvases to {}x{}", size.width, size.height);
        layers.resize(size);
        HorizonPainter::new(&self.config.horizon).draw(&mut layers.horizon, self.timeline.horizon_opacity(), 1.0);
        PollableState::Modified
    }
}

impl Component<LandingTask> for TimedRevealAnimator {
    fn run(&mut self, task: LandingTask, host: &mut Host<LandingTask>) -> PollableState {
        match task {
            LandingTask::Twinkle => self.twinkle(host),
            LandingTask::BeginReveal => self.begin_reveal(host),
            LandingTask::Reveal => self.reveal(host),
            LandingTask::Resize => self.resize(host),
        }
    }
}
