use crate::{
    config::Config,
    landing::{LandingLayers, LandingTask, TimedRevealAnimator},
    render::{host::Host, properties::CanvasSize, properties::WindowSize, surface::Surface},
};
use image::{
    codecs::gif::{GifEncoder, Repeat},
    imageops::{self, FilterType},
    Delay, Frame, RgbaImage,
};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufWriter},
    path::Path,
    time::Duration,
};
use tracing::{debug, info};

/// The rate the animation itself runs at, whatever rate frames are captured at.
const SIMULATION_FPS: u32 = 60;

/// Errors that can occur when exporting the animation
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("frame rate must be between 1 and 60, got {0}")]
    InvalidFrameRate(u32),

    #[error("scale must be within (0, 1], got {0}")]
    InvalidScale(f32),

    #[error("window must not be empty")]
    EmptyWindow,
}

/// What to render and how.
#[derive(Clone, Debug)]
pub(crate) struct ExportOptions {
    pub(crate) window: WindowSize,
    pub(crate) fps: u32,
    pub(crate) duration: Duration,
    /// Output size relative to the window.
    pub(crate) scale: f32,
    pub(crate) seed: Option<u64>,
}

impl ExportOptions {
    fn validate(&self) -> Result<(), ExportError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ExportError::EmptyWindow);
        }
        if self.fps == 0 || self.fps > SIMULATION_FPS {
            return Err(ExportError::InvalidFrameRate(self.fps));
        }
        if !(self.scale > 0.0 && self.scale <= 1.0) {
            return Err(ExportError::InvalidScale(self.scale));
        }
        Ok(())
    }

    fn output_size(&self) -> (u32, u32) {
        let scale = |value: u32| ((value as f32 * self.scale).round() as u32).max(1);
        (scale(self.window.width), scale(self.window.height))
    }
}

/// The state of the animation at the moment a snapshot was taken.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct SnapshotSummary {
    pub(crate) at_ms: u64,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) stars: usize,
    pub(crate) horizon_opacity: f32,
    pub(crate) stars_opacity: f32,
    pub(crate) revealed: bool,
}

/// The landing animation running on a virtual clock.
struct Simulation {
    host: Host<LandingTask>,
    animator: TimedRevealAnimator,
    frame: u64,
}

impl Simulation {
    fn new(config: &Config, options: &ExportOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let mut host = Host::new(options.window);
        let mut animator = TimedRevealAnimator::new(config.clone(), rng);
        let size = CanvasSize::for_window(options.window, config.canvas.min_width);
        animator.activate(&mut host, Some(LandingLayers::new(size)));
        Self { host, animator, frame: 0 }
    }

    /// Runs every simulation frame up to and including `at`.
    fn advance_to(&mut self, at: Duration) {
        loop {
            let next = Self::frame_time(self.frame + 1);
            if next > at {
                break;
            }
            self.frame += 1;
            self.host.begin_frame(next);
            self.host.pump(&mut self.animator);
        }
    }

    fn frame_time(frame: u64) -> Duration {
        Duration::from_micros(frame * 1_000_000 / SIMULATION_FPS as u64)
    }

    /// The visible part of the canvases, flattened.
    fn capture(&self, config: &Config) -> RgbaImage {
        let Some(layers) = self.animator.layers() else {
            return RgbaImage::new(0, 0);
        };
        let image = Surface::flatten(config.canvas.background, &[&layers.starfield, &layers.horizon]);
        let window = self.host.window();
        let offset_x = image.width().saturating_sub(window.width) / 2;
        imageops::crop_imm(&image, offset_x, 0, window.width.min(image.width()), image.height()).to_image()
    }

    fn summary(&self, at: Duration, width: u32, height: u32) -> SnapshotSummary {
        let timeline = self.animator.timeline();
        SnapshotSummary {
            at_ms: at.as_millis() as u64,
            width,
            height,
            stars: self.animator.starfield().map(|s| s.len()).unwrap_or(0),
            horizon_opacity: timeline.horizon_opacity(),
            stars_opacity: timeline.stars_opacity(),
            revealed: self.animator.signal().is_revealed(),
        }
    }
}

/// Renders the landing animation to files.
pub(crate) struct Exporter {
    config: Config,
}

impl Exporter {
    pub(crate) fn new(config: Config) -> Self {
        Self { config }
    }

    /// Writes an animated GIF, returning the number of frames written.
    pub(crate) fn export_gif(&self, path: &Path, options: &ExportOptions) -> Result<usize, ExportError> {
        options.validate()?;
        let file = BufWriter::new(File::create(path)?);
        let mut encoder = GifEncoder::new(file);
        encoder.set_repeat(Repeat::Infinite)?;

        let frames = self.render(options, |image| {
            let delay = Delay::from_numer_denom_ms(1000, options.fps);
            encoder.encode_frame(Frame::from_parts(image, 0, 0, delay))
        })?;
        info!("wrote {frames} frames to {}", path.display());
        Ok(frames)
    }

    /// Writes a single PNG of the animation as it looks `at` after activation.
    pub(crate) fn snapshot(
        &self,
        path: &Path,
        at: Duration,
        options: &ExportOptions,
    ) -> Result<SnapshotSummary, ExportError> {
        options.validate()?;
        let mut simulation = Simulation::new(&self.config, options);
        simulation.advance_to(at);
        let image = self.scaled(simulation.capture(&self.config), options);
        image.save(path)?;
        info!("wrote snapshot at {}ms to {}", at.as_millis(), path.display());
        Ok(simulation.summary(at, image.width(), image.height()))
    }

    /// Runs the animation for the requested duration, handing every captured frame to `sink`.
    fn render<F>(&self, options: &ExportOptions, mut sink: F) -> Result<usize, ExportError>
    where
        F: FnMut(RgbaImage) -> Result<(), image::ImageError>,
    {
        let mut simulation = Simulation::new(&self.config, options);
        let interval_us = 1_000_000 / options.fps as u64;
        let total_us = options.duration.as_micros() as u64;
        let mut frames = 0;
        let mut at_us = 0;
        while at_us <= total_us {
            let at = Duration::from_micros(at_us);
            simulation.advance_to(at);
            sink(self.scaled(simulation.capture(&self.config), options))?;
            frames += 1;
            debug!("captured frame {frames} at {}ms", at.as_millis());
            at_us += interval_us;
        }
        Ok(frames)
    }

    fn scaled(&self, image: RgbaImage, options: &ExportOptions) -> RgbaImage {
        let (width, height) = options.output_size();
        if (width, height) == image.dimensions() {
            return image;
        }
        imageops::resize(&image, width, height, FilterType::Triangle)
    }
}
