use super::common::arc_height;
use crate::{
    config::HorizonConfig,
    render::{
        color::Gradient,
        properties::CanvasSize,
        surface::{Paint, Point, Stroke, Surface},
    },
};

/// The event horizon arc sampled across a canvas.
///
/// Curves are cheap to build and always derived from the current canvas size, so they are rebuilt
/// on every draw rather than kept around.
#[derive(Clone, Debug)]
pub(crate) struct HorizonCurve {
    points: Vec<Point>,
    width: f32,
}

impl HorizonCurve {
    pub(crate) fn new(size: CanvasSize, config: &HorizonConfig) -> Self {
        let width = size.width as f32;
        let base_y = size.height as f32 * config.baseline;
        let samples = (width / config.stride).floor() as usize;
        let points = (0..=samples)
            .map(|i| i as f32 * config.stride)
            .map(|x| Point::new(x, arc_height(x, width, base_y, config.curve_height)))
            .collect();
        Self { points, width }
    }

    pub(crate) fn points(&self) -> &[Point] {
        &self.points
    }

    /// The horizontal window visible at the given reveal progress, centered on the canvas.
    pub(crate) fn reveal_window(&self, progress: f32) -> (f32, f32) {
        let center_x = self.width / 2.0;
        let half = self.width * progress.clamp(0.0, 1.0) / 2.0;
        (center_x - half, center_x + half)
    }

    /// The points that fall inside the reveal window.
    pub(crate) fn revealed(&self, progress: f32) -> &[Point] {
        let (start, end) = self.reveal_window(progress);
        let first = self.points.partition_point(|p| p.x < start);
        let last = self.points.partition_point(|p| p.x <= end);
        &self.points[first..last.max(first)]
    }

    /// The horizontal extent actually drawn at the given progress, if any.
    #[cfg(test)]
    pub(crate) fn revealed_span(&self, progress: f32) -> Option<(f32, f32)> {
        match self.revealed(progress) {
            [first, .., last] => Some((first.x, last.x)),
            _ => None,
        }
    }
}

/// Paints the event horizon layer.
pub(crate) struct HorizonPainter<'a> {
    config: &'a HorizonConfig,
}

impl<'a> HorizonPainter<'a> {
    pub(crate) fn new(config: &'a HorizonConfig) -> Self {
        Self { config }
    }

    /// Clears the surface and draws the curve, revealed from the center outwards.
    ///
    /// `opacity` scales every stroke uniformly on top of the horizontal fade at both ends.
    pub(crate) fn draw(&self, surface: &mut Surface, opacity: f32, reveal_progress: f32) {
        surface.clear();
        let size = surface.size();
        let curve = HorizonCurve::new(size, self.config);
        let points = curve.revealed(reveal_progress);
        if points.len() < 2 || opacity <= 0.0 {
            return;
        }
        let gradient = Gradient::horizontal(size.width as f32, &self.config.gradient);
        for layer in &self.config.layers {
            let stroke = Stroke {
                width: layer.width,
                glow: layer.glow,
                glow_strength: self.config.glow_strength,
                offset_y: layer.offset_y,
            };
            let paint =
                Paint { color: layer.color, gradient: Some(&gradient), global_alpha: opacity, blend: layer.blend };
            surface.stroke_curve(points, &stroke, &paint);
        }
    }
}
