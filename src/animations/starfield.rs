use super::common::arc_height;
use crate::{
    config::{ExclusionConfig, StarfieldConfig},
    render::{
        color::Color,
        properties::CanvasSize,
        surface::{Paint, Point, Surface},
    },
};

/// A single twinkling point of light.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Star {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) radius: f32,
    /// Current brightness. Bounces between 0 and 1 and may overshoot either end by one step.
    pub(crate) opacity: f32,
    /// Signed brightness velocity; the sign flips on every bounce.
    pub(crate) speed: f32,
}

impl Star {
    /// Advances the brightness by one frame.
    ///
    /// The bounce is detected after moving, so a star that just crossed a boundary stays outside
    /// `[0, 1]` for one frame and only comes back on the next one.
    pub(crate) fn tick(&mut self, step: f32) {
        self.opacity += self.speed * step;
        if self.opacity > 1.0 || self.opacity < 0.0 {
            self.speed = -self.speed;
        }
    }
}

/// The band right above the event horizon where stars must not spawn.
#[derive(Clone, Debug)]
pub(crate) struct ForbiddenRegion {
    width: f32,
    horizon_y: f32,
    curve_height: f32,
    threshold: f32,
}

impl ForbiddenRegion {
    pub(crate) fn new(size: CanvasSize, config: &ExclusionConfig) -> Self {
        Self {
            width: size.width as f32,
            horizon_y: size.height as f32 * config.baseline,
            curve_height: config.curve_height,
            threshold: config.threshold,
        }
    }

    pub(crate) fn contains(&self, x: f32, y: f32) -> bool {
        let curve_y = arc_height(x, self.width, self.horizon_y, self.curve_height);
        y > curve_y - self.threshold
    }
}

/// The stars layer.
#[derive(Clone, Debug)]
pub(crate) struct Starfield {
    stars: Vec<Star>,
    step: f32,
    color: Color,
}

impl Starfield {
    /// Scatters stars over a canvas, keeping them out of the forbidden region.
    ///
    /// Every star gets a bounded number of placement attempts. Stars that could not be placed are
    /// dropped rather than retried, so the result may hold fewer stars than requested.
    pub(crate) fn generate(size: CanvasSize, config: &StarfieldConfig, rng: &mut fastrand::Rng) -> Self {
        let region = ForbiddenRegion::new(size, &config.exclusion);
        let (width, height) = (size.width as f32, size.height as f32);
        let mut stars = Vec::with_capacity(config.count);
        for _ in 0..config.count {
            let mut placed = None;
            for _ in 0..config.max_attempts {
                let (x, y) = (rng.f32() * width, rng.f32() * height);
                if !region.contains(x, y) {
                    placed = Some((x, y));
                    break;
                }
            }
            let Some((x, y)) = placed else {
                continue;
            };
            stars.push(Star {
                x,
                y,
                radius: rng.f32() * config.max_radius,
                opacity: rng.f32(),
                speed: rng.f32() * config.speed_range + config.min_speed,
            });
        }
        Self { stars, step: config.oscillation_step, color: config.color }
    }

    pub(crate) fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub(crate) fn len(&self) -> usize {
        self.stars.len()
    }

    /// Advances every star's brightness by one frame.
    pub(crate) fn tick(&mut self) {
        for star in &mut self.stars {
            star.tick(self.step);
        }
    }

    /// Repaints the layer. `layer_opacity` scales every star, so nothing shows while it is zero.
    pub(crate) fn draw(&self, surface: &mut Surface, layer_opacity: f32) {
        surface.clear();
        if layer_opacity <= 0.0 {
            return;
        }
        for star in &self.stars {
            let paint = Paint { global_alpha: star.opacity.abs() * layer_opacity, ..Paint::solid(self.color) };
            surface.fill_disc(Point::new(star.x, star.y), star.radius, &paint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> CanvasSize {
        CanvasSize { width: 1920, height: 1080 }
    }

    #[test]
    fn no_star_spawns_in_the_forbidden_region() {
        let config = StarfieldConfig::default();
        let region = ForbiddenRegion::new(canvas(), &config.exclusion);
        for seed in 0..20 {
            let field = Starfield::generate(canvas(), &config, &mut fastrand::Rng::with_seed(seed));
            assert!(field.len() <= 200);
            for star in field.stars() {
                assert!(!region.contains(star.x, star.y), "star at ({}, {})", star.x, star.y);
            }
        }
    }

    #[test]
    fn star_placed_on_the_last_attempt_is_kept() {
        let mut config = StarfieldConfig { count: 10, max_attempts: 1, ..Default::default() };
        // Nothing is forbidden, so the single attempt always succeeds.
        config.exclusion.threshold = -1e6;
        let field = Starfield::generate(canvas(), &config, &mut fastrand::Rng::with_seed(3));
        assert_eq!(field.len(), 10);

        config.max_attempts = 0;
        let field = Starfield::generate(canvas(), &config, &mut fastrand::Rng::with_seed(3));
        assert_eq!(field.len(), 0);
    }

    #[test]
    fn stars_start_within_their_ranges() {
        let config = StarfieldConfig::default();
        let field = Starfield::generate(canvas(), &config, &mut fastrand::Rng::with_seed(7));
        for star in field.stars() {
            assert!((0.0..1.5).contains(&star.radius));
            assert!((0.0..1.0).contains(&star.opacity));
            assert!((0.1..0.6).contains(&star.speed));
        }
    }

    #[test]
    fn unplaceable_stars_are_dropped() {
        // The band covers the whole canvas, so every attempt fails.
        let mut config = StarfieldConfig::default();
        config.exclusion.threshold = 10_000.0;
        let field = Starfield::generate(canvas(), &config, &mut fastrand::Rng::with_seed(1));
        assert_eq!(field.len(), 0);
    }

    #[test]
    fn forbidden_region_follows_the_arc() {
        let region = ForbiddenRegion::new(canvas(), &ExclusionConfig::default());
        // At the center the curve sits at 0.85 * 1080 - 120 = 798, so the band starts at 718.
        assert!(!region.contains(960.0, 717.0));
        assert!(region.contains(960.0, 719.0));
        // At the edges the curve is back at 918, so the band starts at 838.
        assert!(!region.contains(0.0, 837.0));
        assert!(region.contains(0.0, 839.0));
    }

    #[test]
    fn tick_moves_without_flipping_inside_the_range() {
        let mut star = Star { x: 0.0, y: 0.0, radius: 1.0, opacity: 0.99, speed: 0.05 };
        star.tick(0.02);
        assert!((star.opacity - 0.991).abs() < 1e-6);
        assert_eq!(star.speed, 0.05);
    }

    #[test]
    fn tick_flips_after_overshooting() {
        let mut star = Star { x: 0.0, y: 0.0, radius: 1.0, opacity: 1.005, speed: 0.05 };
        star.tick(0.02);
        assert!(star.opacity > 1.0);
        assert_eq!(star.speed, -0.05);
    }

    #[test]
    fn overshoot_lasts_one_frame() {
        let mut star = Star { x: 0.0, y: 0.0, radius: 1.0, opacity: 0.9995, speed: 0.05 };
        star.tick(0.02);
        assert!(star.opacity > 1.0);
        assert_eq!(star.speed, -0.05);

        star.tick(0.02);
        assert!(star.opacity < 1.0);
        assert_eq!(star.speed, -0.05);
    }

    #[test]
    fn tick_flips_below_zero() {
        let mut star = Star { x: 0.0, y: 0.0, radius: 1.0, opacity: 0.0005, speed: -0.1 };
        star.tick(0.02);
        assert!(star.opacity < 0.0);
        assert_eq!(star.speed, 0.1);
    }

    #[test]
    fn invisible_layer_draws_nothing() {
        let size = CanvasSize { width: 64, height: 64 };
        let config = StarfieldConfig { count: 20, ..Default::default() };
        let field = Starfield::generate(size, &config, &mut fastrand::Rng::with_seed(3));
        let mut surface = Surface::new(size);
        field.draw(&mut surface, 0.0);
        assert!(surface.is_blank());
    }

    #[test]
    fn visible_layer_draws_stars() {
        let size = CanvasSize { width: 32, height: 32 };
        let field = Starfield {
            stars: vec![Star { x: 16.0, y: 16.0, radius: 1.5, opacity: 1.0, speed: 0.1 }],
            step: 0.02,
            color: Color::WHITE,
        };
        let mut surface = Surface::new(size);
        field.draw(&mut surface, 1.0);
        assert_eq!(surface.pixel(16, 16).unwrap()[3], 255);
    }
}
