use std::f32::consts::FRAC_PI_2;

/// Linear progress through a ramp that begins `delay` into a timeline and lasts `duration`.
///
/// Zero before the ramp begins, one from its end onwards.
pub(crate) fn ramp(elapsed: f32, delay: f32, duration: f32) -> f32 {
    if elapsed < delay {
        return 0.0;
    }
    if duration <= 0.0 {
        return 1.0;
    }
    ((elapsed - delay) / duration).min(1.0)
}

pub(crate) fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Ease out cubic: fast start, slow finish.
pub(crate) fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// The height of the event horizon arc at `x`.
///
/// The arc peaks `curve_height` above `base_y` at the horizontal center of a `width` wide canvas and
/// falls back to `base_y` at both edges along a quarter cosine.
pub(crate) fn arc_height(x: f32, width: f32, base_y: f32, curve_height: f32) -> f32 {
    let center_x = width / 2.0;
    let normalized = if center_x > 0.0 { (x - center_x).abs() / center_x } else { 0.0 };
    base_y - (normalized * FRAC_PI_2).cos() * curve_height
}
