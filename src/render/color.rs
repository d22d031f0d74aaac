use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque RGB color.
///
/// Colors are written as `#rrggbb` in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub(crate) struct Color {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Color {
    pub(crate) const BLACK: Color = Color::new(0, 0, 0);
    pub(crate) const WHITE: Color = Color::new(255, 255, 255);

    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub(crate) fn from_hex(input: &str) -> Result<Self, ParseColorError> {
        let hex = input.strip_prefix('#').unwrap_or(input);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseColorError(input.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseColorError(input.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub(crate) fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Scales every channel towards black.
    pub(crate) fn dimmed(&self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * factor).round() as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Perceived brightness in `[0, 1]`.
    pub(crate) fn luminance(&self) -> f32 {
        (0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32) / 255.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[cfg(feature = "json-schema")]
impl schemars::JsonSchema for Color {
    fn schema_name() -> String {
        "Color".to_string()
    }

    fn json_schema(generator: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <String as schemars::JsonSchema>::json_schema(generator)
    }
}

#[derive(thiserror::Error, Debug)]
#[error("invalid color '{0}', expected #rrggbb")]
pub(crate) struct ParseColorError(String);

/// A stop in a horizontal alpha gradient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
pub(crate) struct GradientStop {
    /// Position along the gradient, in `[0, 1]`.
    pub(crate) offset: f32,
    pub(crate) alpha: f32,
}

/// An alpha ramp spanning `[0, width]` horizontally.
///
/// Alpha is linearly interpolated between stops and held flat outside the first and last one.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Gradient {
    width: f32,
    stops: Vec<GradientStop>,
}

impl Gradient {
    pub(crate) fn horizontal(width: f32, stops: &[GradientStop]) -> Self {
        let mut stops = stops.to_vec();
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self { width, stops }
    }

    pub(crate) fn alpha_at(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return 1.0;
        };
        let t = if self.width > 0.0 { x / self.width } else { 0.0 };
        if t <= first.offset {
            return first.alpha;
        }
        if t >= last.offset {
            return last.alpha;
        }
        for (from, to) in self.stops.iter().tuple_windows() {
            if t <= to.offset {
                let span = to.offset - from.offset;
                if span <= f32::EPSILON {
                    return to.alpha;
                }
                let local = (t - from.offset) / span;
                return from.alpha + (to.alpha - from.alpha) * local;
            }
        }
        last.alpha
    }
}
