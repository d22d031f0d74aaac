use super::{
    color::{Color, Gradient},
    properties::CanvasSize,
};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// How a painted pixel is combined with what is already on the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub(crate) enum BlendMode {
    /// Plain alpha compositing.
    #[default]
    SourceOver,

    /// `1 - (1 - a)(1 - b)`: only ever brightens.
    Screen,
}

/// A point in canvas space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Point {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl Point {
    pub(crate) fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The geometry of a stroke.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Stroke {
    pub(crate) width: f32,
    /// Radius of the soft halo painted around the stroke.
    pub(crate) glow: f32,
    /// Peak alpha of the halo, relative to the stroke itself.
    pub(crate) glow_strength: f32,
    /// Vertical offset applied to every point.
    pub(crate) offset_y: f32,
}

/// How a shape is colored.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Paint<'a> {
    pub(crate) color: Color,
    pub(crate) gradient: Option<&'a Gradient>,
    pub(crate) global_alpha: f32,
    pub(crate) blend: BlendMode,
}

impl<'a> Paint<'a> {
    pub(crate) fn solid(color: Color) -> Self {
        Self { color, gradient: None, global_alpha: 1.0, blend: BlendMode::SourceOver }
    }

    fn alpha_at(&self, x: f32) -> f32 {
        let gradient = self.gradient.map(|g| g.alpha_at(x)).unwrap_or(1.0);
        gradient * self.global_alpha
    }
}

/// An RGBA raster the animation layers paint on.
///
/// Pixels are stored with straight (non premultiplied) alpha. A fresh or resized surface is fully
/// transparent, just like a canvas element.
#[derive(Clone, Debug)]
pub(crate) struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub(crate) fn new(size: CanvasSize) -> Self {
        Self { pixels: RgbaImage::new(size.width, size.height) }
    }

    pub(crate) fn size(&self) -> CanvasSize {
        CanvasSize { width: self.pixels.width(), height: self.pixels.height() }
    }

    /// Reallocates the surface, discarding its contents.
    pub(crate) fn resize(&mut self, size: CanvasSize) {
        self.pixels = RgbaImage::new(size.width, size.height);
    }

    pub(crate) fn clear(&mut self) {
        self.pixels.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
    }

    pub(crate) fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.pixels.width() && y < self.pixels.height()).then(|| *self.pixels.get_pixel(x, y))
    }

    #[cfg(test)]
    pub(crate) fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }

    /// Fills an anti-aliased disc centered at `center`.
    pub(crate) fn fill_disc(&mut self, center: Point, radius: f32, paint: &Paint) {
        if radius <= 0.0 {
            return;
        }
        let reach = radius + 1.0;
        let Some((x0, x1)) = self.clamp_span(center.x - reach, center.x + reach, self.pixels.width()) else {
            return;
        };
        let Some((y0, y1)) = self.clamp_span(center.y - reach, center.y + reach, self.pixels.height()) else {
            return;
        };
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - center.x;
                let dy = py as f32 + 0.5 - center.y;
                let distance = (dx * dx + dy * dy).sqrt();
                let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let alpha = coverage * paint.alpha_at(px as f32 + 0.5);
                    self.blend(px, py, paint.color, alpha, paint.blend);
                }
            }
        }
    }

    /// Strokes a polyline whose points are sorted by ascending `x`.
    ///
    /// The stroke is rasterized column by column: for every pixel column between the first and last
    /// point the curve height is interpolated and the perpendicular distance is approximated from the
    /// local slope. Ends are cut flat at the first and last point.
    pub(crate) fn stroke_curve(&mut self, points: &[Point], stroke: &Stroke, paint: &Paint) {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return;
        };
        if points.len() < 2 || stroke.width <= 0.0 {
            return;
        }
        let half_width = stroke.width / 2.0;
        let glow = stroke.glow.max(0.0);
        let sigma = glow / 3.0;
        let reach = half_width + glow + 1.0;
        let Some((x0, x1)) = self.clamp_span(first.x, last.x, self.pixels.width()) else {
            return;
        };

        let mut segment = 0;
        for px in x0..=x1 {
            let x = px as f32 + 0.5;
            if x < first.x || x > last.x {
                continue;
            }
            while segment + 2 < points.len() && points[segment + 1].x < x {
                segment += 1;
            }
            let (from, to) = (points[segment], points[segment + 1]);
            let run = to.x - from.x;
            let slope = if run.abs() > f32::EPSILON { (to.y - from.y) / run } else { 0.0 };
            let y = from.y + slope * (x - from.x) + stroke.offset_y;
            let normal_scale = 1.0 / (1.0 + slope * slope).sqrt();
            let vertical_reach = reach / normal_scale;
            let column_alpha = paint.alpha_at(x);
            if column_alpha <= 0.0 {
                continue;
            }

            let Some((y0, y1)) = self.clamp_span(y - vertical_reach, y + vertical_reach, self.pixels.height())
            else {
                continue;
            };
            for py in y0..=y1 {
                let distance = (py as f32 + 0.5 - y).abs() * normal_scale;
                let core = (half_width + 0.5 - distance).clamp(0.0, 1.0);
                let halo = if sigma > 0.0 {
                    let outside = (distance - half_width).max(0.0);
                    stroke.glow_strength * (-(outside * outside) / (2.0 * sigma * sigma)).exp()
                } else {
                    0.0
                };
                let coverage = core + (1.0 - core) * halo.clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(px, py, paint.color, coverage * column_alpha, paint.blend);
                }
            }
        }
    }

    /// Flattens layers, bottom first, over an opaque background.
    pub(crate) fn flatten(background: Color, layers: &[&Surface]) -> RgbaImage {
        let size = layers.first().map(|s| s.size()).unwrap_or(CanvasSize { width: 0, height: 0 });
        let [r, g, b] = background.channels();
        let mut output = RgbaImage::from_pixel(size.width, size.height, Rgba([r, g, b, 255]));
        for layer in layers {
            for (x, y, source) in layer.pixels.enumerate_pixels() {
                if source[3] == 0 || x >= size.width || y >= size.height {
                    continue;
                }
                let color = Color::new(source[0], source[1], source[2]);
                composite(output.get_pixel_mut(x, y), color, source[3] as f32 / 255.0, BlendMode::SourceOver);
            }
        }
        output
    }

    fn blend(&mut self, x: u32, y: u32, color: Color, alpha: f32, mode: BlendMode) {
        composite(self.pixels.get_pixel_mut(x, y), color, alpha, mode);
    }

    fn clamp_span(&self, from: f32, to: f32, limit: u32) -> Option<(u32, u32)> {
        if limit == 0 || to < 0.0 || from >= limit as f32 || from > to {
            return None;
        }
        let start = from.max(0.0).floor() as u32;
        let end = (to.ceil() as u32).min(limit - 1);
        (start <= end).then_some((start, end))
    }
}

/// Composites a color with the given alpha onto a pixel, per the W3C compositing model.
fn composite(destination: &mut Rgba<u8>, color: Color, alpha: f32, mode: BlendMode) {
    let source_alpha = alpha.clamp(0.0, 1.0);
    if source_alpha <= 0.0 {
        return;
    }
    let backdrop_alpha = destination[3] as f32 / 255.0;
    let output_alpha = source_alpha + backdrop_alpha * (1.0 - source_alpha);
    for (channel, source) in color.channels().into_iter().enumerate() {
        let source = source as f32 / 255.0;
        let backdrop = destination[channel] as f32 / 255.0;
        let blended = match mode {
            BlendMode::SourceOver => source,
            BlendMode::Screen => source + backdrop - source * backdrop,
        };
        let mixed = (1.0 - backdrop_alpha) * source + backdrop_alpha * blended;
        let premultiplied = source_alpha * mixed + backdrop_alpha * backdrop * (1.0 - source_alpha);
        destination[channel] = (premultiplied / output_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    destination[3] = (output_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(width: u32, height: u32) -> Surface {
        Surface::new(CanvasSize { width, height })
    }

    fn flat_line(from: f32, to: f32, y: f32) -> Vec<Point> {
        (0..=((to - from) as usize / 2)).map(|i| Point::new(from + i as f32 * 2.0, y)).collect()
    }

    const THIN: Stroke = Stroke { width: 2.0, glow: 0.0, glow_strength: 0.0, offset_y: 0.0 };

    #[test]
    fn new_surface_is_transparent() {
        assert!(surface(8, 8).is_blank());
    }

    #[test]
    fn disc_covers_its_center() {
        let mut canvas = surface(10, 10);
        canvas.fill_disc(Point::new(5.0, 5.0), 1.5, &Paint::solid(Color::WHITE));
        let center = canvas.pixel(5, 5).unwrap();
        assert_eq!(center, Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(0, 0).unwrap()[3], 0);
    }

    #[test]
    fn zero_global_alpha_paints_nothing() {
        let mut canvas = surface(20, 20);
        let paint = Paint { global_alpha: 0.0, ..Paint::solid(Color::WHITE) };
        canvas.fill_disc(Point::new(10.0, 10.0), 4.0, &paint);
        canvas.stroke_curve(&flat_line(0.0, 20.0, 10.0), &THIN, &paint);
        assert!(canvas.is_blank());
    }

    #[test]
    fn stroke_stays_between_endpoints() {
        let mut canvas = surface(40, 10);
        canvas.stroke_curve(&flat_line(10.0, 30.0, 5.0), &THIN, &Paint::solid(Color::WHITE));
        assert!(canvas.pixel(20, 5).unwrap()[3] > 0);
        assert_eq!(canvas.pixel(5, 5).unwrap()[3], 0);
        assert_eq!(canvas.pixel(35, 5).unwrap()[3], 0);
    }

    #[test]
    fn stroke_offset_moves_the_line() {
        let mut canvas = surface(40, 20);
        let stroke = Stroke { offset_y: -6.0, ..THIN };
        canvas.stroke_curve(&flat_line(0.0, 40.0, 15.0), &stroke, &Paint::solid(Color::WHITE));
        assert!(canvas.pixel(20, 9).unwrap()[3] > 0);
        assert_eq!(canvas.pixel(20, 15).unwrap()[3], 0);
    }

    #[test]
    fn glow_extends_past_the_stroke() {
        let mut plain = surface(40, 40);
        let mut glowing = surface(40, 40);
        let line = flat_line(0.0, 40.0, 20.0);
        plain.stroke_curve(&line, &THIN, &Paint::solid(Color::WHITE));
        glowing.stroke_curve(&line, &Stroke { glow: 10.0, glow_strength: 0.5, ..THIN }, &Paint::solid(Color::WHITE));
        assert_eq!(plain.pixel(20, 25).unwrap()[3], 0);
        assert!(glowing.pixel(20, 25).unwrap()[3] > 0);
    }

    #[test]
    fn screen_never_darkens() {
        let mut canvas = surface(4, 4);
        canvas.fill_disc(Point::new(2.0, 2.0), 3.0, &Paint::solid(Color::new(200, 100, 50)));
        let before = canvas.pixel(2, 2).unwrap();
        let paint = Paint { blend: BlendMode::Screen, global_alpha: 0.5, ..Paint::solid(Color::new(20, 20, 20)) };
        canvas.fill_disc(Point::new(2.0, 2.0), 3.0, &paint);
        let after = canvas.pixel(2, 2).unwrap();
        for channel in 0..3 {
            assert!(after[channel] >= before[channel]);
        }
    }

    #[test]
    fn flatten_uses_background_where_layers_are_empty() {
        let empty = surface(3, 3);
        let image = Surface::flatten(Color::new(1, 2, 3), &[&empty]);
        assert_eq!(*image.get_pixel(1, 1), Rgba([1, 2, 3, 255]));
    }
}
