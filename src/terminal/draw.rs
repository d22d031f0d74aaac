use crate::render::{color::Color, properties::WindowSize};
use image::RgbaImage;

/// How many virtual pixels a terminal cell stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CellMetrics {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl CellMetrics {
    pub(crate) fn window(&self, columns: u16, rows: u16) -> WindowSize {
        WindowSize::new(columns as u32 * self.width, rows as u32 * self.height)
    }
}

/// A terminal cell drawn as an upper half block: two vertically stacked pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HalfBlock {
    pub(crate) top: Color,
    pub(crate) bottom: Color,
}

/// A frame downsampled to terminal cells.
#[derive(Clone, Debug)]
pub(crate) struct CellGrid {
    columns: u16,
    rows: u16,
    cells: Vec<HalfBlock>,
}

impl CellGrid {
    /// Downsamples a flattened canvas onto a grid of cells.
    ///
    /// Canvases can be wider than the window they back, in which case the middle of the canvas is
    /// shown. Each half cell keeps the brightest pixel it covers, so single pixel stars survive the
    /// reduction.
    pub(crate) fn from_image(image: &RgbaImage, window: WindowSize, metrics: CellMetrics) -> Self {
        let columns = (window.width / metrics.width.max(1)).min(u16::MAX as u32) as u16;
        let rows = (window.height / metrics.height.max(1)).min(u16::MAX as u32) as u16;
        let offset_x = image.width().saturating_sub(window.width) / 2;
        let half_height = (metrics.height / 2).max(1);
        let mut cells = Vec::with_capacity(columns as usize * rows as usize);
        for row in 0..rows as u32 {
            for column in 0..columns as u32 {
                let x = offset_x + column * metrics.width;
                let y = row * metrics.height;
                let top = brightest(image, x, y, metrics.width, half_height);
                let bottom = brightest(image, x, y + half_height, metrics.width, metrics.height - half_height);
                cells.push(HalfBlock { top, bottom });
            }
        }
        Self { columns, rows, cells }
    }

    pub(crate) fn columns(&self) -> u16 {
        self.columns
    }

    pub(crate) fn rows(&self) -> u16 {
        self.rows
    }

    pub(crate) fn cell(&self, column: u16, row: u16) -> Option<&HalfBlock> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells.get(row as usize * self.columns as usize + column as usize)
    }

    pub(crate) fn row(&self, row: u16) -> &[HalfBlock] {
        let start = row as usize * self.columns as usize;
        self.cells.get(start..start + self.columns as usize).unwrap_or_default()
    }
}

fn brightest(image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> Color {
    let mut best = Color::BLACK;
    let mut best_luminance = -1.0;
    for py in y..(y + height).min(image.height()) {
        for px in x..(x + width).min(image.width()) {
            let pixel = image.get_pixel(px, py);
            let color = Color::new(pixel[0], pixel[1], pixel[2]);
            let luminance = color.luminance();
            if luminance > best_luminance {
                best = color;
                best_luminance = luminance;
            }
        }
    }
    best
}

/// A piece of text laid over the grid.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TextOverlay {
    pub(crate) column: u16,
    pub(crate) row: u16,
    pub(crate) text: String,
    pub(crate) color: Color,
}

impl TextOverlay {
    /// Centers `text` horizontally on `row`.
    pub(crate) fn centered(text: &str, row: u16, columns: u16, color: Color) -> Self {
        let width = text.chars().count() as u16;
        let column = columns.saturating_sub(width) / 2;
        Self { column, row, text: text.to_string(), color }
    }

    pub(crate) fn contains(&self, column: u16, row: u16) -> bool {
        let width = self.text.chars().count() as u16;
        row == self.row && column >= self.column && column < self.column.saturating_add(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const METRICS: CellMetrics = CellMetrics { width: 4, height: 8 };

    #[test]
    fn grid_matches_window() {
        let image = RgbaImage::new(40, 16);
        let grid = CellGrid::from_image(&image, WindowSize::new(40, 16), METRICS);
        assert_eq!((grid.columns(), grid.rows()), (10, 2));
        assert_eq!(grid.row(1).len(), 10);
    }

    #[test]
    fn single_pixels_survive_downsampling() {
        let mut image = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        image.put_pixel(5, 6, Rgba([255, 255, 255, 255]));
        let grid = CellGrid::from_image(&image, WindowSize::new(8, 8), METRICS);
        let cell = grid.cell(1, 0).unwrap();
        assert_eq!(cell.bottom, Color::WHITE);
        assert_eq!(cell.top, Color::BLACK);
        assert_eq!(grid.cell(0, 0).unwrap().bottom, Color::BLACK);
    }

    #[test]
    fn wide_canvases_are_center_cropped() {
        let mut image = RgbaImage::from_pixel(16, 8, Rgba([0, 0, 0, 255]));
        image.put_pixel(4, 0, Rgba([255, 0, 0, 255]));
        let grid = CellGrid::from_image(&image, WindowSize::new(8, 8), METRICS);
        assert_eq!(grid.cell(0, 0).unwrap().top, Color::new(255, 0, 0));
    }

    #[test]
    fn overlays_center_and_hit_test() {
        let overlay = TextOverlay::centered("Go", 3, 10, Color::WHITE);
        assert_eq!(overlay.column, 4);
        assert!(overlay.contains(5, 3));
        assert!(!overlay.contains(6, 3));
        assert!(!overlay.contains(4, 2));
    }
}
