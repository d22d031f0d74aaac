use serde::{Deserialize, Serialize};

/// The size of the window the animation is shown in, in virtual pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct WindowSize {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl WindowSize {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The size of a canvas backing a window.
///
/// Canvases never get narrower than a minimum width so the horizon keeps its shape on small
/// viewports; the excess is simply cropped by whoever presents the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CanvasSize {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl CanvasSize {
    pub(crate) fn for_window(window: WindowSize, min_width: u32) -> Self {
        Self { width: window.width.max(min_width), height: window.height }
    }

    pub(crate) fn center_x(&self) -> f32 {
        self.width as f32 / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::narrow(800, 1920)]
    #[case::exact(1920, 1920)]
    #[case::wide(2560, 2560)]
    fn canvas_width_is_clamped(#[case] window_width: u32, #[case] expected: u32) {
        let size = CanvasSize::for_window(WindowSize::new(window_width, 600), 1920);
        assert_eq!(size.width, expected);
        assert_eq!(size.height, 600);
    }
}
