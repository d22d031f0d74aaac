mod common;

// Individual layers
pub(crate) mod cursor;
pub(crate) mod horizon;
pub(crate) mod starfield;
pub(crate) mod timeline;

pub(crate) use common::{ease_out, lerp, ramp};
