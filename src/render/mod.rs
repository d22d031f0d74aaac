pub(crate) mod color;
pub(crate) mod host;
pub(crate) mod properties;
pub(crate) mod scheduler;
pub(crate) mod surface;
