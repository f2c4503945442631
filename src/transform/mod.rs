pub(crate) mod ops;
pub(crate) mod pipeline;
pub(crate) mod vignette;
