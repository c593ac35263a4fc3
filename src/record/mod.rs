pub(crate) mod overlay;
pub(crate) mod recorder;
