pub(crate) mod simulated;
pub(crate) mod source;
