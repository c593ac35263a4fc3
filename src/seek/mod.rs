pub(crate) mod completion;
pub(crate) mod driver;
