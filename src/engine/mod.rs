pub(crate) mod augment;
pub(crate) mod ids;
pub(crate) mod jobs;
pub(crate) mod purge;
