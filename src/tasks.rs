pub(crate) mod quiz_maintenance;
pub(crate) mod scheduler;
