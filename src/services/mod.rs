pub(crate) mod question_bank;
pub(crate) mod quiz_finalize;
pub(crate) mod result_export;
pub(crate) mod scoring;
pub(crate) mod team_sync;
