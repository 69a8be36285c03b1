pub(crate) mod auth;
pub(crate) mod entry_codes;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod pagination;
pub(crate) mod questions;
pub(crate) mod quiz;
pub(crate) mod results;
pub(crate) mod router;
pub(crate) mod teams;
pub(crate) mod validation;
