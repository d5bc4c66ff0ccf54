//! Fertility tracking backend: ovulation prediction, sperm health scoring and the
//! HTTP service that serves them from a user's logged history.

pub mod bleeding;
pub mod config;
pub mod dates;
pub mod error;
pub mod logging;
pub mod models;
pub mod ovulation;
pub mod routes;
pub mod sperm;
pub mod stats;
pub mod store;
