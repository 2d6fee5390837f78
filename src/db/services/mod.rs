//! Data-access functions, one sub-module per entity.
//!
//! Everything takes a connection (or an open transaction) explicitly; no
//! service keeps state of its own.

pub mod check_log_service;
pub mod target_service;

pub use check_log_service::*;
pub use target_service::*;
