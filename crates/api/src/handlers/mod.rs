//! Request handlers.
//!
//! Handlers parse the request, delegate rules to `babyspa_core` and storage
//! to the repositories in `babyspa_db`, and map errors via [`AppError`].
//!
//! [`AppError`]: crate::error::AppError

pub mod appointment;
pub mod package_purchase;
pub mod payment;
pub mod schedule;
