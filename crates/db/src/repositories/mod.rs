//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod appointment_repo;
pub mod package_purchase_repo;
pub mod payment_repo;

pub use appointment_repo::AppointmentRepo;
pub use package_purchase_repo::PackagePurchaseRepo;
pub use payment_repo::PaymentRepo;
