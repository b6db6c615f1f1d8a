//! Baby-spa domain core.
//!
//! Pure, synchronous business rules shared by the API and persistence
//! layers: business hours, weekly schedule preferences, bulk slot
//! generation, installment status and payment validation. No I/O and no
//! internal crate dependencies.

pub mod business_hours;
pub mod conflict;
pub mod error;
pub mod installments;
pub mod json_list;
pub mod locale;
pub mod payments;
pub mod schedule_preference;
pub mod slot_generator;
pub mod time_of_day;
pub mod types;
