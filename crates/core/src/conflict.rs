//! Conflict predicates for generated slots.
//!
//! The authoritative check (existing appointments) lives in the API layer,
//! which counts bookings in the database and hands the generator a closure.
//! [`PopularTimes`] is a cheap offline hint used before that check runs.

use crate::slot_generator::GeneratedSlot;

/// Start times that are usually booked out.
pub const POPULAR_TIMES: [&str; 4] = ["09:00", "10:00", "15:00", "16:00"];

/// Something that can tell how many bookings clash with a slot.
pub trait ConflictCheck {
    fn conflict_count(&self, slot: &GeneratedSlot) -> u32;
}

impl<F> ConflictCheck for F
where
    F: Fn(&GeneratedSlot) -> u32,
{
    fn conflict_count(&self, slot: &GeneratedSlot) -> u32 {
        self(slot)
    }
}

/// Heuristic: flags slots starting at a popular time.
#[derive(Debug, Clone)]
pub struct PopularTimes {
    times: Vec<String>,
}

impl Default for PopularTimes {
    fn default() -> Self {
        Self::new(POPULAR_TIMES)
    }
}

impl PopularTimes {
    pub fn new<I, S>(times: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            times: times.into_iter().map(Into::into).collect(),
        }
    }
}

impl ConflictCheck for PopularTimes {
    fn conflict_count(&self, slot: &GeneratedSlot) -> u32 {
        u32::from(self.times.iter().any(|t| *t == slot.start_time))
    }
}

/// Pre-check hint; not a substitute for the appointment lookup.
pub fn might_have_conflicts(slot: &GeneratedSlot) -> bool {
    PopularTimes::default().conflict_count(slot) > 0
}
