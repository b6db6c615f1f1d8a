/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Day of week as stored and exchanged by the portal: 0 = Sunday .. 6 = Saturday.
pub type DayOfWeek = u8;
