/// Task identifiers are random UUIDs assigned at submission.
pub type TaskId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
