use chrono::{DateTime, Utc};

/// Wall-clock timestamp attached to events.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
