use std::time::SystemTime;

use chrono::{DateTime, Utc};

pub fn now_u64() -> u64 {
    now_i64() as u64
}

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

/// Whole seconds elapsed since `modified`; 0 when the mtime lies in the future.
pub fn age_seconds(modified: SystemTime) -> u64 {
    age_seconds_at(modified, Utc::now())
}

pub fn age_seconds_at(modified: SystemTime, now: DateTime<Utc>) -> u64 {
    let modified: DateTime<Utc> = modified.into();
    (now - modified).num_seconds().max(0) as u64
}
