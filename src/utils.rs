use chrono::{DateTime, Utc};
use nanoid::nanoid;

/// generate a random run id
pub fn longid() -> String {
    nanoid!(21)
}

pub fn time_millis() -> i64 {
    let time: DateTime<chrono::Utc> = Utc::now();
    time.timestamp_millis()
}
