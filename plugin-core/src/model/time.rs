use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields read from the time service, kept as whatever JSON the service sent.
/// Anything the service omits is `null`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TimeSnapshot {
    #[serde(default)]
    pub datetime: Value,

    #[serde(default)]
    pub timezone: Value,

    #[serde(default)]
    pub utc_offset: Value,

    #[serde(default)]
    pub day_of_week: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TimeReport {
    pub datetime: Value,
    pub timezone: Value,
    pub utc_offset: Value,
    pub day_of_week: Value,
    pub message: String,
}

impl TimeReport {
    /// `requested` is the zone the caller asked for, which is what the message
    /// names even if the service echoes a canonical spelling.
    pub fn new(requested: &str, snapshot: TimeSnapshot) -> Self {
        let message = format!(
            "Current time in {}: {}",
            requested,
            snapshot.datetime.as_str().unwrap_or("unknown")
        );
        TimeReport {
            datetime: snapshot.datetime,
            timezone: snapshot.timezone,
            utc_offset: snapshot.utc_offset,
            day_of_week: snapshot.day_of_week,
            message,
        }
    }
}
