use serde_json::Value;
use tracing::debug;

use super::{str_param, Plugin};
use crate::error::PluginError;
use crate::model::time::TimeReport;
use crate::protocol::{Method, Params};
use crate::services::time_api::TimeSource;

pub const DEFAULT_TIMEZONE: &str = "Europe/Moscow";

/// Reports the current time of a zone as seen by an external time service.
pub struct TimePlugin {
    source: Box<dyn TimeSource>,
    default_timezone: String,
}

impl TimePlugin {
    pub fn new(source: Box<dyn TimeSource>, default_timezone: impl Into<String>) -> Self {
        TimePlugin {
            source,
            default_timezone: default_timezone.into(),
        }
    }

    fn get_time(&self, params: &Params) -> Result<Value, PluginError> {
        // An absent zone falls back to the default rather than being rejected.
        let timezone = str_param(params, "timezone").unwrap_or(self.default_timezone.as_str());
        debug!(timezone, "get_time");

        let snapshot = self.source.current_time(timezone)?;
        let report = TimeReport::new(timezone, snapshot);
        serde_json::to_value(report).map_err(|e| PluginError::Internal(e.to_string()))
    }
}

impl Plugin for TimePlugin {
    fn name(&self) -> &'static str {
        "time-test"
    }

    fn methods(&self) -> &'static [Method] {
        &[Method::GetTime]
    }

    fn handle(&self, method: Method, params: &Params) -> Result<Value, PluginError> {
        match method {
            Method::GetTime => self.get_time(params),
            other => Err(PluginError::MethodNotFound(other.as_str().to_string())),
        }
    }
}
