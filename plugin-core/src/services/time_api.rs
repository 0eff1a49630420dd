use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::model::time::TimeSnapshot;

pub const DEFAULT_BASE_URL: &str = "http://worldtimeapi.org/api/timezone";

#[derive(Error, Debug)]
pub enum TimeFetchError {
    #[error("time fetch error: HTTP {0}")]
    Status(u16),

    #[error("time request error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Source of the current time for a named zone.
pub trait TimeSource: Send + Sync {
    fn current_time(&self, timezone: &str) -> Result<TimeSnapshot, TimeFetchError>;
}

/// Single-shot HTTP lookup against a worldtimeapi-compatible service.
/// No retries and no caching.
pub struct WorldTimeApi {
    client: Client,
    base_url: String,
}

impl WorldTimeApi {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, TimeFetchError> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self::with_client(builder.build()?, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        WorldTimeApi {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, timezone: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), timezone)
    }
}

impl TimeSource for WorldTimeApi {
    fn current_time(&self, timezone: &str) -> Result<TimeSnapshot, TimeFetchError> {
        let url = self.url_for(timezone);
        debug!(%url, "fetching time");

        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(TimeFetchError::Status(status.as_u16()));
        }

        Ok(resp.json::<TimeSnapshot>()?)
    }
}
