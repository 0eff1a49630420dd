//! Command line and environment configuration for a plugin process.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::parsers::product_page::MarkupExtractor;
use crate::plugins::analyzer::DEFAULT_PRODUCT_URL_PREFIX;
use crate::plugins::time::DEFAULT_TIMEZONE;
use crate::plugins::{OzonAnalyzer, Plugin, TimePlugin};
use crate::protocol::server::MalformedLinePolicy;
use crate::services::catalog::StubCatalog;
use crate::services::time_api::{TimeFetchError, WorldTimeApi, DEFAULT_BASE_URL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PluginKind {
    /// Product description vs composition analysis (`analyze_product`).
    OzonAnalyzer,
    /// Current time lookup (`get_time`).
    TimeTest,
}

#[derive(Debug, Parser)]
#[command(
    name = "mcp-plugin",
    version,
    about = "Line-delimited JSON plugin process over stdin/stdout"
)]
pub struct Cli {
    /// Which plugin this process serves.
    #[arg(value_enum)]
    pub plugin: PluginKind,

    /// Handling of undecodable request lines and panicking handlers.
    #[arg(
        long,
        env = "MCP_PLUGIN_ON_MALFORMED",
        value_enum,
        default_value_t = MalformedLinePolicy::Recover
    )]
    pub on_malformed: MalformedLinePolicy,

    /// Tracing filter directive; falls back to RUST_LOG, then `info`.
    #[arg(long, env = "MCP_PLUGIN_LOG")]
    pub log_filter: Option<String>,

    #[arg(long, env = "TIME_API_URL", default_value = DEFAULT_BASE_URL)]
    pub time_api_url: String,

    #[arg(long, env = "DEFAULT_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    pub default_timezone: String,

    /// Whole-request timeout for the time service. Unset means no timeout.
    #[arg(long, env = "HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,

    #[arg(long, env = "PRODUCT_URL_PREFIX", default_value = DEFAULT_PRODUCT_URL_PREFIX)]
    pub product_url_prefix: String,
}

impl Cli {
    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    pub fn build_plugin(&self) -> Result<Box<dyn Plugin>, TimeFetchError> {
        Ok(match self.plugin {
            PluginKind::OzonAnalyzer => Box::new(OzonAnalyzer::new(
                Box::new(MarkupExtractor),
                Box::new(StubCatalog::default()),
                self.product_url_prefix.clone(),
            )),
            PluginKind::TimeTest => {
                let api = WorldTimeApi::new(self.time_api_url.clone(), self.http_timeout())?;
                let timezone = self.default_timezone.clone();
                Box::new(TimePlugin::new(Box::new(api), timezone))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_is_required() {
        assert!(Cli::try_parse_from(["mcp-plugin"]).is_err());
        assert!(Cli::try_parse_from(["mcp-plugin", "weather"]).is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "mcp-plugin",
            "time-test",
            "--on-malformed",
            "terminate",
            "--time-api-url",
            "http://127.0.0.1:9/api/timezone",
            "--default-timezone",
            "UTC",
            "--http-timeout-secs",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.plugin, PluginKind::TimeTest);
        assert_eq!(cli.on_malformed, MalformedLinePolicy::Terminate);
        assert_eq!(cli.time_api_url, "http://127.0.0.1:9/api/timezone");
        assert_eq!(cli.default_timezone, "UTC");
        assert_eq!(cli.http_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn builds_the_selected_plugin() {
        let cli = Cli::try_parse_from(["mcp-plugin", "ozon-analyzer"]).unwrap();
        assert_eq!(cli.build_plugin().unwrap().name(), "ozon-analyzer");

        let cli = Cli::try_parse_from(["mcp-plugin", "time-test"]).unwrap();
        assert_eq!(cli.build_plugin().unwrap().name(), "time-test");
    }
}
