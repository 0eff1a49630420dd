use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use plugin_core::config::Cli;
use plugin_core::protocol::server::{PluginServer, Shutdown};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries protocol lines only; diagnostics go to stderr.
    let filter = cli
        .log_filter
        .as_deref()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let plugin = match cli.build_plugin() {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "failed to initialize plugin");
            return ExitCode::FAILURE;
        }
    };

    let server = PluginServer::new(plugin).on_malformed(cli.on_malformed);

    let stdin = io::stdin();
    let stdout = io::stdout();

    match server.run(stdin.lock(), stdout.lock()) {
        Ok(Shutdown::EndOfInput) => ExitCode::SUCCESS,
        Ok(Shutdown::Fatal) => {
            info!("exiting after fatal request");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "plugin server failed");
            ExitCode::FAILURE
        }
    }
}
