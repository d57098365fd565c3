//! `pmu-server` — UDP clock-offset estimation server (spec §6, "CLI
//! surface (server)").

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use pmu_sync::constants::{DEFAULT_BIND_ADDR, DEFAULT_RAW_PORT, DEFAULT_SCHEME_AWARE_PORT};
use pmu_sync::logging::{self, log_error};
use pmu_sync::server::{self, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "pmu-server", about = "UDP clock-offset estimation server")]
struct Args {
    /// Interface/port to bind. Defaults to 12345 in raw mode, 12346 when
    /// `--hide-raw` selects scheme-aware mode.
    #[arg(long)]
    bind: Option<String>,

    /// Suppress raw per-packet traces in diagnostics and switch to the
    /// scheme-aware default port.
    #[arg(long)]
    hide_raw: bool,

    /// Seconds between statistics snapshot writes.
    #[arg(long, default_value_t = 10)]
    snapshot_interval_secs: u64,

    /// File the statistics snapshot JSON is written to.
    #[arg(long, default_value = "timing_analysis.json")]
    snapshot_path: PathBuf,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    logging::init_logger();
    let args = Args::parse();

    let bind = args.bind.unwrap_or_else(|| {
        let port = if args.hide_raw {
            DEFAULT_SCHEME_AWARE_PORT
        } else {
            DEFAULT_RAW_PORT
        };
        format!("{DEFAULT_BIND_ADDR}:{port}")
    });

    let bind_addr = match bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            log_error(&format!("invalid --bind address {:?}: {e}", bind));
            return std::process::ExitCode::FAILURE;
        }
    };

    let config = ServerConfig {
        bind_addr,
        hide_raw: args.hide_raw,
        snapshot_interval: Duration::from_secs(args.snapshot_interval_secs),
        snapshot_path: args.snapshot_path,
    };

    match server::run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log_error(&format!("server exited with error: {e}"));
            std::process::ExitCode::FAILURE
        }
    }
}
