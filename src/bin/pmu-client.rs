//! `pmu-client` — UDP clock-offset estimation client (spec §6, "CLI
//! surface (client)").

use clap::{Parser, ValueEnum};

use pmu_sync::client::{self, ClientConfig};
use pmu_sync::logging::{self, log_error};
use pmu_sync::reply::Scheme;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    Raw,
    Ewma,
    Kalman,
    Pid,
}

impl From<Mode> for Scheme {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Raw => Scheme::Raw,
            Mode::Ewma => Scheme::Ewma,
            Mode::Kalman => Scheme::Kalman,
            Mode::Pid => Scheme::Pid,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pmu-client", about = "UDP clock-offset estimation client")]
struct Args {
    /// Server address to poll, e.g. 127.0.0.1:12345.
    #[arg(long, default_value = "127.0.0.1:12345")]
    server: String,

    /// Correction scheme to request from the server.
    #[arg(long, value_enum, default_value = "raw")]
    mode: Mode,

    /// Packets to send before exiting cleanly; 0 means unlimited.
    #[arg(long, default_value_t = 0)]
    count: u64,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    logging::init_logger();
    let args = Args::parse();

    let server_addr = match args.server.parse() {
        Ok(addr) => addr,
        Err(e) => {
            log_error(&format!("invalid --server address {:?}: {e}", args.server));
            return std::process::ExitCode::FAILURE;
        }
    };

    let config = ClientConfig {
        server_addr,
        scheme: args.mode.into(),
        count: args.count,
    };

    match client::run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log_error(&format!("client exited with error: {e}"));
            std::process::ExitCode::FAILURE
        }
    }
}
