use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LONG_ABOUT: &str = r#"
twintail - web console for Tailscale Services

Reads `tailscale serve status --json` and drives `tailscale serve` to
advertise services and manage their endpoints.

Commands:
  twintail serve          Run the web console (default http://127.0.0.1:8077)
  twintail status         List advertised services
  twintail show <name>    Show one service with its endpoints
  twintail doctor         Check that the tailscale CLI is reachable

Environment:
  TWINTAIL_BIND, PORT     Console listen address
  TAILSCALE_BIN           tailscale binary (name on PATH or absolute path)
  TWINTAIL_LANG           Default console language (en, ja)
  RUST_LOG                Log filter, overrides -v/-q
"#;

#[derive(Parser, Clone)]
#[command(name = "twintail")]
#[command(about = "Web console and CLI for Tailscale Services")]
#[command(long_about = LONG_ABOUT)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output (-q)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// tailscale binary to run (overrides TAILSCALE_BIN)
    #[arg(long, global = true)]
    pub tailscale_bin: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run the web console
    Serve {
        /// Address to bind (overrides TWINTAIL_BIND)
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Write logs to this file instead of stderr
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// List advertised services
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show one service with its hostname and endpoints
    ///
    /// Examples:
    ///   twintail show web-app
    ///   twintail show svc:web-app --format json
    Show {
        /// Service name, with or without the `svc:` prefix
        name: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check that the tailscale CLI is installed and reachable
    Doctor,
}

impl Commands {
    pub fn is_serve(&self) -> bool {
        matches!(self, Commands::Serve { .. })
    }
}
