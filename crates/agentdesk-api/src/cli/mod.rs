//! CLI command definitions for the `agentdesk` binary.

use clap::{Parser, Subcommand};

/// Agent management platform: agent registry and chat-completion proxy.
#[derive(Parser)]
#[command(name = "agentdesk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Detailed output (-v for debug, -vv for trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(long, env = "AGENTDESK_PORT", default_value_t = 5000)]
        port: u16,

        /// Host address to bind to.
        #[arg(long, env = "AGENTDESK_HOST", default_value = "127.0.0.1")]
        host: String,
    },

    /// Apply database migrations and exit.
    Migrate,
}
