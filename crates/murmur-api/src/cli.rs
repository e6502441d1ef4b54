//! CLI definition for the `murmur` binary.

use clap::{Parser, Subcommand};

/// Two-party messaging server.
#[derive(Parser)]
#[command(name = "murmur", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log one JSON object per line.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Address to bind. Defaults to `server.host` from config.toml.
        #[arg(long, env = "MURMUR_HOST")]
        host: Option<String>,

        /// Port to listen on. Defaults to `server.port` from config.toml.
        #[arg(short, long, env = "MURMUR_PORT")]
        port: Option<u16>,

        /// Keep all data in memory; nothing is written to disk.
        #[arg(long)]
        in_memory: bool,
    },
}
