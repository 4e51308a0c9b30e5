//! Daemon command-line configuration.

use std::path::PathBuf;

use clap::Parser;

pub use fleet_protocol::DEFAULT_PORT;

/// Runtime configuration parsed from the command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "fleetd", version, about = "Vehicle collection daemon")]
pub struct ServerConfig {
    /// Interface to bind the listening socket to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// TCP port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Snapshot file holding the collection between runs.
    #[arg(long, default_value = "fleet-snapshot.json")]
    pub snapshot: PathBuf,

    /// Tracing filter expression, e.g. `info` or `fleetd=debug`.
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

impl ServerConfig {
    /// Bind address in `host:port` form.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
