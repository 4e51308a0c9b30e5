//! Error types and diagnostics helpers for the client runtime.

use std::io;

use thiserror::Error;

use fleet_protocol::FrameError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to resolve daemon address {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to connect to daemon at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to exchange with the daemon: {0}")]
    Transport(#[from] FrameError),
    #[error("daemon closed the connection")]
    ConnectionClosed,
    #[error("console input ended while a record body was expected")]
    InputClosed,
    #[error("failed to read console input: {0}")]
    ReadInput(#[source] io::Error),
    #[error("failed to write console output: {0}")]
    WriteOutput(#[source] io::Error),
}

/// Determines whether an error indicates the daemon is not running.
///
/// Returns true for connection-refused, socket-not-found, and
/// address-unavailable errors, which typically mean no daemon is listening.
#[must_use]
pub fn is_daemon_not_running(error: &AppError) -> bool {
    match error {
        AppError::Connect { source, .. } => matches!(
            source.kind(),
            io::ErrorKind::ConnectionRefused
                | io::ErrorKind::NotFound
                | io::ErrorKind::AddrNotAvailable
        ),
        _ => false,
    }
}
