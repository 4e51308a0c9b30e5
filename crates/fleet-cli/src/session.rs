//! Persistent daemon connection and the request/response exchange.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use fleet_protocol::{Request, Response, decode_message, write_message};

use crate::errors::AppError;

pub(crate) const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// One connected client session. The socket stays open across commands;
/// requests and responses strictly alternate on it.
pub struct Session {
    stream: TcpStream,
}

impl Session {
    /// Resolves the endpoint and connects with a bounded timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Resolve`] when the host does not resolve and
    /// [`AppError::Connect`] when the connection cannot be established.
    pub fn connect(host: &str, port: u16) -> Result<Self, AppError> {
        let endpoint = format!("{host}:{port}");
        let address = resolve(host, port).map_err(|source| AppError::Resolve {
            endpoint: endpoint.clone(),
            source,
        })?;
        let stream = TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT)
            .map_err(|source| AppError::Connect { endpoint, source })?;
        Ok(Self { stream })
    }

    /// Sends one request and blocks for the matching response.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`] on framing or IO failures and
    /// [`AppError::ConnectionClosed`] when the daemon hangs up instead of
    /// answering.
    pub fn exchange(&mut self, request: &Request) -> Result<Response, AppError> {
        write_message(&mut self.stream, request)?;
        decode_message(&mut self.stream)?.ok_or(AppError::ConnectionClosed)
    }
}

fn resolve(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}
