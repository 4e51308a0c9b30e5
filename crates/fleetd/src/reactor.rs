//! Single-threaded, non-blocking connection reactor.
//!
//! One thread owns the listening socket, every client connection, and the
//! command context. Sockets are polled without blocking, so a slow client
//! never stalls the others, and because only this thread dispatches
//! commands, the registry needs no locking. Operator commands arrive over a
//! channel and pass through the same dispatcher as wire requests.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use fleet_protocol::{Request, Response, encode_message, read_frame};

use crate::commands::CommandContext;
use crate::dispatch::RequestProcessor;

const REACTOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::reactor");
const POLL_BACKOFF: Duration = Duration::from_millis(10);

/// Failures while standing up or tearing down the reactor.
#[derive(Debug, Error)]
pub enum ReactorError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to switch the listener to non-blocking mode: {0}")]
    NonBlocking(#[source] io::Error),
    #[error("reactor thread panicked")]
    ThreadPanic,
}

/// The event loop before it is started.
pub struct Reactor {
    listener: TcpListener,
    address: SocketAddr,
    processor: RequestProcessor,
    context: CommandContext,
    console: Receiver<Request>,
}

/// One accepted client connection.
struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    pending: Vec<u8>,
    open: bool,
}

impl Connection {
    fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            pending: Vec::new(),
            open: true,
        }
    }

    /// Pushes buffered response bytes out until the socket stops accepting
    /// them. Returns true when any progress was made.
    fn flush_pending(&mut self) -> bool {
        let mut progressed = false;
        while !self.pending.is_empty() {
            match self.stream.write(&self.pending) {
                Ok(0) => {
                    self.open = false;
                    return true;
                }
                Ok(written) => {
                    self.pending.drain(..written);
                    progressed = true;
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    warn!(
                        target: REACTOR_TARGET,
                        peer = %self.peer,
                        error = %error,
                        "write failed, closing connection"
                    );
                    self.open = false;
                    return true;
                }
            }
        }
        progressed
    }
}

impl Reactor {
    /// Binds the listening socket and takes ownership of the command state.
    ///
    /// # Errors
    ///
    /// Returns [`ReactorError::Bind`] when the address cannot be bound and
    /// [`ReactorError::NonBlocking`] when the listener cannot be switched to
    /// non-blocking mode.
    pub fn bind(
        address: &str,
        context: CommandContext,
        console: Receiver<Request>,
    ) -> Result<Self, ReactorError> {
        let listener = TcpListener::bind(address).map_err(|source| ReactorError::Bind {
            address: address.to_owned(),
            source,
        })?;
        listener
            .set_nonblocking(true)
            .map_err(ReactorError::NonBlocking)?;
        let address = listener.local_addr().map_err(ReactorError::NonBlocking)?;
        Ok(Self {
            listener,
            address,
            processor: RequestProcessor::new(),
            context,
            console,
        })
    }

    /// Bound socket address, useful when port 0 was requested.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Spawns the event loop on a background thread.
    #[must_use]
    pub fn start(self) -> ReactorHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let address = self.address;
        let shutdown_flag = Arc::clone(&shutdown);
        let handle = thread::spawn(move || self.run(&shutdown_flag));
        ReactorHandle {
            shutdown,
            address,
            handle: Some(handle),
        }
    }

    fn run(mut self, shutdown: &AtomicBool) {
        info!(
            target: REACTOR_TARGET,
            address = %self.address,
            "listening for clients"
        );
        let mut connections: Vec<Connection> = Vec::new();
        while !shutdown.load(Ordering::SeqCst) {
            let mut busy = self.accept_pending(&mut connections);
            busy |= self.drain_console();
            for connection in &mut connections {
                busy |= self.service(connection);
            }
            connections.retain(|connection| connection.open);
            if !busy {
                thread::sleep(POLL_BACKOFF);
            }
        }
        // Orderly shutdown keeps the snapshot current.
        self.dispatch_internal_save("shutdown");
        info!(target: REACTOR_TARGET, "reactor stopped");
    }

    /// Accepts every connection the listener has queued.
    fn accept_pending(&mut self, connections: &mut Vec<Connection>) -> bool {
        let mut accepted = false;
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(error) = stream.set_nonblocking(true) {
                        warn!(
                            target: REACTOR_TARGET,
                            peer = %peer,
                            error = %error,
                            "dropping connection, cannot set non-blocking"
                        );
                        continue;
                    }
                    info!(target: REACTOR_TARGET, peer = %peer, "client connected");
                    connections.push(Connection::new(stream, peer));
                    accepted = true;
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
                Err(error) => {
                    warn!(
                        target: REACTOR_TARGET,
                        error = %error,
                        "accept failed"
                    );
                    break;
                }
            }
        }
        accepted
    }

    /// Runs any operator commands queued on the console channel.
    fn drain_console(&mut self) -> bool {
        let mut executed = false;
        loop {
            match self.console.try_recv() {
                Ok(request) => {
                    let response = self.processor.process(&mut self.context, &request);
                    for line in &response.output {
                        info!(target: REACTOR_TARGET, "console: {line}");
                    }
                    for line in &response.errors {
                        warn!(target: REACTOR_TARGET, "console: {line}");
                    }
                    executed = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        executed
    }

    /// Advances one connection: flush buffered output first, then try to
    /// read and dispatch the next frame.
    fn service(&mut self, connection: &mut Connection) -> bool {
        if !connection.pending.is_empty() {
            return connection.flush_pending();
        }
        match read_frame(&mut connection.stream) {
            Ok(Some(payload)) => {
                let response = self.respond(&payload);
                match encode_message(&response) {
                    Ok(frame) => {
                        connection.pending = frame;
                        connection.flush_pending();
                    }
                    Err(error) => {
                        warn!(
                            target: REACTOR_TARGET,
                            peer = %connection.peer,
                            error = %error,
                            "response encoding failed, closing connection"
                        );
                        connection.open = false;
                    }
                }
                true
            }
            Ok(None) => {
                info!(target: REACTOR_TARGET, peer = %connection.peer, "client disconnected");
                connection.open = false;
                self.dispatch_internal_save("client disconnect");
                true
            }
            Err(error) if error.is_would_block() => false,
            Err(error) => {
                warn!(
                    target: REACTOR_TARGET,
                    peer = %connection.peer,
                    error = %error,
                    "framing error, closing connection"
                );
                connection.open = false;
                self.dispatch_internal_save("connection error");
                true
            }
        }
    }

    /// Decodes and dispatches one frame payload.
    fn respond(&mut self, payload: &[u8]) -> Response {
        match serde_json::from_slice::<Request>(payload) {
            Ok(request) => {
                debug!(
                    target: REACTOR_TARGET,
                    command = %request.command,
                    "request received"
                );
                self.processor.process(&mut self.context, &request)
            }
            Err(error) => Response::failure(vec![format!("Malformed request: {error}")]),
        }
    }

    /// Snapshots the collection through the normal dispatch path.
    fn dispatch_internal_save(&mut self, cause: &str) {
        let response = self
            .processor
            .process(&mut self.context, &Request::new("save", Vec::new()));
        if response.success {
            debug!(target: REACTOR_TARGET, cause, "collection snapshotted");
        } else {
            warn!(
                target: REACTOR_TARGET,
                cause,
                errors = ?response.errors,
                "snapshot on close failed"
            );
        }
    }
}

/// Handle to the background reactor thread.
pub struct ReactorHandle {
    shutdown: Arc<AtomicBool>,
    address: SocketAddr,
    handle: Option<thread::JoinHandle<()>>,
}

impl ReactorHandle {
    /// Bound socket address.
    #[must_use]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Signals the event loop to exit after its current pass.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the event loop thread to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ReactorError::ThreadPanic`] when the thread panicked.
    pub fn join(mut self) -> Result<(), ReactorError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ReactorError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ReactorHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpStream;
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Sender};
    use std::time::Instant;

    use fleet_protocol::{ResponseKind, decode_message, encode_message, write_message};

    use super::*;
    use crate::registry::VehicleRegistry;
    use crate::test_support::sample_body;

    struct TestDaemon {
        handle: ReactorHandle,
        console: Sender<Request>,
        snapshot: PathBuf,
        _dir: tempfile::TempDir,
    }

    fn start_daemon() -> TestDaemon {
        let dir = tempfile::tempdir().expect("temp dir");
        let snapshot = dir.path().join("snapshot.json");
        let context = CommandContext::new(VehicleRegistry::new(), snapshot.clone());
        let (console, receiver) = mpsc::channel();
        let reactor = Reactor::bind("127.0.0.1:0", context, receiver).expect("bind");
        TestDaemon {
            handle: reactor.start(),
            console,
            snapshot,
            _dir: dir,
        }
    }

    fn connect(daemon: &TestDaemon) -> TcpStream {
        let stream = TcpStream::connect(daemon.handle.address()).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
        stream
    }

    fn exchange(stream: &mut TcpStream, request: &Request) -> Response {
        write_message(stream, request).expect("send request");
        decode_message(stream).expect("read response").expect("response frame")
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn two_phase_insert_over_the_wire() {
        let daemon = start_daemon();
        let mut stream = connect(&daemon);

        let first = Request::new("insert", args(&["5"]));
        let response = exchange(&mut stream, &first);
        assert_eq!(response.kind, ResponseKind::NeedsMoreData);

        let response = exchange(&mut stream, &first.into_continuation(sample_body()));
        assert_eq!(response.kind, ResponseKind::Final);
        assert!(response.success, "errors: {:?}", response.errors);

        let response = exchange(&mut stream, &Request::new("show", Vec::new()));
        assert!(response.success);
        assert_eq!(response.output.len(), 1);
        assert!(response.output[0].starts_with("key 5:"));

        daemon.handle.shutdown();
        daemon.handle.join().expect("join");
    }

    #[test]
    fn one_connection_carries_many_requests() {
        let daemon = start_daemon();
        let mut stream = connect(&daemon);

        for _ in 0..3 {
            let response = exchange(&mut stream, &Request::new("info", Vec::new()));
            assert!(response.success);
        }
        let response = exchange(&mut stream, &Request::new("launch", Vec::new()));
        assert!(!response.success);
        assert_eq!(response.errors, vec!["Unknown command 'launch'".to_owned()]);

        daemon.handle.shutdown();
        daemon.handle.join().expect("join");
    }

    #[test]
    fn slow_client_does_not_block_others() {
        let daemon = start_daemon();
        // The idle client holds a connection open without sending anything.
        let _idle = connect(&daemon);
        let mut active = connect(&daemon);

        let response = exchange(&mut active, &Request::new("show", Vec::new()));
        assert!(response.success);
        assert_eq!(response.output, vec!["Collection is empty".to_owned()]);

        daemon.handle.shutdown();
        daemon.handle.join().expect("join");
    }

    #[test]
    fn truncated_frame_closes_the_connection() {
        let daemon = start_daemon();
        let mut stream = connect(&daemon);

        // Header claims five payload bytes, only two follow.
        let mut bytes = 5_u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"ab");
        stream.write_all(&bytes).expect("send truncated frame");
        stream
            .shutdown(std::net::Shutdown::Write)
            .expect("half close");

        let closed: Option<Response> = decode_message(&mut stream).expect("read close");
        assert!(closed.is_none(), "connection should be closed");

        daemon.handle.shutdown();
        daemon.handle.join().expect("join");
    }

    #[test]
    fn frame_split_across_writes_closes_without_a_bogus_reply() {
        let daemon = start_daemon();
        let mut stream = connect(&daemon);

        let frame = encode_message(&Request::new("info", Vec::new())).expect("encode");
        // Header first, payload only after the daemon has polled in between.
        stream.write_all(&frame[..4]).expect("send header");
        stream.flush().expect("flush header");
        thread::sleep(Duration::from_millis(200));
        let _ = stream.write_all(&frame[4..]);

        // A split frame is fatal under the single-read contract: the daemon
        // must close the connection, never answer after misreading payload
        // bytes as a fresh header.
        match decode_message::<_, Response>(&mut stream) {
            Ok(Some(response)) => panic!("unexpected response: {response:?}"),
            Ok(None) | Err(_) => {}
        }

        daemon.handle.shutdown();
        daemon.handle.join().expect("join");
    }

    #[test]
    fn console_save_writes_the_snapshot() {
        let daemon = start_daemon();
        let mut stream = connect(&daemon);

        let request = Request::with_body("insert", args(&["7"]), sample_body());
        let response = exchange(&mut stream, &request);
        assert!(response.success, "errors: {:?}", response.errors);

        daemon
            .console
            .send(Request::new("save", Vec::new()))
            .expect("queue save");
        assert!(
            wait_for(|| daemon.snapshot.exists()),
            "snapshot not written"
        );

        let registry = crate::persistence::load_snapshot(&daemon.snapshot).expect("load");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains_key(7));

        daemon.handle.shutdown();
        daemon.handle.join().expect("join");
    }

    #[test]
    fn disconnect_snapshots_the_collection() {
        let daemon = start_daemon();
        let mut stream = connect(&daemon);

        let request = Request::with_body("insert", args(&["3"]), sample_body());
        let response = exchange(&mut stream, &request);
        assert!(response.success);
        drop(stream);

        assert!(
            wait_for(|| daemon.snapshot.exists()),
            "snapshot not written on disconnect"
        );

        daemon.handle.shutdown();
        daemon.handle.join().expect("join");
    }
}
