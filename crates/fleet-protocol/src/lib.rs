//! Wire protocol shared by the fleet daemon and client.
//!
//! A connection carries length-prefixed frames, each holding one JSON-encoded
//! [`Request`] (client to server) or [`Response`] (server to client). The two
//! directions strictly alternate: the client sends a request and blocks for
//! the matching response before issuing the next one.
//!
//! Commands that need a record body (`insert`, `update`) may span two
//! round trips. The first request carries [`RequestBody::Absent`]; if the
//! server can proceed it answers [`ResponseKind::NeedsMoreData`] and the
//! client re-sends the same command with [`RequestBody::Supplied`] fields.
//! A request that already carries a supplied body completes in one round
//! trip.

mod frame;
mod request;
mod response;

/// TCP port the daemon listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 15454;

pub use frame::{
    FrameError, MAX_FRAME_BYTES, decode_message, encode_frame, encode_message, read_frame,
    write_frame, write_message,
};
pub use request::{InteractionPhase, Request, RequestBody};
pub use response::{Response, ResponseKind};
