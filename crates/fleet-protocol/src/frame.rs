//! Length-prefixed framing over a stream socket.
//!
//! Each frame is a fixed-width header (the big-endian encoding of a `u32`
//! byte count) followed by exactly that many payload bytes. The framing
//! contract is strict: a read that delivers fewer bytes than the field it is
//! reading is a fatal framing error for the connection, not a retry
//! condition. The only clean outcome short of a full frame is zero bytes at
//! a frame boundary, which signals an orderly remote close.

use std::io::{self, Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Width of the length field in bytes.
pub const FRAME_HEADER_LEN: usize = 4;

/// Upper bound on a single frame payload.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Errors surfaced while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("short frame header: {got} bytes, expected {FRAME_HEADER_LEN}")]
    ShortHeader { got: usize },
    #[error("short frame payload: {got} bytes, expected {expected}")]
    ShortPayload { got: usize, expected: usize },
    #[error("frame length cannot be zero")]
    EmptyFrame,
    #[error("frame too large: max {max} got {got}")]
    FrameTooLarge { max: usize, got: usize },
    #[error("frame payload is not a valid message: {0}")]
    Codec(#[from] serde_json::Error),
}

impl FrameError {
    /// True when the underlying socket was merely not ready to be read.
    ///
    /// The reactor polls non-blocking sockets, so `WouldBlock` before the
    /// first header byte is an expected outcome rather than a framing fault.
    /// A `WouldBlock` after the header has been consumed never reaches this
    /// classification: [`read_frame`] reports it as a short payload, which
    /// is fatal, so a frame split across reads can never desynchronise the
    /// stream into misreading payload bytes as a header.
    #[must_use]
    pub fn is_would_block(&self) -> bool {
        matches!(self, Self::Io(source) if source.kind() == io::ErrorKind::WouldBlock)
    }
}

/// Encodes a payload into a framed byte buffer.
///
/// # Errors
///
/// Returns [`FrameError::FrameTooLarge`] when the payload exceeds
/// [`MAX_FRAME_BYTES`] and [`FrameError::EmptyFrame`] for an empty payload.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.is_empty() {
        return Err(FrameError::EmptyFrame);
    }
    if payload.len() > MAX_FRAME_BYTES {
        return Err(FrameError::FrameTooLarge {
            max: MAX_FRAME_BYTES,
            got: payload.len(),
        });
    }
    let length = u32::try_from(payload.len()).map_err(|_| FrameError::FrameTooLarge {
        max: MAX_FRAME_BYTES,
        got: payload.len(),
    })?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Writes one framed payload and flushes the stream.
///
/// # Errors
///
/// Propagates encoding and IO failures.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame payload from the stream.
///
/// Returns `Ok(None)` when the peer closed the connection cleanly at a frame
/// boundary. The header and the payload must each arrive in a single read
/// (interrupted reads are retried); any other short count is a framing
/// error.
///
/// # Errors
///
/// Returns [`FrameError::ShortHeader`] or [`FrameError::ShortPayload`] on a
/// truncated frame; a payload read that would block counts as truncation,
/// because retrying it would misread the buffered payload bytes as the next
/// header. IO failures are propagated, including `WouldBlock` from a
/// non-blocking socket that has no pending data at a frame boundary.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError> {
    let mut header = [0_u8; FRAME_HEADER_LEN];
    let got = read_once(reader, &mut header)?;
    if got == 0 {
        return Ok(None);
    }
    if got != FRAME_HEADER_LEN {
        return Err(FrameError::ShortHeader { got });
    }

    let length = u32::from_be_bytes(header) as usize;
    if length == 0 {
        return Err(FrameError::EmptyFrame);
    }
    if length > MAX_FRAME_BYTES {
        return Err(FrameError::FrameTooLarge {
            max: MAX_FRAME_BYTES,
            got: length,
        });
    }

    let mut payload = vec![0_u8; length];
    // The header has been consumed, so the payload must follow now; a socket
    // that is not readable here has split the frame, which the single-read
    // contract treats as fatal rather than retryable.
    let got = match read_once(reader, &mut payload) {
        Ok(got) => got,
        Err(FrameError::Io(source)) if source.kind() == io::ErrorKind::WouldBlock => {
            return Err(FrameError::ShortPayload {
                got: 0,
                expected: length,
            });
        }
        Err(error) => return Err(error),
    };
    if got != length {
        return Err(FrameError::ShortPayload {
            got,
            expected: length,
        });
    }
    Ok(Some(payload))
}

/// Performs a single read, retrying only on `Interrupted`.
fn read_once<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, FrameError> {
    loop {
        match reader.read(buf) {
            Ok(read) => return Ok(read),
            Err(source) if source.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => return Err(FrameError::Io(source)),
        }
    }
}

/// Serializes a message and frames it.
///
/// # Errors
///
/// Propagates serialization and framing failures.
pub fn encode_message<M: Serialize>(message: &M) -> Result<Vec<u8>, FrameError> {
    let payload = serde_json::to_vec(message)?;
    encode_frame(&payload)
}

/// Writes one framed message to the stream.
///
/// # Errors
///
/// Propagates serialization, framing, and IO failures.
pub fn write_message<W: Write, M: Serialize>(
    writer: &mut W,
    message: &M,
) -> Result<(), FrameError> {
    let payload = serde_json::to_vec(message)?;
    write_frame(writer, &payload)
}

/// Reads one framed message from the stream.
///
/// Returns `Ok(None)` on an orderly remote close.
///
/// # Errors
///
/// Propagates framing failures and rejects payloads that do not deserialize
/// as the expected message type.
pub fn decode_message<R: Read, M: DeserializeOwned>(
    reader: &mut R,
) -> Result<Option<M>, FrameError> {
    match read_frame(reader)? {
        Some(payload) => Ok(Some(serde_json::from_slice(&payload)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;
    use crate::{Request, Response, ResponseKind};

    /// Delivers the header in one read, then reports the socket as not
    /// ready, like a frame split across two TCP segments.
    struct HeaderThenNotReady {
        header: [u8; FRAME_HEADER_LEN],
        delivered: bool,
    }

    impl Read for HeaderThenNotReady {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.delivered {
                return Err(io::Error::from(io::ErrorKind::WouldBlock));
            }
            buf[..self.header.len()].copy_from_slice(&self.header);
            self.delivered = true;
            Ok(self.header.len())
        }
    }

    fn oversized_header() -> Vec<u8> {
        u32::try_from(MAX_FRAME_BYTES + 1)
            .expect("fits in u32")
            .to_be_bytes()
            .to_vec()
    }

    #[test]
    fn frame_round_trip() {
        let frame = encode_frame(b"hello").expect("encode");
        let mut cursor = Cursor::new(frame);
        let payload = read_frame(&mut cursor).expect("read").expect("payload");
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn header_carries_big_endian_length() {
        let frame = encode_frame(b"abc").expect("encode");
        assert_eq!(&frame[..FRAME_HEADER_LEN], &3_u32.to_be_bytes());
        assert_eq!(&frame[FRAME_HEADER_LEN..], b"abc");
    }

    #[test]
    fn clean_eof_yields_none() {
        let mut cursor = Cursor::new(Vec::new());
        let result = read_frame(&mut cursor).expect("read");
        assert!(result.is_none());
    }

    #[rstest]
    #[case::truncated(vec![0_u8, 0], "short frame header")]
    #[case::zero_length(0_u32.to_be_bytes().to_vec(), "frame length cannot be zero")]
    #[case::oversized(oversized_header(), "frame too large")]
    fn malformed_headers_are_rejected(#[case] bytes: Vec<u8>, #[case] message: &str) {
        let mut cursor = Cursor::new(bytes);
        let error = read_frame(&mut cursor).expect_err("malformed header");
        assert!(error.to_string().contains(message), "unexpected error: {error}");
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut frame = encode_frame(b"full payload").expect("encode");
        frame.truncate(FRAME_HEADER_LEN + 4);
        let mut cursor = Cursor::new(frame);
        let error = read_frame(&mut cursor).expect_err("short payload");
        assert!(matches!(
            error,
            FrameError::ShortPayload {
                got: 4,
                expected: 12
            }
        ));
    }

    #[test]
    fn payload_would_block_after_the_header_is_fatal() {
        let mut reader = HeaderThenNotReady {
            header: 5_u32.to_be_bytes(),
            delivered: false,
        };
        let error = read_frame(&mut reader).expect_err("split frame");
        assert!(matches!(
            error,
            FrameError::ShortPayload {
                got: 0,
                expected: 5
            }
        ));
        assert!(
            !error.is_would_block(),
            "a consumed header must not look like an idle socket"
        );
    }

    #[test]
    fn empty_payload_cannot_be_encoded() {
        let error = encode_frame(b"").expect_err("empty");
        assert!(matches!(error, FrameError::EmptyFrame));
    }

    #[test]
    fn request_message_round_trip() {
        let request = Request::new("insert", vec!["5".to_owned()]);
        let frame = encode_message(&request).expect("encode");
        let mut cursor = Cursor::new(frame);
        let decoded: Request = decode_message(&mut cursor)
            .expect("decode")
            .expect("message");
        assert_eq!(decoded, request);
    }

    #[test]
    fn response_message_round_trip() {
        let response = Response::needs_more_data(vec!["insert 5".to_owned()]);
        let frame = encode_message(&response).expect("encode");
        let mut cursor = Cursor::new(frame);
        let decoded: Response = decode_message(&mut cursor)
            .expect("decode")
            .expect("message");
        assert_eq!(decoded.kind, ResponseKind::NeedsMoreData);
        assert_eq!(decoded, response);
    }

    #[test]
    fn garbage_payload_is_a_codec_error() {
        let frame = encode_frame(b"not json").expect("encode");
        let mut cursor = Cursor::new(frame);
        let error = decode_message::<_, Request>(&mut cursor).expect_err("codec");
        assert!(matches!(error, FrameError::Codec(_)));
    }
}
