//! Connection
//!
//! Owns one byte stream and performs strictly ordered request/response
//! exchanges on it.

use std::io::{Read, Write};

use bytes::BytesMut;

use crate::error::{McError, Result};
use crate::protocol::{encode_request_into, read_response_into, Request, Response};

/// Initial capacity of the reusable frame buffers
const INITIAL_BUFFER_SIZE: usize = 4096;

/// A single protocol session over a byte stream
///
/// ## Ordering contract
///
/// Exactly one request is outstanding at a time: `send_and_receive` writes a
/// frame and blocks until its response has been read. Taking `&mut self`
/// makes concurrent use impossible without an external lock; callers that
/// share one connection between threads must serialize access themselves
/// (see `SharedClient`). Interleaving frames from two callers would corrupt
/// the stream.
///
/// ## Failure
///
/// Any I/O error (including a read/write timeout on the stream) or protocol
/// error leaves the stream at an unknown frame boundary. The connection is
/// then marked broken and every later call fails with
/// `McError::ConnectionBroken`. There is no internal retry.
pub struct Connection<S> {
    /// Transport stream (any ordered, reliable byte stream)
    stream: S,

    /// Scratch buffer for encoding requests
    write_buf: BytesMut,

    /// Scratch buffer for reading response frames
    read_buf: BytesMut,

    /// Opaque tag stamped on the next request
    next_opaque: u32,

    /// Set after a fatal error
    broken: bool,
}

impl<S: Read + Write> Connection<S> {
    /// Create a connection over an already established stream
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            write_buf: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            read_buf: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            next_opaque: 1,
            broken: false,
        }
    }

    /// Send one request and wait for its response
    ///
    /// The request's opaque is replaced by the connection's own counter and
    /// must be echoed back along with the opcode. Returns the raw response;
    /// status interpretation is left to the caller.
    pub fn send_and_receive(&mut self, mut request: Request) -> Result<Response> {
        if self.broken {
            return Err(McError::ConnectionBroken);
        }

        request.opaque = self.next_opaque;
        self.next_opaque = self.next_opaque.wrapping_add(1);

        // Nothing has been written yet, so encode failures are not fatal
        self.write_buf.clear();
        encode_request_into(&request, &mut self.write_buf)?;

        match self.exchange(&request) {
            Ok(response) => Ok(response),
            Err(e) => {
                if e.is_fatal() {
                    self.mark_broken(&e);
                }
                Err(e)
            }
        }
    }

    /// Write the encoded frame and read back the matching response
    fn exchange(&mut self, request: &Request) -> Result<Response> {
        self.stream.write_all(&self.write_buf)?;
        self.stream.flush()?;

        tracing::trace!(
            opcode = ?request.opcode,
            opaque = request.opaque,
            body_len = request.body_len(),
            "Sent request"
        );

        let response = read_response_into(&mut self.stream, &mut self.read_buf)?;

        tracing::trace!(
            opcode = ?response.opcode,
            opaque = response.opaque,
            status = response.status,
            body_len = response.extras.len() + response.key.len() + response.value.len(),
            "Received response"
        );

        if response.opcode != request.opcode {
            return Err(McError::Protocol(format!(
                "Opcode mismatch: sent {:?}, received {:?}",
                request.opcode, response.opcode
            )));
        }

        if response.opaque != request.opaque {
            return Err(McError::Protocol(format!(
                "Opaque mismatch: sent {}, received {}",
                request.opaque, response.opaque
            )));
        }

        Ok(response)
    }

    fn mark_broken(&mut self, cause: &McError) {
        tracing::warn!("Connection unusable after error: {}", cause);
        self.broken = true;
    }

    /// Refuse all further commands on this connection
    ///
    /// Used when a mandatory handshake fails.
    pub fn poison(&mut self) {
        self.broken = true;
    }

    /// True once a fatal error has occurred
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Borrow the underlying stream
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> S {
        self.stream
    }
}
