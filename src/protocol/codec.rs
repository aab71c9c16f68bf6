//! Protocol codec
//!
//! Encoding and decoding functions for the binary wire protocol.
//!
//! ## Wire Format
//!
//! Every frame is a fixed 24-byte header followed by the body. All
//! multi-byte integers are big-endian.
//!
//! ```text
//!  0 ┌──────────┬──────────┬─────────────────────┐
//!    │ Magic(1) │Opcode(1) │   Key length (2)    │
//!  4 ├──────────┼──────────┼─────────────────────┤
//!    │Extras(1) │ Type (1) │ Status / vbucket(2) │
//!  8 ├──────────┴──────────┴─────────────────────┤
//!    │           Total body length (4)           │
//! 12 ├───────────────────────────────────────────┤
//!    │               Opaque (4)                  │
//! 16 ├───────────────────────────────────────────┤
//!    │                CAS (8)                    │
//! 24 ├───────────────────────────────────────────┤
//!    │       Extras  |  Key  |  Value            │
//!    └───────────────────────────────────────────┘
//! ```
//!
//! Total body length = extras length + key length + value length.

use std::io::{self, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Extras, Opcode, Request, Response};
use crate::error::{McError, Result};

/// Magic byte for request frames
pub const REQUEST_MAGIC: u8 = 0x80;

/// Magic byte for response frames
pub const RESPONSE_MAGIC: u8 = 0x81;

/// Fixed header size
pub const HEADER_SIZE: usize = 24;

/// Longest key the protocol allows
pub const MAX_KEY_LEN: usize = 250;

/// Maximum body size accepted in either direction (16 MB)
pub const MAX_BODY_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Header
// =============================================================================

/// Decoded 24-byte header, shared by both directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    magic: u8,
    opcode: Opcode,
    key_len: u16,
    extras_len: u8,
    data_type: u8,

    /// Status in responses, vbucket id (always 0) in requests
    status: u16,
    body_len: u32,
    opaque: u32,
    cas: u64,
}

impl Header {
    /// Parse and validate a header
    ///
    /// A magic mismatch means the stream is no longer aligned on frame
    /// boundaries and is reported as a protocol error.
    fn parse(mut data: &[u8], expected_magic: u8) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(McError::Protocol(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                data.len()
            )));
        }

        let magic = data.get_u8();
        if magic != expected_magic {
            return Err(McError::Protocol(format!(
                "Bad magic: expected 0x{:02x}, got 0x{:02x}",
                expected_magic, magic
            )));
        }

        let opcode_byte = data.get_u8();
        let opcode = Opcode::from_u8(opcode_byte).ok_or_else(|| {
            McError::Protocol(format!("Unknown opcode: 0x{:02x}", opcode_byte))
        })?;

        let header = Self {
            magic,
            opcode,
            key_len: data.get_u16(),
            extras_len: data.get_u8(),
            data_type: data.get_u8(),
            status: data.get_u16(),
            body_len: data.get_u32(),
            opaque: data.get_u32(),
            cas: data.get_u64(),
        };

        if header.data_type != 0 {
            return Err(McError::Protocol(format!(
                "Unsupported data type: 0x{:02x}",
                header.data_type
            )));
        }

        if header.body_len > MAX_BODY_SIZE {
            return Err(McError::Protocol(format!(
                "Body too large: {} bytes (max {})",
                header.body_len, MAX_BODY_SIZE
            )));
        }

        if header.extras_len as u32 + header.key_len as u32 > header.body_len {
            return Err(McError::Protocol(format!(
                "Inconsistent lengths: extras {} + key {} exceed body {}",
                header.extras_len, header.key_len, header.body_len
            )));
        }

        Ok(header)
    }

    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.magic);
        buf.put_u8(self.opcode as u8);
        buf.put_u16(self.key_len);
        buf.put_u8(self.extras_len);
        buf.put_u8(self.data_type);
        buf.put_u16(self.status);
        buf.put_u32(self.body_len);
        buf.put_u32(self.opaque);
        buf.put_u64(self.cas);
    }

    fn body_len(&self) -> usize {
        self.body_len as usize
    }
}

/// Split a body into (extras, key, value) as declared by the header
fn split_body(header: &Header, body: &Bytes) -> (Bytes, Bytes, Bytes) {
    let extras_end = header.extras_len as usize;
    let key_end = extras_end + header.key_len as usize;
    (
        body.slice(..extras_end),
        body.slice(extras_end..key_end),
        body.slice(key_end..),
    )
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request, appending the frame to `buf`
///
/// Only length limits are checked; key and value bytes are sent verbatim.
pub fn encode_request_into(request: &Request, buf: &mut BytesMut) -> Result<()> {
    if request.key.len() > MAX_KEY_LEN {
        return Err(McError::InvalidKey(format!(
            "key is {} bytes (max {})",
            request.key.len(),
            MAX_KEY_LEN
        )));
    }

    let body_len = request.body_len();
    if body_len > MAX_BODY_SIZE as usize {
        return Err(McError::ValueTooLarge);
    }

    let header = Header {
        magic: REQUEST_MAGIC,
        opcode: request.opcode,
        key_len: request.key.len() as u16,
        extras_len: request.extras.len() as u8,
        data_type: 0,
        status: 0,
        body_len: body_len as u32,
        opaque: request.opaque,
        cas: request.cas,
    };

    buf.reserve(HEADER_SIZE + body_len);
    header.encode(buf);
    request.extras.encode(buf);
    buf.put_slice(&request.key);
    buf.put_slice(&request.value);

    Ok(())
}

/// Encode a request to bytes
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + request.body_len());
    encode_request_into(request, &mut buf)?;
    Ok(buf.to_vec())
}

/// Decode a request from a complete frame
pub fn decode_request(data: &[u8]) -> Result<Request> {
    let header = Header::parse(data, REQUEST_MAGIC)?;
    let body = complete_body(data, &header)?;
    request_from_parts(&header, &body)
}

fn request_from_parts(header: &Header, body: &Bytes) -> Result<Request> {
    let (extras, key, value) = split_body(header, body);

    Ok(Request {
        opcode: header.opcode,
        key: key.to_vec(),
        extras: decode_request_extras(header.opcode, &extras)?,
        value: value.to_vec(),
        cas: header.cas,
        opaque: header.opaque,
    })
}

/// Interpret request extras according to the opcode's fixed layout
fn decode_request_extras(opcode: Opcode, mut data: &[u8]) -> Result<Extras> {
    match (opcode, data.len()) {
        (op, 8) if op.is_store() => Ok(Extras::Store {
            flags: data.get_u32(),
            expiration: data.get_u32(),
        }),
        (op, 20) if op.is_counter() => Ok(Extras::Counter {
            delta: data.get_u64(),
            initial: data.get_u64(),
            expiration: data.get_u32(),
        }),
        (Opcode::Flush, 4) => Ok(Extras::Flush {
            delay: data.get_u32(),
        }),
        (Opcode::Touch, 4) => Ok(Extras::Touch {
            expiration: data.get_u32(),
        }),
        (op, 0) if !op.is_store() && !op.is_counter() && op != Opcode::Touch => Ok(Extras::None),
        (op, len) => Err(McError::Protocol(format!(
            "{:?} request: unexpected {} bytes of extras",
            op, len
        ))),
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Fails when a section does not fit its header field.
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    if response.key.len() > MAX_KEY_LEN {
        return Err(McError::InvalidKey(format!(
            "key is {} bytes (max {})",
            response.key.len(),
            MAX_KEY_LEN
        )));
    }

    if response.extras.len() > u8::MAX as usize {
        return Err(McError::Protocol(format!(
            "Extras too large: {} bytes (max {})",
            response.extras.len(),
            u8::MAX
        )));
    }

    let body_len = response.extras.len() + response.key.len() + response.value.len();
    if body_len > MAX_BODY_SIZE as usize {
        return Err(McError::ValueTooLarge);
    }

    let header = Header {
        magic: RESPONSE_MAGIC,
        opcode: response.opcode,
        key_len: response.key.len() as u16,
        extras_len: response.extras.len() as u8,
        data_type: 0,
        status: response.status,
        body_len: body_len as u32,
        opaque: response.opaque,
        cas: response.cas,
    };

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + body_len);
    header.encode(&mut buf);
    buf.put_slice(&response.extras);
    buf.put_slice(&response.key);
    buf.put_slice(&response.value);

    Ok(buf.to_vec())
}

/// Decode a response from a complete frame
///
/// Never attempts a partial parse: a bad magic byte, an unknown opcode or
/// inconsistent lengths are protocol errors.
pub fn decode_response(data: &[u8]) -> Result<Response> {
    let header = Header::parse(data, RESPONSE_MAGIC)?;
    let body = complete_body(data, &header)?;
    Ok(response_from_parts(&header, &body))
}

fn response_from_parts(header: &Header, body: &Bytes) -> Response {
    let (extras, key, value) = split_body(header, body);

    Response {
        opcode: header.opcode,
        status: header.status,
        cas: header.cas,
        opaque: header.opaque,
        extras,
        key,
        value,
    }
}

/// Copy the body out of a complete frame, checking it is all there
fn complete_body(data: &[u8], header: &Header) -> Result<Bytes> {
    let total_len = HEADER_SIZE + header.body_len();
    if data.len() < total_len {
        return Err(McError::Protocol(format!(
            "Incomplete body: expected {} bytes, got {}",
            total_len,
            data.len()
        )));
    }

    Ok(Bytes::copy_from_slice(&data[HEADER_SIZE..total_len]))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one frame (header then declared body) using `buf` as scratch space
///
/// `read_exact` retries short reads until the frame is complete or the
/// stream fails. EOF inside the body is a truncated frame.
fn read_frame<R: Read>(reader: &mut R, buf: &mut BytesMut, magic: u8) -> Result<(Header, Bytes)> {
    buf.clear();
    buf.resize(HEADER_SIZE, 0);
    reader.read_exact(&mut buf[..])?;
    let header = Header::parse(&buf[..], magic)?;

    let body_len = header.body_len();
    buf.clear();
    buf.resize(body_len, 0);
    if body_len > 0 {
        reader.read_exact(&mut buf[..]).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => McError::Protocol(format!(
                "Truncated body: expected {} bytes",
                body_len
            )),
            _ => McError::Io(e),
        })?;
    }

    Ok((header, buf.split().freeze()))
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let bytes = encode_request(request)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete request from a stream
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let mut buf = BytesMut::new();
    let (header, body) = read_frame(reader, &mut buf, REQUEST_MAGIC)?;
    request_from_parts(&header, &body)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
///
/// Blocks until a complete response is received or an error occurs
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let mut buf = BytesMut::new();
    read_response_into(reader, &mut buf)
}

/// Read a complete response, reusing `buf` for the frame bytes
///
/// The returned response owns its body; `buf` keeps any spare capacity
/// for the next read.
pub fn read_response_into<R: Read>(reader: &mut R, buf: &mut BytesMut) -> Result<Response> {
    let (header, body) = read_frame(reader, buf, RESPONSE_MAGIC)?;
    Ok(response_from_parts(&header, &body))
}
