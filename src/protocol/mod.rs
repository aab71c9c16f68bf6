//! Protocol Module
//!
//! Frame codec and status mapping for the memcached binary protocol.
//! Nothing in here performs network I/O on its own.
//!
//! ### Opcodes
//! - 0x00 GET, 0x01 SET, 0x02 ADD, 0x03 REPLACE, 0x04 DELETE
//! - 0x05 INCREMENT, 0x06 DECREMENT, 0x07 QUIT, 0x08 FLUSH
//! - 0x0A NOOP, 0x0B VERSION, 0x0E APPEND, 0x0F PREPEND, 0x1C TOUCH
//! - 0x20 SASL LIST MECHS, 0x21 SASL AUTH, 0x22 SASL STEP
//!
//! ### Status Codes
//! - 0x0000: NO_ERROR
//! - 0x0001: KEY_NOT_FOUND
//! - 0x0002: KEY_EXISTS
//! - 0x0003: VALUE_TOO_LARGE
//! - 0x0004: INVALID_ARGUMENTS
//! - 0x0005: ITEM_NOT_STORED
//! - 0x0006: NON_NUMERIC_VALUE
//! - 0x0020: AUTH_ERROR, 0x0021: AUTH_CONTINUE
//! - 0x0081: UNKNOWN_COMMAND, 0x0082: OUT_OF_MEMORY

mod request;
mod response;
mod codec;
pub mod status;

pub use request::{Extras, Opcode, Request};
pub use response::{Response, Status};
pub use codec::{
    decode_request, decode_response, encode_request, encode_request_into, encode_response,
    read_request, read_response, read_response_into, write_request, write_response,
    HEADER_SIZE, MAX_BODY_SIZE, MAX_KEY_LEN, REQUEST_MAGIC, RESPONSE_MAGIC,
};
