//! Request definitions
//!
//! Represents a single frame sent to the server.

use bytes::BufMut;

/// Binary protocol opcodes used by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Get = 0x00,
    Set = 0x01,
    Add = 0x02,
    Replace = 0x03,
    Delete = 0x04,
    Increment = 0x05,
    Decrement = 0x06,
    Quit = 0x07,
    Flush = 0x08,
    Noop = 0x0A,
    Version = 0x0B,
    Append = 0x0E,
    Prepend = 0x0F,
    Touch = 0x1C,
    SaslListMechs = 0x20,
    SaslAuth = 0x21,
    SaslStep = 0x22,
}

impl Opcode {
    /// Try to convert a byte to an opcode
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Opcode::Get),
            0x01 => Some(Opcode::Set),
            0x02 => Some(Opcode::Add),
            0x03 => Some(Opcode::Replace),
            0x04 => Some(Opcode::Delete),
            0x05 => Some(Opcode::Increment),
            0x06 => Some(Opcode::Decrement),
            0x07 => Some(Opcode::Quit),
            0x08 => Some(Opcode::Flush),
            0x0A => Some(Opcode::Noop),
            0x0B => Some(Opcode::Version),
            0x0E => Some(Opcode::Append),
            0x0F => Some(Opcode::Prepend),
            0x1C => Some(Opcode::Touch),
            0x20 => Some(Opcode::SaslListMechs),
            0x21 => Some(Opcode::SaslAuth),
            0x22 => Some(Opcode::SaslStep),
            _ => None,
        }
    }

    /// True for Set/Add/Replace, which carry flags + expiration extras
    pub fn is_store(&self) -> bool {
        matches!(self, Opcode::Set | Opcode::Add | Opcode::Replace)
    }

    /// True for Increment/Decrement
    pub fn is_counter(&self) -> bool {
        matches!(self, Opcode::Increment | Opcode::Decrement)
    }
}

/// Fixed-layout extras carried by a frame
///
/// Field names differ on purpose between `Store`/`Touch` and `Flush`:
/// a store `expiration` of 0 means "never expires", while a flush `delay`
/// of 0 means "invalidate now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extras {
    #[default]
    None,

    /// Set/Add/Replace: flags (4) + expiration (4)
    Store { flags: u32, expiration: u32 },

    /// Increment/Decrement: delta (8) + initial (8) + expiration (4)
    Counter { delta: u64, initial: u64, expiration: u32 },

    /// Flush: delay in seconds (4)
    Flush { delay: u32 },

    /// Touch: expiration (4)
    Touch { expiration: u32 },
}

impl Extras {
    /// Encoded length in bytes
    pub fn len(&self) -> usize {
        match self {
            Extras::None => 0,
            Extras::Flush { .. } | Extras::Touch { .. } => 4,
            Extras::Store { .. } => 8,
            Extras::Counter { .. } => 20,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the big-endian encoding to `buf`
    pub fn encode(&self, buf: &mut impl BufMut) {
        match *self {
            Extras::None => {}
            Extras::Store { flags, expiration } => {
                buf.put_u32(flags);
                buf.put_u32(expiration);
            }
            Extras::Counter {
                delta,
                initial,
                expiration,
            } => {
                buf.put_u64(delta);
                buf.put_u64(initial);
                buf.put_u32(expiration);
            }
            Extras::Flush { delay } => buf.put_u32(delay),
            Extras::Touch { expiration } => buf.put_u32(expiration),
        }
    }
}

/// A single request frame
///
/// Constructed fresh per call. `opaque` is overwritten by the connection
/// that sends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub opcode: Opcode,
    pub key: Vec<u8>,
    pub extras: Extras,
    pub value: Vec<u8>,

    /// 0 = no CAS check
    pub cas: u64,
    pub opaque: u32,
}

impl Request {
    /// Create an empty request for `opcode`
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            key: Vec::new(),
            extras: Extras::None,
            value: Vec::new(),
            cas: 0,
            opaque: 0,
        }
    }

    pub fn with_key(mut self, key: &[u8]) -> Self {
        self.key = key.to_vec();
        self
    }

    pub fn with_value(mut self, value: &[u8]) -> Self {
        self.value = value.to_vec();
        self
    }

    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras = extras;
        self
    }

    pub fn with_cas(mut self, cas: u64) -> Self {
        self.cas = cas;
        self
    }

    /// Total body length: extras + key + value
    pub fn body_len(&self) -> usize {
        self.extras.len() + self.key.len() + self.value.len()
    }
}
