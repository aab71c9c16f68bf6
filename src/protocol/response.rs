//! Response definitions
//!
//! Represents a single frame received from the server.

use bytes::Bytes;

use super::Opcode;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Status {
    NoError = 0x0000,
    KeyNotFound = 0x0001,
    KeyExists = 0x0002,
    ValueTooLarge = 0x0003,
    InvalidArguments = 0x0004,
    ItemNotStored = 0x0005,
    NonNumericValue = 0x0006,
    WrongVbucket = 0x0007,
    AuthError = 0x0020,
    AuthContinue = 0x0021,
    UnknownCommand = 0x0081,
    OutOfMemory = 0x0082,
    NotSupported = 0x0083,
    InternalError = 0x0084,
    Busy = 0x0085,
    TempFailure = 0x0086,
}

impl Status {
    /// Try to convert a u16 to a status
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0000 => Some(Status::NoError),
            0x0001 => Some(Status::KeyNotFound),
            0x0002 => Some(Status::KeyExists),
            0x0003 => Some(Status::ValueTooLarge),
            0x0004 => Some(Status::InvalidArguments),
            0x0005 => Some(Status::ItemNotStored),
            0x0006 => Some(Status::NonNumericValue),
            0x0007 => Some(Status::WrongVbucket),
            0x0020 => Some(Status::AuthError),
            0x0021 => Some(Status::AuthContinue),
            0x0081 => Some(Status::UnknownCommand),
            0x0082 => Some(Status::OutOfMemory),
            0x0083 => Some(Status::NotSupported),
            0x0084 => Some(Status::InternalError),
            0x0085 => Some(Status::Busy),
            0x0086 => Some(Status::TempFailure),
            _ => None,
        }
    }

    /// Short description
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NoError => "No error",
            Status::KeyNotFound => "Key not found",
            Status::KeyExists => "Key exists",
            Status::ValueTooLarge => "Value too large",
            Status::InvalidArguments => "Invalid arguments",
            Status::ItemNotStored => "Item not stored",
            Status::NonNumericValue => "Incr/Decr on non-numeric value",
            Status::WrongVbucket => "Wrong vbucket",
            Status::AuthError => "Authentication error",
            Status::AuthContinue => "Authentication continue",
            Status::UnknownCommand => "Unknown command",
            Status::OutOfMemory => "Out of memory",
            Status::NotSupported => "Not supported",
            Status::InternalError => "Internal error",
            Status::Busy => "Busy",
            Status::TempFailure => "Temporary failure",
        }
    }
}

/// A decoded response frame
///
/// Body sections are owned `Bytes`, so they stay valid after the
/// connection reuses its read buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Echo of the request opcode
    pub opcode: Opcode,

    /// Raw status code
    pub status: u16,
    pub cas: u64,
    pub opaque: u32,
    pub extras: Bytes,
    pub key: Bytes,

    /// Payload on success, diagnostic text otherwise
    pub value: Bytes,
}

impl Response {
    /// Create an empty response with the given status
    pub fn new(opcode: Opcode, status: Status) -> Self {
        Self {
            opcode,
            status: status as u16,
            cas: 0,
            opaque: 0,
            extras: Bytes::new(),
            key: Bytes::new(),
            value: Bytes::new(),
        }
    }

    /// Create a NO_ERROR response
    pub fn ok(opcode: Opcode) -> Self {
        Self::new(opcode, Status::NoError)
    }

    pub fn with_value(mut self, value: impl Into<Bytes>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_extras(mut self, extras: impl Into<Bytes>) -> Self {
        self.extras = extras.into();
        self
    }

    pub fn with_cas(mut self, cas: u64) -> Self {
        self.cas = cas;
        self
    }

    pub fn with_opaque(mut self, opaque: u32) -> Self {
        self.opaque = opaque;
        self
    }

    /// True if the status is NO_ERROR
    pub fn is_success(&self) -> bool {
        self.status == Status::NoError as u16
    }

    /// Known status, if any
    pub fn status_kind(&self) -> Option<Status> {
        Status::from_u16(self.status)
    }

    /// The value interpreted as diagnostic text
    pub fn message(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}
