//! Item returned by a successful get

use bytes::Bytes;

/// A stored value with its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Owned value bytes, valid after later commands
    pub value: Bytes,

    /// Client-defined tag, passed through untouched
    pub flags: u32,

    /// Version token for conditional updates
    pub cas: u64,
}

impl Item {
    /// The value as UTF-8, if it is valid
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}
