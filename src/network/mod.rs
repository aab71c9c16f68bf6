//! Network Module
//!
//! Stream ownership and TCP setup.
//!
//! ## Architecture
//! - `Connection` is generic over any `Read + Write` stream
//! - One request in flight per connection, no pipelining
//! - `dial` is a thin helper for plain TCP

mod connection;
mod dial;

pub use connection::Connection;
pub use dial::dial;
