//! Client Module
//!
//! The public command surface. Each command builds a request with its
//! opcode and extras layout, sends it over the connection, maps the status
//! and extracts the typed result.
//!
//! ## Expiration
//! - Store commands (set/add/replace/touch/counters): 0 means the item
//!   never expires.
//! - `flush(delay)`: 0 means invalidate everything now; N means in N seconds.
//!
//! ## CAS
//! Every successful mutation returns a fresh CAS token. Passing a non-zero
//! token to `set`, `replace`, `append_cas`, `prepend_cas` or `delete_cas`
//! makes the command fail with `KeyExists` if the item changed since.
//!
//! ## Retries
//! Nothing is retried here. `set` is safe to re-issue; counters are not.

mod auth;
mod item;
mod shared;

use std::io::{self, Read, Write};
use std::net::TcpStream;

use bytes::Buf;

use crate::config::{Config, Credentials};
use crate::error::{McError, Result};
use crate::network::{dial, Connection};
use crate::protocol::{status, Extras, Opcode, Request, Response};

pub use auth::{plain_blob, PLAIN};
pub use item::Item;
pub use shared::SharedClient;

/// Counter expiration asking the server not to create a missing key
pub const NO_AUTO_CREATE: u32 = 0xffff_ffff;

/// A client session over one connection
///
/// Lifecycle: create, optionally authenticate, issue commands, `close`.
pub struct Client<S = TcpStream> {
    conn: Connection<S>,
}

impl Client<TcpStream> {
    /// Dial the configured server and authenticate if credentials are set
    ///
    /// If authentication fails the stream is dropped; no unauthenticated
    /// client is handed out.
    pub fn connect(config: &Config) -> Result<Self> {
        let stream = dial(config)?;
        let mut client = Client::new(stream);

        if let Some(credentials) = &config.credentials {
            client.authenticate_with(credentials)?;
        }

        Ok(client)
    }
}

impl<S: Read + Write> Client<S> {
    /// Wrap an established stream
    pub fn new(stream: S) -> Self {
        Self::from_connection(Connection::new(stream))
    }

    pub fn from_connection(conn: Connection<S>) -> Self {
        Self { conn }
    }

    /// Borrow the underlying connection
    pub fn connection(&self) -> &Connection<S> {
        &self.conn
    }

    pub fn into_connection(self) -> Connection<S> {
        self.conn
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Authenticate with SASL PLAIN (empty authzid)
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        self.authenticate_with(&Credentials::new(username, password))
    }

    /// Authenticate with SASL PLAIN
    ///
    /// On failure the connection refuses every further command.
    pub fn authenticate_with(&mut self, credentials: &Credentials) -> Result<()> {
        let result = auth::authenticate(&mut self.conn, credentials);
        if let Err(e) = &result {
            tracing::warn!("Authentication failed: {}", e);
            self.conn.poison();
        }
        result
    }

    /// Mechanisms offered by the server
    pub fn list_mechanisms(&mut self) -> Result<Vec<String>> {
        auth::list_mechanisms(&mut self.conn)
    }

    // =========================================================================
    // Retrieval
    // =========================================================================

    /// Get the value, flags and CAS stored under `key`
    pub fn get(&mut self, key: &[u8]) -> Result<Item> {
        validate_key(key)?;
        let response = self.execute(Request::new(Opcode::Get).with_key(key))?;

        let mut extras = &response.extras[..];
        if extras.len() != 4 {
            return Err(self.malformed(format!(
                "Get response: expected 4 bytes of flags, got {}",
                extras.len()
            )));
        }

        Ok(Item {
            flags: extras.get_u32(),
            cas: response.cas,
            value: response.value,
        })
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Store unconditionally, or only if the current CAS equals `cas` when non-zero
    pub fn set(
        &mut self,
        key: &[u8],
        value: &[u8],
        flags: u32,
        expiration: u32,
        cas: u64,
    ) -> Result<u64> {
        self.store(Opcode::Set, key, value, flags, expiration, cas)
    }

    /// Store only if the key is absent
    pub fn add(&mut self, key: &[u8], value: &[u8], flags: u32, expiration: u32) -> Result<u64> {
        self.store(Opcode::Add, key, value, flags, expiration, 0)
    }

    /// Store only if the key is present (and matches `cas` when non-zero)
    pub fn replace(
        &mut self,
        key: &[u8],
        value: &[u8],
        flags: u32,
        expiration: u32,
        cas: u64,
    ) -> Result<u64> {
        self.store(Opcode::Replace, key, value, flags, expiration, cas)
    }

    /// Add `value` after the existing value; the key must exist
    ///
    /// Takes no flags or expiration: the Append frame has no extras to carry
    /// them, so the item keeps the ones it was stored with.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<u64> {
        self.concat(Opcode::Append, key, value, 0)
    }

    /// Append only if the item's CAS still equals `cas`
    pub fn append_cas(&mut self, key: &[u8], value: &[u8], cas: u64) -> Result<u64> {
        self.concat(Opcode::Append, key, value, cas)
    }

    /// Add `value` before the existing value; the key must exist
    ///
    /// Like `append`, takes no flags or expiration and leaves the stored ones
    /// untouched.
    pub fn prepend(&mut self, key: &[u8], value: &[u8]) -> Result<u64> {
        self.concat(Opcode::Prepend, key, value, 0)
    }

    /// Prepend only if the item's CAS still equals `cas`
    pub fn prepend_cas(&mut self, key: &[u8], value: &[u8], cas: u64) -> Result<u64> {
        self.concat(Opcode::Prepend, key, value, cas)
    }

    fn store(
        &mut self,
        opcode: Opcode,
        key: &[u8],
        value: &[u8],
        flags: u32,
        expiration: u32,
        cas: u64,
    ) -> Result<u64> {
        validate_key(key)?;
        let request = Request::new(opcode)
            .with_key(key)
            .with_value(value)
            .with_extras(Extras::Store { flags, expiration })
            .with_cas(cas);

        Ok(self.execute(request)?.cas)
    }

    fn concat(&mut self, opcode: Opcode, key: &[u8], value: &[u8], cas: u64) -> Result<u64> {
        validate_key(key)?;
        let request = Request::new(opcode)
            .with_key(key)
            .with_value(value)
            .with_cas(cas);

        Ok(self.execute(request)?.cas)
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Add `delta` to a decimal counter, returning (new value, new CAS)
    ///
    /// A missing key is created with `initial` unless `expiration` is
    /// `NO_AUTO_CREATE`.
    pub fn increment(
        &mut self,
        key: &[u8],
        delta: u64,
        initial: u64,
        expiration: u32,
    ) -> Result<(u64, u64)> {
        self.counter(Opcode::Increment, key, delta, initial, expiration)
    }

    /// Subtract `delta`, flooring at 0
    pub fn decrement(
        &mut self,
        key: &[u8],
        delta: u64,
        initial: u64,
        expiration: u32,
    ) -> Result<(u64, u64)> {
        self.counter(Opcode::Decrement, key, delta, initial, expiration)
    }

    fn counter(
        &mut self,
        opcode: Opcode,
        key: &[u8],
        delta: u64,
        initial: u64,
        expiration: u32,
    ) -> Result<(u64, u64)> {
        validate_key(key)?;
        let request = Request::new(opcode).with_key(key).with_extras(Extras::Counter {
            delta,
            initial,
            expiration,
        });
        let response = self.execute(request)?;

        let mut value = &response.value[..];
        if value.len() != 8 {
            return Err(self.malformed(format!(
                "{:?} response: expected 8-byte counter, got {} bytes",
                opcode,
                value.len()
            )));
        }

        Ok((value.get_u64(), response.cas))
    }

    // =========================================================================
    // Removal / Expiry
    // =========================================================================

    /// Remove `key`
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.delete_cas(key, 0)
    }

    /// Remove `key` only if its CAS still equals `cas` (0 = unconditional)
    pub fn delete_cas(&mut self, key: &[u8], cas: u64) -> Result<()> {
        validate_key(key)?;
        self.execute(Request::new(Opcode::Delete).with_key(key).with_cas(cas))?;
        Ok(())
    }

    /// Change the expiration of an existing item
    pub fn touch(&mut self, key: &[u8], expiration: u32) -> Result<u64> {
        validate_key(key)?;
        let request = Request::new(Opcode::Touch)
            .with_key(key)
            .with_extras(Extras::Touch { expiration });
        Ok(self.execute(request)?.cas)
    }

    /// Invalidate every item after `delay` seconds (0 = now)
    pub fn flush(&mut self, delay: u32) -> Result<()> {
        self.execute(Request::new(Opcode::Flush).with_extras(Extras::Flush { delay }))?;
        Ok(())
    }

    // =========================================================================
    // Server
    // =========================================================================

    /// Server version string
    pub fn version(&mut self) -> Result<String> {
        let response = self.execute(Request::new(Opcode::Version))?;
        match String::from_utf8(response.value.to_vec()) {
            Ok(version) => Ok(version),
            Err(_) => Err(self.malformed("Version response is not UTF-8".to_string())),
        }
    }

    /// Round trip with no effect (health check)
    pub fn noop(&mut self) -> Result<()> {
        self.execute(Request::new(Opcode::Noop))?;
        Ok(())
    }

    /// Send QUIT, wait for the acknowledgement and drop the stream
    pub fn close(mut self) -> Result<()> {
        match self.conn.send_and_receive(Request::new(Opcode::Quit)) {
            Ok(response) => status::check(&response),
            // Some servers hang up without acknowledging
            Err(McError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Send a request and map a non-zero status to its error
    fn execute(&mut self, request: Request) -> Result<Response> {
        let response = self.conn.send_and_receive(request)?;
        status::check(&response)?;
        Ok(response)
    }

    /// A well-framed reply whose payload makes no sense for its command
    ///
    /// The server and client disagree about the protocol, so the session
    /// is not trusted any further.
    fn malformed(&mut self, message: String) -> McError {
        tracing::warn!("Malformed response payload: {}", message);
        self.conn.poison();
        McError::Protocol(message)
    }
}

/// Keys must be non-empty; the length limit is enforced by the codec
fn validate_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(McError::InvalidKey("key is empty".to_string()));
    }
    Ok(())
}
