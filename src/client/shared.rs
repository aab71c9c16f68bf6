//! Shared client
//!
//! A connection handles one request at a time. Callers that want to share
//! a single connection between threads go through this mutex wrapper;
//! for real parallelism, open one client per thread instead.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;

use super::Client;
use crate::error::Result;

/// Cloneable handle to one mutex-guarded client
pub struct SharedClient<S = TcpStream> {
    inner: Arc<Mutex<Client<S>>>,
}

impl<S> Clone for SharedClient<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Read + Write> SharedClient<S> {
    pub fn new(client: Client<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    /// Run `f` with exclusive access to the client
    ///
    /// The lock is held for the whole closure, so several commands issued
    /// inside it run back to back without interleaving with other holders.
    pub fn with<T>(&self, f: impl FnOnce(&mut Client<S>) -> Result<T>) -> Result<T> {
        let mut client = self.inner.lock();
        f(&mut *client)
    }
}
