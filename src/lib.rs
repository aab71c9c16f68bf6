//! # mcbin
//!
//! A blocking client for the memcached binary protocol with:
//! - Fixed 24-byte frame codec (no I/O)
//! - Status-code to error-kind mapping
//! - One-request-at-a-time connections over any `Read + Write` stream
//! - Optional SASL PLAIN authentication
//! - get/set/add/replace/append/prepend/incr/decr/delete/flush/version
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Client (Command API)                    │
//! │        builds Request, interprets Response, maps status      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │              ┌──────────────────────┐
//!                       │◄─────────────┤  Auth (SASL PLAIN)   │
//!                       │              └──────────────────────┘
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Connection                             │
//! │         (owned stream, reusable buffers, strict order)       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Frame Codec │          │   Status    │
//!   │ (encode/    │          │   Mapper    │
//!   │  decode)    │          │             │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use mcbin::{Client, Config};
//!
//! let config = Config::from_env()?;
//! let mut client = Client::connect(&config)?;
//! client.set(b"foo", b"bar", 0, 0, 0)?;
//! let item = client.get(b"foo")?;
//! assert_eq!(&item.value[..], b"bar");
//! client.close()?;
//! # Ok::<(), mcbin::McError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorKind, McError, Result};
pub use config::{Config, Credentials};
pub use client::{Client, Item, SharedClient};
pub use network::Connection;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mcbin
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
