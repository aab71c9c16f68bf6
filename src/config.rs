//! Configuration for mcbin
//!
//! Centralized client configuration with sensible defaults.

use crate::error::{McError, Result};

/// Environment variable holding the server address (host:port)
pub const ADDR_ENV_VAR: &str = "MCBIN_ADDR";

/// Main configuration for a client session
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Server address (host:port)
    pub server_addr: String,

    /// Connect timeout (milliseconds, 0 = OS default)
    pub connect_timeout_ms: u64,

    /// Read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// Write timeout (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,

    /// Disable Nagle's algorithm
    pub nodelay: bool,

    // -------------------------------------------------------------------------
    // Authentication Configuration
    // -------------------------------------------------------------------------
    /// SASL credentials; `None` skips authentication entirely
    pub credentials: Option<Credentials>,
}

/// SASL PLAIN credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,

    /// Authorization identity, empty unless set
    pub authzid: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            authzid: String::new(),
        }
    }

    /// Set the authorization identity
    pub fn with_authzid(mut self, authzid: impl Into<String>) -> Self {
        self.authzid = authzid.into();
        self
    }
}

// Keep the password out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("authzid", &self.authzid)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:11211".to_string(),
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            nodelay: true,
            credentials: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Default config with the server address taken from `MCBIN_ADDR` if set
    pub fn from_env() -> Result<Self> {
        let mut builder = Config::builder();
        match std::env::var(ADDR_ENV_VAR) {
            Ok(addr) => builder = builder.server_addr(addr),
            Err(std::env::VarError::NotPresent) => {}
            Err(e) => return Err(McError::Config(format!("{}: {}", ADDR_ENV_VAR, e))),
        }
        builder.try_build()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server address (host:port)
    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server_addr = addr.into();
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    /// Authenticate with SASL PLAIN after connecting
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = Some(credentials);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }

    /// Build, rejecting an address without a port
    pub fn try_build(self) -> Result<Config> {
        let addr = &self.config.server_addr;
        match addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(self.config)
            }
            _ => Err(McError::Config(format!(
                "server address must be host:port, got {:?}",
                addr
            ))),
        }
    }
}
