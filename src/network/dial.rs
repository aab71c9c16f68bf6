//! TCP dialing
//!
//! Opens a stream to the configured server and applies socket options.
//! Timeouts set here are what abort a blocked send or receive.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Config;
use crate::error::{McError, Result};

/// Connect to `config.server_addr`, trying each resolved address in turn
pub fn dial(config: &Config) -> Result<TcpStream> {
    let addrs = config
        .server_addr
        .to_socket_addrs()
        .map_err(|e| McError::Config(format!("cannot resolve {}: {}", config.server_addr, e)))?;

    let mut last_err = None;
    for addr in addrs {
        let attempt = if config.connect_timeout_ms > 0 {
            TcpStream::connect_timeout(&addr, Duration::from_millis(config.connect_timeout_ms))
        } else {
            TcpStream::connect(addr)
        };

        match attempt {
            Ok(stream) => {
                configure(&stream, config)?;
                tracing::debug!("Connected to {}", addr);
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(McError::Io(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses for {}", config.server_addr),
        )
    })))
}

/// Apply nodelay and read/write timeouts
fn configure(stream: &TcpStream, config: &Config) -> Result<()> {
    // Disable Nagle's algorithm for low latency
    stream.set_nodelay(config.nodelay)?;

    if config.read_timeout_ms > 0 {
        stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
    }
    if config.write_timeout_ms > 0 {
        stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
    }

    Ok(())
}
