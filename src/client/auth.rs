//! SASL authentication
//!
//! Runs the PLAIN handshake over a connection before any data command:
//! list mechanisms, send the credential blob, follow continuation
//! requests until the server accepts or rejects.

use std::io::{Read, Write};

use crate::config::Credentials;
use crate::error::{McError, Result};
use crate::network::Connection;
use crate::protocol::{Opcode, Request, Response, Status};

/// The only mechanism this client speaks
pub const PLAIN: &str = "PLAIN";

/// Upper bound on AUTH_CONTINUE rounds before giving up
const MAX_AUTH_STEPS: usize = 4;

/// Ask the server which SASL mechanisms it supports
pub fn list_mechanisms<S: Read + Write>(conn: &mut Connection<S>) -> Result<Vec<String>> {
    let response = conn.send_and_receive(Request::new(Opcode::SaslListMechs))?;
    if !response.is_success() {
        return Err(rejected("listing mechanisms", &response));
    }

    Ok(String::from_utf8_lossy(&response.value)
        .split_whitespace()
        .map(str::to_string)
        .collect())
}

/// Authenticate with SASL PLAIN
///
/// Every failure other than a transport or protocol error is reported as
/// `McError::AuthFailed`, never as a storage-command error.
pub fn authenticate<S: Read + Write>(
    conn: &mut Connection<S>,
    credentials: &Credentials,
) -> Result<()> {
    let mechanisms = list_mechanisms(conn)?;
    tracing::debug!(?mechanisms, "Server SASL mechanisms");

    if !mechanisms.iter().any(|m| m.eq_ignore_ascii_case(PLAIN)) {
        return Err(McError::AuthFailed(format!(
            "server does not offer {} (offers: {})",
            PLAIN,
            mechanisms.join(" ")
        )));
    }

    let blob = plain_blob(credentials);
    let mut response = conn.send_and_receive(
        Request::new(Opcode::SaslAuth)
            .with_key(PLAIN.as_bytes())
            .with_value(&blob),
    )?;

    let mut steps = 0;
    loop {
        match response.status_kind() {
            Some(Status::NoError) => {
                tracing::debug!("Authenticated as {}", credentials.username);
                return Ok(());
            }
            Some(Status::AuthContinue) if steps < MAX_AUTH_STEPS => {
                steps += 1;
                tracing::debug!(step = steps, "Server requested another SASL step");

                // PLAIN has no challenge to answer: the server's continuation
                // value is ignored and the same credentials are sent again
                response = conn.send_and_receive(
                    Request::new(Opcode::SaslStep)
                        .with_key(PLAIN.as_bytes())
                        .with_value(&blob),
                )?;
            }
            Some(Status::AuthContinue) => {
                return Err(McError::AuthFailed(format!(
                    "server still asking to continue after {} steps",
                    steps
                )));
            }
            _ => return Err(rejected("authentication", &response)),
        }
    }
}

/// `authzid \0 username \0 password`
pub fn plain_blob(credentials: &Credentials) -> Vec<u8> {
    let mut blob = Vec::with_capacity(
        credentials.authzid.len() + credentials.username.len() + credentials.password.len() + 2,
    );
    blob.extend_from_slice(credentials.authzid.as_bytes());
    blob.push(0);
    blob.extend_from_slice(credentials.username.as_bytes());
    blob.push(0);
    blob.extend_from_slice(credentials.password.as_bytes());
    blob
}

fn rejected(stage: &str, response: &Response) -> McError {
    McError::AuthFailed(format!(
        "{} rejected with status 0x{:04x}: {}",
        stage,
        response.status,
        response.message()
    ))
}
