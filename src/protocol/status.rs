//! Status mapping
//!
//! Translates response status codes into the crate's error taxonomy.
//! Pure functions, no I/O.

use super::{Response, Status};
use crate::error::{ErrorKind, McError, Result};

/// Map a status code to an error kind
///
/// Returns `None` for NO_ERROR, the only status whose value and CAS are
/// payload rather than diagnostics.
pub fn error_kind(status: u16) -> Option<ErrorKind> {
    let kind = match Status::from_u16(status) {
        Some(Status::NoError) => return None,
        Some(Status::KeyNotFound) => ErrorKind::NotFound,
        Some(Status::KeyExists) => ErrorKind::KeyExists,
        Some(Status::ValueTooLarge) => ErrorKind::ValueTooLarge,
        Some(Status::InvalidArguments) => ErrorKind::InvalidArguments,
        Some(Status::ItemNotStored) => ErrorKind::ValueNotStored,
        Some(Status::NonNumericValue) => ErrorKind::NonNumericValue,
        Some(Status::AuthError) | Some(Status::AuthContinue) => ErrorKind::AuthFailed,
        Some(Status::UnknownCommand) => ErrorKind::UnknownCommand,
        Some(Status::OutOfMemory) => ErrorKind::OutOfMemory,
        Some(Status::NotSupported) => ErrorKind::NotSupported,
        Some(Status::Busy) => ErrorKind::Busy,
        Some(Status::TempFailure) => ErrorKind::TemporaryFailure,
        Some(Status::WrongVbucket) | Some(Status::InternalError) | None => ErrorKind::Server,
    };
    Some(kind)
}

/// Convert a response's status into `Ok(())` or the matching error
///
/// The body of a failed response is only used as diagnostic text.
pub fn check(response: &Response) -> Result<()> {
    let Some(kind) = error_kind(response.status) else {
        return Ok(());
    };

    tracing::debug!(
        opcode = ?response.opcode,
        status = response.status,
        message = %response.message(),
        "Command failed"
    );

    let err = match kind {
        ErrorKind::NotFound => McError::NotFound,
        ErrorKind::KeyExists => McError::KeyExists,
        ErrorKind::ValueTooLarge => McError::ValueTooLarge,
        ErrorKind::InvalidArguments => McError::InvalidArguments,
        ErrorKind::ValueNotStored => McError::ValueNotStored,
        ErrorKind::NonNumericValue => McError::NonNumericValue,
        ErrorKind::UnknownCommand => McError::UnknownCommand,
        ErrorKind::OutOfMemory => McError::OutOfMemory,
        ErrorKind::NotSupported => McError::NotSupported,
        ErrorKind::Busy => McError::Busy,
        ErrorKind::TemporaryFailure => McError::TemporaryFailure,
        ErrorKind::AuthFailed => McError::AuthFailed(response.message()),
        _ => McError::Server {
            status: response.status,
            message: response.message(),
        },
    };
    Err(err)
}
