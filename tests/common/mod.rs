//! Shared test helpers
//!
//! - `FakeServer`: an in-memory memcached stand-in that is itself the
//!   client's byte stream (`Read + Write`).
//! - `ScriptedStream`: replays canned response frames and records writes.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::{self, Cursor, Read, Write};

use mcbin::client::plain_blob;
use mcbin::protocol::{
    decode_request, encode_response, Extras, Opcode, Request, Response, Status, HEADER_SIZE,
};
use mcbin::Credentials;

pub const FAKE_VERSION: &str = "1.6.21-fake";

// =============================================================================
// FakeServer
// =============================================================================

#[derive(Debug, Clone)]
struct StoredItem {
    value: Vec<u8>,
    flags: u32,
    cas: u64,
}

/// In-memory server speaking the binary protocol
///
/// Requests are processed as soon as a complete frame has been written;
/// responses are queued for the next reads.
pub struct FakeServer {
    inbound: Vec<u8>,
    outbound: VecDeque<u8>,
    store: HashMap<Vec<u8>, StoredItem>,
    next_cas: u64,

    /// Credentials required before data commands; `None` = no SASL support
    required: Option<Credentials>,
    mechanisms: String,
    authenticated: bool,

    /// Answer the first SASL AUTH with AUTH_CONTINUE
    continue_first: bool,

    /// Largest number of bytes returned by a single read
    read_chunk: usize,

    /// Largest number of bytes accepted by a single write
    write_chunk: usize,

    /// Fail the next write with `Interrupted` before accepting anything
    interrupt_next_write: bool,

    /// Number of successful `write` calls
    pub write_calls: usize,

    /// Every request received, in order
    pub requests: Vec<Request>,
    pub pending_flush: Option<u32>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self {
            inbound: Vec::new(),
            outbound: VecDeque::new(),
            store: HashMap::new(),
            next_cas: 1000,
            required: None,
            mechanisms: "PLAIN".to_string(),
            authenticated: false,
            continue_first: false,
            read_chunk: usize::MAX,
            write_chunk: usize::MAX,
            interrupt_next_write: false,
            write_calls: 0,
            requests: Vec::new(),
            pending_flush: None,
        }
    }

    /// Require SASL PLAIN with these credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.required = Some(Credentials::new(username, password));
        self
    }

    pub fn with_mechanisms(mut self, mechanisms: &str) -> Self {
        self.mechanisms = mechanisms.to_string();
        self
    }

    pub fn with_auth_continue(mut self) -> Self {
        self.continue_first = true;
        self
    }

    /// Return at most `chunk` bytes per read, forcing partial reads
    pub fn with_read_chunk(mut self, chunk: usize) -> Self {
        self.read_chunk = chunk;
        self
    }

    /// Accept at most `chunk` bytes per write, forcing short writes
    pub fn with_write_chunk(mut self, chunk: usize) -> Self {
        self.write_chunk = chunk;
        self
    }

    /// Interrupt the first write
    pub fn with_interrupted_write(mut self) -> Self {
        self.interrupt_next_write = true;
        self
    }

    fn process(&mut self) {
        loop {
            if self.inbound.len() < HEADER_SIZE {
                return;
            }
            let body_len = u32::from_be_bytes([
                self.inbound[8],
                self.inbound[9],
                self.inbound[10],
                self.inbound[11],
            ]) as usize;
            if self.inbound.len() < HEADER_SIZE + body_len {
                return;
            }

            let frame: Vec<u8> = self.inbound.drain(..HEADER_SIZE + body_len).collect();
            let request = decode_request(&frame).expect("client sent a malformed frame");
            let response = self.handle(&request).with_opaque(request.opaque);
            let bytes = encode_response(&response).expect("fake server built an oversized response");
            self.outbound.extend(bytes);
            self.requests.push(request);
        }
    }

    fn bump_cas(&mut self) -> u64 {
        self.next_cas += 1;
        self.next_cas
    }

    fn handle(&mut self, request: &Request) -> Response {
        let op = request.opcode;
        let sasl = matches!(
            op,
            Opcode::SaslListMechs | Opcode::SaslAuth | Opcode::SaslStep
        );

        if sasl {
            return self.handle_sasl(request);
        }
        if self.required.is_some() && !self.authenticated {
            return Response::new(op, Status::AuthError).with_value(b"Auth failure".to_vec());
        }

        match op {
            Opcode::Get => match self.store.get(&request.key) {
                Some(item) => Response::ok(op)
                    .with_extras(item.flags.to_be_bytes().to_vec())
                    .with_value(item.value.clone())
                    .with_cas(item.cas),
                None => not_found(op),
            },
            Opcode::Set | Opcode::Add | Opcode::Replace => self.handle_store(request),
            Opcode::Append | Opcode::Prepend => self.handle_concat(request),
            Opcode::Increment | Opcode::Decrement => self.handle_counter(request),
            Opcode::Delete => match self.store.get(&request.key).map(|item| item.cas) {
                None => not_found(op),
                Some(cas) if request.cas != 0 && request.cas != cas => {
                    Response::new(op, Status::KeyExists)
                }
                Some(_) => {
                    self.store.remove(&request.key);
                    Response::ok(op)
                }
            },
            Opcode::Touch => {
                let cas = self.bump_cas();
                match self.store.get_mut(&request.key) {
                    Some(item) => {
                        item.cas = cas;
                        Response::ok(op).with_cas(cas)
                    }
                    None => not_found(op),
                }
            }
            Opcode::Flush => {
                match request.extras {
                    Extras::Flush { delay } if delay > 0 => self.pending_flush = Some(delay),
                    _ => self.store.clear(),
                }
                Response::ok(op)
            }
            Opcode::Version => Response::ok(op).with_value(FAKE_VERSION.as_bytes().to_vec()),
            Opcode::Noop | Opcode::Quit => Response::ok(op),
            _ => Response::new(op, Status::UnknownCommand),
        }
    }

    fn handle_store(&mut self, request: &Request) -> Response {
        let op = request.opcode;
        let Extras::Store { flags, .. } = request.extras else {
            return Response::new(op, Status::InvalidArguments);
        };

        let existing = self.store.get(&request.key).map(|item| item.cas);
        match (op, existing) {
            (Opcode::Add, Some(_)) => return Response::new(op, Status::KeyExists),
            (Opcode::Replace, None) => return not_found(op),
            (_, None) if request.cas != 0 => return not_found(op),
            (_, Some(cas)) if request.cas != 0 && request.cas != cas => {
                return Response::new(op, Status::KeyExists)
            }
            _ => {}
        }

        let cas = self.bump_cas();
        self.store.insert(
            request.key.clone(),
            StoredItem {
                value: request.value.clone(),
                flags,
                cas,
            },
        );
        Response::ok(op).with_cas(cas)
    }

    fn handle_concat(&mut self, request: &Request) -> Response {
        let op = request.opcode;
        let cas = self.bump_cas();
        let Some(item) = self.store.get_mut(&request.key) else {
            return Response::new(op, Status::ItemNotStored);
        };
        if request.cas != 0 && request.cas != item.cas {
            return Response::new(op, Status::KeyExists);
        }

        if op == Opcode::Append {
            item.value.extend_from_slice(&request.value);
        } else {
            let mut value = request.value.clone();
            value.extend_from_slice(&item.value);
            item.value = value;
        }
        item.cas = cas;
        Response::ok(op).with_cas(cas)
    }

    fn handle_counter(&mut self, request: &Request) -> Response {
        let op = request.opcode;
        let Extras::Counter {
            delta,
            initial,
            expiration,
        } = request.extras
        else {
            return Response::new(op, Status::InvalidArguments);
        };

        let new_value = match self.store.get(&request.key) {
            None if expiration == 0xffff_ffff => return not_found(op),
            None => initial,
            Some(item) => {
                let current = match std::str::from_utf8(&item.value)
                    .ok()
                    .and_then(|s| s.trim().parse::<u64>().ok())
                {
                    Some(n) => n,
                    None => return Response::new(op, Status::NonNumericValue),
                };
                if op == Opcode::Increment {
                    current.wrapping_add(delta)
                } else {
                    current.saturating_sub(delta)
                }
            }
        };

        let cas = self.bump_cas();
        let flags = self.store.get(&request.key).map_or(0, |item| item.flags);
        self.store.insert(
            request.key.clone(),
            StoredItem {
                value: new_value.to_string().into_bytes(),
                flags,
                cas,
            },
        );
        Response::ok(op)
            .with_value(new_value.to_be_bytes().to_vec())
            .with_cas(cas)
    }

    fn handle_sasl(&mut self, request: &Request) -> Response {
        let op = request.opcode;
        let Some(required) = self.required.clone() else {
            return Response::new(op, Status::UnknownCommand);
        };

        match op {
            Opcode::SaslListMechs => {
                Response::ok(op).with_value(self.mechanisms.as_bytes().to_vec())
            }
            Opcode::SaslAuth if self.continue_first => {
                self.continue_first = false;
                Response::new(op, Status::AuthContinue).with_value(b"go on".to_vec())
            }
            _ if request.key == b"PLAIN" && request.value == plain_blob(&required) => {
                self.authenticated = true;
                Response::ok(op).with_value(b"Authenticated".to_vec())
            }
            _ => Response::new(op, Status::AuthError).with_value(b"Auth failure".to_vec()),
        }
    }
}

fn not_found(op: Opcode) -> Response {
    Response::new(op, Status::KeyNotFound).with_value(b"Not found".to_vec())
}

impl Write for FakeServer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.interrupt_next_write {
            self.interrupt_next_write = false;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
        }

        let n = buf.len().min(self.write_chunk);
        self.inbound.extend_from_slice(&buf[..n]);
        self.write_calls += 1;
        self.process();
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for FakeServer {
    /// Returns 0 (EOF) once no response is pending
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.outbound.len()).min(self.read_chunk);
        for (slot, byte) in buf.iter_mut().zip(self.outbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

// =============================================================================
// ScriptedStream
// =============================================================================

/// Stream that replays fixed bytes and records everything written
pub struct ScriptedStream {
    input: Cursor<Vec<u8>>,
    pub written: Vec<u8>,
}

impl ScriptedStream {
    /// Replay `responses`, stamping opaques 1, 2, 3... as a connection expects
    pub fn new(responses: Vec<Response>) -> Self {
        let mut bytes = Vec::new();
        for (i, response) in responses.into_iter().enumerate() {
            bytes.extend(
                encode_response(&response.with_opaque(i as u32 + 1))
                    .expect("scripted response does not fit a frame"),
            );
        }
        Self::from_bytes(bytes)
    }

    /// Replay raw bytes verbatim
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            input: Cursor::new(bytes),
            written: Vec::new(),
        }
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// FailingStream
// =============================================================================

/// Stream whose writes always fail
pub struct FailingStream;

impl Read for FailingStream {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

impl Write for FailingStream {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
