//! Tests for TCP dialing and timeouts
//!
//! A small server thread on a loopback port answers with the crate's own
//! stream helpers.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mcbin::protocol::{read_request, write_response, Opcode, Response, Status};
use mcbin::{Client, Config, ErrorKind, McError};

/// Serve one connection: Version, Get (always a miss) and Quit
fn spawn_server() -> (SocketAddr, JoinHandle<Vec<Opcode>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut seen = Vec::new();

        loop {
            let request = match read_request(&mut stream) {
                Ok(request) => request,
                Err(_) => break,
            };
            seen.push(request.opcode);

            let response = match request.opcode {
                Opcode::Version => Response::ok(Opcode::Version).with_value(b"1.6-test".to_vec()),
                Opcode::Get => Response::new(Opcode::Get, Status::KeyNotFound),
                other => Response::ok(other),
            };
            write_response(&mut stream, &response.with_opaque(request.opaque)).unwrap();

            if request.opcode == Opcode::Quit {
                break;
            }
        }
        seen
    });

    (addr, handle)
}

#[test]
fn test_connect_and_run_commands() {
    let (addr, server) = spawn_server();
    let config = Config::builder().server_addr(addr.to_string()).build();

    let mut client = Client::connect(&config).unwrap();
    assert_eq!(client.version().unwrap(), "1.6-test");
    assert!(matches!(client.get(b"foo").unwrap_err(), McError::NotFound));
    client.close().unwrap();

    let seen = server.join().unwrap();
    assert_eq!(seen, vec![Opcode::Version, Opcode::Get, Opcode::Quit]);
}

#[test]
fn test_read_timeout_makes_connection_unusable() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept and never answer
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_millis(500));
        drop(stream);
    });

    let config = Config::builder()
        .server_addr(addr.to_string())
        .read_timeout_ms(50)
        .build();
    let mut client = Client::connect(&config).unwrap();

    let err = client.version().unwrap_err();
    match &err {
        McError::Io(e) => assert!(
            matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut),
            "unexpected kind {:?}",
            e.kind()
        ),
        other => panic!("Expected IO error, got {:?}", other),
    }
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(client.connection().is_broken());
    assert!(matches!(client.noop().unwrap_err(), McError::ConnectionBroken));

    server.join().unwrap();
}

#[test]
fn test_connect_refused() {
    // Grab a free port, then close it
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let config = Config::builder().server_addr(addr.to_string()).build();
    let err = Client::connect(&config).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[test]
fn test_address_without_port() {
    let config = Config::builder().server_addr("localhost").build();
    let err = Client::connect(&config).err().unwrap();
    assert!(matches!(err, McError::Config(_)));
}

#[test]
fn test_client_over_plain_tcp_stream() {
    let (addr, server) = spawn_server();

    let stream = TcpStream::connect(addr).unwrap();
    let mut client = Client::new(stream);
    client.noop().unwrap();
    client.close().unwrap();

    assert_eq!(server.join().unwrap(), vec![Opcode::Noop, Opcode::Quit]);
}
