use std::net::TcpListener;
use std::time::Duration;

use super::{connect, resolve};
use crate::utils::MqError;

#[test]
fn test_resolve_localhost() {
    let addrs = resolve("127.0.0.1", 9621).unwrap();
    assert_eq!(addrs.len(), 1);
    assert_eq!(addrs[0].port(), 9621);
}

#[test]
fn test_resolve_rejects_garbage_host() {
    let err = resolve("not a host name", 80).unwrap_err();
    assert!(matches!(err, MqError::InvalidAddress { .. }));
}

#[test]
fn test_connect_to_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let stream = connect(&[addr], Duration::from_secs(1)).unwrap();
    assert_eq!(stream.peer_addr().unwrap(), addr);
}

#[test]
fn test_connect_falls_through_to_working_address() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let good = listener.local_addr().unwrap();

    // Bind and drop to get a port with nothing listening.
    let dead = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();

    let stream = connect(&[dead, good], Duration::from_secs(1)).unwrap();
    assert_eq!(stream.peer_addr().unwrap(), good);
}

#[test]
fn test_connect_reports_error_without_addresses() {
    assert!(connect(&[], Duration::from_millis(10)).is_err());
}
