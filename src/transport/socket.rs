use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::utils::{MqError, Result};

/// Resolves `host:port` into the list of addresses to try, in resolver order.
pub fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let address = format!("{host}:{port}");
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| MqError::InvalidAddress {
            address: address.clone(),
            source,
        })?
        .collect();
    if addrs.is_empty() {
        return Err(MqError::InvalidAddress {
            address,
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses resolved"),
        });
    }
    Ok(addrs)
}

/// Opens a stream to the first address that accepts within `timeout`.
///
/// Returns the last connection error when every address fails.
pub fn connect(addrs: &[SocketAddr], timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = io::Error::new(io::ErrorKind::InvalidInput, "no broker address");
    for addr in addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}
