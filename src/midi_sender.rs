use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::errors::BridgeError;

/// Port the SQ listens on for MIDI-over-UDP.
pub const DEFAULT_MIDI_PORT: u16 = 51325;

/// Upper bound on a blocking send toward an unreachable destination.
const SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Where MIDI datagrams go. The address is replaced wholesale on updates so
/// a concurrent reader never observes a partially written value.
pub struct Destination {
    addr: ArcSwap<SocketAddr>,
}

impl Destination {
    pub fn new(addr: SocketAddr) -> Self {
        Destination {
            addr: ArcSwap::from_pointee(addr),
        }
    }

    pub fn get(&self) -> SocketAddr {
        **self.addr.load()
    }

    pub fn set(&self, addr: SocketAddr) {
        self.addr.store(Arc::new(addr));
    }
}

/// Parse a `host[:port]` destination string. A bare host gets the default
/// MIDI port appended, matching the console "Apply" behavior.
pub fn parse_destination(text: &str) -> Result<SocketAddr, BridgeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BridgeError::BadDestination(text.to_string()));
    }
    let candidate = if text.contains(':') {
        text.to_string()
    } else {
        format!("{}:{}", text, DEFAULT_MIDI_PORT)
    };
    candidate
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| BridgeError::BadDestination(text.to_string()))
}

/// Send one MIDI byte sequence as a single datagram to `dest`.
///
/// Each call opens a transient association; the socket is released when it
/// drops, on every exit path. No retries and no ordering guarantee beyond
/// what UDP provides.
pub fn send_midi(bytes: &[u8], dest: SocketAddr) -> io::Result<()> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_write_timeout(Some(SEND_TIMEOUT))?;
    socket.connect(dest)?;
    socket.send(bytes)?;
    Ok(())
}
