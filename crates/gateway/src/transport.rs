//! Datagram transport
//!
//! The receiver depends on [`Transport`] rather than a concrete socket so
//! the receiver is testable without the network. Production uses
//! [`UdpTransport`], a non-blocking UDP socket built through `socket2` for
//! the options tokio does not expose.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Source of whole datagrams with peer addresses.
#[async_trait]
pub trait Transport: Send {
    /// Receive one datagram into `buf`, returning the number of bytes
    /// written and the peer address. A datagram larger than `buf` is
    /// truncated to `buf.len()` by the platform.
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

/// Non-blocking UDP socket transport.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind a UDP socket with SO_REUSEADDR and the configured receive
    /// buffer hint.
    pub fn bind(bind_address: &str, recv_buffer_bytes: usize) -> io::Result<Self> {
        let addr: SocketAddr = bind_address.parse().map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "invalid bind address")
        })?;

        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;

        // Larger kernel buffer absorbs bursts between poll cycles;
        // best-effort, some platforms clamp it.
        if let Err(error) = socket.set_recv_buffer_size(recv_buffer_bytes) {
            tracing::warn!(
                %error,
                requested_size = recv_buffer_bytes,
                "failed to set SO_RCVBUF"
            );
        }

        socket.bind(&addr.into())?;
        socket.set_nonblocking(true)?;

        let std_socket: std::net::UdpSocket = socket.into();
        Ok(Self {
            socket: UdpSocket::from_std(std_socket)?,
        })
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }
}
