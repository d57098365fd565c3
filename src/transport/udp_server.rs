//! Server-side datagram socket: a single bound socket, one receive per
//! client frame, unicast reply (spec §4.8).

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::constants::MAX_DATAGRAM_LEN;
use crate::error::PmuError;

/// Thin wrapper over a bound [`UdpSocket`] sized for the protocol's
/// datagram ceiling.
pub struct UdpServer {
    socket: UdpSocket,
}

impl UdpServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self, PmuError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| PmuError::BindError {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Blocks until a datagram arrives, returning its bytes and sender.
    pub async fn recv(&self) -> Result<(Vec<u8>, SocketAddr), PmuError> {
        let mut buf = [0u8; MAX_DATAGRAM_LEN];
        let (len, from) = self.socket.recv_from(&mut buf).await.map_err(PmuError::Io)?;
        Ok((buf[..len].to_vec(), from))
    }

    /// Sends a unicast reply back to `to`.
    pub async fn send_to(&self, bytes: &[u8], to: SocketAddr) -> Result<(), PmuError> {
        self.socket
            .send_to(bytes, to)
            .await
            .map(|_| ())
            .map_err(PmuError::SendError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_and_roundtrips_a_datagram() {
        let server = UdpServer::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let server_addr = server.local_addr().unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"hello", server_addr).await.unwrap();

        let (bytes, from) = server.recv().await.unwrap();
        assert_eq!(bytes, b"hello");

        server.send_to(b"ack", from).await.unwrap();
        let mut buf = [0u8; 16];
        let (len, _) = client.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"ack");
    }
}
