//! Client-side datagram socket: connects to one server endpoint and
//! exchanges request/reply datagrams (spec §4.8, §4.12).

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::constants::MAX_DATAGRAM_LEN;
use crate::error::PmuError;

/// Thin wrapper over a connected [`UdpSocket`].
pub struct UdpClient {
    socket: UdpSocket,
}

impl UdpClient {
    pub async fn connect(server_addr: SocketAddr) -> Result<Self, PmuError> {
        let local: SocketAddr = if server_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        }
        .parse()
        .expect("static address parses");
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| PmuError::BindError {
                addr: local.to_string(),
                source,
            })?;
        socket.connect(server_addr).await.map_err(PmuError::Io)?;
        Ok(Self { socket })
    }

    pub async fn send(&self, bytes: &[u8]) -> Result<(), PmuError> {
        self.socket
            .send(bytes)
            .await
            .map(|_| ())
            .map_err(PmuError::SendError)
    }

    pub async fn recv(&self) -> Result<Vec<u8>, PmuError> {
        let mut buf = [0u8; MAX_DATAGRAM_LEN];
        let len = self.socket.recv(&mut buf).await.map_err(PmuError::Io)?;
        Ok(buf[..len].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UdpSocket as RawSocket;

    #[tokio::test]
    async fn connects_and_exchanges_datagrams() {
        let echo = RawSocket::bind("127.0.0.1:0").await.unwrap();
        let echo_addr = echo.local_addr().unwrap();

        let client = UdpClient::connect(echo_addr).await.unwrap();
        client.send(b"ping").await.unwrap();

        let mut buf = [0u8; 16];
        let (len, from) = echo.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"ping");
        echo.send_to(b"pong", from).await.unwrap();

        let reply = client.recv().await.unwrap();
        assert_eq!(reply, b"pong");
    }
}
