use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use trust_dns_resolver::proto::error::ProtoError;
use trust_dns_resolver::proto::op::Message;

/// Large enough for EDNS sized answers; anything longer is truncated by the socket.
const MAX_UDP_PAYLOAD: usize = 4096;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("malformed message: {0}")]
    Proto(#[from] ProtoError),
    #[error("response id {received} does not match query id {expected}")]
    IdMismatch { expected: u16, received: u16 },
}

/// One query/response round trip against a server.
///
/// `Ok(None)` means the implementation reported neither a response nor an
/// error; callers treat it as a broken contract, not as a normal outcome.
pub trait Exchanger {
    fn exchange(
        &self,
        query: &Message,
        server: SocketAddr,
    ) -> impl Future<Output = Result<Option<Message>, ExchangeError>>;
}

/// Plain DNS over UDP, one fresh socket per exchange.
#[derive(Debug, Clone)]
pub struct UdpExchanger {
    timeout: Duration,
}

impl UdpExchanger {
    /// `timeout` bounds the whole exchange, from bind to decoded reply.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn send_and_receive(
        &self,
        query: &Message,
        server: SocketAddr,
    ) -> Result<Message, ExchangeError> {
        let local: SocketAddr = match server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server).await?;
        socket.send(&query.to_vec()?).await?;

        let mut buf = vec![0u8; MAX_UDP_PAYLOAD];
        let len = socket.recv(&mut buf).await?;
        let response = Message::from_vec(&buf[..len])?;
        if response.id() != query.id() {
            return Err(ExchangeError::IdMismatch {
                expected: query.id(),
                received: response.id(),
            });
        }
        Ok(response)
    }
}

impl Exchanger for UdpExchanger {
    async fn exchange(
        &self,
        query: &Message,
        server: SocketAddr,
    ) -> Result<Option<Message>, ExchangeError> {
        match timeout(self.timeout, self.send_and_receive(query, server)).await {
            Ok(result) => result.map(Some),
            Err(_) => Err(ExchangeError::Timeout(self.timeout)),
        }
    }
}
