//! Single-hop resolver client.
//!
//! A [`Client`] sends one query datagram and reads one reply over a
//! connection obtained from its [`Dialer`]. Every call uses a fresh
//! connection, so concurrent lookups share nothing but the configuration.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::codec::{decode_message, encode_message};
use crate::errors::{ClientError, ResolveError};
use crate::protocol::{Message, ResourceType};
use crate::util::hex_dump;

/// Size of the reply buffer. Longer replies are cut off and will usually
/// fail to decode.
pub const RECEIVE_BUFFER_SIZE: usize = 1024;

/// One open exchange with a server.
#[async_trait]
pub trait Connection: Send {
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Opens connections to a server address.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, address: SocketAddr) -> io::Result<Box<dyn Connection>>;
}

/// Dials a connected UDP socket.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpDialer;

#[async_trait]
impl Dialer for UdpDialer {
    async fn dial(&self, address: SocketAddr) -> io::Result<Box<dyn Connection>> {
        let local: SocketAddr = if address.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(address).await?;
        Ok(Box::new(socket))
    }
}

#[async_trait]
impl Connection for UdpSocket {
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(buf).await
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.recv(buf).await
    }
}

/// Adapts a byte stream (for example an in-memory pipe) into a
/// [`Connection`].
#[derive(Debug)]
pub struct StreamConnection<S>(pub S);

#[async_trait]
impl<S> Connection for StreamConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_all(buf).await?;
        self.0.flush().await?;
        Ok(buf.len())
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf).await
    }
}

/// Source of transaction ids for outgoing queries.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> u16;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> u16 {
        rand::random()
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> u16 + Send + Sync,
{
    fn next_id(&self) -> u16 {
        self()
    }
}

/// Anything that can answer a lookup with a decoded message.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, name: &str, rtype: ResourceType) -> Result<Message, ResolveError>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upstream server, 8.8.8.8:53 by default
    pub server: SocketAddr,
    /// Log hex dumps of every datagram sent and received
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server: SocketAddr::from((Ipv4Addr::new(8, 8, 8, 8), 53)),
            verbose: false,
        }
    }
}

#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    dialer: Arc<dyn Dialer>,
    ids: Arc<dyn IdGenerator>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Client {
            config,
            dialer: Arc::new(UdpDialer),
            ids: Arc::new(RandomIdGenerator),
        }
    }

    /// Replaces the transport.
    pub fn with_dialer(mut self, dialer: impl Dialer + 'static) -> Self {
        self.dialer = Arc::new(dialer);
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Asks the configured server for `name` records of type `rtype`.
    pub async fn resolve(&self, name: &str, rtype: ResourceType) -> Result<Message, ResolveError> {
        info!(domain = name, rtype = %rtype, server = %self.config.server, "Resolving DNS records");

        let query = Message::query(self.ids.next_id(), name, rtype);
        self.exchange(&query).await.map_err(|source| ResolveError {
            name: name.to_string(),
            rtype,
            source,
        })
    }

    async fn exchange(&self, query: &Message) -> Result<Message, ClientError> {
        let send_buf = encode_message(query).map_err(ClientError::Encode)?;

        let mut conn = self
            .dialer
            .dial(self.config.server)
            .await
            .map_err(|source| ClientError::Dial {
                address: self.config.server,
                source,
            })?;

        if self.config.verbose {
            debug!("[SEND PACKET]\n{}", hex_dump(&send_buf));
        }
        conn.write(&send_buf).await.map_err(ClientError::Write)?;

        let mut recv_buf = [0u8; RECEIVE_BUFFER_SIZE];
        let recv_len = conn.read(&mut recv_buf).await.map_err(ClientError::Read)?;
        let received = recv_buf.get(..recv_len).unwrap_or(&recv_buf);

        if self.config.verbose {
            debug!("[RECV PACKET]\n{}", hex_dump(received));
        }

        decode_message(received).map_err(ClientError::Decode)
    }
}

#[async_trait]
impl Resolve for Client {
    async fn resolve(&self, name: &str, rtype: ResourceType) -> Result<Message, ResolveError> {
        Client::resolve(self, name, rtype).await
    }
}
