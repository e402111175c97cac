//! Forwarding server.
//!
//! Receives query datagrams, resolves the first question of each through
//! the configured [`Resolve`] implementation and logs what came back. No
//! reply datagram is sent to the requester.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tokio_util::udp::UdpFramed;
use tracing::{debug, error, info, warn};

use crate::client::Resolve;
use crate::codec::DnsCodec;
use crate::errors::{DnsCodecError, ServerError};
use crate::protocol::Message;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on, 0.0.0.0:53 by default
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 53)),
        }
    }
}

pub struct Server {
    config: ServerConfig,
    resolver: Arc<dyn Resolve>,
    shutdown: CancellationToken,
}

impl Server {
    pub fn new(config: ServerConfig, resolver: Arc<dyn Resolve>) -> Self {
        Self {
            config,
            resolver,
            shutdown: CancellationToken::new(),
        }
    }

    /// Stops the receive loop once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Binds the configured address and runs the receive loop.
    pub async fn start(&self) -> Result<(), ServerError> {
        let address = self.config.listen;
        let socket = UdpSocket::bind(address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;
        self.serve(socket).await
    }

    /// Runs the receive loop on an already bound socket.
    ///
    /// Returns `Ok(())` when cancelled. A datagram that fails to decode is
    /// logged and skipped; a failing socket read ends the loop with
    /// [`ServerError::Receive`].
    pub async fn serve(&self, socket: UdpSocket) -> Result<(), ServerError> {
        match socket.local_addr() {
            Ok(address) => info!("DNS server listening on {}", address),
            Err(e) => warn!("DNS server listening on an unknown address: {}", e),
        }

        self.run_loop(UdpFramed::new(socket, DnsCodec::new())).await
    }

    // Dispatches decoded frames until cancelled, the stream ends or a read
    // fails.
    async fn run_loop<S>(&self, mut frames: S) -> Result<(), ServerError>
    where
        S: Stream<Item = Result<(Message, SocketAddr), DnsCodecError>> + Unpin,
    {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("DNS server shutting down");
                    return Ok(());
                }
                frame = frames.next() => match frame {
                    Some(Ok((message, peer))) => {
                        let resolver = Arc::clone(&self.resolver);
                        tokio::spawn(async move {
                            handle_message(resolver, message, peer).await;
                        });
                    }
                    Some(Err(DnsCodecError::IoError(e))) => {
                        error!("Failed to read from UDP: {}", e);
                        return Err(ServerError::Receive(e));
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Failed to decode DNS packet");
                    }
                    None => return Ok(()),
                }
            }
        }
    }
}

async fn handle_message(resolver: Arc<dyn Resolve>, message: Message, peer: SocketAddr) {
    let header = &message.header;
    debug!(
        target: "dnsbox::packet_details",
        %peer,
        packet_id = header.id,
        query_response = if header.is_response { "Response" } else { "Query" },
        opcode = %header.opcode,
        authoritative = header.authoritative,
        truncated = header.truncated,
        recursion_desired = header.recursion_desired,
        recursion_available = header.recursion_available,
        response_code = %header.response_code,
        question_count = message.questions.len(),
        answer_count = message.answers.len(),
        authority_count = message.authorities.len(),
        additional_count = message.additional.len(),
        "DNS packet header parsed successfully"
    );

    let Some(question) = message.questions.first() else {
        warn!(%peer, packet_id = header.id, "Query without a question, ignoring");
        return;
    };

    match resolver.resolve(&question.name, question.qtype).await {
        Ok(reply) => {
            info!(
                %peer,
                domain = %question.name,
                rtype = %question.qtype,
                response_code = %reply.header.response_code,
                answers = reply.answers.len(),
                "Resolved query"
            );
            for answer in &reply.answers {
                info!("Resolved {}", answer);
            }
        }
        Err(e) => error!(%peer, error = %e, "Could not resolve query"),
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::errors::{ClientError, ResolveError};
    use crate::protocol::ResourceType;

    const WAIT: Duration = Duration::from_secs(5);

    /// Reports every lookup over a channel. Names starting with "slow"
    /// never complete and names starting with "fail" return an error.
    struct ReportingResolver {
        seen: mpsc::UnboundedSender<(String, ResourceType)>,
    }

    #[async_trait]
    impl Resolve for ReportingResolver {
        async fn resolve(
            &self,
            name: &str,
            rtype: ResourceType,
        ) -> Result<Message, ResolveError> {
            let _ = self.seen.send((name.to_string(), rtype));
            if name.starts_with("slow") {
                std::future::pending::<()>().await;
            }
            if name.starts_with("fail") {
                return Err(ResolveError {
                    name: name.to_string(),
                    rtype,
                    source: ClientError::Read(io::Error::other("stub")),
                });
            }
            Ok(Message::default())
        }
    }

    struct Running {
        address: SocketAddr,
        seen: mpsc::UnboundedReceiver<(String, ResourceType)>,
        token: CancellationToken,
        task: JoinHandle<Result<(), ServerError>>,
        sender: UdpSocket,
    }

    async fn run_server() -> Running {
        let (tx, seen) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let server = Server::new(
            ServerConfig::default(),
            Arc::new(ReportingResolver { seen: tx }),
        )
        .with_cancellation(token.clone());

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let address = socket.local_addr().unwrap();
        let task = tokio::spawn(async move { server.serve(socket).await });
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        Running {
            address,
            seen,
            token,
            task,
            sender,
        }
    }

    impl Running {
        async fn send(&self, message: &Message) {
            let bytes = message.encode().unwrap();
            self.sender.send_to(&bytes, self.address).await.unwrap();
        }

        async fn next_lookup(&mut self) -> (String, ResourceType) {
            tokio::time::timeout(WAIT, self.seen.recv())
                .await
                .expect("no lookup reported")
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_server_resolves_first_question() {
        let mut running = run_server().await;

        let mut query = Message::query(7, "google.com", ResourceType::A);
        query
            .questions
            .push(crate::protocol::Question::new("ignored.com.", ResourceType::TXT));
        running.send(&query).await;

        assert_eq!(
            running.next_lookup().await,
            ("google.com.".to_string(), ResourceType::A)
        );

        running.token.cancel();
        assert!(running.task.await.unwrap().is_ok());
        assert!(running.seen.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_server_survives_bad_datagrams() {
        let mut running = run_server().await;

        running.sender.send_to(b"short", running.address).await.unwrap();
        running
            .sender
            .send_to(&[0xFF; 40], running.address)
            .await
            .unwrap();
        running.send(&Message::default()).await;
        running
            .send(&Message::query(8, "fail.example.", ResourceType::TXT))
            .await;
        running
            .send(&Message::query(9, "example.org", ResourceType::SOA))
            .await;

        // lookups run on their own tasks, so they may report in either order
        let mut lookups = vec![running.next_lookup().await, running.next_lookup().await];
        lookups.sort();
        assert_eq!(
            lookups,
            vec![
                ("example.org.".to_string(), ResourceType::SOA),
                ("fail.example.".to_string(), ResourceType::TXT),
            ]
        );

        running.token.cancel();
        assert!(running.task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_slow_lookup_does_not_block_reception() {
        let mut running = run_server().await;

        running
            .send(&Message::query(1, "slow.example.", ResourceType::A))
            .await;
        assert_eq!(running.next_lookup().await.0, "slow.example.");

        running
            .send(&Message::query(2, "fast.example.", ResourceType::A))
            .await;
        assert_eq!(running.next_lookup().await.0, "fast.example.");

        running.token.cancel();
        assert!(running.task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_read_failure_stops_the_loop() {
        let (tx, mut seen) = mpsc::unbounded_channel();
        let server = Server::new(
            ServerConfig::default(),
            Arc::new(ReportingResolver { seen: tx }),
        );
        let peer: SocketAddr = "127.0.0.1:5300".parse().unwrap();

        let frames = futures::stream::iter(vec![
            Ok((Message::query(1, "before.example.", ResourceType::A), peer)),
            Err(DnsCodecError::InvalidDomain("bad datagram".to_string())),
            Err(DnsCodecError::IoError(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "socket closed",
            ))),
            Ok((Message::query(2, "after.example.", ResourceType::A), peer)),
        ]);

        match server.run_loop(frames).await {
            Err(ServerError::Receive(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected a receive failure, got {:?}", other),
        }

        let first = tokio::time::timeout(WAIT, seen.recv()).await.unwrap();
        assert_eq!(first, Some(("before.example.".to_string(), ResourceType::A)));
        tokio::task::yield_now().await;
        assert!(seen.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_loop_ends_with_the_stream() {
        let (tx, _seen) = mpsc::unbounded_channel();
        let server = Server::new(
            ServerConfig::default(),
            Arc::new(ReportingResolver { seen: tx }),
        );

        let frames = futures::stream::empty::<Result<(Message, SocketAddr), DnsCodecError>>();
        assert!(server.run_loop(frames).await.is_ok());
    }

    #[tokio::test]
    async fn test_start_reports_bind_failure() {
        let taken = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let address = taken.local_addr().unwrap();
        let (tx, _seen) = mpsc::unbounded_channel();

        let server = Server::new(
            ServerConfig { listen: address },
            Arc::new(ReportingResolver { seen: tx }),
        );

        match server.start().await {
            Err(ServerError::Bind { address: failed, .. }) => assert_eq!(failed, address),
            other => panic!("expected a bind failure, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config() {
        assert_eq!(
            ServerConfig::default().listen,
            "0.0.0.0:53".parse::<SocketAddr>().unwrap()
        );
    }
}
