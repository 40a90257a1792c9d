//! DNS server setup and lifecycle management.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::DnsError;
use crate::handler::QueryHandler;
use crate::registry::Registry;
use crate::upstream::{PtrResolver, UdpPtrResolver};

/// Per-datagram receive buffer. Queries are far smaller, but a generous
/// buffer never truncates what a client sends.
const RECV_BUFFER_SIZE: usize = 4096;

/// UDP DNS server: one receive loop per bound address, one task per
/// datagram.
pub struct DnsServer {
    sockets: Vec<Arc<UdpSocket>>,
    handler: Arc<QueryHandler>,
}

impl DnsServer {
    /// Bind every configured listen address, with the default UDP upstream
    /// resolver.
    pub async fn bind(config: &Config) -> Result<Self, DnsError> {
        Self::bind_with_resolver(config, Arc::new(UdpPtrResolver::new())).await
    }

    /// Bind every configured listen address with a caller-supplied upstream
    /// delegate.
    pub async fn bind_with_resolver(
        config: &Config,
        resolver: Arc<dyn PtrResolver>,
    ) -> Result<Self, DnsError> {
        let registry = Arc::new(Registry::new(config.networks.clone()));
        info!(networks = registry.len(), "built network registry");

        let handler = Arc::new(QueryHandler::new(registry, resolver, config.query_log));

        let mut sockets = Vec::with_capacity(config.listen_socket_addrs().len());
        for addr in config.listen_socket_addrs() {
            let socket = UdpSocket::bind(addr).await.map_err(|e| {
                error!(%addr, error = %e, "failed to bind");
                DnsError::Io(e)
            })?;
            info!(addr = %addr, "DNS UDP listening");
            sockets.push(Arc::new(socket));
        }

        Ok(Self { sockets, handler })
    }

    /// Addresses actually bound; with port 0 these carry the assigned ports.
    pub fn local_addrs(&self) -> Result<Vec<SocketAddr>, DnsError> {
        self.sockets
            .iter()
            .map(|s| s.local_addr().map_err(DnsError::Io))
            .collect()
    }

    /// Serve until the cancellation token fires.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), DnsError> {
        let mut workers = JoinSet::new();
        for socket in self.sockets {
            workers.spawn(serve_socket(
                socket,
                Arc::clone(&self.handler),
                shutdown.clone(),
            ));
        }

        while workers.join_next().await.is_some() {}

        info!("DNS server stopped");
        Ok(())
    }
}

/// Receive loop for one socket.
async fn serve_socket(
    socket: Arc<UdpSocket>,
    handler: Arc<QueryHandler>,
    shutdown: CancellationToken,
) {
    let mut buf = [0u8; RECV_BUFFER_SIZE];

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("receive loop shutting down");
                return;
            }
            received = socket.recv_from(&mut buf) => {
                let (len, src) = match received {
                    Ok(received) => received,
                    Err(e) => {
                        error!(error = %e, "UDP recv error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };

                let request = buf[..len].to_vec();
                let handler = Arc::clone(&handler);
                let socket = Arc::clone(&socket);
                tokio::spawn(async move {
                    if let Some(response) = handler.handle(&request, src).await {
                        if let Err(e) = socket.send_to(&response, src).await {
                            debug!(client = %src, error = %e, "UDP send error");
                        }
                    }
                });
            }
        }
    }
}
