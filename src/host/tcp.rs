//! Static backend directory probed over TCP.
//!
//! Backends are resolved from the `[addresses]` table of the config file.
//! A probe is a plain TCP connect: success means reachable, and no occupancy
//! is reported, so connection counts stay with the tracker.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::net::TcpStream;

use crate::host::{BackendDirectory, BackendHandle, ProbeError, ProbeResponse};
use crate::load_balancer::BackendId;

/// Reloadable id → address table.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    addresses: ArcSwap<HashMap<BackendId, SocketAddr>>,
}

impl StaticDirectory {
    pub fn new(addresses: HashMap<BackendId, SocketAddr>) -> Self {
        Self {
            addresses: ArcSwap::from_pointee(addresses),
        }
    }

    /// Swap in a new address table (config reload).
    pub fn update(&self, addresses: HashMap<BackendId, SocketAddr>) {
        tracing::debug!(backends = addresses.len(), "Backend directory updated");
        self.addresses.store(Arc::new(addresses));
    }

    pub fn address_of(&self, id: &BackendId) -> Option<SocketAddr> {
        self.addresses.load().get(id).copied()
    }
}

impl BackendDirectory for StaticDirectory {
    fn resolve(&self, id: &BackendId) -> Option<Arc<dyn BackendHandle>> {
        let addr = self.address_of(id)?;
        Some(Arc::new(TcpBackend { addr }))
    }
}

/// A backend reachable at a socket address.
#[derive(Debug, Clone, Copy)]
pub struct TcpBackend {
    pub addr: SocketAddr,
}

impl BackendHandle for TcpBackend {
    fn probe(&self, timeout: Duration) -> BoxFuture<'static, Result<ProbeResponse, ProbeError>> {
        let addr = self.addr;
        async move {
            match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
                Ok(Ok(_stream)) => Ok(ProbeResponse::default()),
                Ok(Err(e)) => Err(ProbeError::Connect(e)),
                Err(_) => Err(ProbeError::Timeout(timeout)),
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_resolve_and_update() {
        let addr: SocketAddr = "127.0.0.1:25565".parse().unwrap();
        let directory = StaticDirectory::new(HashMap::from([(BackendId::new("Lobby"), addr)]));

        assert!(directory.resolve(&BackendId::new("lobby")).is_some());
        assert!(directory.resolve(&BackendId::new("survival")).is_none());

        directory.update(HashMap::new());
        assert!(directory.resolve(&BackendId::new("lobby")).is_none());
    }

    #[tokio::test]
    async fn test_tcp_probe() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let backend = TcpBackend { addr };
        let response = backend.probe(Duration::from_secs(1)).await.unwrap();
        assert_eq!(response.occupancy, None);

        drop(listener);
        let result = backend.probe(Duration::from_secs(1)).await;
        assert!(result.is_err());
    }
}
