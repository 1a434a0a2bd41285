use tokio::net::lookup_host;
use tracing::*;

use crate::{config::ServerConfig, retry::RetryPolicy};

/// Link-level readiness of the uplink network
#[async_trait::async_trait]
pub trait NetworkLink: Send {
    async fn is_associated(&mut self) -> bool;
}

/// Host network: ready once the upload server's address resolves
#[derive(Debug, Clone)]
pub struct ResolverLink {
    host: String,
    port: u16,
}

impl ResolverLink {
    pub fn new(server: &ServerConfig) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
        }
    }
}

#[async_trait::async_trait]
impl NetworkLink for ResolverLink {
    async fn is_associated(&mut self) -> bool {
        match lookup_host((self.host.as_str(), self.port)).await {
            Ok(mut addrs) => addrs.next().is_some(),
            Err(err) => {
                debug!("resolving {}:{} failed: {err}", self.host, self.port);
                false
            }
        }
    }
}

/// Spin until the link is up, backing off between polls. Never gives up.
///
/// Returns the number of failed polls before association.
pub async fn wait_for_association<L, R>(link: &mut L, retry: &mut R) -> u32
where
    L: NetworkLink,
    R: RetryPolicy,
{
    let mut failed = 0;
    while !link.is_associated().await {
        failed += 1;
        info!("Connecting to network...");
        retry.backoff(failed).await;
    }

    info!("Connected to network");
    failed
}
