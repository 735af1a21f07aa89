//! DNS resolution backed by hickory.

use super::DnsLookup;
use crate::error::DittoError;
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::net::IpAddr;
use std::time::Duration;

/// Forward/reverse resolver using the host's DNS configuration.
#[derive(Clone)]
pub struct HickoryDns {
    resolver: TokioResolver,
}

impl HickoryDns {
    /// Build a resolver from the system configuration, falling back to
    /// hickory's default upstreams when it cannot be read.
    pub fn new(timeout: Duration) -> Self {
        Self {
            resolver: build_system_resolver(timeout),
        }
    }
}

fn build_system_resolver(timeout: Duration) -> TokioResolver {
    match TokioResolver::builder_tokio() {
        Ok(mut builder) => {
            builder.options_mut().timeout = timeout;
            return builder.build();
        }
        Err(e) => {
            tracing::warn!("Failed to load system DNS configuration, using defaults: {}", e);
        }
    }

    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    TokioResolver::builder_with_config(ResolverConfig::default(), TokioConnectionProvider::default())
        .with_options(opts)
        .build()
}

#[async_trait]
impl DnsLookup for HickoryDns {
    async fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, DittoError> {
        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| DittoError::dns(host, e.to_string()))?;

        let mut addresses: Vec<IpAddr> = Vec::new();
        for addr in lookup.iter() {
            if !addresses.contains(&addr) {
                addresses.push(addr);
            }
        }
        Ok(addresses)
    }

    async fn lookup_addr(&self, addr: IpAddr) -> Result<Vec<String>, DittoError> {
        let lookup = self
            .resolver
            .reverse_lookup(addr)
            .await
            .map_err(|e| DittoError::dns(addr.to_string(), e.to_string()))?;

        Ok(lookup.iter().map(|name| name.to_string()).collect())
    }
}
