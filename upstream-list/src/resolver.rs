//! DNS resolution collaborator.
//!
//! Grounded on `droute/src/router/upstreams/upstream/qhandle/mod.rs`'s
//! `ConnInitiator`/`QHandle` `async_trait` pattern: a narrow trait covering
//! exactly what the engine needs (parallel A/AAAA lookup with a timeout and
//! retransmit count), implemented once against `trust-dns-resolver` for
//! production use and once as a scriptable mock for tests.

use crate::error::ResolveError;
use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::TokioAsyncResolver;

/// Performs the A/AAAA lookups backing lazy DNS re-resolution.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Resolve the A records for `name`.
    async fn lookup_a(
        &self,
        name: &str,
        timeout: Duration,
        retransmits: u32,
    ) -> Result<Vec<Ipv4Addr>, ResolveError>;

    /// Resolve the AAAA records for `name`.
    async fn lookup_aaaa(
        &self,
        name: &str,
        timeout: Duration,
        retransmits: u32,
    ) -> Result<Vec<Ipv6Addr>, ResolveError>;
}

/// Production resolver backed by `trust-dns-resolver`'s Tokio-integrated
/// async resolver.
pub struct TrustDnsResolver {
    inner: TokioAsyncResolver,
}

impl TrustDnsResolver {
    /// Wrap an already-constructed `trust-dns-resolver` handle.
    pub fn new(inner: TokioAsyncResolver) -> Self {
        TrustDnsResolver { inner }
    }

    /// Build from the system's resolver configuration (`/etc/resolv.conf`
    /// on unix), matching how a daemon would ordinarily obtain one.
    pub async fn from_system_conf() -> Result<Self, ResolveError> {
        let inner = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| ResolveError::Lookup(e.to_string()))?;
        Ok(TrustDnsResolver { inner })
    }
}

fn map_err(err: trust_dns_resolver::error::ResolveError) -> ResolveError {
    match err.kind() {
        ResolveErrorKind::Timeout => ResolveError::Timeout,
        _ => ResolveError::Lookup(err.to_string()),
    }
}

#[async_trait]
impl DnsResolver for TrustDnsResolver {
    async fn lookup_a(
        &self,
        name: &str,
        timeout: Duration,
        retransmits: u32,
    ) -> Result<Vec<Ipv4Addr>, ResolveError> {
        let _ = retransmits; // retry policy is configured on the resolver's options at construction
        match tokio::time::timeout(timeout, self.inner.ipv4_lookup(name)).await {
            Ok(Ok(lookup)) => Ok(lookup.iter().copied().collect()),
            Ok(Err(e)) => Err(map_err(e)),
            Err(_) => Err(ResolveError::Timeout),
        }
    }

    async fn lookup_aaaa(
        &self,
        name: &str,
        timeout: Duration,
        retransmits: u32,
    ) -> Result<Vec<Ipv6Addr>, ResolveError> {
        let _ = retransmits;
        match tokio::time::timeout(timeout, self.inner.ipv6_lookup(name)).await {
            Ok(Ok(lookup)) => Ok(lookup.iter().copied().collect()),
            Ok(Err(e)) => Err(map_err(e)),
            Err(_) => Err(ResolveError::Timeout),
        }
    }
}
