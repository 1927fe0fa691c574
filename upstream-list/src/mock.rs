//! Test doubles for the DNS resolver and RNG collaborators, following the
//! teacher's `#[doc(hidden)] pub mod mock` (`droute::mock::Server`): exported
//! so integration tests in `tests/` can use them, but not part of the
//! crate's intended public surface.

use crate::error::ResolveError;
use crate::resolver::DnsResolver;
use crate::rng::UpstreamRng;
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Mutex;
use std::time::Duration;

/// Resolver returning a fixed, scriptable address table, keyed by hostname.
/// Each lookup consults the table under its current lock; tests mutate it
/// between `tokio::time::advance` steps to simulate address changes.
pub struct ScriptedResolver {
    table: Mutex<HashMap<String, (Vec<Ipv4Addr>, Vec<Ipv6Addr>)>>,
}

impl ScriptedResolver {
    /// A resolver that returns the given single A record for any name not
    /// otherwise configured via `set`, with no AAAA records.
    pub fn single_a(addr: Ipv4Addr) -> Self {
        let mut table = HashMap::new();
        table.insert(String::new(), (vec![addr], vec![]));
        ScriptedResolver {
            table: Mutex::new(table),
        }
    }

    /// An empty resolver, answers populated per-name with `set`.
    pub fn new() -> Self {
        ScriptedResolver {
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the records returned for `name`.
    pub fn set(&self, name: &str, a: Vec<Ipv4Addr>, aaaa: Vec<Ipv6Addr>) {
        self.table.lock().unwrap().insert(name.to_string(), (a, aaaa));
    }
}

impl Default for ScriptedResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsResolver for ScriptedResolver {
    async fn lookup_a(&self, name: &str, _timeout: Duration, _retransmits: u32) -> Result<Vec<Ipv4Addr>, ResolveError> {
        let table = self.table.lock().unwrap();
        if let Some((a, _)) = table.get(name) {
            return Ok(a.clone());
        }
        if let Some((a, _)) = table.get("") {
            return Ok(a.clone());
        }
        Ok(vec![])
    }

    async fn lookup_aaaa(&self, name: &str, _timeout: Duration, _retransmits: u32) -> Result<Vec<Ipv6Addr>, ResolveError> {
        let table = self.table.lock().unwrap();
        if let Some((_, aaaa)) = table.get(name) {
            return Ok(aaaa.clone());
        }
        Ok(vec![])
    }
}

/// A resolver whose every lookup fails, used to exercise the "silently
/// absorbed, retried on next tick" error policy.
pub struct FailingResolver;

#[async_trait]
impl DnsResolver for FailingResolver {
    async fn lookup_a(&self, _name: &str, _timeout: Duration, _retransmits: u32) -> Result<Vec<Ipv4Addr>, ResolveError> {
        Err(ResolveError::Lookup("mock failure".into()))
    }

    async fn lookup_aaaa(&self, _name: &str, _timeout: Duration, _retransmits: u32) -> Result<Vec<Ipv6Addr>, ResolveError> {
        Err(ResolveError::Lookup("mock failure".into()))
    }
}

/// Deterministic RNG driven by a fixed sequence of values, cycling once
/// exhausted. `uniform01` and `uniform_range` draw from the same sequence,
/// scaled appropriately.
pub struct FixedRng {
    values: Vec<f64>,
    cursor: Mutex<usize>,
}

impl FixedRng {
    /// Cycle through `values` (each expected in `[0, 1)`) on every draw.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty());
        FixedRng {
            values,
            cursor: Mutex::new(0),
        }
    }

    /// Always return the same value.
    pub fn constant(v: f64) -> Self {
        Self::new(vec![v])
    }

    fn next(&self) -> f64 {
        let mut cursor = self.cursor.lock().unwrap();
        let v = self.values[*cursor % self.values.len()];
        *cursor += 1;
        v
    }
}

impl UpstreamRng for FixedRng {
    fn uniform01(&self) -> f64 {
        self.next()
    }

    fn uniform_range(&self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        let v = self.next();
        ((v * bound as f64) as u64).min(bound - 1)
    }
}
