//! Time and error-rate limits shared by a [`crate::Ctx`] and copied into each
//! [`crate::UpstreamList`] at creation time, following the serde-with-defaults
//! pattern used for config structs throughout the teacher crate.

use serde::{Deserialize, Serialize};

fn default_revive_time() -> f64 {
    60.0
}
fn default_revive_jitter() -> f64 {
    0.4
}
fn default_error_time() -> f64 {
    10.0
}
fn default_max_errors() -> u32 {
    4
}
fn default_dns_timeout() -> f64 {
    1.0
}
fn default_dns_retransmits() -> u32 {
    2
}
fn default_lazy_resolve_time() -> f64 {
    3600.0
}

/// Snapshot of the timing and error-rate thresholds governing failure
/// detection, revival scheduling, and DNS refresh cadence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Seconds an ejected upstream waits before a revive attempt, before jitter.
    #[serde(default = "default_revive_time")]
    pub revive_time: f64,
    /// Fractional jitter applied symmetrically to `revive_time` and to the
    /// lazy-resolve interval (e.g. `0.4` means ±40%).
    #[serde(default = "default_revive_jitter")]
    pub revive_jitter: f64,
    /// Width, in seconds, of the rolling window used for the error-rate test.
    #[serde(default = "default_error_time")]
    pub error_time: f64,
    /// Maximum errors tolerated within `error_time` before ejection.
    #[serde(default = "default_max_errors")]
    pub max_errors: u32,
    /// Per-query DNS timeout, in seconds.
    #[serde(default = "default_dns_timeout")]
    pub dns_timeout: f64,
    /// Number of retransmits attempted by the DNS collaborator per query.
    #[serde(default = "default_dns_retransmits")]
    pub dns_retransmits: u32,
    /// Interval, in seconds, between lazy re-resolutions of a live hostname
    /// upstream, before jitter.
    #[serde(default = "default_lazy_resolve_time")]
    pub lazy_resolve_time: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            revive_time: default_revive_time(),
            revive_jitter: default_revive_jitter(),
            error_time: default_error_time(),
            max_errors: default_max_errors(),
            dns_timeout: default_dns_timeout(),
            dns_retransmits: default_dns_retransmits(),
            lazy_resolve_time: default_lazy_resolve_time(),
        }
    }
}

/// Partial override of [`Limits`], where `None` means "leave unchanged" —
/// the Rust rendering of the original's NaN-sentinel setter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LimitsOverride {
    /// See [`Limits::revive_time`].
    pub revive_time: Option<f64>,
    /// See [`Limits::revive_jitter`].
    pub revive_jitter: Option<f64>,
    /// See [`Limits::error_time`].
    pub error_time: Option<f64>,
    /// See [`Limits::max_errors`].
    pub max_errors: Option<u32>,
    /// See [`Limits::dns_timeout`].
    pub dns_timeout: Option<f64>,
    /// See [`Limits::dns_retransmits`].
    pub dns_retransmits: Option<u32>,
    /// See [`Limits::lazy_resolve_time`].
    pub lazy_resolve_time: Option<f64>,
}

impl Limits {
    /// Apply a partial override in place, leaving unset fields untouched.
    pub fn apply(&mut self, over: &LimitsOverride) {
        if let Some(v) = over.revive_time {
            self.revive_time = v;
        }
        if let Some(v) = over.revive_jitter {
            self.revive_jitter = v;
        }
        if let Some(v) = over.error_time {
            self.error_time = v;
        }
        if let Some(v) = over.max_errors {
            self.max_errors = v;
        }
        if let Some(v) = over.dns_timeout {
            self.dns_timeout = v;
        }
        if let Some(v) = over.dns_retransmits {
            self.dns_retransmits = v;
        }
        if let Some(v) = over.lazy_resolve_time {
            self.lazy_resolve_time = v;
        }
    }
}

/// Mirrors the fields of a daemon configuration file that this library's
/// [`crate::Ctx::configure`] cares about. Supplied separately from
/// [`Limits`] because a real configuration struct carries many unrelated
/// fields; this one exists purely to document the field-name mapping onto
/// `Limits`, including the corrected `revive_time` wiring (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Maps to [`Limits::error_time`].
    pub upstream_error_time: Option<f64>,
    /// Maps to [`Limits::max_errors`].
    pub upstream_max_errors: Option<u32>,
    /// Maps to [`Limits::revive_time`].
    pub upstream_revive_time: Option<f64>,
    /// Maps to [`Limits::lazy_resolve_time`].
    pub upstream_lazy_resolve_time: Option<f64>,
    /// Maps to [`Limits::dns_retransmits`].
    pub dns_retransmits: Option<u32>,
    /// Maps to [`Limits::dns_timeout`].
    pub dns_timeout: Option<f64>,
}

impl From<&LibraryConfig> for LimitsOverride {
    fn from(cfg: &LibraryConfig) -> Self {
        LimitsOverride {
            revive_time: cfg.upstream_revive_time,
            revive_jitter: None,
            error_time: cfg.upstream_error_time,
            max_errors: cfg.upstream_max_errors,
            dns_timeout: cfg.dns_timeout,
            dns_retransmits: cfg.dns_retransmits,
            lazy_resolve_time: cfg.upstream_lazy_resolve_time,
        }
    }
}
