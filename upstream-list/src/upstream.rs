//! A single named endpoint inside an [`crate::UpstreamList`]'s arena.

use crate::addr::AddrSet;
use crate::UserData;
use bitflags::bitflags;
use tokio::task::JoinHandle;
use tokio::time::Instant;

bitflags! {
    /// Per-upstream behavioral flags.
    pub struct UpstreamFlags: u32 {
        /// The upstream's address(es) are fixed; never scheduled for DNS
        /// resolution (numeric literal or UNIX socket path).
        const NO_RESOLVE = 0b0001;
    }
}

/// Stable handle into an [`crate::UpstreamList`]'s arena. Valid for the
/// lifetime of the owning list; never reused, even after ejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpstreamId(pub(crate) usize);

/// Tracks which kind of timer, if any, is currently scheduled for an
/// upstream. Invariant 4/5 from `SPEC_FULL.md`: never both at once, and an
/// alive upstream never carries a revive timer.
pub(crate) enum TimerState {
    Stopped,
    LazyResolve(JoinHandle<()>),
    Revive(JoinHandle<()>),
}

impl TimerState {
    pub(crate) fn stop(&mut self) {
        match std::mem::replace(self, TimerState::Stopped) {
            TimerState::LazyResolve(h) => h.abort(),
            TimerState::Revive(h) => h.abort(),
            TimerState::Stopped => {}
        }
    }
}

pub(crate) struct Upstream {
    pub(crate) name: String,
    pub(crate) weight: u32,
    pub(crate) cur_weight: u32,
    pub(crate) errors: u32,
    pub(crate) last_fail: Option<Instant>,
    pub(crate) checked: u32,
    pub(crate) dns_requests: u32,
    /// Port newly resolved addresses are given during reconciliation
    /// (irrelevant for UNIX-socket upstreams). Fixed at construction time
    /// rather than read back off the current address set, so that an
    /// upstream's very first resolution — when `addrs` starts empty — still
    /// knows what port to attach.
    pub(crate) port: u16,
    pub(crate) addrs: AddrSet,
    pub(crate) pending_addrs: Vec<crate::addr::EndpointAddr>,
    pub(crate) active_idx: Option<usize>,
    pub(crate) flags: UpstreamFlags,
    pub(crate) uid: String,
    pub(crate) timer: TimerState,
    pub(crate) data: Option<UserData>,
}

impl Upstream {
    pub(crate) fn new(name: String, weight: u32, port: u16, addrs: AddrSet, flags: UpstreamFlags) -> Self {
        let uid = crate::hash::derive_uid(&name);
        Upstream {
            name,
            weight,
            cur_weight: weight,
            errors: 0,
            last_fail: None,
            checked: 0,
            dns_requests: 0,
            port,
            addrs,
            pending_addrs: Vec::new(),
            active_idx: None,
            flags,
            uid,
            timer: TimerState::Stopped,
            data: None,
        }
    }
}
