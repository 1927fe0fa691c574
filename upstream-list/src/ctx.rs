//! Process-wide context owning the DNS resolver and a registry of every
//! upstream created against it, used to arm initial lazy-resolve timers
//! once a resolver becomes available and to implement a global `Reresolve`.
//!
//! Teardown is ordinary `Arc`/`Drop` refcounting rather than a manual
//! "unref": dropping every clone of a `Ctx` (and every list built from it)
//! drops the shared state, substituting for the original's manual reference
//! counting (see `SPEC_FULL.md` §4.7 and `DESIGN.md`).

use crate::limits::{LibraryConfig, Limits, LimitsOverride};
use crate::list::{ListState, UpstreamList};
use crate::resolver::DnsResolver;
use crate::upstream::UpstreamId;
use std::sync::{Arc, Mutex, Weak};

struct CtxState {
    limits: Limits,
    configured: bool,
    resolver: Option<Arc<dyn DnsResolver>>,
    registry: Vec<(Weak<Mutex<ListState>>, usize)>,
}

/// Shared, cloneable handle to the process-wide upstream context.
#[derive(Clone)]
pub struct Ctx(pub(crate) Arc<Mutex<CtxState>>);

impl Ctx {
    /// Create a context with default limits, no resolver attached yet, and
    /// an empty registry.
    pub fn init() -> Self {
        Ctx(Arc::new(Mutex::new(CtxState {
            limits: Limits::default(),
            configured: false,
            resolver: None,
            registry: Vec::new(),
        })))
    }

    /// Snapshot of the context's current limits, copied into every list
    /// created against this context.
    pub fn current_limits(&self) -> Limits {
        self.0.lock().unwrap().limits
    }

    pub(crate) fn is_configured(&self) -> bool {
        self.0.lock().unwrap().configured
    }

    pub(crate) fn resolver(&self) -> Option<Arc<dyn DnsResolver>> {
        self.0.lock().unwrap().resolver.clone()
    }

    pub(crate) fn register(&self, list: &UpstreamList, id: UpstreamId) {
        let mut st = self.0.lock().unwrap();
        st.registry.push((Arc::downgrade(&list.inner), id.0));
    }

    /// Attach a DNS resolver and apply configuration overrides, then schedule
    /// an initial lazy-resolve timer for every already-registered upstream
    /// that is resolvable and has no pending timer.
    ///
    /// `cfg.upstream_revive_time` is wired to `Limits::revive_time`; the
    /// original C implementation swaps this with `upstream_max_errors` (see
    /// `DESIGN.md`, Open Question 5) — that miswiring is not reproduced here.
    pub fn configure(&self, cfg: &LibraryConfig, resolver: Arc<dyn DnsResolver>) {
        let registry;
        {
            let mut st = self.0.lock().unwrap();
            st.limits.apply(&LimitsOverride::from(cfg));
            st.resolver = Some(resolver);
            st.configured = true;
            registry = st.registry.clone();
        }
        for (weak_list, idx) in registry {
            if let Some(inner) = weak_list.upgrade() {
                let list = UpstreamList { inner };
                let id = UpstreamId(idx);
                let (no_resolve, has_timer) = list.timer_status(id);
                if !no_resolve && !has_timer {
                    list.schedule_lazy_resolve(id);
                }
            }
        }
    }

    /// Trigger immediate re-resolution of every registered upstream across
    /// every list created against this context, independent of each
    /// upstream's lazy-resolve schedule.
    pub fn reresolve(&self) {
        let registry = self.0.lock().unwrap().registry.clone();
        for (weak_list, idx) in registry {
            if let Some(inner) = weak_list.upgrade() {
                let list = UpstreamList { inner };
                list.trigger_resolve(UpstreamId(idx));
            }
        }
    }
}
