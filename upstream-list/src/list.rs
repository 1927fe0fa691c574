//! The rotation domain: the arena of upstreams, the alive index, selection
//! algorithms, the failure/revival state machine, and DNS reconciliation.
//!
//! The arena (`Vec<Upstream>` plus an `alive: Vec<usize>` index vector) is
//! the Rust rendering of the original's cyclic refcounted `GPtrArray`
//! design, adopted per the explicit invitation in `SPEC_FULL.md` §9 to use
//! "an arena with weak indices" instead.

use crate::addr::{AddrSet, EndpointAddr};
use crate::ctx::Ctx;
use crate::error::ParseError;
use crate::hash::{consistent_hash_jump, seeded_hash, HASH_SEED};
use crate::limits::{Limits, LimitsOverride};
use crate::parse::{self, ParseMode};
use crate::rng::{jitter, SystemRng, UpstreamRng};
use crate::rotation::Rotation;
use crate::upstream::{TimerState, Upstream, UpstreamFlags, UpstreamId};
use crate::watcher::{WatchEvent, WatchEvents, WatcherEntry};
use crate::UserData;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub(crate) struct ListState {
    pub(crate) ups: Vec<Upstream>,
    pub(crate) alive: Vec<usize>,
    pub(crate) limits: Limits,
    pub(crate) rot_alg: Rotation,
    pub(crate) cur_elt: usize,
    pub(crate) watchers: Vec<WatcherEntry>,
    pub(crate) flags: UpstreamFlags,
    pub(crate) ctx: Option<Ctx>,
    pub(crate) rng: Arc<dyn UpstreamRng>,
}

impl Drop for ListState {
    fn drop(&mut self) {
        for w in self.watchers.drain(..) {
            if let Some(dtor) = &w.dtor {
                dtor(w.data.as_ref());
            }
        }
    }
}

/// A rotation domain: the set of upstreams a caller selects among via
/// [`UpstreamList::get`]/[`UpstreamList::get_forced`].
#[derive(Clone)]
pub struct UpstreamList {
    pub(crate) inner: Arc<Mutex<ListState>>,
}

/// An upstream picked by `Get`/`GetForced`, bundled with the address it
/// should be dialed at. Reports outcomes back via `ok`/`fail`.
#[derive(Clone)]
pub struct Selected {
    list: UpstreamList,
    id: UpstreamId,
    /// The address to dial.
    pub addr: EndpointAddr,
}

impl Selected {
    /// The id of the upstream picked, stable for the lifetime of the list.
    pub fn id(&self) -> UpstreamId {
        self.id
    }

    /// Report a successful use of this upstream, clearing its error state.
    pub fn ok(&self) {
        self.list.ok(self.id);
    }

    /// Report a failed use. `addr_failure` additionally penalizes the
    /// specific address that was dialed, affecting future `addr_next` calls.
    pub fn fail(&self, addr_failure: bool) {
        self.list.fail(self.id, addr_failure);
    }

    /// Advance to the next address within this upstream, skipping over
    /// addresses with strictly more accumulated errors.
    pub fn addr_next(&self) -> EndpointAddr {
        self.list.addr_next(self.id)
    }

    /// The address currently pointed at, without advancing.
    pub fn addr_cur(&self) -> EndpointAddr {
        self.list.addr_cur(self.id)
    }

    /// The upstream's name as given at `add_upstream` time.
    pub fn name(&self) -> String {
        self.list.name(self.id)
    }

    /// Short stable diagnostic identifier for this upstream.
    pub fn uid(&self) -> String {
        self.list.uid(self.id)
    }

    /// Override this upstream's static weight.
    pub fn set_weight(&self, weight: u32) {
        self.list.set_weight(self.id, weight);
    }

    /// Opaque user data previously attached via `set_data`.
    pub fn data(&self) -> Option<UserData> {
        self.list.data(self.id)
    }

    /// Attach opaque user data, returning whatever was previously attached.
    pub fn set_data(&self, data: UserData) -> Option<UserData> {
        self.list.set_data(self.id, data)
    }
}

impl UpstreamList {
    /// Create an empty list. `ctx`, if supplied, is snapshotted for its
    /// limits and retains every subsequently added upstream in its registry,
    /// enabling `Ctx::reresolve` and deferred lazy-resolve arming once the
    /// context is configured. Failure tracking (`fail`) is a no-op on an
    /// upstream whose list was created without a context, matching the
    /// original's `up->ctx` guard.
    pub fn new(ctx: Option<&Ctx>) -> Self {
        Self::with_rng(ctx, Arc::new(SystemRng))
    }

    /// As [`UpstreamList::new`], but with an injectable randomness source —
    /// used by tests needing deterministic jitter/random-pick behavior.
    pub fn with_rng(ctx: Option<&Ctx>, rng: Arc<dyn UpstreamRng>) -> Self {
        let limits = ctx.map(|c| c.current_limits()).unwrap_or_default();
        UpstreamList {
            inner: Arc::new(Mutex::new(ListState {
                ups: Vec::new(),
                alive: Vec::new(),
                limits,
                rot_alg: Rotation::Undef,
                cur_elt: 0,
                watchers: Vec::new(),
                flags: UpstreamFlags::empty(),
                ctx: ctx.cloned(),
                rng,
            })),
        }
    }

    /// Number of upstreams ever added, alive or ejected.
    pub fn count(&self) -> usize {
        self.inner.lock().unwrap().ups.len()
    }

    /// Number of currently alive upstreams.
    pub fn alive_count(&self) -> usize {
        self.inner.lock().unwrap().alive.len()
    }

    /// Set the default rotation flags applied to subsequently added
    /// upstreams.
    pub fn set_flags(&self, flags: UpstreamFlags) {
        self.inner.lock().unwrap().flags = flags;
    }

    /// Set this list's default rotation algorithm.
    pub fn set_rotation(&self, rotation: Rotation) {
        self.inner.lock().unwrap().rot_alg = rotation;
    }

    /// Override a subset of this list's limits; unset fields are left
    /// untouched.
    pub fn set_limits(&self, over: LimitsOverride) {
        self.inner.lock().unwrap().limits.apply(&over);
    }

    /// Parse and add a single upstream specification token
    /// (`host[:port][:weight]`, bracketed IPv6, or `/path`).
    ///
    /// Weight defaults to 0, except: if this is the very first upstream
    /// added to a list whose rotation is `MasterSlave` and no weight was
    /// given, the weight is promoted to 1 so the master is preferred.
    pub fn add_upstream(
        &self,
        spec: &str,
        default_port: u16,
        mode: ParseMode,
        data: Option<UserData>,
    ) -> Result<UpstreamId, ParseError> {
        if spec.is_empty() {
            return Err(ParseError::Empty);
        }
        let parsed = parse::parse_token(spec, default_port, mode)?;
        let id = {
            let mut state = self.inner.lock().unwrap();
            let is_first = state.ups.is_empty();
            let mut weight = parsed.weight;
            if weight == 0 && state.rot_alg == Rotation::MasterSlave && is_first {
                weight = 1;
            }
            let flags = state.flags | parse::flags_for(parsed.no_resolve);
            let mut up = Upstream::new(parsed.name, weight, parsed.port, AddrSet::from_addrs(parsed.addrs), flags);
            up.data = data;
            let idx = state.ups.len();
            state.ups.push(up);
            idx
        };
        let id = UpstreamId(id);
        if let Some(ctx) = self.inner.lock().unwrap().ctx.clone() {
            ctx.register(self, id);
        }
        self.set_active(id);
        Ok(id)
    }

    /// Parse an optional leading rotation prefix followed by a
    /// separator-delimited token stream, per `SPEC_FULL.md` §6's grammar.
    /// Returns `true` iff at least one token was successfully added.
    pub fn parse_line(&self, s: &str, default_port: u16, data: Option<UserData>) -> bool {
        let (rotation, rest) = parse::split_rotation_prefix(s);
        if let Some(rot) = rotation {
            self.set_rotation(rot);
        }
        let mut any = false;
        for token in parse::split_tokens(rest) {
            if self
                .add_upstream(token, default_port, ParseMode::Default, data.clone())
                .is_ok()
            {
                any = true;
            }
        }
        any
    }

    /// Accept a structured configuration value (this crate's stand-in for
    /// the original's UCL object, per `SPEC_FULL.md` §5) whose array
    /// elements are upstream spec strings.
    pub fn from_structured(&self, value: &serde_json::Value, default_port: u16, data: Option<UserData>) -> bool {
        let mut any = false;
        if let Some(arr) = value.as_array() {
            for item in arr {
                if let Some(s) = item.as_str() {
                    if self.parse_line(s, default_port, data.clone()) {
                        any = true;
                    }
                }
            }
        }
        any
    }

    /// Register a watcher callback invoked for every event in `mask`.
    /// `dtor`, if given, runs exactly once, when this list (its last clone)
    /// is dropped.
    pub fn add_watch_callback<F, D>(&self, mask: WatchEvents, func: F, dtor: Option<D>, data: Option<UserData>)
    where
        F: Fn(&str, WatchEvent, u32, Option<&UserData>) + Send + Sync + 'static,
        D: Fn(Option<&UserData>) + Send + Sync + 'static,
    {
        let mut state = self.inner.lock().unwrap();
        state.watchers.push(WatcherEntry {
            mask,
            func: Arc::new(func),
            data,
            dtor: dtor.map(|d| Arc::new(d) as _),
        });
    }

    /// Iterate over every upstream ever added, in insertion order, calling
    /// `f(name, position)`.
    pub fn foreach<F: FnMut(&str, usize)>(&self, mut f: F) {
        let state = self.inner.lock().unwrap();
        for (i, up) in state.ups.iter().enumerate() {
            f(&up.name, i);
        }
    }

    /// Select an upstream using `list.rot_alg` if set, else `default_rotation`.
    pub fn get(&self, default_rotation: Rotation, key: Option<&[u8]>) -> Option<Selected> {
        self.get_common(default_rotation, key, false)
    }

    /// Select an upstream using `forced_rotation` if not `Undef`, else
    /// `list.rot_alg`.
    pub fn get_forced(&self, forced_rotation: Rotation, key: Option<&[u8]>) -> Option<Selected> {
        self.get_common(forced_rotation, key, true)
    }

    fn get_common(&self, default_type: Rotation, key: Option<&[u8]>, forced: bool) -> Option<Selected> {
        if self.inner.lock().unwrap().alive.is_empty() {
            self.restore_all();
        }

        let mut state = self.inner.lock().unwrap();
        if state.alive.is_empty() {
            return None;
        }

        let mut rtype = if !forced {
            if state.rot_alg != Rotation::Undef {
                state.rot_alg
            } else {
                default_type
            }
        } else if default_type != Rotation::Undef {
            default_type
        } else {
            state.rot_alg
        };
        if rtype == Rotation::Hashed && key.map_or(true, |k| k.is_empty()) {
            rtype = Rotation::Random;
        }

        let picked = match rtype {
            Rotation::Undef | Rotation::Random => pick_random(&mut state),
            Rotation::RoundRobin => pick_weighted(&mut state, true),
            Rotation::MasterSlave => pick_weighted(&mut state, false),
            Rotation::Hashed => pick_hashed(&state, key.unwrap()),
            Rotation::Sequential => pick_sequential(&mut state),
        };

        let uid = picked?;
        state.ups[uid].checked = state.ups[uid].checked.saturating_add(1);
        let addr = state.ups[uid].addrs.cur().clone();
        drop(state);
        Some(Selected {
            list: self.clone(),
            id: UpstreamId(uid),
            addr,
        })
    }

    fn addr_next(&self, id: UpstreamId) -> EndpointAddr {
        self.inner.lock().unwrap().ups[id.0].addrs.next().clone()
    }

    fn addr_cur(&self, id: UpstreamId) -> EndpointAddr {
        self.inner.lock().unwrap().ups[id.0].addrs.cur().clone()
    }

    fn name(&self, id: UpstreamId) -> String {
        self.inner.lock().unwrap().ups[id.0].name.clone()
    }

    fn uid(&self, id: UpstreamId) -> String {
        self.inner.lock().unwrap().ups[id.0].uid.clone()
    }

    fn set_weight(&self, id: UpstreamId, weight: u32) {
        self.inner.lock().unwrap().ups[id.0].weight = weight;
    }

    fn data(&self, id: UpstreamId) -> Option<UserData> {
        self.inner.lock().unwrap().ups[id.0].data.clone()
    }

    fn set_data(&self, id: UpstreamId, data: UserData) -> Option<UserData> {
        std::mem::replace(&mut self.inner.lock().unwrap().ups[id.0].data, Some(data))
    }

    /// Report a successful use, clearing error state if any was present.
    fn ok(&self, id: UpstreamId) {
        let mut fire = false;
        {
            let mut state = self.inner.lock().unwrap();
            let up = &mut state.ups[id.0];
            if up.errors > 0 && up.active_idx.is_some() {
                up.errors = 0;
                let cur = up.addrs.cur;
                up.addrs.entries[cur].errors = 0;
                fire = true;
            }
        }
        if fire {
            self.fire_watchers(id, WatchEvent::Success, 0);
        }
    }

    /// Record a failure. A no-op unless this list was created with a
    /// context and the upstream is currently alive, matching the original's
    /// `up->ctx && up->active_idx != -1` guard: without a context, timers
    /// (and therefore revival) can never run, so tracking errors would only
    /// produce a permanently-ejected upstream.
    fn fail(&self, id: UpstreamId, addr_failure: bool) {
        let mut fire_failure: Option<u32> = None;
        let mut eject_with: Option<u32> = None;
        let mut reresolve_single = false;

        {
            let mut state = self.inner.lock().unwrap();
            let has_ctx = state.ctx.is_some();
            let alive = state.ups[id.0].active_idx.is_some();
            if has_ctx && alive {
                let now = Instant::now();
                let total = state.ups.len();
                let limits = state.limits;
                let up = &mut state.ups[id.0];

                if up.errors == 0 {
                    up.last_fail = Some(now);
                    up.errors = 1;
                    fire_failure = Some(1);
                } else {
                    let last = up.last_fail.unwrap_or(now);
                    if now >= last {
                        up.errors += 1;
                        fire_failure = Some(up.errors);
                        let elapsed = (now - last).as_secs_f64();
                        if elapsed > 0.0 {
                            let rate = up.errors as f64 / elapsed;
                            let max_rate = limits.max_errors as f64 / limits.error_time;
                            if rate > max_rate {
                                if total > 1 {
                                    eject_with = Some(up.errors);
                                    up.errors = 0;
                                } else if elapsed > limits.revive_time {
                                    up.errors = 0;
                                    reresolve_single = true;
                                }
                            }
                        }
                    }
                }

                if addr_failure {
                    let cur = up.addrs.cur;
                    up.addrs.entries[cur].errors += 1;
                }
            }
        }

        if let Some(count) = fire_failure {
            self.fire_watchers(id, WatchEvent::Failure, count);
        }
        if let Some(errors_at_ejection) = eject_with {
            self.eject(id, errors_at_ejection);
        }
        if reresolve_single {
            self.trigger_resolve(id);
        }
    }

    /// Remove `id` from `alive`, cancel any pending timer, fire `OFFLINE`
    /// with the error count observed immediately before the reset to zero
    /// (see `DESIGN.md`, Open Question 3), trigger re-resolution, and
    /// schedule a jittered revive timer.
    fn eject(&self, id: UpstreamId, errors_at_ejection: u32) {
        let revive_delay = {
            let mut state = self.inner.lock().unwrap();
            if let Some(pos) = state.ups[id.0].active_idx {
                state.alive.remove(pos);
                for (i, uid) in state.alive.clone().into_iter().enumerate() {
                    state.ups[uid].active_idx = Some(i);
                }
            }
            state.ups[id.0].active_idx = None;
            state.ups[id.0].timer.stop();
            let spread = state.limits.revive_jitter;
            let j = jitter(state.rng.as_ref(), spread);
            state.limits.revive_time * (1.0 + j)
        };

        self.trigger_resolve(id);
        self.fire_watchers(id, WatchEvent::Offline, errors_at_ejection);

        let list = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs_f64(revive_delay.max(0.0))).await;
            list.revive(id);
        });
        self.inner.lock().unwrap().ups[id.0].timer = TimerState::Revive(handle);
    }

    /// Individual revive: re-insert into `alive` via the same path used at
    /// insertion time, so a lazy-resolve timer is re-armed, then fire
    /// `ONLINE`.
    fn revive(&self, id: UpstreamId) {
        {
            let mut state = self.inner.lock().unwrap();
            state.ups[id.0].timer.stop();
        }
        self.set_active(id);
        let errors = self.inner.lock().unwrap().ups[id.0].errors;
        self.fire_watchers(id, WatchEvent::Online, errors);
    }

    /// Mass recovery path used when `alive` becomes entirely empty: every
    /// upstream is reinserted, pending timers cancelled, `ONLINE` fired for
    /// each — but unlike an individual revive, no new lazy-resolve timer is
    /// armed (matching the original's distinct `restore_cb` path).
    fn restore_all(&self) {
        let ids: Vec<usize> = {
            let mut state = self.inner.lock().unwrap();
            let ids: Vec<usize> = (0..state.ups.len()).collect();
            for &id in &ids {
                state.ups[id].timer.stop();
            }
            state.alive = ids.clone();
            for (i, uid) in state.alive.clone().into_iter().enumerate() {
                state.ups[uid].active_idx = Some(i);
            }
            ids
        };
        for idx in ids {
            let id = UpstreamId(idx);
            let errors = self.inner.lock().unwrap().ups[idx].errors;
            self.fire_watchers(id, WatchEvent::Online, errors);
        }
    }

    /// Insert into `alive` and arm a lazy-resolve timer if the owning
    /// context is configured and the upstream is resolvable. Used both by
    /// `add_upstream` and by an individual `revive`.
    fn set_active(&self, id: UpstreamId) {
        {
            let mut state = self.inner.lock().unwrap();
            state.alive.push(id.0);
            let pos = state.alive.len() - 1;
            state.ups[id.0].active_idx = Some(pos);
        }
        self.schedule_lazy_resolve(id);
    }

    pub(crate) fn timer_status(&self, id: UpstreamId) -> (bool, bool) {
        let state = self.inner.lock().unwrap();
        let no_resolve = state.ups[id.0].flags.contains(UpstreamFlags::NO_RESOLVE);
        let has_timer = !matches!(state.ups[id.0].timer, TimerState::Stopped);
        (no_resolve, has_timer)
    }

    pub(crate) fn schedule_lazy_resolve(&self, id: UpstreamId) {
        let delay = {
            let mut state = self.inner.lock().unwrap();
            let configured = state.ctx.as_ref().map_or(false, |c| c.is_configured());
            let no_resolve = state.ups[id.0].flags.contains(UpstreamFlags::NO_RESOLVE);
            if !configured || no_resolve {
                return;
            }
            // Lazy-resolve jitter is a fixed +/-10%, independent of the
            // revive jitter fraction (which governs only the revive timer).
            let j = jitter(state.rng.as_ref(), 0.1);
            let delay = state.limits.lazy_resolve_time * (1.0 + j);
            state.ups[id.0].timer.stop();
            delay
        };
        let list = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs_f64(delay.max(0.0))).await;
            list.on_lazy_resolve_fire(id);
        });
        self.inner.lock().unwrap().ups[id.0].timer = TimerState::LazyResolve(handle);
    }

    fn on_lazy_resolve_fire(&self, id: UpstreamId) {
        {
            let mut state = self.inner.lock().unwrap();
            state.ups[id.0].timer.stop();
        }
        self.trigger_resolve(id);
        self.schedule_lazy_resolve(id);
    }

    /// Kick off A/AAAA lookups for `id` if eligible (resolver present and
    /// configured, not already in flight, resolvable name). Used by the
    /// lazy timer, by ejection, and by `Ctx::reresolve`.
    pub(crate) fn trigger_resolve(&self, id: UpstreamId) {
        let (resolver, name, timeout, retransmits, eligible) = {
            let mut state = self.inner.lock().unwrap();
            let configured = state.ctx.as_ref().map_or(false, |c| c.is_configured());
            let resolver = state.ctx.as_ref().and_then(|c| c.resolver());
            let limits = state.limits;
            let up = &mut state.ups[id.0];
            let eligible =
                resolver.is_some() && configured && up.dns_requests == 0 && !up.flags.contains(UpstreamFlags::NO_RESOLVE);
            if eligible {
                up.dns_requests = 2;
            }
            (resolver, up.name.clone(), limits.dns_timeout, limits.dns_retransmits, eligible)
        };
        if !eligible {
            return;
        }
        let resolver = resolver.unwrap();
        let timeout = Duration::from_secs_f64(timeout);

        let list_a = self.clone();
        let resolver_a = resolver.clone();
        let name_a = name.clone();
        tokio::spawn(async move {
            let res = resolver_a.lookup_a(&name_a, timeout, retransmits).await;
            let addrs = res
                .map(|v| v.into_iter().map(|ip| EndpointAddr::from_ip(ip.into(), 0)).collect())
                .unwrap_or_default();
            list_a.on_dns_reply(id, addrs);
        });

        let list_b = self.clone();
        tokio::spawn(async move {
            let res = resolver.lookup_aaaa(&name, timeout, retransmits).await;
            let addrs = res
                .map(|v| v.into_iter().map(|ip| EndpointAddr::from_ip(ip.into(), 0)).collect())
                .unwrap_or_default();
            list_b.on_dns_reply(id, addrs);
        });
    }

    fn on_dns_reply(&self, id: UpstreamId, addrs: Vec<EndpointAddr>) {
        let should_reconcile = {
            let mut state = self.inner.lock().unwrap();
            let up = &mut state.ups[id.0];
            up.pending_addrs.extend(addrs);
            up.dns_requests = up.dns_requests.saturating_sub(1);
            up.dns_requests == 0
        };
        if should_reconcile {
            self.reconcile(id);
        }
    }

    /// Address-set reconciliation: preserve the prior port, roll a 10%
    /// chance to reset carried-over error counts, match staged addresses
    /// against current ones ignoring port, replace the set, reset the
    /// cursor, and re-sort by family preference. Runs whenever the staged
    /// list is non-empty — including an upstream's very first resolution,
    /// see `DESIGN.md` Open Question 4.
    fn reconcile(&self, id: UpstreamId) {
        let mut state = self.inner.lock().unwrap();
        let reset_errors = state.rng.uniform01() > 0.9;
        let up = &mut state.ups[id.0];
        if up.pending_addrs.is_empty() {
            return;
        }
        let port = up.port;
        let mut new_entries = Vec::with_capacity(up.pending_addrs.len());
        for mut staged in up.pending_addrs.drain(..) {
            staged.set_port(port);
            let existing = up.addrs.entries.iter().find(|e| e.addr.eq_ignore_port(&staged));
            let errors = match existing {
                Some(e) if !reset_errors => e.errors,
                _ => 0,
            };
            new_entries.push(crate::addr::AddrElt { addr: staged, errors });
        }
        up.addrs.entries = new_entries;
        up.addrs.cur = 0;
        up.addrs.sort();
    }

    fn fire_watchers(&self, id: UpstreamId, event: WatchEvent, count: u32) {
        let (name, handles) = {
            let state = self.inner.lock().unwrap();
            let name = state.ups[id.0].name.clone();
            let handles: Vec<_> = state
                .watchers
                .iter()
                .filter(|w| w.mask.contains(event.mask()))
                .map(|w| w.firing_handle())
                .collect();
            (name, handles)
        };
        for h in handles {
            (h.func)(&name, event, count, h.data.as_ref());
        }
    }
}

fn pick_random(state: &mut ListState) -> Option<usize> {
    if state.alive.is_empty() {
        return None;
    }
    let bound = (state.alive.len() - 1) as u64;
    let idx = state.rng.uniform_range(bound) as usize;
    Some(state.alive[idx])
}

/// Weighted round-robin/master-slave selection: pick the alive upstream
/// with the highest relevant weight; if every weight is zero, fall back to
/// minimizing `checked * (errors + 1)`, tracking the running minimum as the
/// raw `checked` value rather than the product (DESIGN.md Open Question 2).
fn pick_weighted(state: &mut ListState, use_cur_weight: bool) -> Option<usize> {
    if state.alive.is_empty() {
        return None;
    }
    let mut max_weight = 0u32;
    let mut selected: Option<usize> = None;
    let mut min_checked = u32::MAX;
    let mut min_checked_sel: Option<usize> = None;

    for &uid in &state.alive {
        let up = &state.ups[uid];
        let w = if use_cur_weight { up.cur_weight } else { up.weight };
        if w > max_weight {
            max_weight = w;
            selected = Some(uid);
        }
        let product = up.checked as u64 * (up.errors as u64 + 1);
        if product < min_checked as u64 {
            min_checked_sel = Some(uid);
            min_checked = up.checked;
        }
    }

    if max_weight == 0 {
        if min_checked > u32::MAX / 2 {
            for &uid in &state.alive {
                state.ups[uid].checked = 0;
            }
        }
        selected = min_checked_sel;
    }

    if use_cur_weight {
        if let Some(uid) = selected {
            if state.ups[uid].cur_weight > 0 {
                state.ups[uid].cur_weight -= 1;
            } else {
                state.ups[uid].cur_weight = state.ups[uid].weight;
            }
        }
    }

    selected
}

fn pick_hashed(state: &ListState, key: &[u8]) -> Option<usize> {
    if state.alive.is_empty() {
        return None;
    }
    let hashed = seeded_hash(key, HASH_SEED);
    let bucket = consistent_hash_jump(hashed, state.alive.len() as u32);
    Some(state.alive[bucket as usize])
}

fn pick_sequential(state: &mut ListState) -> Option<usize> {
    if state.cur_elt >= state.alive.len() {
        state.cur_elt = 0;
        return None;
    }
    let uid = state.alive[state.cur_elt];
    state.cur_elt += 1;
    Some(uid)
}
