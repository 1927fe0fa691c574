//! Watcher notification protocol: callbacks invoked on upstream health
//! transitions, in insertion order.

use crate::UserData;
use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    /// Mask selecting which [`WatchEvent`] kinds a callback receives.
    pub struct WatchEvents: u32 {
        /// An upstream (re)joined the alive set.
        const ONLINE = 0b0001;
        /// An upstream was ejected from the alive set.
        const OFFLINE = 0b0010;
        /// A single failure was recorded against an upstream.
        const FAILURE = 0b0100;
        /// A failed upstream recovered (`Ok` called after prior errors).
        const SUCCESS = 0b1000;
        /// All event kinds.
        const ALL = Self::ONLINE.bits | Self::OFFLINE.bits | Self::FAILURE.bits | Self::SUCCESS.bits;
    }
}

/// A single health transition reported to watchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// See [`WatchEvents::ONLINE`].
    Online,
    /// See [`WatchEvents::OFFLINE`].
    Offline,
    /// See [`WatchEvents::FAILURE`].
    Failure,
    /// See [`WatchEvents::SUCCESS`].
    Success,
}

impl WatchEvent {
    pub(crate) fn mask(self) -> WatchEvents {
        match self {
            WatchEvent::Online => WatchEvents::ONLINE,
            WatchEvent::Offline => WatchEvents::OFFLINE,
            WatchEvent::Failure => WatchEvents::FAILURE,
            WatchEvent::Success => WatchEvents::SUCCESS,
        }
    }
}

pub(crate) type WatchCallback = dyn Fn(&str, WatchEvent, u32, Option<&UserData>) + Send + Sync;
pub(crate) type WatchDtor = dyn Fn(Option<&UserData>) + Send + Sync;

/// A registered watcher. Owned exclusively by the list's `watchers` vector;
/// its destructor (if any) is invoked exactly once, explicitly, when the
/// owning list itself is dropped (see `ListState`'s `Drop` impl in `list.rs`)
/// — never by an incidental clone, which is why this type does not
/// implement `Clone` or `Drop` itself. Firing a callback clones only the
/// pieces needed to invoke it ([`FiringHandle`]), after releasing the lock.
pub(crate) struct WatcherEntry {
    pub(crate) mask: WatchEvents,
    pub(crate) func: Arc<WatchCallback>,
    pub(crate) data: Option<UserData>,
    pub(crate) dtor: Option<Arc<WatchDtor>>,
}

/// Lightweight clone of a [`WatcherEntry`] used to invoke a callback after
/// releasing the list's lock, without touching the entry's destructor.
pub(crate) struct FiringHandle {
    pub(crate) func: Arc<WatchCallback>,
    pub(crate) data: Option<UserData>,
}

impl WatcherEntry {
    pub(crate) fn firing_handle(&self) -> FiringHandle {
        FiringHandle {
            func: self.func.clone(),
            data: self.data.clone(),
        }
    }
}
