// Copyright 2020 LEXUGE
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Weighted upstream selection, failure tracking, and DNS-backed health
//! management for pools of remote service endpoints.
//!
//! A [`Ctx`] owns the shared DNS resolver and default [`Limits`]. One or
//! more [`UpstreamList`]s are built against it, each a rotation domain:
//! callers add upstreams by parsing a spec string (`parse_line`) or one at a
//! time (`add_upstream`), then repeatedly call `get`/`get_forced` to obtain
//! a [`Selected`] upstream and address, reporting back with `ok`/`fail`.
//! Failure tracking, ejection, scheduled revival, and periodic DNS
//! re-resolution run independently in the background against the ambient
//! Tokio runtime.
#![deny(unsafe_code)]

mod addr;
mod ctx;
pub mod error;
mod hash;
mod limits;
mod list;
#[doc(hidden)]
pub mod mock;
mod parse;
mod rng;
mod resolver;
mod rotation;
mod upstream;
mod watcher;

use std::any::Any;
use std::sync::Arc;

pub use addr::EndpointAddr;
pub use ctx::Ctx;
pub use hash::HASH_SEED;
pub use limits::{LibraryConfig, Limits, LimitsOverride};
pub use list::{Selected, UpstreamList};
pub use parse::ParseMode;
pub use resolver::{DnsResolver, TrustDnsResolver};
pub use rng::{SystemRng, UpstreamRng};
pub use rotation::Rotation;
pub use upstream::{UpstreamFlags, UpstreamId};
pub use watcher::{WatchEvent, WatchEvents};

/// Opaque per-upstream or per-call user data, the Rust stand-in for the
/// original's `void *` userdata parameters.
pub type UserData = Arc<dyn Any + Send + Sync>;
