//! Rotation algorithms selectable per list or per `Get` call.

use std::fmt;
use std::str::FromStr;

/// Selection algorithm used by `Get`/`GetForced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// No explicit preference; defer to the other side of the `Get`/list
    /// pairing, or to `Random` as the ultimate fallback.
    Undef,
    /// Uniformly pick among alive upstreams.
    Random,
    /// Weighted round-robin prioritizing the highest static weight
    /// (first-listed upstream, by convention, when only one has weight).
    MasterSlave,
    /// Weighted round-robin cycling `cur_weight` down to zero before refill.
    RoundRobin,
    /// Consistent-hash selection keyed by caller-supplied bytes.
    Hashed,
    /// Strict in-order iteration over the alive set, resetting at the end.
    Sequential,
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rotation::Undef => "undef",
            Rotation::Random => "random",
            Rotation::MasterSlave => "master-slave",
            Rotation::RoundRobin => "round-robin",
            Rotation::Hashed => "hash",
            Rotation::Sequential => "sequential",
        };
        f.write_str(s)
    }
}

impl FromStr for Rotation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Rotation::Random),
            "master-slave" | "masterslave" => Ok(Rotation::MasterSlave),
            "round-robin" | "roundrobin" => Ok(Rotation::RoundRobin),
            "hash" | "hashed" => Ok(Rotation::Hashed),
            "sequential" => Ok(Rotation::Sequential),
            _ => Err(()),
        }
    }
}

/// Rotation prefixes recognized at the start of a `ParseLine` spec string,
/// longest-match order doesn't matter since each ends in `:` and none is a
/// prefix of another.
pub(crate) const ROTATION_PREFIXES: &[(&str, Rotation)] = &[
    ("random:", Rotation::Random),
    ("master-slave:", Rotation::MasterSlave),
    ("round-robin:", Rotation::RoundRobin),
    ("hash:", Rotation::Hashed),
    ("sequential:", Rotation::Sequential),
];
