//! Textual upstream specification parsing.
//!
//! Grammar (unchanged from `SPEC_FULL.md` §6):
//! ```text
//! list_spec       := [ rotation_prefix ] token { sep+ token }
//! rotation_prefix := "random:" | "master-slave:" | "round-robin:" | "hash:" | "sequential:"
//! sep             := one of ';' ',' ' ' '\n' '\r' '\t'
//! token           := host[:port][:weight] | "[" ipv6 "]"[:port][:weight] | "/path"
//! ```

use crate::addr::EndpointAddr;
use crate::error::ParseError;
use crate::rotation::{Rotation, ROTATION_PREFIXES};
use crate::upstream::UpstreamFlags;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

/// Whether a spec token is interpreted as a generic upstream or a bare
/// nameserver (which must resolve to exactly one numeric address).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// `host[:port][:weight]`, `[ipv6][:port][:weight]`, or `/path`.
    Default,
    /// A single numeric address, no port/weight suffix beyond the address
    /// itself.
    Nameserver,
}

pub(crate) struct ParsedToken {
    pub(crate) name: String,
    pub(crate) weight: u32,
    /// The port to attach to addresses resolved for this upstream. For a
    /// token with a resolved address already attached, this matches that
    /// address's port; for a deferred hostname, it is the port parsed from
    /// the spec (or `default_port`), carried forward for the first
    /// resolution since `addrs` starts empty.
    pub(crate) port: u16,
    pub(crate) addrs: Vec<EndpointAddr>,
    pub(crate) no_resolve: bool,
}

fn parse_port(s: &str) -> Result<u16, ParseError> {
    s.parse().map_err(|_| ParseError::InvalidNumber(s.to_string()))
}

fn parse_weight(s: &str) -> Result<u32, ParseError> {
    s.parse().map_err(|_| ParseError::InvalidNumber(s.to_string()))
}

fn parse_default_token(token: &str, default_port: u16) -> Result<ParsedToken, ParseError> {
    if let Some(path) = token.strip_prefix('/') {
        let _ = path;
        return Ok(ParsedToken {
            name: token.to_string(),
            weight: 0,
            port: default_port,
            addrs: vec![EndpointAddr::Unix(PathBuf::from(token))],
            no_resolve: true,
        });
    }

    if let Some(after_bracket) = token.strip_prefix('[') {
        let close = after_bracket
            .find(']')
            .ok_or_else(|| ParseError::Malformed(token.to_string()))?;
        let host = &after_bracket[..close];
        let remainder = &after_bracket[close + 1..];
        let ip: Ipv6Addr = host
            .parse()
            .map_err(|_| ParseError::Malformed(token.to_string()))?;
        let mut parts = remainder.trim_start_matches(':').split(':');
        let port = match parts.next() {
            Some(s) if !s.is_empty() => parse_port(s)?,
            _ => default_port,
        };
        let weight = match parts.next() {
            Some(s) if !s.is_empty() => parse_weight(s)?,
            _ => 0,
        };
        if parts.next().is_some() {
            return Err(ParseError::Malformed(token.to_string()));
        }
        let sa = SocketAddr::new(IpAddr::V6(ip), port);
        return Ok(ParsedToken {
            name: host.to_string(),
            weight,
            port,
            addrs: vec![EndpointAddr::Inet(sa)],
            no_resolve: true,
        });
    }

    let mut parts = token.split(':');
    let host = parts.next().unwrap_or("");
    if host.is_empty() {
        return Err(ParseError::Malformed(token.to_string()));
    }
    let port = match parts.next() {
        Some(s) if !s.is_empty() => parse_port(s)?,
        Some(_) => default_port,
        None => default_port,
    };
    let weight = match parts.next() {
        Some(s) if !s.is_empty() => parse_weight(s)?,
        Some(_) => 0,
        None => 0,
    };
    if parts.next().is_some() {
        return Err(ParseError::Malformed(token.to_string()));
    }

    if let Ok(ipv4) = host.parse::<Ipv4Addr>() {
        let sa = SocketAddr::new(IpAddr::V4(ipv4), port);
        return Ok(ParsedToken {
            name: host.to_string(),
            weight,
            port,
            addrs: vec![EndpointAddr::Inet(sa)],
            no_resolve: true,
        });
    }

    // Deferred: a hostname upstream is inserted with an empty address set
    // and picked up by the lazy-resolve timer (SPEC_FULL.md §4.1). `port`
    // carries the parsed (or default) port through to that first resolution.
    Ok(ParsedToken {
        name: host.to_string(),
        weight,
        port,
        addrs: vec![],
        no_resolve: false,
    })
}

fn parse_nameserver_token(token: &str) -> Result<ParsedToken, ParseError> {
    if let Some(after_bracket) = token.strip_prefix('[') {
        let close = after_bracket
            .find(']')
            .ok_or_else(|| ParseError::NotNumeric(token.to_string()))?;
        let host = &after_bracket[..close];
        let ip: Ipv6Addr = host
            .parse()
            .map_err(|_| ParseError::NotNumeric(token.to_string()))?;
        return Ok(ParsedToken {
            name: host.to_string(),
            weight: 0,
            port: 53,
            addrs: vec![EndpointAddr::from_ip(IpAddr::V6(ip), 53)],
            no_resolve: true,
        });
    }
    let (host, port) = match token.rsplit_once(':') {
        Some((h, p)) => (h, parse_port(p)?),
        None => (token, 53),
    };
    let ip: IpAddr = host
        .parse()
        .map_err(|_| ParseError::NotNumeric(token.to_string()))?;
    Ok(ParsedToken {
        name: host.to_string(),
        weight: 0,
        port,
        addrs: vec![EndpointAddr::from_ip(ip, port)],
        no_resolve: true,
    })
}

pub(crate) fn parse_token(
    token: &str,
    default_port: u16,
    mode: ParseMode,
) -> Result<ParsedToken, ParseError> {
    match mode {
        ParseMode::Default => parse_default_token(token, default_port),
        ParseMode::Nameserver => parse_nameserver_token(token),
    }
}

pub(crate) fn flags_for(no_resolve: bool) -> UpstreamFlags {
    if no_resolve {
        UpstreamFlags::NO_RESOLVE
    } else {
        UpstreamFlags::empty()
    }
}

/// Split a full `ParseLine` spec into an optional leading rotation and the
/// remaining token stream.
pub(crate) fn split_rotation_prefix(s: &str) -> (Option<Rotation>, &str) {
    for (prefix, rot) in ROTATION_PREFIXES {
        if let Some(rest) = s.strip_prefix(prefix) {
            return (Some(*rot), rest);
        }
    }
    (None, s)
}

/// Split the token stream on any separator character.
pub(crate) fn split_tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c| matches!(c, ';' | ',' | ' ' | '\n' | '\r' | '\t'))
        .filter(|t| !t.is_empty())
}
