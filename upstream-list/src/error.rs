//! Error taxonomy for this crate, one enum per concern the way `droute`
//! keeps `DrouteError`/`QHandleError` separate rather than a single
//! catch-all.

use thiserror::Error;

/// Failure parsing a single upstream specification token.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The specification string contained no usable tokens.
    #[error("empty upstream specification")]
    Empty,
    /// A token did not match any recognized grammar production.
    #[error("malformed upstream token: {0}")]
    Malformed(String),
    /// Nameserver mode requires a numeric literal address.
    #[error("nameserver upstream must be a numeric address: {0}")]
    NotNumeric(String),
    /// A port or weight component failed to parse as an integer.
    #[error("invalid port or weight in token: {0}")]
    InvalidNumber(String),
}

/// Failure performing a DNS lookup, surfaced to logs rather than to callers
/// (background re-resolution absorbs it and retries on the next lazy tick).
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The underlying resolver collaborator returned an error.
    #[error("resolution failed: {0}")]
    Lookup(String),
    /// The query timed out.
    #[error("resolution timed out")]
    Timeout,
}
