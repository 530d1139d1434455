//! Existence oracle: the remote service that says whether a handle exists

pub mod http;
pub mod targets;

pub use http::HttpOracle;

use crate::error::{Result, SniperError};
use crate::types::{IndeterminateReason, ProbeOutcome};
use async_trait::async_trait;

/// Remote existence check for a single candidate.
///
/// Returns the raw HTTP-style status on any answer, or an error for a
/// transport-level failure. URL construction and authentication belong to
/// the implementation.
#[async_trait]
pub trait ExistenceOracle: Send + Sync {
    async fn probe(&self, candidate: &str) -> Result<u16>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "oracle"
    }
}

/// Map an oracle answer onto a probe outcome.
///
/// 200 is taken, 404 is free; everything else, including transport
/// failures, is indeterminate and keeps whatever raw signal there was.
pub fn classify(response: &Result<u16>) -> ProbeOutcome {
    match response {
        Ok(200) => ProbeOutcome::Taken(200),
        Ok(404) => ProbeOutcome::Free(404),
        Ok(429) => ProbeOutcome::Indeterminate(IndeterminateReason::RateLimited),
        Ok(code) => ProbeOutcome::Indeterminate(IndeterminateReason::UnexpectedStatus(*code)),
        Err(SniperError::Timeout { .. }) => ProbeOutcome::Indeterminate(IndeterminateReason::Timeout),
        Err(e) => ProbeOutcome::Indeterminate(IndeterminateReason::Transport(e.to_string())),
    }
}
