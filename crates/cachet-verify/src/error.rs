//! Error taxonomy for the verification subsystem.
//!
//! `NoValidSignature` is a policy failure ("untrusted"); the collaborator
//! variants are infrastructure failures ("unreachable"). Callers rely on
//! that distinction when reporting, so the variants stay separate.

use crate::engine::VerificationRecord;

/// Errors from the cachet verification subsystem.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// The policy configuration is invalid. Raised before any
    /// collaborator I/O occurs.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The image reference is malformed or could not be resolved.
    #[error("invalid reference `{image}`: {reason}")]
    Reference {
        /// The reference as supplied by the caller.
        image: String,
        /// Why resolution failed.
        reason: String,
    },

    /// Fetching the candidate signature set failed.
    #[error("fetching signatures for `{image}` failed: {reason}")]
    Fetch {
        /// The reference being verified.
        image: String,
        /// Why the fetch failed.
        reason: String,
    },

    /// The transparency log collaborator failed.
    #[error("transparency log lookup for `{image}` failed: {reason}")]
    Log {
        /// The reference being verified.
        image: String,
        /// Why the lookup failed.
        reason: String,
    },

    /// No candidate signature satisfied every enabled policy predicate.
    /// Carries the full record so callers can still report the checklist.
    #[error("no matching signatures for `{image}`")]
    NoValidSignature {
        /// The reference being verified.
        image: String,
        /// The record with its empty verified set and full checklist.
        record: VerificationRecord,
    },

    /// I/O error while reading local collaborator data or writing output.
    #[error("verification I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
