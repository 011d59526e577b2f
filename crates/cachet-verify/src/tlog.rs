//! Transparency log collaborator interface.

use crate::cert::ValidityWindow;
use crate::error::VerificationError;
use crate::registry::CandidateSignature;

/// An append-only transparency log, treated as a black box. Proof
/// cryptography belongs to the implementation behind this trait.
pub trait TransparencyLog {
    /// Whether `signature` has a valid inclusion proof, dated within
    /// `window` when one is supplied.
    fn check_inclusion(
        &self,
        signature: &CandidateSignature,
        window: Option<&ValidityWindow>,
    ) -> Result<bool, VerificationError>;
}
