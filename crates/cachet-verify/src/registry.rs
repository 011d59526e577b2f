//! Registry collaborator interface.
//!
//! The engine only needs two operations from a registry: pin a reference
//! to a manifest digest and list the signatures associated with it.

use crate::error::VerificationError;

/// A resolved, digest-pinned image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRef {
    /// Normalized reference (tag retained for display).
    pub name: String,
    /// The image's manifest digest, `sha256:<hex>`.
    pub digest: String,
}

/// One signature object associated with an image, not yet judged
/// against policy.
#[derive(Debug, Clone)]
pub struct CandidateSignature {
    /// The signed claim payload bytes.
    pub payload: Vec<u8>,
    /// Raw signature bytes over the payload.
    pub signature: Vec<u8>,
    /// DER-encoded signer certificate, when one was attached.
    pub certificate: Option<Vec<u8>>,
}

/// Read side of a signature registry.
pub trait Registry {
    /// Resolve `image_ref` to a canonical, digest-pinned reference.
    fn resolve_reference(&self, image_ref: &str) -> Result<CanonicalRef, VerificationError>;

    /// Fetch the candidate signature set for a resolved reference.
    fn fetch_signatures(
        &self,
        resolved: &CanonicalRef,
    ) -> Result<Vec<CandidateSignature>, VerificationError>;
}
