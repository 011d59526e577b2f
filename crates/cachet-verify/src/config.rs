//! Verification policy configuration.

use std::collections::BTreeMap;

use cachet_keys::PublicKey;

use crate::error::VerificationError;
use crate::flags;

/// Caller-supplied trust policy for one verification call.
///
/// Passed by read-only reference into the engine; the engine never
/// retains it across calls.
#[derive(Default)]
pub struct PolicyConfig {
    /// Annotations that must appear with matching values in a
    /// signature's optional claims.
    pub required_annotations: BTreeMap<String, String>,
    /// Check the payload's embedded digest against the resolved image
    /// digest.
    pub check_claims: bool,
    /// Require a transparency-log inclusion proof for each signature.
    pub check_tlog: bool,
    /// Verify signature bytes against this exact key.
    pub public_key: Option<PublicKey>,
    /// KMS-resident key reference, dereferenced by an external resolver.
    /// Mutually exclusive with `public_key`.
    pub kms_key_ref: Option<String>,
    /// Trusted root certificates (DER) anchoring the certificate check.
    pub trusted_roots: Vec<Vec<u8>>,
}

impl PolicyConfig {
    /// Validate the key-source combination.
    ///
    /// At most one of the explicit public key and the KMS key reference
    /// may be non-empty. Runs before any collaborator call; a violation
    /// is a configuration error, not a verification failure.
    pub fn validate(&self) -> Result<(), VerificationError> {
        let sources = [
            self.public_key.is_some(),
            self.kms_key_ref.as_deref().is_some_and(|r| !r.is_empty()),
        ];
        if sources.iter().any(|s| *s) && !flags::exactly_one_set(&sources) {
            return Err(VerificationError::Configuration(
                "a public key and a KMS key reference are mutually exclusive".to_owned(),
            ));
        }
        Ok(())
    }
}
