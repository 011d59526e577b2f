//! The verification policy engine.
//!
//! One `verify` call judges an image's candidate signatures against the
//! caller's policy. The enabled predicates are built as an ordered list
//! of named closures, so checklist generation and pass/fail evaluation
//! stay in lock-step: every enabled predicate contributes exactly one
//! checklist entry, and a signature survives only if it passed them all.

use std::time::SystemTime;

use crate::cert;
use crate::config::PolicyConfig;
use crate::error::VerificationError;
use crate::payload::SimpleSigning;
use crate::registry::{CandidateSignature, CanonicalRef, Registry};
use crate::tlog::TransparencyLog;

/// One evaluated policy predicate in the checklist.
#[derive(Debug, Clone)]
pub struct ChecklistEntry {
    /// Prose description of the check that was performed.
    pub description: String,
    /// Whether at least one signature passed the check.
    pub satisfied: bool,
}

/// The outcome of verifying one image reference. Immutable once built.
#[derive(Debug)]
pub struct VerificationRecord {
    /// The reference as supplied by the caller.
    pub image_reference: String,
    /// Signatures that satisfied every enabled predicate, in fetch order.
    pub verified_signatures: Vec<CandidateSignature>,
    /// One entry per enabled predicate, in evaluation order.
    pub policy_checklist: Vec<ChecklistEntry>,
}

/// Checks an image's signatures against a policy. Stateless per call:
/// the configuration is borrowed for the duration of `verify` only.
pub struct Verifier<'a, R, L> {
    registry: &'a R,
    tlog: &'a L,
}

type Predicate<'c> = Box<dyn Fn(&CandidateSignature) -> Result<bool, VerificationError> + 'c>;

struct PolicyCheck<'c> {
    description: &'static str,
    run: Predicate<'c>,
}

impl<'a, R: Registry, L: TransparencyLog> Verifier<'a, R, L> {
    /// Create a verifier over the given collaborators.
    pub const fn new(registry: &'a R, tlog: &'a L) -> Self {
        Self { registry, tlog }
    }

    /// Verify one image reference against `config`.
    ///
    /// All-or-nothing at the call boundary: if no candidate satisfies
    /// every enabled predicate, the call fails with
    /// [`VerificationError::NoValidSignature`] carrying the record.
    pub fn verify(
        &self,
        image_ref: &str,
        config: &PolicyConfig,
    ) -> Result<VerificationRecord, VerificationError> {
        config.validate()?;

        let resolved = self.registry.resolve_reference(image_ref)?;
        let candidates = self.registry.fetch_signatures(&resolved)?;
        tracing::debug!(
            image = image_ref,
            digest = %resolved.digest,
            candidates = candidates.len(),
            "fetched candidate signatures"
        );

        let checks = build_checks(self.tlog, image_ref, &resolved, config);
        let mut satisfied = vec![false; checks.len()];
        let mut verified = Vec::new();

        for candidate in candidates {
            let mut all_passed = true;
            for (seen, check) in satisfied.iter_mut().zip(&checks) {
                if (check.run)(&candidate)? {
                    *seen = true;
                } else {
                    all_passed = false;
                }
            }
            if all_passed {
                verified.push(candidate);
            }
        }

        let policy_checklist = checks
            .iter()
            .zip(&satisfied)
            .map(|(check, seen)| ChecklistEntry {
                description: check.description.to_owned(),
                satisfied: *seen,
            })
            .collect();

        let record = VerificationRecord {
            image_reference: image_ref.to_owned(),
            verified_signatures: verified,
            policy_checklist,
        };

        if record.verified_signatures.is_empty() {
            return Err(VerificationError::NoValidSignature {
                image: image_ref.to_owned(),
                record,
            });
        }
        Ok(record)
    }
}

/// Build the ordered list of enabled predicates for one call.
///
/// Order is fixed: annotations, claims, transparency log, public key,
/// certificate roots. The root check is always on; it passes vacuously
/// for signatures that carry no certificate.
fn build_checks<'c, L: TransparencyLog>(
    tlog: &'c L,
    image: &'c str,
    resolved: &'c CanonicalRef,
    config: &'c PolicyConfig,
) -> Vec<PolicyCheck<'c>> {
    let mut checks: Vec<PolicyCheck<'c>> = Vec::new();

    if !config.required_annotations.is_empty() {
        checks.push(PolicyCheck {
            description: "The specified annotations were verified",
            run: Box::new(|sig| {
                Ok(SimpleSigning::parse(&sig.payload)
                    .is_ok_and(|p| p.satisfies_annotations(&config.required_annotations)))
            }),
        });
    }

    if config.check_claims {
        checks.push(PolicyCheck {
            description: "The cachet claims were validated",
            run: Box::new(|sig| {
                Ok(SimpleSigning::parse(&sig.payload)
                    .is_ok_and(|p| p.critical.image.docker_manifest_digest == resolved.digest))
            }),
        });
    }

    if config.check_tlog {
        checks.push(PolicyCheck {
            description: "The signatures were present in the transparency log",
            run: Box::new(move |sig| {
                let window = sig
                    .certificate
                    .as_deref()
                    .and_then(cert::parse)
                    .map(|c| cert::validity_window(&c));
                tlog.check_inclusion(sig, window.as_ref()).map_err(|e| {
                    VerificationError::Log {
                        image: image.to_owned(),
                        reason: e.to_string(),
                    }
                })
            }),
        });
    }

    if let Some(key) = &config.public_key {
        checks.push(PolicyCheck {
            description: "The signatures were verified against the specified public key",
            run: Box::new(|sig| Ok(key.verify(&sig.payload, &sig.signature))),
        });
    }

    checks.push(PolicyCheck {
        description: "Any certificates were verified against the trusted roots",
        run: Box::new(|sig| {
            Ok(sig
                .certificate
                .as_deref()
                .is_none_or(|der| cert::trusted_by(der, &config.trusted_roots, SystemTime::now())))
        }),
    });

    checks
}
