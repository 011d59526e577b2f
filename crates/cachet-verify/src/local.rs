//! Filesystem-backed collaborators.
//!
//! `LocalStore` serves signatures out of a JSON index file; `OfflineLog`
//! answers inclusion queries from a snapshot of transparency log entries.
//! These back the CLI and the integration tests; remote transports live
//! outside this crate.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use aws_lc_rs::digest::{SHA256, digest};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::cert::ValidityWindow;
use crate::error::VerificationError;
use crate::registry::{CandidateSignature, CanonicalRef, Registry};
use crate::tlog::TransparencyLog;

// ── signature store ──────────────────────────────────────────────────

/// One stored signature in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSignature {
    /// Base64 claim payload.
    pub payload: String,
    /// Base64 signature bytes.
    pub signature: String,
    /// PEM signer certificate, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
}

/// One image entry in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredImage {
    /// Manifest digest, `sha256:<hex>`.
    pub digest: String,
    /// Signatures associated with the image.
    #[serde(default)]
    pub signatures: Vec<StoredSignature>,
}

/// The serialized store index.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreIndex {
    /// Normalized image reference → entry.
    #[serde(default)]
    pub images: BTreeMap<String, StoredImage>,
}

/// A registry backed by an `index.json` file on disk.
pub struct LocalStore {
    index: StoreIndex,
}

impl LocalStore {
    /// Load a store index from `path`.
    pub fn open(path: &Path) -> Result<Self, VerificationError> {
        let data = std::fs::read_to_string(path)?;
        let index: StoreIndex = serde_json::from_str(&data)?;
        tracing::debug!(
            path = %path.display(),
            images = index.images.len(),
            "opened local signature store"
        );
        Ok(Self { index })
    }

    /// Build a store from an in-memory index.
    pub fn from_index(index: StoreIndex) -> Self {
        Self { index }
    }
}

impl Registry for LocalStore {
    fn resolve_reference(&self, image_ref: &str) -> Result<CanonicalRef, VerificationError> {
        let normalized = normalize_reference(image_ref).map_err(|reason| {
            VerificationError::Reference {
                image: image_ref.to_owned(),
                reason,
            }
        })?;

        // Digest-pinned references carry their own digest.
        if let Some((name, digest)) = normalized.split_once('@') {
            return Ok(CanonicalRef {
                name: name.to_owned(),
                digest: digest.to_owned(),
            });
        }

        let entry = self.index.images.get(&normalized).ok_or_else(|| {
            VerificationError::Fetch {
                image: image_ref.to_owned(),
                reason: "image not present in local store".to_owned(),
            }
        })?;
        Ok(CanonicalRef {
            name: normalized,
            digest: entry.digest.clone(),
        })
    }

    fn fetch_signatures(
        &self,
        resolved: &CanonicalRef,
    ) -> Result<Vec<CandidateSignature>, VerificationError> {
        let entry = self
            .index
            .images
            .get(&resolved.name)
            .or_else(|| {
                self.index
                    .images
                    .values()
                    .find(|e| e.digest == resolved.digest)
            })
            .ok_or_else(|| VerificationError::Fetch {
                image: resolved.name.clone(),
                reason: "image not present in local store".to_owned(),
            })?;

        let b64 = base64::engine::general_purpose::STANDARD;
        let mut candidates = Vec::with_capacity(entry.signatures.len());
        for stored in &entry.signatures {
            let payload = b64.decode(&stored.payload).map_err(|e| {
                VerificationError::Fetch {
                    image: resolved.name.clone(),
                    reason: format!("corrupt stored payload: {e}"),
                }
            })?;
            let signature = b64.decode(&stored.signature).map_err(|e| {
                VerificationError::Fetch {
                    image: resolved.name.clone(),
                    reason: format!("corrupt stored signature: {e}"),
                }
            })?;
            let certificate = match &stored.certificate {
                Some(pem) => Some(
                    crate::cert::load_pem_chain(pem)
                        .ok()
                        .and_then(|mut chain| {
                            if chain.is_empty() {
                                None
                            } else {
                                Some(chain.remove(0))
                            }
                        })
                        .ok_or_else(|| VerificationError::Fetch {
                            image: resolved.name.clone(),
                            reason: "corrupt stored certificate".to_owned(),
                        })?,
                ),
                None => None,
            };
            candidates.push(CandidateSignature {
                payload,
                signature,
                certificate,
            });
        }
        Ok(candidates)
    }
}

/// Normalize and syntactically validate an image reference.
///
/// Accepts `repo[:tag]` and `repo@sha256:<hex>`; a bare repository gets
/// the `latest` tag.
fn normalize_reference(image_ref: &str) -> Result<String, String> {
    if image_ref.is_empty() {
        return Err("empty reference".to_owned());
    }
    if image_ref.chars().any(char::is_whitespace) {
        return Err("reference contains whitespace".to_owned());
    }

    if let Some((name, digest)) = image_ref.split_once('@') {
        if name.is_empty() {
            return Err("missing repository before digest".to_owned());
        }
        let hex = digest
            .strip_prefix("sha256:")
            .ok_or_else(|| "digest must be sha256".to_owned())?;
        if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("malformed sha256 digest".to_owned());
        }
        return Ok(image_ref.to_owned());
    }

    // Tag is whatever follows the last path component's colon.
    let last = image_ref.rsplit('/').next().unwrap_or(image_ref);
    match last.split_once(':') {
        Some((_, tag)) if tag.is_empty() => Err("empty tag".to_owned()),
        Some(_) => Ok(image_ref.to_owned()),
        None => Ok(format!("{image_ref}:latest")),
    }
}

// ── offline transparency log ─────────────────────────────────────────

/// One entry in a transparency log snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Hex SHA-256 of the signature bytes.
    pub signature_digest: String,
    /// Unix seconds when the entry was integrated into the log.
    pub integrated_time: u64,
}

/// A transparency log answered from a local snapshot of entries.
pub struct OfflineLog {
    entries: Vec<LogEntry>,
}

impl OfflineLog {
    /// Load a snapshot (a JSON array of entries) from `path`.
    pub fn open(path: &Path) -> Result<Self, VerificationError> {
        let data = std::fs::read_to_string(path)?;
        let entries: Vec<LogEntry> = serde_json::from_str(&data)?;
        Ok(Self { entries })
    }

    /// A log with no entries; every inclusion check fails.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a snapshot from in-memory entries.
    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    /// The snapshot digest for a signature, hex SHA-256 over its bytes.
    pub fn entry_digest(signature: &[u8]) -> String {
        hex_encode(digest(&SHA256, signature).as_ref())
    }
}

impl TransparencyLog for OfflineLog {
    fn check_inclusion(
        &self,
        signature: &CandidateSignature,
        window: Option<&ValidityWindow>,
    ) -> Result<bool, VerificationError> {
        let wanted = Self::entry_digest(&signature.signature);
        Ok(self.entries.iter().any(|entry| {
            entry.signature_digest == wanted
                && window.is_none_or(|w| {
                    w.contains(UNIX_EPOCH + Duration::from_secs(entry.integrated_time))
                })
        }))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(reference: &str, digest_value: &str) -> LocalStore {
        let mut index = StoreIndex::default();
        index.images.insert(
            reference.to_owned(),
            StoredImage {
                digest: digest_value.to_owned(),
                signatures: vec![StoredSignature {
                    payload: base64::engine::general_purpose::STANDARD.encode(b"{}"),
                    signature: base64::engine::general_purpose::STANDARD.encode(b"sig"),
                    certificate: None,
                }],
            },
        );
        LocalStore::from_index(index)
    }

    #[test]
    fn bare_repository_gets_latest_tag() {
        let store = store_with("registry.example/app:latest", "sha256:abc");
        let resolved = store.resolve_reference("registry.example/app").unwrap();
        assert_eq!(resolved.name, "registry.example/app:latest");
        assert_eq!(resolved.digest, "sha256:abc");
    }

    #[test]
    fn digest_reference_resolves_without_index_entry() {
        let store = LocalStore::from_index(StoreIndex::default());
        let hex = "a".repeat(64);
        let resolved = store
            .resolve_reference(&format!("registry.example/app@sha256:{hex}"))
            .unwrap();
        assert_eq!(resolved.digest, format!("sha256:{hex}"));
    }

    #[test]
    fn malformed_references_rejected() {
        let store = LocalStore::from_index(StoreIndex::default());
        for bad in ["", "repo image", "repo@md5:abc", "repo@sha256:short", "repo:"] {
            let err = store.resolve_reference(bad).unwrap_err();
            assert!(
                matches!(err, VerificationError::Reference { .. }),
                "`{bad}` should be a reference error, got {err}"
            );
        }
    }

    #[test]
    fn unknown_image_is_a_fetch_error() {
        let store = LocalStore::from_index(StoreIndex::default());
        let err = store.resolve_reference("registry.example/ghost:v1").unwrap_err();
        assert!(matches!(err, VerificationError::Fetch { .. }));
    }

    #[test]
    fn fetch_decodes_stored_signatures() {
        let store = store_with("app:v1", "sha256:abc");
        let resolved = store.resolve_reference("app:v1").unwrap();
        let sigs = store.fetch_signatures(&resolved).unwrap();
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].payload, b"{}");
        assert_eq!(sigs[0].signature, b"sig");
        assert!(sigs[0].certificate.is_none());
    }

    #[test]
    fn corrupt_base64_is_a_fetch_error() {
        let mut index = StoreIndex::default();
        index.images.insert(
            "app:v1".to_owned(),
            StoredImage {
                digest: "sha256:abc".to_owned(),
                signatures: vec![StoredSignature {
                    payload: "!!! not base64 !!!".to_owned(),
                    signature: String::new(),
                    certificate: None,
                }],
            },
        );
        let store = LocalStore::from_index(index);
        let resolved = store.resolve_reference("app:v1").unwrap();
        assert!(matches!(
            store.fetch_signatures(&resolved),
            Err(VerificationError::Fetch { .. })
        ));
    }

    #[test]
    fn offline_log_matches_by_signature_digest() {
        let sig = CandidateSignature {
            payload: b"{}".to_vec(),
            signature: b"sig-bytes".to_vec(),
            certificate: None,
        };
        let log = OfflineLog::from_entries(vec![LogEntry {
            signature_digest: OfflineLog::entry_digest(b"sig-bytes"),
            integrated_time: 1_700_000_000,
        }]);
        assert!(log.check_inclusion(&sig, None).unwrap());
        assert!(!OfflineLog::empty().check_inclusion(&sig, None).unwrap());
    }

    #[test]
    fn inclusion_outside_validity_window_fails() {
        let sig = CandidateSignature {
            payload: b"{}".to_vec(),
            signature: b"sig-bytes".to_vec(),
            certificate: None,
        };
        let log = OfflineLog::from_entries(vec![LogEntry {
            signature_digest: OfflineLog::entry_digest(b"sig-bytes"),
            integrated_time: 0, // 1970, before any plausible certificate
        }]);
        let window = ValidityWindow {
            not_before: UNIX_EPOCH + Duration::from_secs(1_000_000),
            not_after: UNIX_EPOCH + Duration::from_secs(2_000_000),
        };
        assert!(!log.check_inclusion(&sig, Some(&window)).unwrap());
        assert!(log.check_inclusion(&sig, None).unwrap());
    }
}
