//! The signed claim payload.
//!
//! Simple-signing style: a `critical` section binding the signature to a
//! specific image reference and manifest digest, and an `optional` section
//! carrying free-form annotations the signer chose to attach. Field names
//! follow the established kebab-case wire format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The `critical.type` value for cachet image signatures.
pub const SIGNATURE_TYPE: &str = "cachet container image signature";

/// A parsed claim payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleSigning {
    /// Claims that bind the signature to an image.
    pub critical: Critical,
    /// Signer-chosen annotations; absent entries are simply not claimed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<BTreeMap<String, serde_json::Value>>,
}

/// The binding claims every signature must carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Critical {
    /// The image identity being signed.
    pub identity: Identity,
    /// The image content being signed.
    pub image: Image,
    /// Payload type discriminator.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Identity portion of the critical claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// The image reference the signer intended.
    #[serde(rename = "docker-reference")]
    pub docker_reference: String,
}

/// Content portion of the critical claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    /// The manifest digest the signer attests to, `sha256:<hex>`.
    #[serde(rename = "docker-manifest-digest")]
    pub docker_manifest_digest: String,
}

impl SimpleSigning {
    /// Build a payload for `reference` at `digest`.
    pub fn new(reference: &str, digest: &str) -> Self {
        Self {
            critical: Critical {
                identity: Identity {
                    docker_reference: reference.to_owned(),
                },
                image: Image {
                    docker_manifest_digest: digest.to_owned(),
                },
                kind: SIGNATURE_TYPE.to_owned(),
            },
            optional: None,
        }
    }

    /// Parse payload bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Attach an annotation, creating the optional section on first use.
    pub fn annotate(mut self, key: &str, value: &str) -> Self {
        self.optional
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_owned(), serde_json::Value::String(value.to_owned()));
        self
    }

    /// Every required key must be present with an equal value; extra
    /// annotations on the payload are ignored.
    pub fn satisfies_annotations(&self, required: &BTreeMap<String, String>) -> bool {
        required.iter().all(|(key, value)| {
            self.optional
                .as_ref()
                .and_then(|optional| optional.get(key))
                .and_then(serde_json::Value::as_str)
                == Some(value.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn wire_format_uses_kebab_names() {
        let payload = SimpleSigning::new("registry.example/app:v1", "sha256:abc");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json["critical"]["identity"]["docker-reference"],
            "registry.example/app:v1"
        );
        assert_eq!(
            json["critical"]["image"]["docker-manifest-digest"],
            "sha256:abc"
        );
        assert_eq!(json["critical"]["type"], SIGNATURE_TYPE);
        assert!(json.get("optional").is_none());
    }

    #[test]
    fn parse_round_trip() {
        let payload = SimpleSigning::new("app:v1", "sha256:abc").annotate("env", "prod");
        let bytes = serde_json::to_vec(&payload).unwrap();
        let parsed = SimpleSigning::parse(&bytes).unwrap();
        assert_eq!(parsed.critical.image.docker_manifest_digest, "sha256:abc");
        assert!(parsed.satisfies_annotations(&required(&[("env", "prod")])));
    }

    #[test]
    fn missing_annotation_fails() {
        let payload = SimpleSigning::new("app:v1", "sha256:abc");
        assert!(!payload.satisfies_annotations(&required(&[("env", "prod")])));
    }

    #[test]
    fn mismatched_annotation_value_fails() {
        let payload = SimpleSigning::new("app:v1", "sha256:abc").annotate("env", "staging");
        assert!(!payload.satisfies_annotations(&required(&[("env", "prod")])));
    }

    #[test]
    fn extra_annotations_are_ignored() {
        let payload = SimpleSigning::new("app:v1", "sha256:abc")
            .annotate("env", "prod")
            .annotate("team", "infra");
        assert!(payload.satisfies_annotations(&required(&[("env", "prod")])));
    }

    #[test]
    fn empty_requirement_is_vacuously_satisfied() {
        let payload = SimpleSigning::new("app:v1", "sha256:abc");
        assert!(payload.satisfies_annotations(&BTreeMap::new()));
    }

    #[test]
    fn non_string_annotation_does_not_match() {
        let mut payload = SimpleSigning::new("app:v1", "sha256:abc");
        payload
            .optional
            .get_or_insert_with(BTreeMap::new)
            .insert("env".to_owned(), serde_json::json!(42));
        assert!(!payload.satisfies_annotations(&required(&[("env", "42")])));
    }
}
