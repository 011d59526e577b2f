//! Certificate policy checks.
//!
//! Parses signer certificates, extracts the subject common name and the
//! validity window, and decides whether a leaf is anchored in the trusted
//! root set. The chain decision here is trust policy — issuer match and
//! validity — not chain signature math.

use std::time::SystemTime;

use der::Decode;
use der::asn1::ObjectIdentifier;
use x509_cert::Certificate;

/// OID of the X.509 commonName attribute (2.5.4.3).
const COMMON_NAME_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// A certificate's validity period, as system time bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    /// Earliest instant the certificate is valid.
    pub not_before: SystemTime,
    /// Latest instant the certificate is valid.
    pub not_after: SystemTime,
}

impl ValidityWindow {
    /// Whether `at` falls inside the window, bounds inclusive.
    pub fn contains(&self, at: SystemTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

/// Parse a DER certificate; `None` on any structural error.
pub fn parse(der_bytes: &[u8]) -> Option<Certificate> {
    Certificate::from_der(der_bytes).ok()
}

/// Extract the subject common name, if one is present and textual.
pub fn common_name(cert: &Certificate) -> Option<String> {
    for rdn in cert.tbs_certificate.subject.0.iter() {
        for atv in rdn.0.iter() {
            if atv.oid == COMMON_NAME_OID {
                if let Ok(name) = std::str::from_utf8(atv.value.value()) {
                    return Some(name.to_owned());
                }
            }
        }
    }
    None
}

/// The certificate's validity period.
pub fn validity_window(cert: &Certificate) -> ValidityWindow {
    ValidityWindow {
        not_before: cert.tbs_certificate.validity.not_before.to_system_time(),
        not_after: cert.tbs_certificate.validity.not_after.to_system_time(),
    }
}

/// Whether the leaf's issuer matches the subject of any trusted root.
pub fn anchored_in_roots(cert: &Certificate, roots: &[Vec<u8>]) -> bool {
    roots
        .iter()
        .filter_map(|der_bytes| Certificate::from_der(der_bytes).ok())
        .any(|root| root.tbs_certificate.subject == cert.tbs_certificate.issuer)
}

/// The full trust decision for one signer certificate: parseable, within
/// its validity period at `now`, and anchored in the root set.
pub fn trusted_by(cert_der: &[u8], roots: &[Vec<u8>], now: SystemTime) -> bool {
    let Some(cert) = parse(cert_der) else {
        return false;
    };
    validity_window(&cert).contains(now) && anchored_in_roots(&cert, roots)
}

/// Collect the DER bytes of every `CERTIFICATE` block in a PEM bundle.
pub fn load_pem_chain(text: &str) -> Result<Vec<Vec<u8>>, crate::error::VerificationError> {
    use base64::Engine;

    let mut certs = Vec::new();
    let mut body: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        match trimmed {
            "-----BEGIN CERTIFICATE-----" => body = Some(String::new()),
            "-----END CERTIFICATE-----" => {
                let b64 = body.take().ok_or_else(|| {
                    crate::error::VerificationError::Configuration(
                        "certificate bundle has END without BEGIN".to_owned(),
                    )
                })?;
                let der_bytes = base64::engine::general_purpose::STANDARD
                    .decode(&b64)
                    .map_err(|e| {
                        crate::error::VerificationError::Configuration(format!(
                            "invalid certificate encoding: {e}"
                        ))
                    })?;
                certs.push(der_bytes);
            }
            _ => {
                if let Some(b) = body.as_mut() {
                    b.push_str(trimmed);
                }
            }
        }
    }

    if body.is_some() {
        return Err(crate::error::VerificationError::Configuration(
            "unterminated certificate block".to_owned(),
        ));
    }
    Ok(certs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, date_time_ymd};

    fn test_ca(cn: &str) -> rcgen::Certificate {
        let mut params = CertificateParams::new(vec![]);
        params.distinguished_name.push(DnType::CommonName, cn);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        rcgen::Certificate::from_params(params).expect("ca")
    }

    fn test_leaf(cn: &str) -> rcgen::Certificate {
        let mut params = CertificateParams::new(vec![]);
        params.distinguished_name.push(DnType::CommonName, cn);
        params.not_before = date_time_ymd(2020, 1, 1);
        params.not_after = date_time_ymd(2099, 1, 1);
        rcgen::Certificate::from_params(params).expect("leaf")
    }

    #[test]
    fn common_name_extracted() {
        let ca = test_ca("cachet test CA");
        let leaf = test_leaf("signer@example.com");
        let der_bytes = leaf.serialize_der_with_signer(&ca).expect("sign leaf");

        let cert = parse(&der_bytes).expect("parse");
        assert_eq!(common_name(&cert).as_deref(), Some("signer@example.com"));
    }

    #[test]
    fn leaf_anchors_in_its_issuing_root() {
        let ca = test_ca("cachet test CA");
        let leaf = test_leaf("signer@example.com");
        let leaf_der = leaf.serialize_der_with_signer(&ca).expect("sign leaf");
        let ca_der = ca.serialize_der().expect("ca der");

        assert!(trusted_by(&leaf_der, &[ca_der], SystemTime::now()));
    }

    #[test]
    fn unrelated_root_does_not_anchor() {
        let ca = test_ca("cachet test CA");
        let other = test_ca("someone else's CA");
        let leaf = test_leaf("signer@example.com");
        let leaf_der = leaf.serialize_der_with_signer(&ca).expect("sign leaf");
        let other_der = other.serialize_der().expect("other der");

        assert!(!trusted_by(&leaf_der, &[other_der], SystemTime::now()));
    }

    #[test]
    fn empty_root_set_trusts_nothing() {
        let ca = test_ca("cachet test CA");
        let leaf = test_leaf("signer@example.com");
        let leaf_der = leaf.serialize_der_with_signer(&ca).expect("sign leaf");

        assert!(!trusted_by(&leaf_der, &[], SystemTime::now()));
    }

    #[test]
    fn expired_leaf_is_untrusted() {
        let ca = test_ca("cachet test CA");
        let mut params = CertificateParams::new(vec![]);
        params
            .distinguished_name
            .push(DnType::CommonName, "signer@example.com");
        params.not_before = date_time_ymd(2019, 1, 1);
        params.not_after = date_time_ymd(2020, 1, 1);
        let leaf = rcgen::Certificate::from_params(params).expect("leaf");
        let leaf_der = leaf.serialize_der_with_signer(&ca).expect("sign leaf");
        let ca_der = ca.serialize_der().expect("ca der");

        assert!(!trusted_by(&leaf_der, &[ca_der], SystemTime::now()));
    }

    #[test]
    fn garbage_der_is_untrusted() {
        assert!(!trusted_by(b"not a certificate", &[], SystemTime::now()));
    }

    #[test]
    fn validity_window_bounds_are_inclusive() {
        let leaf = test_leaf("signer@example.com");
        let der_bytes = leaf.serialize_der().expect("der");
        let cert = parse(&der_bytes).expect("parse");
        let window = validity_window(&cert);
        assert!(window.contains(window.not_before));
        assert!(window.contains(window.not_after));
        assert!(!window.contains(window.not_before - std::time::Duration::from_secs(1)));
    }

    #[test]
    fn pem_chain_loads_multiple_blocks() {
        let ca1 = test_ca("root one");
        let ca2 = test_ca("root two");
        let bundle = format!(
            "{}{}",
            ca1.serialize_pem().expect("pem"),
            ca2.serialize_pem().expect("pem")
        );
        let certs = load_pem_chain(&bundle).expect("load");
        assert_eq!(certs.len(), 2);
        assert!(parse(&certs[0]).is_some());
        assert!(parse(&certs[1]).is_some());
    }

    #[test]
    fn pem_chain_rejects_unterminated_block() {
        assert!(load_pem_chain("-----BEGIN CERTIFICATE-----\nabcd").is_err());
    }
}
