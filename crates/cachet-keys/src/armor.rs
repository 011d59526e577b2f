//! Armored key encodings.
//!
//! Keys travel as PEM-style blocks: a type label plus a base64 payload.
//! The label is enforced on decode, so a private key envelope can never
//! be mistaken for a public key by a caller expecting the other kind.

use base64::Engine;

use crate::error::KeyError;

/// Label for the encrypted private key block.
pub const PRIVATE_KEY_LABEL: &str = "ENCRYPTED CACHET PRIVATE KEY";

/// Label for the public key block (standard SPKI PEM).
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// Wrap `bytes` in an armored block with the given label.
pub fn encode_block(label: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    let mut block = format!("-----BEGIN {label}-----\n");
    let mut rest = b64.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(64));
        block.push_str(line);
        block.push('\n');
        rest = tail;
    }
    block.push_str(&format!("-----END {label}-----\n"));
    block
}

/// Extract the payload bytes from an armored block, requiring `label`.
///
/// A block carrying any other label is rejected; trailing data after the
/// first block is ignored.
pub fn decode_block(label: &str, text: &str) -> Result<Vec<u8>, KeyError> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let mut b64 = String::new();
    let mut in_body = false;
    let mut found = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed == begin {
            in_body = true;
            found = true;
            continue;
        }
        if in_body && trimmed == end {
            in_body = false;
            break;
        }
        if let Some(other) = trimmed.strip_prefix("-----BEGIN ") {
            let other = other.trim_end_matches("-----");
            return Err(KeyError::Armor(format!(
                "expected `{label}` block, found `{other}`"
            )));
        }
        if in_body {
            b64.push_str(trimmed);
        }
    }

    if !found {
        return Err(KeyError::Armor(format!("no `{label}` block present")));
    }
    if in_body {
        return Err(KeyError::Armor(format!("unterminated `{label}` block")));
    }

    base64::engine::general_purpose::STANDARD
        .decode(&b64)
        .map_err(|e| KeyError::Armor(format!("invalid base64 payload: {e}")))
}
