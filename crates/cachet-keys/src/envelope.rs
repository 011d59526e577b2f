//! Password-derived encryption envelope for private key material.
//!
//! Argon2id derives a 32-byte key from the password; ChaCha20-Poly1305
//! seals the plaintext. The KDF name and parameters, the salt, and the
//! nonce ride alongside the ciphertext in the envelope body, so opening
//! it requires nothing beyond the password itself.

use argon2::{Algorithm, Argon2, Params, Version};
use aws_lc_rs::aead::{Aad, CHACHA20_POLY1305, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use aws_lc_rs::rand::{SecureRandom, SystemRandom};
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::KeyError;

const KDF_NAME: &str = "argon2id";
const CIPHER_NAME: &str = "chacha20poly1305";
const SALT_LEN: usize = 32;
const KEY_LEN: usize = 32;

/// Argon2id cost parameters stored in the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // RFC 9106 second recommended parameter set.
        Self {
            m_cost: 19_456,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Kdf {
    name: String,
    params: KdfParams,
    salt: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Cipher {
    name: String,
    nonce: String,
}

/// Serialized envelope body: kdf, cipher, ciphertext.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    kdf: Kdf,
    cipher: Cipher,
    ciphertext: String,
}

/// Seal `plaintext` under a key derived from `password`.
///
/// Returns the serialized envelope body (JSON bytes), ready for armoring.
pub fn seal(plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>, KeyError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| KeyError::Encrypt("salt generation failed".to_owned()))?;
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill(&mut nonce)
        .map_err(|_| KeyError::Encrypt("nonce generation failed".to_owned()))?;

    let params = KdfParams::default();
    let key = derive_key(password, &salt, &params)?;

    let unbound = UnboundKey::new(&CHACHA20_POLY1305, &key[..])
        .map_err(|_| KeyError::Encrypt("invalid cipher key length".to_owned()))?;
    let sealing = LessSafeKey::new(unbound);
    let mut buf = plaintext.to_vec();
    sealing
        .seal_in_place_append_tag(Nonce::assume_unique_for_key(nonce), Aad::empty(), &mut buf)
        .map_err(|_| KeyError::Encrypt("AEAD seal failed".to_owned()))?;

    let b64 = base64::engine::general_purpose::STANDARD;
    let envelope = Envelope {
        kdf: Kdf {
            name: KDF_NAME.to_owned(),
            params,
            salt: b64.encode(salt),
        },
        cipher: Cipher {
            name: CIPHER_NAME.to_owned(),
            nonce: b64.encode(nonce),
        },
        ciphertext: b64.encode(&buf),
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Open an envelope body with `password`, recovering the plaintext.
///
/// Fails closed on unknown KDF or cipher names, malformed fields, or a
/// wrong password (AEAD tag mismatch).
pub fn open(envelope: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    let envelope: Envelope = serde_json::from_slice(envelope)?;
    if envelope.kdf.name != KDF_NAME {
        return Err(KeyError::Decrypt(format!(
            "unsupported kdf `{}`",
            envelope.kdf.name
        )));
    }
    if envelope.cipher.name != CIPHER_NAME {
        return Err(KeyError::Decrypt(format!(
            "unsupported cipher `{}`",
            envelope.cipher.name
        )));
    }

    let b64 = base64::engine::general_purpose::STANDARD;
    let salt = b64
        .decode(&envelope.kdf.salt)
        .map_err(|e| KeyError::Decrypt(format!("invalid salt encoding: {e}")))?;
    let nonce: [u8; NONCE_LEN] = b64
        .decode(&envelope.cipher.nonce)
        .map_err(|e| KeyError::Decrypt(format!("invalid nonce encoding: {e}")))?
        .try_into()
        .map_err(|_| KeyError::Decrypt("invalid nonce length".to_owned()))?;
    let mut buf = b64
        .decode(&envelope.ciphertext)
        .map_err(|e| KeyError::Decrypt(format!("invalid ciphertext encoding: {e}")))?;

    let key = derive_key(password, &salt, &envelope.kdf.params)?;
    let unbound = UnboundKey::new(&CHACHA20_POLY1305, &key[..])
        .map_err(|_| KeyError::Decrypt("invalid cipher key length".to_owned()))?;
    let opening = LessSafeKey::new(unbound);
    let plaintext = opening
        .open_in_place(Nonce::assume_unique_for_key(nonce), Aad::empty(), &mut buf)
        .map_err(|_| KeyError::Decrypt("wrong password or corrupt envelope".to_owned()))?;

    Ok(Zeroizing::new(plaintext.to_vec()))
}

fn derive_key(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, KeyError> {
    let params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(KEY_LEN))
        .map_err(|e| KeyError::Derivation(format!("invalid argon2 parameters: {e}")))?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon
        .hash_password_into(password, salt, &mut key[..])
        .map_err(|e| KeyError::Derivation(format!("argon2 derivation failed: {e}")))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_round_trip() {
        let sealed = seal(b"private key bytes", b"hunter2").expect("seal");
        let opened = open(&sealed, b"hunter2").expect("open");
        assert_eq!(&opened[..], b"private key bytes");
    }

    #[test]
    fn wrong_password_fails() {
        let sealed = seal(b"private key bytes", b"hunter2").expect("seal");
        let err = open(&sealed, b"hunter3").unwrap_err();
        assert!(matches!(err, KeyError::Decrypt(_)), "got: {err}");
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let sealed = seal(b"private key bytes", b"hunter2").expect("seal");
        let mut envelope: serde_json::Value = serde_json::from_slice(&sealed).unwrap();
        let ct = envelope["ciphertext"].as_str().unwrap().to_owned();
        let mut bytes = base64::engine::general_purpose::STANDARD
            .decode(&ct)
            .unwrap();
        bytes[0] ^= 0xFF;
        envelope["ciphertext"] =
            base64::engine::general_purpose::STANDARD.encode(&bytes).into();

        let result = open(&serde_json::to_vec(&envelope).unwrap(), b"hunter2");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_kdf_rejected() {
        let sealed = seal(b"key", b"pw").expect("seal");
        let mut envelope: serde_json::Value = serde_json::from_slice(&sealed).unwrap();
        envelope["kdf"]["name"] = "scrypt".into();
        let err = open(&serde_json::to_vec(&envelope).unwrap(), b"pw").unwrap_err();
        assert!(err.to_string().contains("unsupported kdf"));
    }

    #[test]
    fn unknown_cipher_rejected() {
        let sealed = seal(b"key", b"pw").expect("seal");
        let mut envelope: serde_json::Value = serde_json::from_slice(&sealed).unwrap();
        envelope["cipher"]["name"] = "aes-256-cbc".into();
        let err = open(&serde_json::to_vec(&envelope).unwrap(), b"pw").unwrap_err();
        assert!(err.to_string().contains("unsupported cipher"));
    }

    #[test]
    fn parameters_travel_with_the_envelope() {
        let sealed = seal(b"key", b"pw").expect("seal");
        let envelope: serde_json::Value = serde_json::from_slice(&sealed).unwrap();
        assert_eq!(envelope["kdf"]["name"], "argon2id");
        assert!(envelope["kdf"]["params"]["m_cost"].is_u64());
        assert_eq!(envelope["cipher"]["name"], "chacha20poly1305");
    }
}
