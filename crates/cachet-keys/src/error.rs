//! Error types for key generation and the at-rest envelope.

/// Errors from the cachet key subsystem.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The password prompt collaborator failed or was refused.
    #[error("password prompt failed: {0}")]
    Prompt(String),

    /// Fresh key material could not be generated.
    #[error("key generation failed: {0}")]
    Generation(String),

    /// Deriving the envelope key from the password failed.
    #[error("key derivation failed: {0}")]
    Derivation(String),

    /// Sealing the private key envelope failed.
    #[error("envelope encryption failed: {0}")]
    Encrypt(String),

    /// Opening the private key envelope failed. Wrong passwords land here:
    /// the AEAD tag check fails deterministically, never yielding
    /// wrong-but-valid key bytes.
    #[error("envelope decryption failed: {0}")]
    Decrypt(String),

    /// An armored block was malformed or carried the wrong type label.
    #[error("invalid armored block: {0}")]
    Armor(String),

    /// The envelope body could not be serialized or parsed.
    #[error("envelope encoding error: {0}")]
    Envelope(#[from] serde_json::Error),
}
