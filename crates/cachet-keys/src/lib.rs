//! Key generation and at-rest protection for cachet signing keys.
//!
//! A signing key pair is generated as Ed25519. The private half is sealed
//! in a password-derived encryption envelope (Argon2id + ChaCha20-Poly1305,
//! provided by `aws-lc-rs`) and both halves are wrapped in labelled armored
//! blocks, so they can be written to arbitrary storage without any external
//! metadata and a private envelope can never be mistaken for a public key.

pub mod armor;
pub mod envelope;
pub mod error;
pub mod keypair;

pub use error::KeyError;
pub use keypair::{KeyPair, PublicKey, decrypt_private_key, generate, sign_payload};
