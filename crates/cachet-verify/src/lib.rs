//! Signature verification policy engine for container image artifacts.
//!
//! Given an image reference, the candidate signatures a registry
//! collaborator associates with it, and a caller-supplied trust policy,
//! the engine decides which signatures are trusted and reports a
//! checklist of every policy predicate it evaluated.
//!
//! The pipeline for one image:
//! 1. **Configuration** — key-source exclusivity, validated before any I/O
//! 2. **Resolution** — the reference is pinned to a manifest digest
//! 3. **Predicates** — annotations, claims, transparency log, public key,
//!    and certificate roots, evaluated per signature in a fixed order
//!
//! Registry and transparency-log access are narrow traits; remote
//! transports live outside this crate.

pub mod cert;
pub mod config;
pub mod engine;
pub mod error;
pub mod flags;
pub mod local;
pub mod payload;
pub mod registry;
pub mod render;
pub mod tlog;

// Re-export primary types for convenience.
pub use config::PolicyConfig;
pub use engine::{ChecklistEntry, VerificationRecord, Verifier};
pub use error::VerificationError;
pub use registry::{CandidateSignature, CanonicalRef, Registry};
pub use render::OutputFormat;
pub use tlog::TransparencyLog;
