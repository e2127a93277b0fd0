//! Proof Module - session digest committed at end of exam
//!
//! Hash-based integrity digest only; there is no zero-knowledge circuit here.
//!
//! ## Structure
//! - `digest.rs` - `ProofDigest`, canonical payload, SHA-256 helpers
//! - `finalizer.rs` - builds a digest from a frozen ledger + score

pub mod digest;
pub mod finalizer;

pub use digest::{canonical_payload, hash_subject, sha256_hex, ProofDigest};
pub use finalizer::{finalize, generate_salt, FinalizeInput};
