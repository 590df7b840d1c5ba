//! Utility functions and helpers
//!
//! Hashing, time and randomness helpers plus the canonical encoding that
//! every record identity is computed from.

pub mod crypto;
pub mod serialization;

pub use crypto::{current_timestamp, hex_decode, random_nonce, sha256_digest, sha256_hex};

pub use serialization::{canonical_encode, deserialize, CanonicalFormatter};
