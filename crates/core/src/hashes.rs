//! Holds utilities for working with cryptographic digests.
//!
//! Transaction ids, signed messages and cb58 checksums use SHA-256. Addresses are the
//! RIPEMD-160 of the SHA-256 of a compressed public key.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// The SHA-256 digest of `data`
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// `ripemd160(sha256(data))`, as used for addresses
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}
