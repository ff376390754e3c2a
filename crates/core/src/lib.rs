//! # AVM Core
//!
//! `avm-core` contains the byte-level codec used by the `avm` crate.
//!
//! ## Crate Layout
//!
//! ### Ser
//!
//! The `ByteFormat` trait is a simple serialization API using
//! `std::io::{Read, Write}`. Implementers define the binary serialization
//! format of the type. All integers on the wire are big-endian and no padding
//! is ever inserted. Helpers for reading and writing length-prefixed byte
//! strings and count-prefixed sequences are provided.
//!
//! ### Primitives
//!
//! `Seq` and `SortedSeq` are count-prefixed vectors. A `SortedSeq` keeps its
//! items in canonical (non-decreasing) order at every insertion, so a
//! container can be serialized any number of times without being re-sorted.
//!
//! ### Enc
//!
//! Stateless conversion between canonical bytes and their textual
//! representations: hex, cb58 (checksummed base58), base58, base64, utf8 and
//! big-endian integers.
//!
//! ### Ids
//!
//! Fixed-length byte wrappers, generated with the `fixed_length_bytes!`
//! macro. E.g. `TxId` and `AssetId` are 32-byte identifiers, while `Address`
//! is the 20-byte hash of a public key.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

#[macro_use]
pub mod macros;

pub mod enc;
pub mod hashes;
pub mod ids;
pub mod primitives;
pub mod ser;

pub use enc::*;
pub use ids::*;
pub use primitives::*;
pub use ser::*;
