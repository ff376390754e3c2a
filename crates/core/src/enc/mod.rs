//! Textual representations of canonical bytes.
//!
//! `bases` holds the individual encoders (hex, cb58, base58, base64), while `codec` exposes the
//! `ByteCodec`, which converts between any pair of supported representations.

pub mod bases;
pub mod codec;

pub use bases::*;
pub use codec::*;
