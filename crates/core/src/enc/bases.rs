//! Byte encoders shared by every textual representation in the crate.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::hashes::sha256;

/// Length of the cb58 checksum suffix
pub const CHECKSUM_LENGTH: usize = 4;

/// Errors related to textual encodings
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The trailing checksum of a cb58 string did not match its payload
    #[error("Checksum mismatch on cb58 deserialization")]
    Checksum,

    /// A decoded payload does not have the length the target type declares
    #[error("Expected a payload of {expected} bytes. Got {got}.")]
    BadLength {
        /// The declared size of the target type
        expected: usize,
        /// The size of the decoded payload
        got: usize,
    },

    /// The representation identifier is not supported
    #[error("Unknown representation type: {0}")]
    UnknownType(String),

    /// The value carried does not match the representation it was declared as
    #[error("Value does not match representation {0}")]
    MismatchedValue(&'static str),

    /// Bubbled up from the hex decoder
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),

    /// Bubbled up from the base58 decoder
    #[error(transparent)]
    Base58(#[from] bs58::decode::Error),

    /// Bubbled up from the base64 decoder
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),

    /// Bytes were not valid utf8
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A decimal string could not be parsed as an unsigned integer
    #[error("Invalid decimal string: {0:?}")]
    InvalidDecimal(String),
}

/// Type alias for encoding errors
pub type EncodingResult<T> = Result<T, EncodingError>;

/// The 4-byte checksum appended to cb58 payloads: the last 4 bytes of the payload's SHA-256.
pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let digest = sha256(payload);
    let mut checksum = [0u8; CHECKSUM_LENGTH];
    checksum.copy_from_slice(&digest[32 - CHECKSUM_LENGTH..]);
    checksum
}

/// Append the 4-byte checksum to a payload
pub fn add_checksum(payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LENGTH);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum(payload));
    data
}

/// Validate and strip the trailing 4-byte checksum.
pub fn strip_checksum(data: &[u8]) -> EncodingResult<Vec<u8>> {
    if data.len() < CHECKSUM_LENGTH {
        return Err(EncodingError::Checksum);
    }
    let idx = data.len() - CHECKSUM_LENGTH;
    let (payload, check) = data.split_at(idx);
    if checksum(payload).as_slice() != check {
        return Err(EncodingError::Checksum);
    }
    Ok(payload.to_vec())
}

/// Encode bytes as plain base58
pub fn encode_base58(v: &[u8]) -> String {
    bs58::encode(v).into_string()
}

/// Decode a plain base58 string
pub fn decode_base58(s: &str) -> EncodingResult<Vec<u8>> {
    Ok(bs58::decode(s).into_vec()?)
}

/// Encode a payload as cb58: `base58(payload ‖ checksum(payload))`
pub fn encode_cb58(v: &[u8]) -> String {
    encode_base58(&add_checksum(v))
}

/// Decode a cb58 string, validating and stripping its checksum
pub fn decode_cb58(s: &str) -> EncodingResult<Vec<u8>> {
    strip_checksum(&decode_base58(s)?)
}

/// Encode bytes as lowercase hex, without prefix
pub fn encode_hex(v: &[u8]) -> String {
    hex::encode(v)
}

/// Decode a hex string. A leading `0x` is accepted.
pub fn decode_hex(s: &str) -> EncodingResult<Vec<u8>> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    Ok(hex::decode(s)?)
}

/// Encode bytes as standard, padded base64
pub fn encode_base64(v: &[u8]) -> String {
    STANDARD.encode(v)
}

/// Decode a standard, padded base64 string
pub fn decode_base64(s: &str) -> EncodingResult<Vec<u8>> {
    Ok(STANDARD.decode(s)?)
}
