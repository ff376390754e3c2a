//! Conversion between canonical bytes and a closed set of representations.
//!
//! Every conversion passes through the canonical byte form: the input is decoded from its
//! source representation into bytes, and the bytes are encoded into the target representation.
//!
//! ```
//! use avm_core::enc::{ByteCodec, Encoded, Encoding};
//!
//! let hex = Encoded::Text("00".repeat(32));
//! let cb58 = ByteCodec::encode(&hex, Encoding::Hex, Encoding::Cb58, None).unwrap();
//! assert_eq!(cb58, Encoded::Text("11111111111111111111111111111111LpoYY".to_owned()));
//! ```

use std::str::FromStr;

use num_bigint::BigUint;

use crate::enc::bases::{self, EncodingError, EncodingResult};

/// The supported representations of a byte sequence.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Encoding {
    /// Raw bytes
    Bytes,
    /// Lowercase hex, optionally `0x`-prefixed on input
    Hex,
    /// base58 with a trailing 4-byte checksum
    Cb58,
    /// Plain base58
    Base58,
    /// Standard padded base64
    Base64,
    /// utf8 text
    Utf8,
    /// A big-endian unsigned integer, written in decimal
    DecimalString,
    /// A big-endian unsigned integer
    Number,
}

impl Encoding {
    /// The identifier of the representation, as accepted by `from_str`
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Bytes => "bytes",
            Encoding::Hex => "hex",
            Encoding::Cb58 => "cb58",
            Encoding::Base58 => "base58",
            Encoding::Base64 => "base64",
            Encoding::Utf8 => "utf8",
            Encoding::DecimalString => "decimalString",
            Encoding::Number => "number",
        }
    }

    /// True for the integer representations, to which length hints apply
    pub fn is_integer(&self) -> bool {
        matches!(self, Encoding::DecimalString | Encoding::Number)
    }
}

impl FromStr for Encoding {
    type Err = EncodingError;

    fn from_str(s: &str) -> EncodingResult<Self> {
        match s {
            "bytes" | "buffer" => Ok(Encoding::Bytes),
            "hex" => Ok(Encoding::Hex),
            "cb58" => Ok(Encoding::Cb58),
            "base58" => Ok(Encoding::Base58),
            "base64" => Ok(Encoding::Base64),
            "utf8" => Ok(Encoding::Utf8),
            "decimalString" => Ok(Encoding::DecimalString),
            "number" | "bn" => Ok(Encoding::Number),
            other => Err(EncodingError::UnknownType(other.to_owned())),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value in one of the supported representations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Encoded {
    /// `Encoding::Bytes`
    Bytes(Vec<u8>),
    /// Any textual representation
    Text(String),
    /// `Encoding::Number`
    Number(BigUint),
}

impl From<Vec<u8>> for Encoded {
    fn from(v: Vec<u8>) -> Self {
        Encoded::Bytes(v)
    }
}

impl From<&str> for Encoded {
    fn from(s: &str) -> Self {
        Encoded::Text(s.to_owned())
    }
}

impl From<BigUint> for Encoded {
    fn from(n: BigUint) -> Self {
        Encoded::Number(n)
    }
}

/// Stateless conversion between representations. It holds no state, so it may be shared freely.
#[derive(Copy, Clone, Debug, Default)]
pub struct ByteCodec;

impl ByteCodec {
    /// Convert `value`, given in the `source` representation, to the `target` representation.
    ///
    /// When the bytes are produced from an integer representation, `length_hint` left-pads them
    /// with zeros, or keeps only the low-order `length_hint` bytes.
    pub fn encode(
        value: &Encoded,
        source: Encoding,
        target: Encoding,
        length_hint: Option<usize>,
    ) -> EncodingResult<Encoded> {
        let bytes = Self::to_bytes(value, source, length_hint)?;
        Self::from_bytes(&bytes, target)
    }

    /// The inverse of `encode`: convert `value`, given in the `target` representation, back to
    /// the `source` representation.
    pub fn decode(
        value: &Encoded,
        target: Encoding,
        source: Encoding,
        length_hint: Option<usize>,
    ) -> EncodingResult<Encoded> {
        Self::encode(value, target, source, length_hint)
    }

    /// Convert a value in the `source` representation to canonical bytes.
    pub fn to_bytes(
        value: &Encoded,
        source: Encoding,
        length_hint: Option<usize>,
    ) -> EncodingResult<Vec<u8>> {
        let bytes = match (source, value) {
            (Encoding::Bytes, Encoded::Bytes(b)) => b.clone(),
            (Encoding::Hex, Encoded::Text(s)) => bases::decode_hex(s)?,
            (Encoding::Cb58, Encoded::Text(s)) => bases::decode_cb58(s)?,
            (Encoding::Base58, Encoded::Text(s)) => bases::decode_base58(s)?,
            (Encoding::Base64, Encoded::Text(s)) => bases::decode_base64(s)?,
            (Encoding::Utf8, Encoded::Text(s)) => s.as_bytes().to_vec(),
            (Encoding::DecimalString, Encoded::Text(s)) => {
                let n = BigUint::from_str(s)
                    .map_err(|_| EncodingError::InvalidDecimal(s.clone()))?;
                integer_to_bytes(&n, length_hint)
            }
            (Encoding::Number, Encoded::Number(n)) => integer_to_bytes(n, length_hint),
            (source, _) => return Err(EncodingError::MismatchedValue(source.as_str())),
        };
        Ok(bytes)
    }

    /// Convert canonical bytes to the `target` representation.
    pub fn from_bytes(bytes: &[u8], target: Encoding) -> EncodingResult<Encoded> {
        let encoded = match target {
            Encoding::Bytes => Encoded::Bytes(bytes.to_vec()),
            Encoding::Hex => Encoded::Text(bases::encode_hex(bytes)),
            Encoding::Cb58 => Encoded::Text(bases::encode_cb58(bytes)),
            Encoding::Base58 => Encoded::Text(bases::encode_base58(bytes)),
            Encoding::Base64 => Encoded::Text(bases::encode_base64(bytes)),
            Encoding::Utf8 => Encoded::Text(String::from_utf8(bytes.to_vec())?),
            Encoding::DecimalString => {
                Encoded::Text(BigUint::from_bytes_be(bytes).to_str_radix(10))
            }
            Encoding::Number => Encoded::Number(BigUint::from_bytes_be(bytes)),
        };
        Ok(encoded)
    }

    /// Parse both representation identifiers, then `encode`.
    pub fn encode_str(
        value: &Encoded,
        source: &str,
        target: &str,
        length_hint: Option<usize>,
    ) -> EncodingResult<Encoded> {
        Self::encode(value, source.parse()?, target.parse()?, length_hint)
    }
}

/// Big-endian bytes of `n`. With a length hint the result is left-padded with zeros or
/// truncated to its low-order bytes.
pub fn integer_to_bytes(n: &BigUint, length_hint: Option<usize>) -> Vec<u8> {
    let mut bytes = n.to_bytes_be();
    // BigUint zero serializes as [0]
    if bytes == [0] {
        bytes.clear();
    }
    match length_hint {
        Some(len) if bytes.len() < len => {
            let mut padded = vec![0u8; len - bytes.len()];
            padded.extend_from_slice(&bytes);
            padded
        }
        Some(len) => bytes.split_off(bytes.len() - len),
        None if bytes.is_empty() => vec![0],
        None => bytes,
    }
}
