//! A simple trait for binary (de)Serialization using std `Read` and `Write` traits.
//!
//! Every integer on the wire is big-endian. Variable-length fields carry a `u32` length (or
//! item count) prefix.

use std::io::{Cursor, Error as IOError, Read, Write};

use thiserror::Error;

use crate::enc::bases::{self, EncodingError};

/// Errors related to serialization of types.
#[derive(Debug, Error)]
pub enum SerError {
    /// IOError bubbled up from a `Write` passed to a `ByteFormat::write_to` implementation.
    #[error(transparent)]
    IOError(#[from] IOError),

    /// Fewer bytes remain in a buffer than a fixed-length type requires.
    #[error("Buffer too short. Need {need} bytes at offset {offset}. Got {got}.")]
    BufferSize {
        /// The number of bytes the type requires
        need: usize,
        /// The offset the read started at
        offset: usize,
        /// The number of bytes remaining after `offset`
        got: usize,
    },

    /// A type discriminator did not match any known variant.
    #[error("Unknown type id {id} while reading {context}")]
    UnknownTypeId {
        /// The discriminator read from the wire
        id: u32,
        /// What was being read
        context: &'static str,
    },

    /// A sequence or byte string is too long for its `u32` prefix.
    #[error("Sequence of {0} items does not fit a u32 length prefix")]
    SequenceTooLong(usize),

    /// A sequence that must be in canonical order was not.
    #[error("Sequence items are not sorted and unique")]
    UnsortedSequence,

    /// Bytes remained after deserializing a complete item from a buffer.
    #[error("{0} trailing bytes after deserialization")]
    TrailingBytes(usize),

    /// Error bubbled up while decoding a textual representation.
    #[error(transparent)]
    EncodingError(#[from] EncodingError),

    /// A component-specific error with a custom message.
    #[error("{0}")]
    ComponentError(String),
}

/// Type alias for serialization errors
pub type SerResult<T> = Result<T, SerError>;

/// Read a single byte.
pub fn read_u8<R: Read>(reader: &mut R) -> SerResult<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a BE u16
pub fn read_u16<R: Read>(reader: &mut R) -> SerResult<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Read a BE u32
pub fn read_u32<R: Read>(reader: &mut R) -> SerResult<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read a BE u64
pub fn read_u64<R: Read>(reader: &mut R) -> SerResult<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

/// Write a BE u16
pub fn write_u16<W: Write>(writer: &mut W, number: u16) -> SerResult<usize> {
    writer.write_all(&number.to_be_bytes())?;
    Ok(2)
}

/// Write a BE u32
pub fn write_u32<W: Write>(writer: &mut W, number: u32) -> SerResult<usize> {
    writer.write_all(&number.to_be_bytes())?;
    Ok(4)
}

/// Write a BE u64
pub fn write_u64<W: Write>(writer: &mut W, number: u64) -> SerResult<usize> {
    writer.write_all(&number.to_be_bytes())?;
    Ok(8)
}

/// Convert a length to its `u32` wire prefix.
pub fn length_prefix(len: usize) -> SerResult<u32> {
    u32::try_from(len).map_err(|_| SerError::SequenceTooLong(len))
}

/// Read a `u32`-length-prefixed byte string.
pub fn read_prefixed_bytes<R: Read>(reader: &mut R) -> SerResult<Vec<u8>> {
    let len = read_u32(reader)? as u64;
    let mut buf = vec![];
    let read = reader.by_ref().take(len).read_to_end(&mut buf)?;
    if (read as u64) < len {
        return Err(IOError::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    Ok(buf)
}

/// Write a `u32`-length-prefixed byte string.
pub fn write_prefixed_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> SerResult<usize> {
    let written = write_u32(writer, length_prefix(bytes.len())?)?;
    writer.write_all(bytes)?;
    Ok(written + bytes.len())
}

/// A simple trait for deserializing from `std::io::Read` and serializing to `std::io::Write`.
///
/// `ByteFormat` is used for transaction serialization and deserialization, for canonical
/// ordering of outputs and inputs (which compares serialized bytes), and for the message that
/// credentials sign.
pub trait ByteFormat {
    /// An associated error type
    type Error: From<SerError> + From<IOError> + std::error::Error;

    /// Returns the byte-length of the serialized data structure.
    fn serialized_length(&self) -> usize;

    /// Deserializes an instance of `Self` from a `std::io::Read`.
    ///
    /// ```
    /// use avm_core::{ByteFormat, TxId};
    ///
    /// let a = [0u8; 32];
    /// let result = TxId::read_from(&mut a.as_ref()).unwrap();
    ///
    /// assert_eq!(result, TxId::default());
    /// ```
    fn read_from<R>(reader: &mut R) -> Result<Self, Self::Error>
    where
        R: Read,
        Self: std::marker::Sized;

    /// Serializes `self` to a `std::io::Write`. Following `Write` trait conventions, its `Ok`
    /// type is a `usize` denoting the number of bytes written.
    ///
    /// ```
    /// use avm_core::{ByteFormat, TxId};
    ///
    /// let mut buf: Vec<u8> = vec![];
    /// let written = TxId::default().write_to(&mut buf).unwrap();
    ///
    /// assert_eq!(written, 32);
    /// assert_eq!(buf, vec![0u8; 32]);
    /// ```
    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write;

    /// Serializes `self` to a new vector, propagating errors.
    fn try_to_vec(&self) -> Result<Vec<u8>, Self::Error> {
        let mut v = Vec::with_capacity(self.serialized_length());
        self.write_to(&mut v)?;
        Ok(v)
    }

    /// Serializes `self` to a new vector.
    ///
    /// # Panics
    ///
    /// If a sequence holds more than `u32::MAX` items. Use `try_to_vec` to handle that case.
    fn to_vec(&self) -> Vec<u8> {
        self.try_to_vec()
            .expect("No IOError writing to a Vec. Sequence lengths fit a u32 prefix")
    }

    /// Deserializes an instance of `Self` from a byte slice. The slice must be consumed
    /// entirely.
    fn from_slice(bytes: &[u8]) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized,
    {
        let mut cursor = Cursor::new(bytes);
        let item = Self::read_from(&mut cursor)?;
        let remaining = bytes.len() - cursor.position() as usize;
        if remaining != 0 {
            return Err(SerError::TrailingBytes(remaining).into());
        }
        Ok(item)
    }

    /// Decodes a hex string to a `Vec<u8>`, deserializes an instance of `Self` from that vector.
    fn deserialize_hex(s: &str) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized,
    {
        let v = bases::decode_hex(s).map_err(SerError::from)?;
        Self::from_slice(&v)
    }

    /// Serializes `self` to a vector, returns the hex-encoded vector
    fn serialize_hex(&self) -> String {
        hex::encode(self.to_vec())
    }

    /// Decodes a cb58 string, validating its checksum, and deserializes an instance of `Self`.
    fn deserialize_cb58(s: &str) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized,
    {
        let v = bases::decode_cb58(s).map_err(SerError::from)?;
        Self::from_slice(&v)
    }

    /// Serializes `self` to a vector, returns the cb58-encoded vector
    fn serialize_cb58(&self) -> String {
        bases::encode_cb58(&self.to_vec())
    }

    /// Decodes a base64 string to a `Vec<u8>`, deserializes an instance of `Self`.
    fn deserialize_base64(s: &str) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized,
    {
        let v = bases::decode_base64(s).map_err(SerError::from)?;
        Self::from_slice(&v)
    }

    /// Serializes `self` to a vector, returns the base64-encoded vector
    fn serialize_base64(&self) -> String {
        bases::encode_base64(&self.to_vec())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_reads_and_writes_big_endian_integers() {
        let mut buf = vec![];
        write_u16(&mut buf, 0x0102).unwrap();
        write_u32(&mut buf, 0x0304_0506).unwrap();
        write_u64(&mut buf, 0x0708_090a_0b0c_0d0e).unwrap();
        assert_eq!(hex::encode(&buf), "0102030405060708090a0b0c0d0e");

        let mut reader = buf.as_slice();
        assert_eq!(read_u16(&mut reader).unwrap(), 0x0102);
        assert_eq!(read_u32(&mut reader).unwrap(), 0x0304_0506);
        assert_eq!(read_u64(&mut reader).unwrap(), 0x0708_090a_0b0c_0d0e);
        assert!(read_u8(&mut reader).is_err());
    }

    #[test]
    fn it_reads_and_writes_prefixed_bytes() {
        let mut buf = vec![];
        let written = write_prefixed_bytes(&mut buf, b"memo").unwrap();
        assert_eq!(written, 8);
        assert_eq!(hex::encode(&buf), "000000046d656d6f");
        assert_eq!(read_prefixed_bytes(&mut buf.as_slice()).unwrap(), b"memo".to_vec());
    }

    struct Oversized;

    impl ByteFormat for Oversized {
        type Error = SerError;

        fn serialized_length(&self) -> usize {
            4
        }

        fn read_from<R: Read>(_reader: &mut R) -> SerResult<Self> {
            Ok(Oversized)
        }

        fn write_to<W: Write>(&self, writer: &mut W) -> SerResult<usize> {
            write_u32(writer, length_prefix(u32::MAX as usize + 1)?)
        }
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn it_surfaces_oversized_sequences() {
        assert!(matches!(
            Oversized.try_to_vec(),
            Err(SerError::SequenceTooLong(len)) if len == u32::MAX as usize + 1
        ));
        assert!(std::panic::catch_unwind(|| Oversized.to_vec()).is_err());
    }

    #[test]
    fn it_errors_on_truncated_prefixed_bytes() {
        let buf = hex::decode("000000056d656d6f").unwrap();
        assert!(read_prefixed_bytes(&mut buf.as_slice()).is_err());
    }
}
