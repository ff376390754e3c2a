//! Useful macros for implementing wire types

#[macro_export]
/// Implement `serde::Serialize` and `serde::Deserialize` by passing through to the cb58 string.
macro_rules! impl_cb58_serde {
    ($item:ty) => {
        impl serde::Serialize for $item {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let s = $crate::ser::ByteFormat::serialize_cb58(self);
                serializer.serialize_str(&s)
            }
        }

        impl<'de> serde::Deserialize<'de> for $item {
            fn deserialize<D>(deserializer: D) -> Result<$item, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s: String = serde::Deserialize::deserialize(deserializer)?;
                <$item>::from_cb58(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
            }
        }
    };
}

#[macro_export]
/// Wrap a fixed-length byte array in a newtype. The declared size is the array length, so
/// `len(bytes) == SIZE` holds for every instance. Implements `ByteFormat`, cb58 parsing and
/// display, and byte-wise ordering.
macro_rules! fixed_length_bytes {
    (
        $(#[$outer:meta])*
        $name:ident, $size:expr
    ) => {
        $(#[$outer])*
        #[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
        pub struct $name(pub [u8; $size]);

        impl $name {
            /// The declared size of the type, in bytes
            pub const SIZE: usize = $size;

            /// Wrap a byte array
            pub const fn new(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }

            /// Read `SIZE` bytes starting at `offset`. Fails if fewer bytes remain.
            pub fn from_bytes(bytes: &[u8], offset: usize) -> $crate::ser::SerResult<Self> {
                let remaining = bytes.len().saturating_sub(offset);
                if remaining < $size {
                    return Err($crate::ser::SerError::BufferSize {
                        need: $size,
                        offset,
                        got: remaining,
                    });
                }
                let mut buf = [0u8; $size];
                buf.copy_from_slice(&bytes[offset..offset + $size]);
                Ok(Self(buf))
            }

            /// Wrap a slice that must be exactly `SIZE` bytes long.
            pub fn from_exact(bytes: &[u8]) -> $crate::enc::bases::EncodingResult<Self> {
                if bytes.len() != $size {
                    return Err($crate::enc::bases::EncodingError::BadLength {
                        expected: $size,
                        got: bytes.len(),
                    });
                }
                let mut buf = [0u8; $size];
                buf.copy_from_slice(bytes);
                Ok(Self(buf))
            }

            /// Parse a cb58 string. The checksum is validated and stripped, and the payload must
            /// be exactly `SIZE` bytes long.
            pub fn from_cb58(s: &str) -> $crate::enc::bases::EncodingResult<Self> {
                let payload = $crate::enc::bases::decode_cb58(s)?;
                Self::from_exact(&payload)
            }

            /// The cb58 representation
            pub fn to_cb58(&self) -> String {
                $crate::enc::bases::encode_cb58(&self.0)
            }

            /// Return a reference to the underlying bytes
            pub fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            /// True if every byte is zero
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $size])
            }
        }

        impl From<[u8; $size]> for $name {
            fn from(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0[..]
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_cb58())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_cb58())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::enc::bases::EncodingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_cb58(s)
            }
        }

        impl $crate::ser::ByteFormat for $name {
            type Error = $crate::ser::SerError;

            fn serialized_length(&self) -> usize {
                $size
            }

            fn read_from<R>(reader: &mut R) -> $crate::ser::SerResult<Self>
            where
                R: std::io::Read,
                Self: std::marker::Sized,
            {
                let mut buf = [0u8; $size];
                reader.read_exact(&mut buf)?;
                Ok(Self(buf))
            }

            fn write_to<W>(&self, writer: &mut W) -> $crate::ser::SerResult<usize>
            where
                W: std::io::Write,
            {
                writer.write_all(&self.0)?;
                Ok($size)
            }
        }

        $crate::impl_cb58_serde!($name);
    };
}
