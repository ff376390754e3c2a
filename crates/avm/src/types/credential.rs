//! Credentials: the signatures authorizing one input.

use std::io::{Read, Write};

use avm_core::{
    fixed_length_bytes,
    ser::{read_u32, write_u32, ByteFormat, SerError, SerResult},
    Seq,
};

fixed_length_bytes!(
    /// A recoverable secp256k1 signature: `r(32) ‖ s(32) ‖ recovery_id(1)`.
    Signature,
    65
);

/// Type id of a secp256k1 credential
pub const SECP_CREDENTIAL_ID: u32 = 9;
/// Type id of an NFT credential
pub const NFT_CREDENTIAL_ID: u32 = 14;

/// The credential kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CredentialKind {
    /// Authorizes secp256k1 transfer and mint inputs
    Secp256k1,
    /// Authorizes NFT operations
    Nft,
}

impl CredentialKind {
    /// The wire type id
    pub fn type_id(&self) -> u32 {
        match self {
            CredentialKind::Secp256k1 => SECP_CREDENTIAL_ID,
            CredentialKind::Nft => NFT_CREDENTIAL_ID,
        }
    }

    /// Look up a kind by wire type id
    pub fn from_type_id(type_id: u32) -> Option<Self> {
        match type_id {
            SECP_CREDENTIAL_ID => Some(CredentialKind::Secp256k1),
            NFT_CREDENTIAL_ID => Some(CredentialKind::Nft),
            _ => None,
        }
    }
}

/// The signatures for one input, in the order of the input's signature indices. Serialized as
/// `type_id(4) ‖ count(4) ‖ signature(65)×`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Credential {
    kind: CredentialKind,
    signatures: Seq<Signature>,
}

impl Credential {
    /// An empty credential of `kind`
    pub fn new(kind: CredentialKind) -> Self {
        Self {
            kind,
            signatures: Seq::null(),
        }
    }

    /// Append a signature
    pub fn add_signature(&mut self, signature: Signature) {
        self.signatures.push(signature)
    }

    /// The credential kind
    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    /// The signatures, in order
    pub fn signatures(&self) -> &[Signature] {
        self.signatures.items()
    }
}

impl ByteFormat for Credential {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        4 + self.signatures.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let type_id = read_u32(reader)?;
        let kind = CredentialKind::from_type_id(type_id).ok_or(SerError::UnknownTypeId {
            id: type_id,
            context: "credential",
        })?;
        Ok(Self {
            kind,
            signatures: Seq::read_from(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let len = write_u32(writer, self.kind.type_id())?;
        Ok(len + self.signatures.write_to(writer)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_serializes_credentials() {
        let mut cred = Credential::new(CredentialKind::Secp256k1);
        cred.add_signature(Signature::new([0xab; 65]));
        cred.add_signature(Signature::new([0x01; 65]));
        let expected = format!("0000000900000002{}{}", "ab".repeat(65), "01".repeat(65));
        assert_eq!(cred.serialize_hex(), expected);
        assert_eq!(cred.serialized_length(), 138);

        let read = Credential::deserialize_hex(&expected).unwrap();
        assert_eq!(read, cred);
        assert_eq!(read.signatures()[0], Signature::new([0xab; 65]));
    }

    #[test]
    fn it_dispatches_credential_kinds() {
        assert_eq!(CredentialKind::from_type_id(14), Some(CredentialKind::Nft));
        assert_eq!(CredentialKind::Nft.type_id(), 14);
        assert_eq!(CredentialKind::from_type_id(5), None);
        assert!(matches!(
            Credential::deserialize_hex("0000000700000000"),
            Err(SerError::UnknownTypeId { id: 7, .. })
        ));
        let empty = Credential::deserialize_hex("0000000e00000000").unwrap();
        assert_eq!(empty.kind(), CredentialKind::Nft);
        assert!(empty.signatures().is_empty());
    }
}
