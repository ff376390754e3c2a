//! Output types. Each output kind is a closed variant of `Output`, dispatched on its wire type
//! id.

use std::{
    cmp::Ordering,
    io::{Read, Write},
};

use avm_core::{
    ser::{
        read_prefixed_bytes, read_u32, read_u64, write_prefixed_bytes, write_u32, write_u64,
        ByteFormat, SerError, SerResult,
    },
    AssetId,
};

use crate::{
    errors::{AvmError, AvmResult},
    types::owners::{Owned, OutputOwners},
};

/// Type id of a secp256k1 mint output
pub const SECP_MINT_OUTPUT_ID: u32 = 6;
/// Type id of a secp256k1 transfer output
pub const SECP_TRANSFER_OUTPUT_ID: u32 = 7;
/// Type id of an NFT mint output
pub const NFT_MINT_OUTPUT_ID: u32 = 10;
/// Type id of an NFT transfer output
pub const NFT_TRANSFER_OUTPUT_ID: u32 = 11;

/// An amount of a fungible asset, locked to an owner set.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AmountOutput {
    /// The amount held
    pub amount: u64,
    /// The spending conditions
    pub owners: OutputOwners,
}

impl AmountOutput {
    /// Instantiate a new amount output
    pub fn new(amount: u64, owners: OutputOwners) -> Self {
        Self { amount, owners }
    }
}

/// The right to mint more of a fungible asset.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MintOutput {
    /// The spending conditions
    pub owners: OutputOwners,
}

/// The right to mint NFTs in a group.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct NftMintOutput {
    /// The NFT group
    pub group_id: u32,
    /// The spending conditions
    pub owners: OutputOwners,
}

/// An NFT and its payload.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct NftTransferOutput {
    /// The NFT group
    pub group_id: u32,
    /// Opaque payload
    pub payload: Vec<u8>,
    /// The spending conditions
    pub owners: OutputOwners,
}

impl ByteFormat for AmountOutput {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        8 + self.owners.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let amount = read_u64(reader)?;
        let owners = OutputOwners::read_from(reader)?;
        Ok(Self { amount, owners })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let len = write_u64(writer, self.amount)?;
        Ok(len + self.owners.write_to(writer)?)
    }
}

impl ByteFormat for MintOutput {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        self.owners.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            owners: OutputOwners::read_from(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        self.owners.write_to(writer)
    }
}

impl ByteFormat for NftMintOutput {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        4 + self.owners.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let group_id = read_u32(reader)?;
        let owners = OutputOwners::read_from(reader)?;
        Ok(Self { group_id, owners })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let len = write_u32(writer, self.group_id)?;
        Ok(len + self.owners.write_to(writer)?)
    }
}

impl ByteFormat for NftTransferOutput {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        8 + self.payload.len() + self.owners.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let group_id = read_u32(reader)?;
        let payload = read_prefixed_bytes(reader)?;
        let owners = OutputOwners::read_from(reader)?;
        Ok(Self {
            group_id,
            payload,
            owners,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = write_u32(writer, self.group_id)?;
        len += write_prefixed_bytes(writer, &self.payload)?;
        len += self.owners.write_to(writer)?;
        Ok(len)
    }
}

/// An output of any kind. Serialized as `type_id(4) ‖ body`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Output {
    /// Type id 7
    SecpTransfer(AmountOutput),
    /// Type id 6
    SecpMint(MintOutput),
    /// Type id 10
    NftMint(NftMintOutput),
    /// Type id 11
    NftTransfer(NftTransferOutput),
}

impl Output {
    /// The wire type id
    pub fn type_id(&self) -> u32 {
        match self {
            Output::SecpTransfer(_) => SECP_TRANSFER_OUTPUT_ID,
            Output::SecpMint(_) => SECP_MINT_OUTPUT_ID,
            Output::NftMint(_) => NFT_MINT_OUTPUT_ID,
            Output::NftTransfer(_) => NFT_TRANSFER_OUTPUT_ID,
        }
    }

    /// The amount held, for amount-bearing outputs
    pub fn amount(&self) -> Option<u64> {
        match self {
            Output::SecpTransfer(o) => Some(o.amount),
            _ => None,
        }
    }

    /// Synthesize an amount-bearing output of the kind identified by `type_id`. Only transfer
    /// outputs carry an amount.
    pub fn amount_output(type_id: u32, amount: u64, owners: OutputOwners) -> AvmResult<Self> {
        match type_id {
            SECP_TRANSFER_OUTPUT_ID => Ok(Output::SecpTransfer(AmountOutput::new(amount, owners))),
            other => Err(AvmError::Validation(format!(
                "output type {} does not carry an amount",
                other
            ))),
        }
    }

    /// Read the body of an output whose type id has already been read.
    pub fn read_body<R>(type_id: u32, reader: &mut R) -> SerResult<Self>
    where
        R: Read,
    {
        match type_id {
            SECP_TRANSFER_OUTPUT_ID => Ok(Output::SecpTransfer(AmountOutput::read_from(reader)?)),
            SECP_MINT_OUTPUT_ID => Ok(Output::SecpMint(MintOutput::read_from(reader)?)),
            NFT_MINT_OUTPUT_ID => Ok(Output::NftMint(NftMintOutput::read_from(reader)?)),
            NFT_TRANSFER_OUTPUT_ID => Ok(Output::NftTransfer(NftTransferOutput::read_from(reader)?)),
            id => Err(SerError::UnknownTypeId {
                id,
                context: "output",
            }),
        }
    }

    /// Write the body without its type id.
    pub fn write_body<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        match self {
            Output::SecpTransfer(o) => o.write_to(writer),
            Output::SecpMint(o) => o.write_to(writer),
            Output::NftMint(o) => o.write_to(writer),
            Output::NftTransfer(o) => o.write_to(writer),
        }
    }
}

impl Owned for Output {
    fn owners(&self) -> &OutputOwners {
        match self {
            Output::SecpTransfer(o) => &o.owners,
            Output::SecpMint(o) => &o.owners,
            Output::NftMint(o) => &o.owners,
            Output::NftTransfer(o) => &o.owners,
        }
    }
}

impl ByteFormat for Output {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        4 + match self {
            Output::SecpTransfer(o) => o.serialized_length(),
            Output::SecpMint(o) => o.serialized_length(),
            Output::NftMint(o) => o.serialized_length(),
            Output::NftTransfer(o) => o.serialized_length(),
        }
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let type_id = read_u32(reader)?;
        Self::read_body(type_id, reader)
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let len = write_u32(writer, self.type_id())?;
        Ok(len + self.write_body(writer)?)
    }
}

/// Outputs sort by type id, then by serialized bytes. The serialized form leads with the type
/// id, so this is byte order of the serialization.
impl Ord for Output {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_vec().cmp(&other.to_vec())
    }
}

impl PartialOrd for Output {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An output tagged with its asset. Serialized as `asset_id(32) ‖ type_id(4) ‖ body`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TransferableOutput {
    /// The asset held
    pub asset_id: AssetId,
    /// The output
    pub output: Output,
}

impl TransferableOutput {
    /// Instantiate a new transferable output
    pub fn new(asset_id: AssetId, output: Output) -> Self {
        Self { asset_id, output }
    }

    /// The amount held, for amount-bearing outputs
    pub fn amount(&self) -> Option<u64> {
        self.output.amount()
    }
}

impl Owned for TransferableOutput {
    fn owners(&self) -> &OutputOwners {
        self.output.owners()
    }
}

impl ByteFormat for TransferableOutput {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        AssetId::SIZE + self.output.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let asset_id = AssetId::read_from(reader)?;
        let output = Output::read_from(reader)?;
        Ok(Self { asset_id, output })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let len = self.asset_id.write_to(writer)?;
        Ok(len + self.output.write_to(writer)?)
    }
}

/// Transferable outputs sort by their full serialization.
impl Ord for TransferableOutput {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_vec().cmp(&other.to_vec())
    }
}

impl PartialOrd for TransferableOutput {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use avm_core::{Address, SortedSeq};

    fn owners(b: u8) -> OutputOwners {
        OutputOwners::single(Address::new([b; 20]))
    }

    #[test]
    fn it_serializes_transferable_outputs() {
        let out = TransferableOutput::new(
            AssetId::new([0xaa; 32]),
            Output::SecpTransfer(AmountOutput::new(1000, owners(0x11))),
        );
        let expected = format!(
            "{}{}{}{}{}{}{}",
            "aa".repeat(32),
            "00000007",
            "00000000000003e8",
            "0000000000000000",
            "00000001",
            "00000001",
            "11".repeat(20)
        );
        assert_eq!(out.serialize_hex(), expected);
        assert_eq!(out.serialized_length(), expected.len() / 2);
        assert_eq!(TransferableOutput::deserialize_hex(&expected).unwrap(), out);
    }

    #[test]
    fn it_dispatches_on_type_id() {
        let cases = [
            Output::SecpTransfer(AmountOutput::new(5, owners(1))),
            Output::SecpMint(MintOutput { owners: owners(2) }),
            Output::NftMint(NftMintOutput {
                group_id: 3,
                owners: owners(3),
            }),
            Output::NftTransfer(NftTransferOutput {
                group_id: 4,
                payload: b"hello".to_vec(),
                owners: owners(4),
            }),
        ];
        let ids = [7u32, 6, 10, 11];
        for ((output, id), owner) in cases.iter().zip(ids.iter()).zip(1u8..) {
            assert_eq!(output.type_id(), *id);
            let bytes = output.to_vec();
            assert_eq!(&bytes[..4], &id.to_be_bytes());
            assert_eq!(bytes.len(), output.serialized_length());
            assert_eq!(&Output::from_slice(&bytes).unwrap(), output);
            assert_eq!(output.owners(), &owners(owner));
        }

        match Output::deserialize_hex("0000000c") {
            Err(SerError::UnknownTypeId { id, .. }) => assert_eq!(id, 12),
            other => panic!("expected unknown type id, got {:?}", other),
        }
    }

    #[test]
    fn it_synthesizes_amount_outputs() {
        let out = Output::amount_output(SECP_TRANSFER_OUTPUT_ID, 9, owners(1)).unwrap();
        assert_eq!(out.amount(), Some(9));
        assert!(Output::amount_output(NFT_TRANSFER_OUTPUT_ID, 9, owners(1)).is_err());
        assert!(Output::SecpMint(MintOutput { owners: owners(1) }).amount().is_none());
    }

    #[test]
    fn it_orders_outputs_canonically() {
        let a = TransferableOutput::new(
            AssetId::new([1; 32]),
            Output::SecpTransfer(AmountOutput::new(9, owners(9))),
        );
        let b = TransferableOutput::new(
            AssetId::new([2; 32]),
            Output::SecpTransfer(AmountOutput::new(1, owners(1))),
        );
        let c = TransferableOutput::new(
            AssetId::new([2; 32]),
            Output::SecpTransfer(AmountOutput::new(2, owners(1))),
        );
        let mint = TransferableOutput::new(
            AssetId::new([2; 32]),
            Output::SecpMint(MintOutput { owners: owners(1) }),
        );
        let seq: SortedSeq<_> = vec![c.clone(), mint.clone(), b.clone(), a.clone()].into();
        assert_eq!(seq.items(), &[a, mint, b, c]);

        // bare outputs sort by type id first
        let transfer = Output::SecpTransfer(AmountOutput::new(0, owners(0)));
        let nft = Output::NftMint(NftMintOutput {
            group_id: 0,
            owners: owners(0),
        });
        assert!(transfer < nft);
    }
}
