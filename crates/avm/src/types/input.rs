//! Input types.

use std::{
    cmp::Ordering,
    io::{Read, Write},
};

use avm_core::{
    ser::{length_prefix, read_u32, read_u64, write_u32, write_u64, ByteFormat, SerError, SerResult},
    Address, AssetId, TxId,
};

use crate::types::credential::CredentialKind;

/// Type id of a secp256k1 transfer input
pub const SECP_TRANSFER_INPUT_ID: u32 = 5;

/// A signature index: the position of a signer in the spent output's owner list. The signer's
/// address is carried alongside for key lookup but is not serialized.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct SigIdx {
    /// Position in the owner list
    pub address_index: u32,
    /// The signer. `Address::default()` when read from the wire.
    pub source: Address,
}

impl SigIdx {
    /// Instantiate a new signature index
    pub fn new(address_index: u32, source: Address) -> Self {
        Self {
            address_index,
            source,
        }
    }
}

/// Spends an amount output.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct AmountInput {
    /// The amount of the spent output
    pub amount: u64,
    sig_indices: Vec<SigIdx>,
}

impl AmountInput {
    /// Instantiate an input with no signature indices
    pub fn new(amount: u64) -> Self {
        Self {
            amount,
            sig_indices: vec![],
        }
    }

    /// Append a signature index
    pub fn add_sig_idx(&mut self, address_index: u32, source: Address) {
        self.sig_indices.push(SigIdx::new(address_index, source))
    }

    /// The signature indices, in signing order
    pub fn sig_indices(&self) -> &[SigIdx] {
        &self.sig_indices
    }
}

impl ByteFormat for AmountInput {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        12 + 4 * self.sig_indices.len()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let amount = read_u64(reader)?;
        let count = read_u32(reader)?;
        let mut sig_indices = Vec::with_capacity((count as usize).min(64));
        for _ in 0..count {
            sig_indices.push(SigIdx::new(read_u32(reader)?, Address::default()));
        }
        Ok(Self {
            amount,
            sig_indices,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = write_u64(writer, self.amount)?;
        len += write_u32(writer, length_prefix(self.sig_indices.len())?)?;
        for idx in self.sig_indices.iter() {
            len += write_u32(writer, idx.address_index)?;
        }
        Ok(len)
    }
}

/// An input of any kind. Serialized as `type_id(4) ‖ body`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Input {
    /// Type id 5
    SecpTransfer(AmountInput),
}

impl Input {
    /// The wire type id
    pub fn type_id(&self) -> u32 {
        match self {
            Input::SecpTransfer(_) => SECP_TRANSFER_INPUT_ID,
        }
    }

    /// The kind of credential that authorizes this input
    pub fn credential_kind(&self) -> CredentialKind {
        match self {
            Input::SecpTransfer(_) => CredentialKind::Secp256k1,
        }
    }

    /// The amount consumed
    pub fn amount(&self) -> u64 {
        match self {
            Input::SecpTransfer(i) => i.amount,
        }
    }

    /// The signature indices, in signing order
    pub fn sig_indices(&self) -> &[SigIdx] {
        match self {
            Input::SecpTransfer(i) => i.sig_indices(),
        }
    }
}

impl ByteFormat for Input {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        4 + match self {
            Input::SecpTransfer(i) => i.serialized_length(),
        }
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        match read_u32(reader)? {
            SECP_TRANSFER_INPUT_ID => Ok(Input::SecpTransfer(AmountInput::read_from(reader)?)),
            id => Err(SerError::UnknownTypeId { id, context: "input" }),
        }
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let len = write_u32(writer, self.type_id())?;
        Ok(len + match self {
            Input::SecpTransfer(i) => i.write_to(writer)?,
        })
    }
}

/// Inputs sort by type id, then by serialized bytes. Signer addresses break ties so that the
/// ordering agrees with equality.
impl Ord for Input {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_vec().cmp(&other.to_vec()).then_with(|| {
            let signers = |i: &Input| i.sig_indices().iter().map(|s| s.source).collect::<Vec<_>>();
            signers(self).cmp(&signers(other))
        })
    }
}

impl PartialOrd for Input {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An input spending a specific UTXO. Serialized as
/// `tx_id(32) ‖ output_index(4) ‖ asset_id(32) ‖ type_id(4) ‖ body`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TransferableInput {
    /// The transaction that created the spent UTXO
    pub tx_id: TxId,
    /// The index of the spent UTXO in that transaction
    pub output_index: u32,
    /// The asset spent
    pub asset_id: AssetId,
    /// The input
    pub input: Input,
}

impl TransferableInput {
    /// Instantiate a new transferable input
    pub fn new(tx_id: TxId, output_index: u32, asset_id: AssetId, input: Input) -> Self {
        Self {
            tx_id,
            output_index,
            asset_id,
            input,
        }
    }

    /// The `(tx_id, output_index)` key of the spent UTXO
    pub fn utxo_key(&self) -> (TxId, u32) {
        (self.tx_id, self.output_index)
    }
}

impl ByteFormat for TransferableInput {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        TxId::SIZE + 4 + AssetId::SIZE + self.input.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let tx_id = TxId::read_from(reader)?;
        let output_index = read_u32(reader)?;
        let asset_id = AssetId::read_from(reader)?;
        let input = Input::read_from(reader)?;
        Ok(Self::new(tx_id, output_index, asset_id, input))
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = self.tx_id.write_to(writer)?;
        len += write_u32(writer, self.output_index)?;
        len += self.asset_id.write_to(writer)?;
        len += self.input.write_to(writer)?;
        Ok(len)
    }
}

/// Transferable inputs sort by the spent UTXO's `(tx_id, output_index)`. Remaining fields break
/// ties so that the ordering agrees with equality.
impl Ord for TransferableInput {
    fn cmp(&self, other: &Self) -> Ordering {
        self.utxo_key()
            .cmp(&other.utxo_key())
            .then_with(|| self.asset_id.cmp(&other.asset_id))
            .then_with(|| self.input.cmp(&other.input))
    }
}

impl PartialOrd for TransferableInput {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use avm_core::SortedSeq;

    fn input(tx: u8, idx: u32, amount: u64) -> TransferableInput {
        let mut body = AmountInput::new(amount);
        body.add_sig_idx(0, Address::new([1; 20]));
        TransferableInput::new(
            TxId::new([tx; 32]),
            idx,
            AssetId::new([0xaa; 32]),
            Input::SecpTransfer(body),
        )
    }

    #[test]
    fn it_serializes_transferable_inputs() {
        let mut body = AmountInput::new(0x0102);
        body.add_sig_idx(0, Address::new([1; 20]));
        body.add_sig_idx(3, Address::new([2; 20]));
        let input = TransferableInput::new(
            TxId::new([0xcc; 32]),
            2,
            AssetId::new([0xaa; 32]),
            Input::SecpTransfer(body),
        );
        let expected = format!(
            "{}00000002{}00000005{}{}{}{}",
            "cc".repeat(32),
            "aa".repeat(32),
            "0000000000000102",
            "00000002",
            "00000000",
            "00000003"
        );
        assert_eq!(input.serialize_hex(), expected);
        assert_eq!(input.serialized_length(), expected.len() / 2);

        // signer addresses do not survive the wire
        let read = TransferableInput::deserialize_hex(&expected).unwrap();
        assert_eq!(read.to_vec(), input.to_vec());
        assert_eq!(read.input.sig_indices()[1], SigIdx::new(3, Address::default()));
        assert_eq!(read.input.amount(), 0x0102);
        assert_eq!(read.input.credential_kind(), CredentialKind::Secp256k1);
    }

    #[test]
    fn it_orders_inputs_by_utxo() {
        let seq: SortedSeq<_> = vec![input(2, 0, 1), input(1, 5, 1), input(1, 1, 9)].into();
        let keys: Vec<_> = seq.iter().map(|i| i.utxo_key()).collect();
        assert_eq!(
            keys,
            vec![
                (TxId::new([1; 32]), 1),
                (TxId::new([1; 32]), 5),
                (TxId::new([2; 32]), 0)
            ]
        );
    }

    #[test]
    fn it_rejects_unknown_input_types() {
        assert!(matches!(
            Input::deserialize_hex("00000006"),
            Err(SerError::UnknownTypeId { id: 6, .. })
        ));
    }
}
