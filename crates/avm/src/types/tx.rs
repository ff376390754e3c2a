//! Transaction types.
//!
//! Every list of inputs or outputs in a transaction is a `SortedSeq`, so a transaction always
//! serializes in canonical order, however it was assembled.

use std::{
    collections::HashSet,
    io::{Read, Write},
};

use avm_core::{
    hashes::sha256,
    ser::{
        read_prefixed_bytes, read_u16, read_u32, write_prefixed_bytes, write_u16, write_u32,
        ByteFormat, SerError, SerResult,
    },
    AssetId, BlockchainId, Seq, SortedSeq, TxId,
};

use crate::{
    builder::BuildStage,
    errors::{AvmError, AvmResult},
    keychain::KeySource,
    nets::{ChainKind, TxKind},
    types::{
        credential::Credential,
        input::TransferableInput,
        output::TransferableOutput,
        owners::Owned,
        utxo::DEFAULT_CODEC_ID,
    },
};

/// Maximum memo length, in bytes
pub const MAX_MEMO_SIZE: usize = 256;

/// The fields common to every transaction. Serialized as
/// `network_id(4) ‖ blockchain_id(32) ‖ outputs ‖ inputs ‖ memo`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BaseTx {
    network_id: u32,
    blockchain_id: BlockchainId,
    outputs: SortedSeq<TransferableOutput>,
    inputs: SortedSeq<TransferableInput>,
    memo: Vec<u8>,
}

impl BaseTx {
    /// Instantiate a base transaction. Inputs and outputs are sorted into canonical order.
    /// Fails if the memo exceeds `MAX_MEMO_SIZE`.
    pub fn new<O, I>(
        network_id: u32,
        blockchain_id: BlockchainId,
        outputs: O,
        inputs: I,
        memo: Vec<u8>,
    ) -> AvmResult<Self>
    where
        O: IntoIterator<Item = TransferableOutput>,
        I: IntoIterator<Item = TransferableInput>,
    {
        if memo.len() > MAX_MEMO_SIZE {
            return Err(AvmError::Validation(format!(
                "memo of {} bytes exceeds the {} byte limit",
                memo.len(),
                MAX_MEMO_SIZE
            )));
        }
        Ok(Self {
            network_id,
            blockchain_id,
            outputs: outputs.into_iter().collect(),
            inputs: inputs.into_iter().collect(),
            memo,
        })
    }

    /// The network id
    pub fn network_id(&self) -> u32 {
        self.network_id
    }

    /// The id of the chain the transaction is issued on
    pub fn blockchain_id(&self) -> BlockchainId {
        self.blockchain_id
    }

    /// Outputs created on the issuing chain, in canonical order
    pub fn outputs(&self) -> &[TransferableOutput] {
        self.outputs.items()
    }

    /// Inputs spent on the issuing chain, in canonical order
    pub fn inputs(&self) -> &[TransferableInput] {
        self.inputs.items()
    }

    /// The memo
    pub fn memo(&self) -> &[u8] {
        &self.memo
    }
}

impl ByteFormat for BaseTx {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        4 + BlockchainId::SIZE
            + self.outputs.serialized_length()
            + self.inputs.serialized_length()
            + 4
            + self.memo.len()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let network_id = read_u32(reader)?;
        let blockchain_id = BlockchainId::read_from(reader)?;
        let outputs = SortedSeq::read_from(reader)?;
        let inputs = SortedSeq::read_from(reader)?;
        let memo = read_prefixed_bytes(reader)?;
        if memo.len() > MAX_MEMO_SIZE {
            return Err(SerError::ComponentError(format!(
                "memo of {} bytes exceeds the {} byte limit",
                memo.len(),
                MAX_MEMO_SIZE
            )));
        }
        Ok(Self {
            network_id,
            blockchain_id,
            outputs,
            inputs,
            memo,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = write_u32(writer, self.network_id)?;
        len += self.blockchain_id.write_to(writer)?;
        len += self.outputs.write_to(writer)?;
        len += self.inputs.write_to(writer)?;
        len += write_prefixed_bytes(writer, &self.memo)?;
        Ok(len)
    }
}

/// Consumes outputs exported to this chain from another chain's shared memory. Serialized as
/// `base ‖ source_chain(32) ‖ imported_inputs`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ImportTx {
    base: BaseTx,
    source_chain: BlockchainId,
    imported_inputs: SortedSeq<TransferableInput>,
}

impl ImportTx {
    /// Instantiate an import transaction.
    ///
    /// Fails if two base outputs pay the same address in the same asset, or if the fee-asset
    /// inputs less the fee-asset outputs do not cover `fee`.
    pub fn new<I>(
        base: BaseTx,
        source_chain: BlockchainId,
        imported_inputs: I,
        fee_asset_id: AssetId,
        fee: u64,
    ) -> AvmResult<Self>
    where
        I: IntoIterator<Item = TransferableInput>,
    {
        let mut seen = HashSet::new();
        for output in base.outputs() {
            for address in output.owners().addresses() {
                if !seen.insert((*address, output.asset_id)) {
                    return Err(AvmError::DuplicateOutput {
                        address: *address,
                        asset_id: output.asset_id,
                    });
                }
            }
        }

        let tx = Self {
            base,
            source_chain,
            imported_inputs: imported_inputs.into_iter().collect(),
        };

        let consumed = tx
            .all_inputs()
            .filter(|i| i.asset_id == fee_asset_id)
            .try_fold(0u64, |acc, i| acc.checked_add(i.input.amount()))
            .ok_or(AvmError::Overflow("imported input total"))?;
        let produced = tx
            .base
            .outputs()
            .iter()
            .filter(|o| o.asset_id == fee_asset_id)
            .filter_map(TransferableOutput::amount)
            .try_fold(0u64, |acc, a| acc.checked_add(a))
            .ok_or(AvmError::Overflow("import output total"))?;
        let available = consumed.saturating_sub(produced);
        if available < fee {
            return Err(AvmError::Fee {
                required: fee,
                available,
            });
        }
        Ok(tx)
    }

    /// The base transaction
    pub fn base(&self) -> &BaseTx {
        &self.base
    }

    /// The chain the imported outputs come from
    pub fn source_chain(&self) -> BlockchainId {
        self.source_chain
    }

    /// Inputs spending the imported outputs, in canonical order
    pub fn imported_inputs(&self) -> &[TransferableInput] {
        self.imported_inputs.items()
    }

    /// Base inputs followed by imported inputs
    pub fn all_inputs(&self) -> impl Iterator<Item = &TransferableInput> {
        self.base.inputs().iter().chain(self.imported_inputs.iter())
    }
}

impl ByteFormat for ImportTx {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        self.base.serialized_length()
            + BlockchainId::SIZE
            + self.imported_inputs.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            base: BaseTx::read_from(reader)?,
            source_chain: BlockchainId::read_from(reader)?,
            imported_inputs: SortedSeq::read_from(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = self.base.write_to(writer)?;
        len += self.source_chain.write_to(writer)?;
        len += self.imported_inputs.write_to(writer)?;
        Ok(len)
    }
}

/// Moves outputs into another chain's shared memory. Serialized as
/// `base ‖ destination_chain(32) ‖ exported_outputs`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ExportTx {
    base: BaseTx,
    destination_chain: BlockchainId,
    exported_outputs: SortedSeq<TransferableOutput>,
}

impl ExportTx {
    /// Instantiate an export transaction
    pub fn new<O>(base: BaseTx, destination_chain: BlockchainId, exported_outputs: O) -> Self
    where
        O: IntoIterator<Item = TransferableOutput>,
    {
        Self {
            base,
            destination_chain,
            exported_outputs: exported_outputs.into_iter().collect(),
        }
    }

    /// The base transaction
    pub fn base(&self) -> &BaseTx {
        &self.base
    }

    /// The chain receiving the exported outputs
    pub fn destination_chain(&self) -> BlockchainId {
        self.destination_chain
    }

    /// Outputs placed in shared memory, in canonical order
    pub fn exported_outputs(&self) -> &[TransferableOutput] {
        self.exported_outputs.items()
    }
}

impl ByteFormat for ExportTx {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        self.base.serialized_length()
            + BlockchainId::SIZE
            + self.exported_outputs.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            base: BaseTx::read_from(reader)?,
            destination_chain: BlockchainId::read_from(reader)?,
            exported_outputs: SortedSeq::read_from(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = self.base.write_to(writer)?;
        len += self.destination_chain.write_to(writer)?;
        len += self.exported_outputs.write_to(writer)?;
        Ok(len)
    }
}

/// A transaction body.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TxBody {
    /// A transfer on the issuing chain
    Base(BaseTx),
    /// An import
    Import(ImportTx),
    /// An export
    Export(ExportTx),
}

impl TxBody {
    /// The body kind
    pub fn kind(&self) -> TxKind {
        match self {
            TxBody::Base(_) => TxKind::Base,
            TxBody::Import(_) => TxKind::Import,
            TxBody::Export(_) => TxKind::Export,
        }
    }

    /// The base transaction
    pub fn base(&self) -> &BaseTx {
        match self {
            TxBody::Base(tx) => tx,
            TxBody::Import(tx) => tx.base(),
            TxBody::Export(tx) => tx.base(),
        }
    }

    /// Every input the transaction spends, in signing order: base inputs, then imported inputs.
    pub fn inputs(&self) -> Vec<&TransferableInput> {
        match self {
            TxBody::Import(tx) => tx.all_inputs().collect(),
            _ => self.base().inputs().iter().collect(),
        }
    }

    /// Every output the transaction creates: base outputs, then exported outputs.
    pub fn outputs(&self) -> Vec<&TransferableOutput> {
        let base = self.base().outputs().iter();
        match self {
            TxBody::Export(tx) => base.chain(tx.exported_outputs().iter()).collect(),
            _ => base.collect(),
        }
    }

    fn serialized_length(&self) -> usize {
        match self {
            TxBody::Base(tx) => tx.serialized_length(),
            TxBody::Import(tx) => tx.serialized_length(),
            TxBody::Export(tx) => tx.serialized_length(),
        }
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> SerResult<usize> {
        match self {
            TxBody::Base(tx) => tx.write_to(writer),
            TxBody::Import(tx) => tx.write_to(writer),
            TxBody::Export(tx) => tx.write_to(writer),
        }
    }
}

/// A transaction awaiting credentials. Serialized as `codec_id(2) ‖ type_id(4) ‖ body`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct UnsignedTx {
    codec_id: u16,
    chain: ChainKind,
    type_id: u32,
    body: TxBody,
}

impl UnsignedTx {
    /// Wrap a body for a chain. Fails if the chain has no transaction of the body's kind.
    pub fn new(chain: ChainKind, body: TxBody) -> AvmResult<Self> {
        let type_id = chain.tx_type_id(body.kind()).ok_or_else(|| {
            AvmError::Validation(format!("{:?} chain has no {:?} transaction", chain, body.kind()))
        })?;
        Ok(Self {
            codec_id: DEFAULT_CODEC_ID,
            chain,
            type_id,
            body,
        })
    }

    /// The codec version
    pub fn codec_id(&self) -> u16 {
        self.codec_id
    }

    /// The chain kind
    pub fn chain(&self) -> ChainKind {
        self.chain
    }

    /// The wire type id of the body
    pub fn type_id(&self) -> u32 {
        self.type_id
    }

    /// The body
    pub fn body(&self) -> &TxBody {
        &self.body
    }

    /// The message credentials sign: the SHA-256 of the unsigned serialization
    pub fn signing_message(&self) -> [u8; 32] {
        sha256(&self.to_vec())
    }

    /// Produce one credential per spent input, base inputs first, then imported inputs. Each
    /// credential holds one signature per signature index, in index order.
    ///
    /// Fails with `MissingKey` if any signer cannot be resolved.
    #[tracing::instrument(skip_all, err)]
    pub fn sign<K: KeySource>(self, keys: &K) -> AvmResult<Tx> {
        let message = sha256(&self.try_to_vec()?);
        let mut credentials = Seq::null();
        for input in self.body.inputs() {
            let mut credential = Credential::new(input.input.credential_kind());
            for sig_idx in input.input.sig_indices() {
                let key = keys.resolve(&sig_idx.source)?;
                credential.add_signature(keys.sign(&key, &message)?);
            }
            credentials.push(credential);
        }
        tracing::debug!(
            stage = %BuildStage::Signed,
            credentials = credentials.len(),
            type_id = self.type_id,
            "signed transaction"
        );
        Ok(Tx {
            unsigned: self,
            credentials,
        })
    }
}

impl ByteFormat for UnsignedTx {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        6 + self.body.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let codec_id = read_u16(reader)?;
        let type_id = read_u32(reader)?;
        let (chain, kind) = ChainKind::from_tx_type_id(type_id).ok_or(SerError::UnknownTypeId {
            id: type_id,
            context: "transaction",
        })?;
        let body = match kind {
            TxKind::Base => TxBody::Base(BaseTx::read_from(reader)?),
            TxKind::Import => TxBody::Import(ImportTx::read_from(reader)?),
            TxKind::Export => TxBody::Export(ExportTx::read_from(reader)?),
        };
        Ok(Self {
            codec_id,
            chain,
            type_id,
            body,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = write_u16(writer, self.codec_id)?;
        len += write_u32(writer, self.type_id)?;
        len += self.body.write_to(writer)?;
        Ok(len)
    }
}

/// A signed transaction. Serialized as `unsigned ‖ credentials`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Tx {
    unsigned: UnsignedTx,
    credentials: Seq<Credential>,
}

impl Tx {
    /// The unsigned transaction
    pub fn unsigned(&self) -> &UnsignedTx {
        &self.unsigned
    }

    /// The credentials, one per spent input
    pub fn credentials(&self) -> &[Credential] {
        self.credentials.items()
    }

    /// The transaction id: the SHA-256 of the signed serialization
    pub fn tx_id(&self) -> TxId {
        TxId::new(sha256(&self.to_vec()))
    }
}

impl ByteFormat for Tx {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        self.unsigned.serialized_length() + self.credentials.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            unsigned: UnsignedTx::read_from(reader)?,
            credentials: Seq::read_from(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let len = self.unsigned.write_to(writer)?;
        Ok(len + self.credentials.write_to(writer)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{
        input::{AmountInput, Input},
        output::{AmountOutput, Output},
        owners::OutputOwners,
    };
    use avm_core::Address;

    fn output(asset: u8, amount: u64, owner: u8) -> TransferableOutput {
        TransferableOutput::new(
            AssetId::new([asset; 32]),
            Output::SecpTransfer(AmountOutput::new(
                amount,
                OutputOwners::single(Address::new([owner; 20])),
            )),
        )
    }

    fn input(tx: u8, asset: u8, amount: u64) -> TransferableInput {
        let mut body = AmountInput::new(amount);
        body.add_sig_idx(0, Address::new([1; 20]));
        TransferableInput::new(
            TxId::new([tx; 32]),
            0,
            AssetId::new([asset; 32]),
            Input::SecpTransfer(body),
        )
    }

    #[test]
    fn it_serializes_an_empty_base_tx() {
        let base = BaseTx::new(1, BlockchainId::new([2; 32]), vec![], vec![], b"hi".to_vec()).unwrap();
        let tx = UnsignedTx::new(ChainKind::Avm, TxBody::Base(base)).unwrap();
        let expected = format!(
            "0000{}{}{}{}{}{}",
            "00000000",
            "00000001",
            "02".repeat(32),
            "00000000",
            "00000000",
            "000000026869"
        );
        assert_eq!(tx.serialize_hex(), expected);
        assert_eq!(tx.serialized_length(), expected.len() / 2);
        assert_eq!(UnsignedTx::deserialize_hex(&expected).unwrap(), tx);
    }

    #[test]
    fn it_rejects_long_memos() {
        let memo = vec![0u8; MAX_MEMO_SIZE + 1];
        assert!(matches!(
            BaseTx::new(1, BlockchainId::default(), vec![], vec![], memo),
            Err(AvmError::Validation(_))
        ));
        assert!(BaseTx::new(1, BlockchainId::default(), vec![], vec![], vec![0; MAX_MEMO_SIZE]).is_ok());
    }

    #[test]
    fn it_sorts_regardless_of_assembly_order() {
        let outs = vec![output(2, 5, 1), output(1, 5, 1), output(1, 3, 2)];
        let ins = vec![input(9, 1, 10), input(3, 1, 10)];
        let a = BaseTx::new(1, BlockchainId::default(), outs.clone(), ins.clone(), vec![]).unwrap();
        let b = BaseTx::new(
            1,
            BlockchainId::default(),
            outs.into_iter().rev(),
            ins.into_iter().rev(),
            vec![],
        )
        .unwrap();
        assert_eq!(a.to_vec(), b.to_vec());
        assert_eq!(a.inputs()[0].tx_id, TxId::new([3; 32]));
        assert_eq!(a.outputs()[0].asset_id, AssetId::new([1; 32]));
    }

    #[test]
    fn it_validates_import_txs() {
        let fee_asset = AssetId::new([1; 32]);
        let source = BlockchainId::new([7; 32]);

        // two outputs to the same address in the same asset
        let base = BaseTx::new(1, BlockchainId::default(), vec![output(2, 5, 1), output(2, 6, 1)], vec![], vec![]).unwrap();
        match ImportTx::new(base, source, vec![input(1, 1, 10)], fee_asset, 1) {
            Err(AvmError::DuplicateOutput { address, asset_id }) => {
                assert_eq!(address, Address::new([1; 20]));
                assert_eq!(asset_id, AssetId::new([2; 32]));
            }
            other => panic!("expected duplicate output, got {:?}", other),
        }

        // fee not covered: 10 in, 9 out, fee 2
        let base = BaseTx::new(1, BlockchainId::default(), vec![output(1, 9, 1)], vec![], vec![]).unwrap();
        match ImportTx::new(base.clone(), source, vec![input(1, 1, 10)], fee_asset, 2) {
            Err(AvmError::Fee { required, available }) => assert_eq!((required, available), (2, 1)),
            other => panic!("expected fee error, got {:?}", other),
        }
        let tx = ImportTx::new(base, source, vec![input(1, 1, 10)], fee_asset, 1).unwrap();
        assert_eq!(tx.all_inputs().count(), 1);
        let read = ImportTx::from_slice(&tx.to_vec()).unwrap();
        assert_eq!(read.to_vec(), tx.to_vec());
    }

    #[test]
    fn it_has_no_platform_base_tx() {
        let base = BaseTx::new(1, BlockchainId::default(), vec![], vec![], vec![]).unwrap();
        assert!(matches!(
            UnsignedTx::new(ChainKind::Platform, TxBody::Base(base.clone())),
            Err(AvmError::Validation(_))
        ));
        let export = ExportTx::new(base, BlockchainId::new([9; 32]), vec![output(1, 1, 1)]);
        let tx = UnsignedTx::new(ChainKind::Platform, TxBody::Export(export)).unwrap();
        assert_eq!(tx.type_id(), 18);
        assert_eq!(tx.body().outputs().len(), 1);
        assert_eq!(UnsignedTx::from_slice(&tx.to_vec()).unwrap().chain(), ChainKind::Platform);
    }
}
