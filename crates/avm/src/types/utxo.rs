//! UTXOs and UTXO snapshots.
//!
//! A `Utxo` is keyed by the `(tx_id, output_index)` pair that created it. Its textual id is the
//! cb58 encoding of `tx_id ‖ output_index`.
//!
//! A `UtxoSet` is a caller-provided snapshot. It preserves insertion order, which is the order
//! coin selection visits UTXOs in.

use std::{
    collections::{BTreeSet, HashMap},
    io::{Read, Write},
};

use avm_core::{
    enc::bases::encode_cb58,
    ser::{read_u16, read_u32, write_u16, write_u32, ByteFormat, SerError, SerResult},
    Address, AssetId, TxId,
};

use crate::types::{
    output::Output,
    owners::{Owned, OutputOwners},
};

/// The codec version written in front of serialized UTXOs and transactions
pub const DEFAULT_CODEC_ID: u16 = 0;

/// The key of a UTXO: the creating transaction and the output's position in it
pub type UtxoKey = (TxId, u32);

/// An unspent output. Serialized as
/// `codec_id(2) ‖ tx_id(32) ‖ output_index(4) ‖ asset_id(32) ‖ type_id(4) ‖ output`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Utxo {
    /// Codec version
    pub codec_id: u16,
    /// The creating transaction
    pub tx_id: TxId,
    /// The output's position in the creating transaction
    pub output_index: u32,
    /// The asset held
    pub asset_id: AssetId,
    /// The output
    pub output: Output,
}

impl Utxo {
    /// Instantiate a UTXO with the default codec id
    pub fn new(tx_id: TxId, output_index: u32, asset_id: AssetId, output: Output) -> Self {
        Self {
            codec_id: DEFAULT_CODEC_ID,
            tx_id,
            output_index,
            asset_id,
            output,
        }
    }

    /// The `(tx_id, output_index)` key
    pub fn key(&self) -> UtxoKey {
        (self.tx_id, self.output_index)
    }

    /// The textual id: cb58 of `tx_id ‖ output_index`
    pub fn utxo_id(&self) -> String {
        let mut buf = Vec::with_capacity(TxId::SIZE + 4);
        buf.extend_from_slice(self.tx_id.as_bytes());
        buf.extend_from_slice(&self.output_index.to_be_bytes());
        encode_cb58(&buf)
    }
}

impl Owned for Utxo {
    fn owners(&self) -> &OutputOwners {
        self.output.owners()
    }
}

impl ByteFormat for Utxo {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        2 + TxId::SIZE + 4 + AssetId::SIZE + self.output.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            codec_id: read_u16(reader)?,
            tx_id: TxId::read_from(reader)?,
            output_index: read_u32(reader)?,
            asset_id: AssetId::read_from(reader)?,
            output: Output::read_from(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = write_u16(writer, self.codec_id)?;
        len += self.tx_id.write_to(writer)?;
        len += write_u32(writer, self.output_index)?;
        len += self.asset_id.write_to(writer)?;
        len += self.output.write_to(writer)?;
        Ok(len)
    }
}

/// An insertion-ordered set of UTXOs, unique by key.
#[derive(Clone, Debug, Default)]
pub struct UtxoSet {
    utxos: Vec<Utxo>,
    index: HashMap<UtxoKey, usize>,
}

impl UtxoSet {
    /// An empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a UTXO. If a UTXO with the same key is present it is replaced in place when
    /// `overwrite` is set, and kept otherwise. Returns true if the set changed.
    pub fn add(&mut self, utxo: Utxo, overwrite: bool) -> bool {
        match self.index.get(&utxo.key()) {
            Some(&i) if overwrite => {
                self.utxos[i] = utxo;
                true
            }
            Some(_) => false,
            None => {
                self.index.insert(utxo.key(), self.utxos.len());
                self.utxos.push(utxo);
                true
            }
        }
    }

    /// Add many UTXOs, keeping existing entries. Returns the number added.
    pub fn add_all<I>(&mut self, utxos: I) -> usize
    where
        I: IntoIterator<Item = Utxo>,
    {
        utxos
            .into_iter()
            .map(|u| self.add(u, false))
            .filter(|added| *added)
            .count()
    }

    /// Parse and add a cb58-encoded UTXO
    pub fn add_cb58(&mut self, s: &str, overwrite: bool) -> SerResult<bool> {
        Ok(self.add(Utxo::deserialize_cb58(s)?, overwrite))
    }

    /// Remove a UTXO by key
    pub fn remove(&mut self, key: &UtxoKey) -> Option<Utxo> {
        let i = self.index.remove(key)?;
        let removed = self.utxos.remove(i);
        for idx in self.index.values_mut() {
            if *idx > i {
                *idx -= 1;
            }
        }
        Some(removed)
    }

    /// Look up a UTXO by key
    pub fn get(&self, key: &UtxoKey) -> Option<&Utxo> {
        self.index.get(key).map(|&i| &self.utxos[i])
    }

    /// Look up a UTXO by its textual id
    pub fn get_by_id(&self, utxo_id: &str) -> Option<&Utxo> {
        self.utxos.iter().find(|u| u.utxo_id() == utxo_id)
    }

    /// True if a UTXO with this key is present
    pub fn contains(&self, key: &UtxoKey) -> bool {
        self.index.contains_key(key)
    }

    /// The number of UTXOs
    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    /// True if the set is empty
    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Utxo> {
        self.utxos.iter()
    }

    /// The UTXOs, in insertion order
    pub fn utxos(&self) -> &[Utxo] {
        &self.utxos
    }

    /// The distinct assets held, ascending
    pub fn asset_ids(&self) -> Vec<AssetId> {
        self.utxos
            .iter()
            .map(|u| u.asset_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The distinct owner addresses, ascending
    pub fn addresses(&self) -> Vec<Address> {
        self.utxos
            .iter()
            .flat_map(|u| u.owners().addresses().iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The UTXOs `addresses` can spend as of `as_of`
    pub fn spendable<'a>(
        &'a self,
        addresses: &'a [Address],
        as_of: u64,
    ) -> impl Iterator<Item = &'a Utxo> + 'a {
        self.utxos
            .iter()
            .filter(move |u| u.spendable_by(addresses, as_of))
    }

    /// The total amount of `asset_id` that `addresses` can spend as of `as_of`. Saturates on
    /// overflow.
    pub fn balance(&self, addresses: &[Address], asset_id: &AssetId, as_of: u64) -> u64 {
        self.spendable(addresses, as_of)
            .filter(|u| &u.asset_id == asset_id)
            .filter_map(|u| u.output.amount())
            .fold(0u64, |acc, amount| acc.saturating_add(amount))
    }

    /// UTXOs in either set. Entries of `self` come first.
    pub fn union(&self, other: &UtxoSet) -> UtxoSet {
        let mut out = self.clone();
        out.add_all(other.iter().cloned());
        out
    }

    /// UTXOs in both sets, in the order of `self`
    pub fn intersection(&self, other: &UtxoSet) -> UtxoSet {
        self.filtered(|u| other.contains(&u.key()))
    }

    /// UTXOs in `self` but not in `other`
    pub fn difference(&self, other: &UtxoSet) -> UtxoSet {
        self.filtered(|u| !other.contains(&u.key()))
    }

    fn filtered<F>(&self, f: F) -> UtxoSet
    where
        F: Fn(&Utxo) -> bool,
    {
        let mut out = UtxoSet::new();
        out.add_all(self.utxos.iter().filter(|u| f(u)).cloned());
        out
    }
}

impl FromIterator<Utxo> for UtxoSet {
    fn from_iter<I: IntoIterator<Item = Utxo>>(iter: I) -> Self {
        let mut set = UtxoSet::new();
        set.add_all(iter);
        set
    }
}

impl<'a> IntoIterator for &'a UtxoSet {
    type Item = &'a Utxo;
    type IntoIter = std::slice::Iter<'a, Utxo>;

    fn into_iter(self) -> Self::IntoIter {
        self.utxos.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::output::{AmountOutput, MintOutput};

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    fn utxo(tx: u8, idx: u32, asset: u8, amount: u64, owner: u8) -> Utxo {
        Utxo::new(
            TxId::new([tx; 32]),
            idx,
            AssetId::new([asset; 32]),
            Output::SecpTransfer(AmountOutput::new(amount, OutputOwners::single(addr(owner)))),
        )
    }

    #[test]
    fn it_serializes_utxos() {
        let u = utxo(0xcc, 1, 0xaa, 1000, 0x11);
        let expected = format!(
            "0000{}00000001{}00000007{}{}{}{}{}",
            "cc".repeat(32),
            "aa".repeat(32),
            "00000000000003e8",
            "0000000000000000",
            "00000001",
            "00000001",
            "11".repeat(20)
        );
        assert_eq!(u.serialize_hex(), expected);
        assert_eq!(u.serialized_length(), expected.len() / 2);
        assert_eq!(Utxo::deserialize_hex(&expected).unwrap(), u);
        assert_eq!(Utxo::deserialize_cb58(&u.serialize_cb58()).unwrap(), u);
    }

    #[test]
    fn it_encodes_utxo_ids() {
        let u = utxo(0, 0, 0, 1, 1);
        assert_eq!(u.utxo_id(), encode_cb58(&[0u8; 36]));
        let mut set = UtxoSet::new();
        set.add(u.clone(), false);
        assert_eq!(set.get_by_id(&u.utxo_id()), Some(&u));
    }

    #[test]
    fn it_keeps_insertion_order_and_unique_keys() {
        let mut set = UtxoSet::new();
        assert!(set.add(utxo(2, 0, 1, 10, 1), false));
        assert!(set.add(utxo(1, 0, 1, 20, 1), false));
        assert!(!set.add(utxo(2, 0, 1, 99, 1), false));
        assert_eq!(set.len(), 2);
        assert_eq!(set.utxos()[0].output.amount(), Some(10));

        assert!(set.add(utxo(2, 0, 1, 99, 1), true));
        assert_eq!(set.utxos()[0].output.amount(), Some(99));

        let removed = set.remove(&(TxId::new([2; 32]), 0)).unwrap();
        assert_eq!(removed.output.amount(), Some(99));
        assert_eq!(set.len(), 1);
        assert!(set.get(&(TxId::new([1; 32]), 0)).is_some());
        assert!(set.remove(&(TxId::new([2; 32]), 0)).is_none());
    }

    #[test]
    fn it_computes_balances() {
        let mut locked = utxo(5, 0, 1, 1000, 1);
        locked.output = Output::SecpTransfer(AmountOutput::new(
            1000,
            OutputOwners::new(vec![addr(1)], 500, 1).unwrap(),
        ));
        let set: UtxoSet = vec![
            utxo(1, 0, 1, 10, 1),
            utxo(2, 0, 1, 20, 2),
            utxo(3, 0, 2, 30, 1),
            Utxo::new(
                TxId::new([4; 32]),
                0,
                AssetId::new([1; 32]),
                Output::SecpMint(MintOutput {
                    owners: OutputOwners::single(addr(1)),
                }),
            ),
            locked,
        ]
        .into_iter()
        .collect();

        let asset = AssetId::new([1; 32]);
        assert_eq!(set.balance(&[addr(1)], &asset, 100), 10);
        assert_eq!(set.balance(&[addr(1), addr(2)], &asset, 100), 30);
        assert_eq!(set.balance(&[addr(1)], &asset, 501), 1010);
        assert_eq!(set.asset_ids(), vec![AssetId::new([1; 32]), AssetId::new([2; 32])]);
        assert_eq!(set.addresses(), vec![addr(1), addr(2)]);
        assert_eq!(set.spendable(&[addr(2)], 1).count(), 1);
    }

    #[test]
    fn it_combines_sets() {
        let a: UtxoSet = vec![utxo(1, 0, 1, 1, 1), utxo(2, 0, 1, 1, 1)].into_iter().collect();
        let b: UtxoSet = vec![utxo(2, 0, 1, 1, 1), utxo(3, 0, 1, 1, 1)].into_iter().collect();

        let keys = |s: &UtxoSet| s.iter().map(|u| u.tx_id.0[0]).collect::<Vec<_>>();
        assert_eq!(keys(&a.union(&b)), vec![1, 2, 3]);
        assert_eq!(keys(&a.intersection(&b)), vec![2]);
        assert_eq!(keys(&a.difference(&b)), vec![1]);
        assert_eq!(keys(&b.difference(&a)), vec![3]);
    }
}
