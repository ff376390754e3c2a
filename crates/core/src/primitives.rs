//! Count-prefixed vectors.
//!
//! On the wire, a vector is a BE `u32` item count followed by the serialized items.
//!
//! - `Seq<T>` preserves insertion order. Used for signature indices and credentials.
//! - `SortedSeq<T>` keeps its items in non-decreasing order at all times. Every insertion
//!     places the item at its sorted position, so serialization never needs to re-sort. Used
//!     for owner addresses and for transaction input and output lists.

use std::io::{Read, Write};
use std::ops::Index;

use crate::ser::{length_prefix, read_u32, write_u32, ByteFormat, SerError};

/// Bound on speculative allocation when reading an untrusted count prefix
const PREALLOCATION_LIMIT: usize = 256;

/// Read a count-prefixed vector of items.
pub fn read_items<R, T>(reader: &mut R) -> Result<Vec<T>, T::Error>
where
    R: Read,
    T: ByteFormat,
{
    let count = read_u32(reader)? as usize;
    let mut items = Vec::with_capacity(count.min(PREALLOCATION_LIMIT));
    for _ in 0..count {
        items.push(T::read_from(reader)?);
    }
    Ok(items)
}

/// Write a count-prefixed vector of items.
pub fn write_items<W, T>(writer: &mut W, items: &[T]) -> Result<usize, T::Error>
where
    W: Write,
    T: ByteFormat,
{
    let mut written = write_u32(writer, length_prefix(items.len())?)?;
    for item in items.iter() {
        written += item.write_to(writer)?;
    }
    Ok(written)
}

/// A vector of items prefixed by a `u32` count. Insertion order is preserved.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Seq<T>(Vec<T>);

impl<T> Seq<T> {
    /// Construct an empty `Seq`.
    pub fn null() -> Self {
        Self(vec![])
    }

    /// Push an item to the item vector.
    pub fn push(&mut self, i: T) {
        self.0.push(i)
    }

    /// Return a reference to the contents of the item vector.
    pub fn items(&self) -> &[T] {
        &self.0
    }

    /// Return the length of the item vector.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the length of the item vector is 0.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the items
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Consume the `Seq`, returning the item vector.
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for Seq<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Vec<T>> for Seq<T> {
    fn from(v: Vec<T>) -> Self {
        Self(v)
    }
}

impl<T> FromIterator<T> for Seq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> Extend<T> for Seq<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl<T> Index<usize> for Seq<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.0[index]
    }
}

impl<T> IntoIterator for Seq<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Seq<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: ByteFormat> ByteFormat for Seq<T> {
    type Error = T::Error;

    fn serialized_length(&self) -> usize {
        4 + self.0.iter().map(ByteFormat::serialized_length).sum::<usize>()
    }

    fn read_from<R>(reader: &mut R) -> Result<Self, Self::Error>
    where
        R: Read,
    {
        Ok(Self(read_items(reader)?))
    }

    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        write_items(writer, &self.0)
    }
}

/// A vector of items prefixed by a `u32` count, kept in non-decreasing order.
///
/// There is no way to obtain a mutable reference to an item, so the order established at
/// insertion cannot be broken.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SortedSeq<T>(Vec<T>);

impl<T: Ord> SortedSeq<T> {
    /// Construct an empty `SortedSeq`.
    pub fn null() -> Self {
        Self(vec![])
    }

    /// Insert an item at its sorted position. Equal items are kept, after any existing equal
    /// items. Returns the index the item was placed at.
    pub fn insert(&mut self, item: T) -> usize {
        let idx = self.0.partition_point(|existing| existing <= &item);
        self.0.insert(idx, item);
        idx
    }

    /// The position of an equal item, if any.
    pub fn position(&self, item: &T) -> Option<usize> {
        self.0.binary_search(item).ok()
    }

    /// True if an equal item is present.
    pub fn contains(&self, item: &T) -> bool {
        self.position(item).is_some()
    }

    /// Remove adjacent equal items.
    pub fn dedup(&mut self) {
        self.0.dedup()
    }

    /// Return a reference to the contents of the item vector.
    pub fn items(&self) -> &[T] {
        &self.0
    }

    /// Return the length of the item vector.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the length of the item vector is 0.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the items, in order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Consume the `SortedSeq`, returning the sorted item vector.
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }

    /// Check the canonical-order invariant.
    pub fn is_sorted(items: &[T]) -> bool {
        items.windows(2).all(|w| w[0] <= w[1])
    }
}

impl<T: Ord> Default for SortedSeq<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: Ord> From<Vec<T>> for SortedSeq<T> {
    fn from(mut v: Vec<T>) -> Self {
        v.sort();
        Self(v)
    }
}

impl<T: Ord> FromIterator<T> for SortedSeq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl<T: Ord> Extend<T> for SortedSeq<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.0.extend(iter);
        self.0.sort();
    }
}

impl<T> Index<usize> for SortedSeq<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.0[index]
    }
}

impl<T> IntoIterator for SortedSeq<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a SortedSeq<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: ByteFormat + Ord> ByteFormat for SortedSeq<T> {
    type Error = T::Error;

    fn serialized_length(&self) -> usize {
        4 + self.0.iter().map(ByteFormat::serialized_length).sum::<usize>()
    }

    /// Items on the wire must already be in canonical order.
    fn read_from<R>(reader: &mut R) -> Result<Self, Self::Error>
    where
        R: Read,
    {
        let items: Vec<T> = read_items(reader)?;
        if !Self::is_sorted(&items) {
            return Err(SerError::UnsortedSequence.into());
        }
        Ok(Self(items))
    }

    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        write_items(writer, &self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ids::Address;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    #[test]
    fn it_keeps_items_sorted_on_insert() {
        let mut seq = SortedSeq::null();
        assert_eq!(seq.insert(addr(3)), 0);
        assert_eq!(seq.insert(addr(1)), 0);
        assert_eq!(seq.insert(addr(2)), 1);
        assert_eq!(seq.insert(addr(2)), 2);
        assert_eq!(seq.items(), &[addr(1), addr(2), addr(2), addr(3)]);
        seq.dedup();
        assert_eq!(seq.items(), &[addr(1), addr(2), addr(3)]);
        assert_eq!(seq.position(&addr(3)), Some(2));
        assert!(!seq.contains(&addr(9)));
    }

    #[test]
    fn it_serializes_with_a_count_prefix() {
        let seq: SortedSeq<Address> = vec![addr(2), addr(1)].into();
        let expected = format!("00000002{}{}", "01".repeat(20), "02".repeat(20));
        assert_eq!(seq.serialize_hex(), expected);
        assert_eq!(seq.serialized_length(), 44);
        assert_eq!(SortedSeq::<Address>::deserialize_hex(&expected).unwrap(), seq);

        let unsorted = format!("00000002{}{}", "02".repeat(20), "01".repeat(20));
        assert!(matches!(
            SortedSeq::<Address>::deserialize_hex(&unsorted),
            Err(SerError::UnsortedSequence)
        ));
        // insertion order preserved
        let seq: Seq<Address> = Seq::deserialize_hex(&unsorted).unwrap();
        assert_eq!(seq.items(), &[addr(2), addr(1)]);
    }

    #[test]
    fn it_errors_on_short_sequences() {
        let short = format!("00000003{}", "01".repeat(20));
        assert!(Seq::<Address>::deserialize_hex(&short).is_err());
        assert!(Seq::<Address>::deserialize_hex("000000").is_err());
        assert!(Seq::<Address>::deserialize_hex("00000000").unwrap().is_empty());
    }
}
