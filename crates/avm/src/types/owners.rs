//! Spending conditions shared by every output kind.

use std::io::{Read, Write};

use avm_core::{
    ser::{read_u32, read_u64, write_u32, write_u64, ByteFormat, SerError, SerResult},
    Address, SortedSeq,
};

use crate::errors::{AvmError, AvmResult};

/// Who may spend an output, and when. Any `threshold` of the owner `addresses` may jointly
/// spend it once `locktime` has passed.
///
/// The address set is kept ascending and free of duplicates.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct OutputOwners {
    locktime: u64,
    threshold: u32,
    addresses: SortedSeq<Address>,
}

impl OutputOwners {
    /// Instantiate a new owner set. Duplicate addresses are dropped.
    ///
    /// Fails if the threshold exceeds the number of addresses, or if a zero threshold is paired
    /// with a non-empty address set.
    pub fn new<I>(addresses: I, locktime: u64, threshold: u32) -> AvmResult<Self>
    where
        I: IntoIterator<Item = Address>,
    {
        let mut addresses: SortedSeq<Address> = addresses.into_iter().collect();
        addresses.dedup();
        if threshold as usize > addresses.len() {
            return Err(AvmError::Validation(format!(
                "threshold {} exceeds {} owner addresses",
                threshold,
                addresses.len()
            )));
        }
        if threshold == 0 && !addresses.is_empty() {
            return Err(AvmError::Validation(
                "zero threshold with non-empty owner set".to_owned(),
            ));
        }
        Ok(Self {
            locktime,
            threshold,
            addresses,
        })
    }

    /// A single owner, no locktime, threshold 1
    pub fn single(address: Address) -> Self {
        let mut addresses = SortedSeq::null();
        addresses.insert(address);
        Self {
            locktime: 0,
            threshold: 1,
            addresses,
        }
    }

    /// The time before which the output cannot be spent
    pub fn locktime(&self) -> u64 {
        self.locktime
    }

    /// The number of owner signatures required to spend
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// The owner addresses, ascending
    pub fn addresses(&self) -> &[Address] {
        self.addresses.items()
    }

    /// The position of `address` in the owner list. Signature indices refer to this position.
    pub fn address_index(&self, address: &Address) -> Option<u32> {
        self.addresses.position(address).map(|i| i as u32)
    }

    /// The owners able to sign for this output among `candidates`, as of `as_of`.
    ///
    /// Owners are taken in owner-list order, and at most `threshold` are returned. Before the
    /// locktime has passed, no owner may spend.
    pub fn spenders(&self, candidates: &[Address], as_of: u64) -> Vec<Address> {
        if as_of <= self.locktime {
            return vec![];
        }
        self.addresses
            .iter()
            .filter(|owner| candidates.contains(*owner))
            .take(self.threshold as usize)
            .copied()
            .collect()
    }

    /// True if `candidates` can jointly spend this output as of `as_of`.
    pub fn meets_threshold(&self, candidates: &[Address], as_of: u64) -> bool {
        as_of > self.locktime
            && self.spenders(candidates, as_of).len() >= self.threshold as usize
    }
}

impl ByteFormat for OutputOwners {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        12 + self.addresses.serialized_length()
    }

    fn read_from<R>(reader: &mut R) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let locktime = read_u64(reader)?;
        let threshold = read_u32(reader)?;
        let addresses = SortedSeq::<Address>::read_from(reader)?;
        if addresses.items().windows(2).any(|w| w[0] == w[1]) {
            return Err(SerError::UnsortedSequence);
        }
        Ok(Self {
            locktime,
            threshold,
            addresses,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = write_u64(writer, self.locktime)?;
        len += write_u32(writer, self.threshold)?;
        len += self.addresses.write_to(writer)?;
        Ok(len)
    }
}

/// Types with spending conditions.
pub trait Owned {
    /// The spending conditions
    fn owners(&self) -> &OutputOwners;

    /// Shortcut for `self.owners().meets_threshold(candidates, as_of)`
    fn spendable_by(&self, candidates: &[Address], as_of: u64) -> bool {
        self.owners().meets_threshold(candidates, as_of)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    #[test]
    fn it_serializes_owners() {
        let owners = OutputOwners::new(vec![addr(0x22), addr(0x11)], 0x0102, 1).unwrap();
        let expected = format!(
            "0000000000000102{}{}{}{}",
            "00000001",
            "00000002",
            "11".repeat(20),
            "22".repeat(20)
        );
        assert_eq!(owners.serialize_hex(), expected);
        assert_eq!(owners.serialized_length(), 56);
        assert_eq!(OutputOwners::deserialize_hex(&expected).unwrap(), owners);
    }

    #[test]
    fn it_rejects_non_canonical_owner_lists() {
        let unsorted = format!("0000000000000000000000010000000222{}11{}", "22".repeat(19), "11".repeat(19));
        assert!(OutputOwners::deserialize_hex(&unsorted).is_err());
        let repeated = format!("00000000000000000000000100000002{}", "11".repeat(40));
        assert!(matches!(
            OutputOwners::deserialize_hex(&repeated),
            Err(SerError::UnsortedSequence)
        ));
    }

    #[test]
    fn it_validates_thresholds() {
        assert!(OutputOwners::new(vec![addr(1)], 0, 2).is_err());
        assert!(OutputOwners::new(vec![addr(1)], 0, 0).is_err());
        assert!(OutputOwners::new(vec![], 0, 0).is_ok());
        // duplicates collapse before the check
        assert!(OutputOwners::new(vec![addr(1), addr(1)], 0, 2).is_err());
        let owners = OutputOwners::new(vec![addr(3), addr(1), addr(3)], 0, 2).unwrap();
        assert_eq!(owners.addresses(), &[addr(1), addr(3)]);
        assert_eq!(owners.address_index(&addr(3)), Some(1));
        assert_eq!(owners.address_index(&addr(2)), None);
    }

    #[test]
    fn it_selects_spenders_in_owner_order() {
        let owners = OutputOwners::new(vec![addr(1), addr(2), addr(3)], 100, 2).unwrap();
        let candidates = [addr(3), addr(9), addr(2), addr(1)];

        assert!(owners.spenders(&candidates, 100).is_empty());
        assert!(!owners.meets_threshold(&candidates, 100));

        assert_eq!(owners.spenders(&candidates, 101), vec![addr(1), addr(2)]);
        assert!(owners.meets_threshold(&candidates, 101));

        assert_eq!(owners.spenders(&[addr(3), addr(9)], 101), vec![addr(3)]);
        assert!(!owners.meets_threshold(&[addr(3), addr(9)], 101));
    }

    #[test]
    fn it_honors_locktime_even_for_zero_thresholds() {
        let owners = OutputOwners::new(vec![], 50, 0).unwrap();
        assert!(!owners.meets_threshold(&[], 50));
        assert!(owners.meets_threshold(&[], 51));
    }
}
