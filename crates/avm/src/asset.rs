//! Per-asset spend accounting.
//!
//! An `AssetAmount` tracks how much of one asset a transaction must deliver (`amount`) and
//! destroy (`burn`), how much has been gathered from inputs so far (`spent`), and the change
//! owed back once enough has been gathered.
//!
//! An `AssetAmountDestination` groups the trackers of one build together with its destination,
//! sender, and change addresses, and accumulates the inputs and outputs the build produces. It
//! is owned by exactly one build.

use std::collections::HashMap;

use avm_core::{Address, AssetId};

use crate::{
    errors::{AvmError, AvmResult},
    types::{TransferableInput, TransferableOutput},
};

/// Spend accounting for one asset.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetAmount {
    asset_id: AssetId,
    amount: u64,
    burn: u64,
    spent: u64,
    change: u64,
    locked_spent: u64,
    locked_change: bool,
    finished: bool,
}

impl AssetAmount {
    /// Track a new requirement of `amount` delivered plus `burn` destroyed.
    pub fn new(asset_id: AssetId, amount: u64, burn: u64) -> Self {
        Self {
            asset_id,
            amount,
            burn,
            spent: 0,
            change: 0,
            locked_spent: 0,
            locked_change: false,
            finished: false,
        }
    }

    /// Record `quantity` gathered from an input. Once the gathered total reaches
    /// `amount + burn`, the tracker is finished and the excess becomes change.
    ///
    /// Fails with `InsufficientFunds` when called on a finished tracker, which signals a
    /// selection bug rather than a lack of funds.
    pub fn spend_amount(&mut self, quantity: u64, locked: bool) -> AvmResult<bool> {
        if self.finished {
            return Err(AvmError::InsufficientFunds(format!(
                "spend of {} on finished asset {}",
                quantity, self.asset_id
            )));
        }
        self.spent = self
            .spent
            .checked_add(quantity)
            .ok_or(AvmError::Overflow("spent amount"))?;
        if locked {
            self.locked_spent = self
                .locked_spent
                .checked_add(quantity)
                .ok_or(AvmError::Overflow("locked spent amount"))?;
        }

        let total = self.total()?;
        if self.spent >= total {
            self.change = self.spent - total;
            self.locked_change = locked;
            self.finished = true;
        }
        Ok(self.finished)
    }

    /// `amount + burn`
    pub fn total(&self) -> AvmResult<u64> {
        self.amount
            .checked_add(self.burn)
            .ok_or(AvmError::Overflow("amount plus burn"))
    }

    /// The asset tracked
    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    /// The amount to deliver
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// The amount to destroy
    pub fn burn(&self) -> u64 {
        self.burn
    }

    /// The amount gathered so far
    pub fn spent(&self) -> u64 {
        self.spent
    }

    /// The excess gathered. Zero until finished.
    pub fn change(&self) -> u64 {
        self.change
    }

    /// The amount gathered from locked inputs
    pub fn locked_spent(&self) -> u64 {
        self.locked_spent
    }

    /// True if the input that finished the tracker was locked, so the change derives from a
    /// locked source
    pub fn locked_change(&self) -> bool {
        self.locked_change
    }

    /// True once `spent >= amount + burn`
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// The trackers, addresses, and accumulated results of one build.
#[derive(Clone, Debug, Default)]
pub struct AssetAmountDestination {
    destinations: Vec<Address>,
    senders: Vec<Address>,
    change_addresses: Vec<Address>,
    amounts: Vec<AssetAmount>,
    index: HashMap<AssetId, usize>,
    inputs: Vec<TransferableInput>,
    outputs: Vec<TransferableOutput>,
    change_outputs: Vec<TransferableOutput>,
}

impl AssetAmountDestination {
    /// Instantiate a destination with no tracked assets
    pub fn new(
        destinations: Vec<Address>,
        senders: Vec<Address>,
        change_addresses: Vec<Address>,
    ) -> Self {
        Self {
            destinations,
            senders,
            change_addresses,
            ..Default::default()
        }
    }

    /// Track an asset. Each asset may be registered once; a second registration is a
    /// validation error.
    pub fn add_asset_amount(&mut self, asset_id: AssetId, amount: u64, burn: u64) -> AvmResult<()> {
        if self.index.contains_key(&asset_id) {
            return Err(AvmError::Validation(format!(
                "asset {} is already tracked",
                asset_id
            )));
        }
        self.index.insert(asset_id, self.amounts.len());
        self.amounts.push(AssetAmount::new(asset_id, amount, burn));
        Ok(())
    }

    /// True if `asset_id` is tracked
    pub fn asset_exists(&self, asset_id: &AssetId) -> bool {
        self.index.contains_key(asset_id)
    }

    /// The tracker for `asset_id`
    pub fn asset_amount(&self, asset_id: &AssetId) -> Option<&AssetAmount> {
        self.index.get(asset_id).map(|&i| &self.amounts[i])
    }

    /// The tracker for `asset_id`, mutably
    pub fn asset_amount_mut(&mut self, asset_id: &AssetId) -> Option<&mut AssetAmount> {
        match self.index.get(asset_id) {
            Some(&i) => self.amounts.get_mut(i),
            None => None,
        }
    }

    /// Every tracker, in registration order
    pub fn amounts(&self) -> &[AssetAmount] {
        &self.amounts
    }

    /// True when every tracker is finished
    pub fn can_complete(&self) -> bool {
        self.amounts.iter().all(AssetAmount::is_finished)
    }

    /// Addresses receiving the primary outputs
    pub fn destinations(&self) -> &[Address] {
        &self.destinations
    }

    /// Addresses whose UTXOs may be spent
    pub fn senders(&self) -> &[Address] {
        &self.senders
    }

    /// Addresses receiving change
    pub fn change_addresses(&self) -> &[Address] {
        &self.change_addresses
    }

    /// Record a selected input
    pub fn add_input(&mut self, input: TransferableInput) {
        self.inputs.push(input)
    }

    /// Record a primary output
    pub fn add_output(&mut self, output: TransferableOutput) {
        self.outputs.push(output)
    }

    /// Record a change output
    pub fn add_change(&mut self, output: TransferableOutput) {
        self.change_outputs.push(output)
    }

    /// The selected inputs
    pub fn inputs(&self) -> &[TransferableInput] {
        &self.inputs
    }

    /// The primary outputs
    pub fn outputs(&self) -> &[TransferableOutput] {
        &self.outputs
    }

    /// The change outputs
    pub fn change_outputs(&self) -> &[TransferableOutput] {
        &self.change_outputs
    }

    /// Primary outputs followed by change outputs
    pub fn all_outputs(&self) -> Vec<TransferableOutput> {
        self.outputs
            .iter()
            .chain(self.change_outputs.iter())
            .cloned()
            .collect()
    }

    /// Consume the destination, returning `(inputs, outputs, change_outputs)`.
    pub fn into_parts(
        self,
    ) -> (
        Vec<TransferableInput>,
        Vec<TransferableOutput>,
        Vec<TransferableOutput>,
    ) {
        (self.inputs, self.outputs, self.change_outputs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn asset(b: u8) -> AssetId {
        AssetId::new([b; 32])
    }

    #[test]
    fn it_finishes_once_amount_and_burn_are_covered() {
        let mut a = AssetAmount::new(asset(1), 100, 10);
        assert!(!a.is_finished());
        assert!(!a.spend_amount(60, false).unwrap());
        assert_eq!(a.change(), 0);
        assert!(a.spend_amount(60, false).unwrap());
        assert_eq!(a.spent(), 120);
        assert_eq!(a.change(), 10);
        assert!(!a.locked_change());
        assert!(matches!(
            a.spend_amount(1, false),
            Err(AvmError::InsufficientFunds(_))
        ));
        assert_eq!(a.spent(), 120);
    }

    #[test]
    fn it_tracks_locked_spends() {
        let mut a = AssetAmount::new(asset(1), 5, 0);
        a.spend_amount(3, true).unwrap();
        a.spend_amount(4, true).unwrap();
        assert_eq!(a.locked_spent(), 7);
        assert_eq!(a.change(), 2);
        assert!(a.locked_change());
    }

    #[test]
    fn it_finishes_an_empty_requirement_on_first_spend() {
        let mut a = AssetAmount::new(asset(1), 0, 0);
        assert!(!a.is_finished());
        assert!(a.spend_amount(5, true).unwrap());
        assert!(a.is_finished());
        assert_eq!(a.change(), 5);
        assert!(a.locked_change());
        assert!(a.spend_amount(1, false).is_err());
    }

    #[test]
    fn it_reports_overflow() {
        let mut a = AssetAmount::new(asset(1), u64::MAX, 0);
        a.spend_amount(u64::MAX - 1, false).unwrap();
        assert!(matches!(a.spend_amount(2, false), Err(AvmError::Overflow(_))));
        assert!(AssetAmount::new(asset(1), u64::MAX, 1).total().is_err());
    }

    #[test]
    fn it_rejects_duplicate_asset_registration() {
        let mut dest = AssetAmountDestination::new(vec![], vec![], vec![]);
        dest.add_asset_amount(asset(1), 10, 0).unwrap();
        assert!(matches!(
            dest.add_asset_amount(asset(1), 5, 5),
            Err(AvmError::Validation(_))
        ));
        assert_eq!(dest.amounts().len(), 1);
        assert_eq!(dest.asset_amount(&asset(1)).unwrap().amount(), 10);
    }

    #[test]
    fn it_completes_when_every_asset_finishes() {
        let mut dest = AssetAmountDestination::new(vec![], vec![], vec![]);
        assert!(dest.can_complete());
        dest.add_asset_amount(asset(1), 10, 0).unwrap();
        dest.add_asset_amount(asset(2), 0, 1).unwrap();
        assert!(!dest.can_complete());
        dest.asset_amount_mut(&asset(1)).unwrap().spend_amount(10, false).unwrap();
        assert!(!dest.can_complete());
        dest.asset_amount_mut(&asset(2)).unwrap().spend_amount(3, false).unwrap();
        assert!(dest.can_complete());
        assert_eq!(dest.asset_amount(&asset(2)).unwrap().change(), 2);
        assert!(dest.asset_amount_mut(&asset(3)).is_none());
    }
}
