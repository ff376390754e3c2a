//! Transaction assembly.
//!
//! A `TxBuilder` holds one chain's `ChainContext` and turns a UTXO snapshot plus a payment into
//! an `UnsignedTx`. Every build owns a fresh `AssetAmountDestination` and only borrows the
//! snapshot, so a failed build leaves nothing behind.
//!
//! Builds move through the stages of `BuildStage`. The last stage, `Signed`, is reached by
//! calling `UnsignedTx::sign` on the result.

use std::collections::HashMap;

use avm_core::{ser::ByteFormat, Address, AssetId, BlockchainId};

use crate::{
    asset::AssetAmountDestination,
    errors::{AvmError, AvmResult},
    nets::{ChainContext, TxKind},
    select::{select_spendable, spend_utxo},
    types::{
        AmountOutput, BaseTx, ExportTx, ImportTx, Output, OutputOwners, Owned, TransferableOutput,
        TxBody, UnsignedTx, UtxoSet,
    },
};

/// The stages of a build. Any stage may end the build with an error instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildStage {
    /// Nothing selected yet
    Unbuilt,
    /// Inputs chosen
    InputsSelected,
    /// Primary and change outputs synthesized
    OutputsComputed,
    /// Wrapped in an `UnsignedTx`
    SerializedUnsigned,
    /// Credentials attached
    Signed,
}

impl BuildStage {
    /// The following stage, if any
    pub fn next(self) -> Option<Self> {
        match self {
            BuildStage::Unbuilt => Some(BuildStage::InputsSelected),
            BuildStage::InputsSelected => Some(BuildStage::OutputsComputed),
            BuildStage::OutputsComputed => Some(BuildStage::SerializedUnsigned),
            BuildStage::SerializedUnsigned => Some(BuildStage::Signed),
            BuildStage::Signed => None,
        }
    }

    /// Pass `res` through, logging this stage if it holds an error
    pub(crate) fn check<T>(self, res: AvmResult<T>) -> AvmResult<T> {
        if let Err(e) = &res {
            tracing::debug!(stage = %self, error = %e, "build failed");
        }
        res
    }

    pub(crate) fn advance(&mut self) {
        if let Some(next) = self.next() {
            tracing::trace!(from = %self, to = %next, "build stage");
            *self = next;
        }
    }
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BuildStage::Unbuilt => "unbuilt",
            BuildStage::InputsSelected => "inputs-selected",
            BuildStage::OutputsComputed => "outputs-computed",
            BuildStage::SerializedUnsigned => "serialized-unsigned",
            BuildStage::Signed => "signed",
        };
        f.write_str(s)
    }
}

/// Close a build once its `UnsignedTx` is assembled
fn serialized(stage: &mut BuildStage, tx: UnsignedTx) -> AvmResult<UnsignedTx> {
    let bytes = tx.serialized_length();
    stage.advance();
    tracing::debug!(stage = %stage, type_id = tx.type_id(), bytes, "built unsigned tx");
    Ok(tx)
}

/// An amount of one asset to pay to a set of addresses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Payment {
    /// The asset paid
    pub asset_id: AssetId,
    /// The amount paid. Must be nonzero.
    pub amount: u64,
    /// The recipients
    pub to: Vec<Address>,
    /// The output may not be spent until after this time
    pub locktime: u64,
    /// The number of recipients needed to spend the output
    pub threshold: u32,
}

impl Payment {
    /// Pay `amount` of `asset_id`, spendable at once by any one of `to`
    pub fn new(asset_id: AssetId, amount: u64, to: Vec<Address>) -> Self {
        Self {
            asset_id,
            amount,
            to,
            locktime: 0,
            threshold: 1,
        }
    }

    /// Lock the paid output until after `locktime`
    pub fn with_locktime(mut self, locktime: u64) -> Self {
        self.locktime = locktime;
        self
    }

    /// Require `threshold` recipients to spend the paid output
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Who pays, where change goes, and when the build happens.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SpendParams {
    /// Addresses whose UTXOs may be spent
    pub from: Vec<Address>,
    /// Addresses receiving change. Defaults to `from` when empty.
    pub change: Vec<Address>,
    /// The memo
    pub memo: Vec<u8>,
    /// The current time, compared against locktimes
    pub as_of: u64,
}

impl SpendParams {
    /// Spend from `from` as of `as_of`, returning change to `from`
    pub fn new(from: Vec<Address>, as_of: u64) -> Self {
        Self {
            from,
            as_of,
            ..Default::default()
        }
    }

    /// Send change somewhere other than `from`
    pub fn with_change(mut self, change: Vec<Address>) -> Self {
        self.change = change;
        self
    }

    /// Attach a memo
    pub fn with_memo(mut self, memo: Vec<u8>) -> Self {
        self.memo = memo;
        self
    }

    /// The addresses that receive change
    pub fn change_addresses(&self) -> &[Address] {
        if self.change.is_empty() {
            &self.from
        } else {
            &self.change
        }
    }
}

/// Builds unsigned transactions for one chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxBuilder {
    ctx: ChainContext,
}

impl TxBuilder {
    /// Instantiate a builder for a chain
    pub fn new(ctx: ChainContext) -> Self {
        Self { ctx }
    }

    /// The chain context
    pub fn context(&self) -> &ChainContext {
        &self.ctx
    }

    /// Register the payment, the fee, and any extra fee-asset amount, on a fresh destination.
    fn payment_destination(
        &self,
        payment: &Payment,
        spend: &SpendParams,
        extra_fee_asset: u64,
    ) -> AvmResult<AssetAmountDestination> {
        if payment.amount == 0 {
            return Err(AvmError::Validation("payment amount must be nonzero".to_owned()));
        }
        let (fee_asset, fee) = self.ctx.fee()?;
        let mut destination = AssetAmountDestination::new(
            payment.to.clone(),
            spend.from.clone(),
            spend.change_addresses().to_vec(),
        );
        if fee_asset == payment.asset_id {
            let amount = payment
                .amount
                .checked_add(extra_fee_asset)
                .ok_or(AvmError::Overflow("payment plus fee subsidy"))?;
            destination.add_asset_amount(payment.asset_id, amount, fee)?;
        } else {
            destination.add_asset_amount(payment.asset_id, payment.amount, 0)?;
            if fee > 0 || extra_fee_asset > 0 {
                destination.add_asset_amount(fee_asset, extra_fee_asset, fee)?;
            }
        }
        tracing::debug!(
            asset = %payment.asset_id,
            amount = payment.amount,
            fee_asset = %fee_asset,
            fee,
            extra_fee_asset,
            "registered payment"
        );
        Ok(destination)
    }

    /// Pay `payment` on this chain from the `spend.from` addresses, returning change.
    ///
    /// Fails on chains without base transactions, on a zero amount, on an oversized memo, and
    /// with `InsufficientFunds` if `utxos` cannot cover the payment and the fee.
    #[tracing::instrument(skip_all, err, fields(chain = %self.ctx.alias))]
    pub fn build_base_tx(
        &self,
        utxos: &UtxoSet,
        payment: &Payment,
        spend: &SpendParams,
    ) -> AvmResult<UnsignedTx> {
        if self.ctx.chain.tx_type_id(TxKind::Base).is_none() {
            return Err(AvmError::Validation(format!(
                "{:?} chain has no base transaction",
                self.ctx.chain
            )));
        }
        let mut stage = BuildStage::Unbuilt;
        let mut destination = stage.check(self.payment_destination(payment, spend, 0))?;
        stage.check(select_spendable(
            utxos,
            &mut destination,
            spend.as_of,
            payment.locktime,
            payment.threshold,
        ))?;
        stage.advance();

        let (inputs, outputs, change) = destination.into_parts();
        stage.advance();

        let base = stage.check(BaseTx::new(
            self.ctx.network_id,
            self.ctx.blockchain_id,
            outputs.into_iter().chain(change),
            inputs,
            spend.memo.clone(),
        ))?;
        let tx = stage.check(UnsignedTx::new(self.ctx.chain, TxBody::Base(base)))?;
        serialized(&mut stage, tx)
    }

    /// Export `payment` to another chain's shared memory.
    ///
    /// The paid outputs become the exported outputs. Change stays on this chain in the base
    /// outputs. `import_fee` is an extra amount of the fee asset exported alongside the payment,
    /// so that the recipient can pay the fee of the matching import. The destination defaults to
    /// the platform chain.
    #[tracing::instrument(skip_all, err, fields(chain = %self.ctx.alias))]
    pub fn build_export_tx(
        &self,
        utxos: &UtxoSet,
        payment: &Payment,
        destination_chain: Option<BlockchainId>,
        import_fee: u64,
        spend: &SpendParams,
    ) -> AvmResult<UnsignedTx> {
        let destination_chain = destination_chain.unwrap_or(BlockchainId::PLATFORM);
        if destination_chain == self.ctx.blockchain_id {
            return Err(AvmError::Validation(format!(
                "cannot export from chain {} to itself",
                destination_chain
            )));
        }
        let mut stage = BuildStage::Unbuilt;
        let mut destination = stage.check(self.payment_destination(payment, spend, import_fee))?;
        stage.check(select_spendable(
            utxos,
            &mut destination,
            spend.as_of,
            payment.locktime,
            payment.threshold,
        ))?;
        stage.advance();

        let (inputs, exported, change) = destination.into_parts();
        stage.advance();

        let base = stage.check(BaseTx::new(
            self.ctx.network_id,
            self.ctx.blockchain_id,
            change,
            inputs,
            spend.memo.clone(),
        ))?;
        let export = ExportTx::new(base, destination_chain, exported);
        let tx = stage.check(UnsignedTx::new(self.ctx.chain, TxBody::Export(export)))?;
        serialized(&mut stage, tx)
    }

    /// Import every UTXO in `atomics` from `source_chain`'s shared memory, paying the proceeds
    /// to `to`.
    ///
    /// Each atomic UTXO is spent whole, signed for by the `spend.from` addresses. The fee is
    /// paid first out of the imported fee asset. Whatever remains of each asset is forwarded to
    /// `to` in a single output per asset. If the atomics cannot cover the fee, the shortfall is
    /// selected from `fee_utxos` on this chain. The build fails with a `Fee` error if there are
    /// no `fee_utxos` or they cannot cover the shortfall.
    #[tracing::instrument(skip_all, err, fields(chain = %self.ctx.alias, atomics = atomics.len()))]
    pub fn build_import_tx(
        &self,
        atomics: &UtxoSet,
        source_chain: BlockchainId,
        to: Address,
        fee_utxos: Option<&UtxoSet>,
        spend: &SpendParams,
    ) -> AvmResult<UnsignedTx> {
        if atomics.is_empty() {
            return Err(AvmError::Validation("no atomic utxos to import".to_owned()));
        }
        if source_chain == self.ctx.blockchain_id {
            return Err(AvmError::Validation(format!(
                "cannot import into chain {} from itself",
                source_chain
            )));
        }
        let (fee_asset, fee) = self.ctx.fee()?;
        let mut stage = BuildStage::Unbuilt;

        let mut fee_paid = 0u64;
        let mut forwarded: Vec<(AssetId, u64)> = vec![];
        let mut positions: HashMap<AssetId, usize> = HashMap::new();
        let mut imported = Vec::with_capacity(atomics.len());

        for utxo in atomics {
            let amount = utxo.output.amount().ok_or_else(|| {
                AvmError::Validation(format!(
                    "atomic utxo {} does not carry an amount",
                    utxo.utxo_id()
                ))
            })?;
            if !utxo.spendable_by(&spend.from, spend.as_of) {
                return Err(AvmError::Validation(format!(
                    "atomic utxo {} is not spendable by the given addresses",
                    utxo.utxo_id()
                )));
            }
            imported.push(spend_utxo(utxo, amount, &spend.from, spend.as_of)?);

            let mut remaining = amount;
            if utxo.asset_id == fee_asset && fee_paid < fee {
                let applied = remaining.min(fee - fee_paid);
                fee_paid += applied;
                remaining -= applied;
            }
            let slot = *positions.entry(utxo.asset_id).or_insert_with(|| {
                forwarded.push((utxo.asset_id, 0));
                forwarded.len() - 1
            });
            forwarded[slot].1 = forwarded[slot]
                .1
                .checked_add(remaining)
                .ok_or(AvmError::Overflow("forwarded amount"))?;
        }

        let mut local_inputs = vec![];
        let mut change = vec![];
        if fee_paid < fee {
            let shortfall = fee - fee_paid;
            let local = stage.check(fee_utxos.ok_or(AvmError::Fee {
                required: fee,
                available: fee_paid,
            }))?;
            tracing::debug!(shortfall, "covering import fee from local utxos");
            let mut destination = AssetAmountDestination::new(
                vec![],
                spend.from.clone(),
                spend.change_addresses().to_vec(),
            );
            destination.add_asset_amount(fee_asset, 0, shortfall)?;
            match select_spendable(local, &mut destination, spend.as_of, 0, 1) {
                Ok(()) => {}
                Err(AvmError::InsufficientFunds(_)) => {
                    let gathered = destination
                        .asset_amount(&fee_asset)
                        .map_or(0, |tracker| tracker.spent());
                    return stage.check(Err(AvmError::Fee {
                        required: fee,
                        available: fee_paid.saturating_add(gathered),
                    }));
                }
                Err(e) => return stage.check(Err(e)),
            }
            let (inputs, _, change_outputs) = destination.into_parts();
            local_inputs = inputs;
            change = change_outputs;
        }
        stage.advance();

        let owners = OutputOwners::single(to);
        let outputs = forwarded
            .into_iter()
            .filter(|(_, amount)| *amount > 0)
            .map(|(asset_id, amount)| {
                TransferableOutput::new(
                    asset_id,
                    Output::SecpTransfer(AmountOutput::new(amount, owners.clone())),
                )
            })
            .chain(change)
            .collect::<Vec<_>>();
        stage.advance();

        tracing::debug!(
            imported = imported.len(),
            local = local_inputs.len(),
            outputs = outputs.len(),
            fee,
            "import assembled"
        );
        let base = stage.check(BaseTx::new(
            self.ctx.network_id,
            self.ctx.blockchain_id,
            outputs,
            local_inputs,
            spend.memo.clone(),
        ))?;
        let import = stage.check(ImportTx::new(base, source_chain, imported, fee_asset, fee))?;
        let tx = stage.check(UnsignedTx::new(self.ctx.chain, TxBody::Import(import)))?;
        serialized(&mut stage, tx)
    }
}
