//! Coin selection.
//!
//! Selection walks a UTXO snapshot in the caller's order, spending whole UTXOs into an
//! `AssetAmountDestination` until every tracked asset is covered. It then synthesizes one
//! primary output per asset for the requested amount and one change output per asset for the
//! excess.
//!
//! The snapshot is never modified. Callers remove spent UTXOs from their own store once the
//! transaction is accepted.

use std::collections::HashMap;

use avm_core::{Address, AssetId};

use crate::{
    asset::AssetAmountDestination,
    errors::{AvmError, AvmResult},
    types::{
        AmountInput, Input, Output, OutputOwners, Owned, TransferableInput, TransferableOutput,
        Utxo, UtxoSet, SECP_TRANSFER_OUTPUT_ID,
    },
};

/// Build an input spending all of `utxo`, with one signature index per spender among
/// `candidates`.
///
/// A spender missing from the owner list is an invariant violation.
pub(crate) fn spend_utxo(
    utxo: &Utxo,
    amount: u64,
    candidates: &[Address],
    as_of: u64,
) -> AvmResult<TransferableInput> {
    let owners = utxo.owners();
    let mut input = AmountInput::new(amount);
    for spender in owners.spenders(candidates, as_of) {
        let index = owners.address_index(&spender).ok_or_else(|| {
            AvmError::InvariantViolation(format!(
                "spender {} is not an owner of utxo {}",
                spender,
                utxo.utxo_id()
            ))
        })?;
        input.add_sig_idx(index, spender);
    }
    Ok(TransferableInput::new(
        utxo.tx_id,
        utxo.output_index,
        utxo.asset_id,
        Input::SecpTransfer(input),
    ))
}

/// Select UTXOs from `utxos` to cover every asset tracked by `destination`.
///
/// On success `destination` holds the selected inputs, a primary output per asset with a
/// nonzero amount (paid to the destinations under `locktime` and `threshold`), and a change
/// output per asset with nonzero change (paid to the change addresses, spendable immediately by
/// any one of them). Primary and change outputs reuse the kind of the first UTXO spent for
/// their asset.
///
/// Fails with `InsufficientFunds` if the senders cannot cover every tracked asset. The
/// destination is left partially filled and should be discarded.
pub fn select_spendable(
    utxos: &UtxoSet,
    destination: &mut AssetAmountDestination,
    as_of: u64,
    locktime: u64,
    threshold: u32,
) -> AvmResult<()> {
    let senders = destination.senders().to_vec();
    let mut output_kinds: HashMap<AssetId, u32> = HashMap::new();

    for utxo in utxos {
        if destination.can_complete() {
            break;
        }
        let finished = match destination.asset_amount(&utxo.asset_id) {
            Some(tracker) => tracker.is_finished(),
            None => continue,
        };
        if !utxo.spendable_by(&senders, as_of) {
            continue;
        }
        let amount = match utxo.output.amount() {
            Some(amount) => amount,
            None => continue,
        };
        if finished {
            continue;
        }

        output_kinds
            .entry(utxo.asset_id)
            .or_insert_with(|| utxo.output.type_id());
        destination
            .asset_amount_mut(&utxo.asset_id)
            .ok_or_else(|| {
                AvmError::InvariantViolation(format!("asset {} is not tracked", utxo.asset_id))
            })?
            .spend_amount(amount, false)?;

        let input = spend_utxo(utxo, amount, &senders, as_of)?;
        tracing::trace!(
            utxo = %utxo.utxo_id(),
            asset = %utxo.asset_id,
            amount,
            signers = input.input.sig_indices().len(),
            "spending utxo"
        );
        destination.add_input(input);
    }

    if !destination.can_complete() {
        let missing = destination
            .amounts()
            .iter()
            .filter(|a| !a.is_finished())
            .map(|a| {
                format!(
                    "{} (have {}, need {} plus {} burned)",
                    a.asset_id(),
                    a.spent(),
                    a.amount(),
                    a.burn()
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AvmError::InsufficientFunds(missing));
    }

    let mut primary_owners = None;
    let mut change_owners = None;
    for tracker in destination.amounts().to_vec() {
        let type_id = output_kinds
            .get(&tracker.asset_id())
            .copied()
            .unwrap_or(SECP_TRANSFER_OUTPUT_ID);

        if tracker.amount() > 0 {
            if primary_owners.is_none() {
                primary_owners = Some(OutputOwners::new(
                    destination.destinations().iter().copied(),
                    locktime,
                    threshold,
                )?);
            }
            if let Some(owners) = &primary_owners {
                let output = Output::amount_output(type_id, tracker.amount(), owners.clone())?;
                destination.add_output(TransferableOutput::new(tracker.asset_id(), output));
            }
        }

        if tracker.change() > 0 {
            if change_owners.is_none() {
                change_owners = Some(OutputOwners::new(
                    destination.change_addresses().iter().copied(),
                    0,
                    1,
                )?);
            }
            if let Some(owners) = &change_owners {
                let output = Output::amount_output(type_id, tracker.change(), owners.clone())?;
                destination.add_change(TransferableOutput::new(tracker.asset_id(), output));
            }
        }
    }

    tracing::debug!(
        inputs = destination.inputs().len(),
        outputs = destination.outputs().len(),
        change = destination.change_outputs().len(),
        "selection complete"
    );
    Ok(())
}
