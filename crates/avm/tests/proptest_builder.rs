use proptest::prelude::*;

use avm::prelude::*;

const FEE: u64 = 10;

fn native() -> AssetId {
    AssetId::new([1; 32])
}

fn chain_id() -> BlockchainId {
    BlockchainId::new([0xaa; 32])
}

fn key(i: u8) -> KeyPair {
    KeyPair::from_bytes(&[i + 1; 32]).unwrap()
}

fn transfer(tx: u8, index: u32, amount: u64, owner: Address) -> Utxo {
    Utxo::new(
        TxId::new([tx; 32]),
        index,
        native(),
        Output::SecpTransfer(AmountOutput::new(amount, OutputOwners::single(owner))),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn threshold_needs_enough_owners_after_locktime(
        owners in prop::collection::btree_set(any::<[u8; 20]>(), 1..6),
        picks in prop::collection::vec(any::<bool>(), 6),
        threshold_seed in any::<u32>(),
        locktime in 0u64..100,
        now in 0u64..200,
    ) {
        let owners: Vec<Address> = owners.into_iter().map(Address::new).collect();
        let threshold = threshold_seed % (owners.len() as u32) + 1;
        let conditions = OutputOwners::new(owners.clone(), locktime, threshold).unwrap();
        let candidates: Vec<Address> = owners
            .iter()
            .zip(picks.iter())
            .filter(|(_, pick)| **pick)
            .map(|(a, _)| *a)
            .collect();

        let expected = now > locktime && candidates.len() >= threshold as usize;
        prop_assert_eq!(conditions.meets_threshold(&candidates, now), expected);
    }

    #[test]
    fn asset_amount_finishes_exactly_once(
        amount in 0u64..1000,
        burn in 0u64..100,
        spends in prop::collection::vec(1u64..300, 1..12),
    ) {
        let mut tracker = AssetAmount::new(native(), amount, burn);
        let target = amount + burn;
        let mut spent = 0u64;
        for quantity in spends {
            if tracker.is_finished() {
                prop_assert!(tracker.spend_amount(quantity, false).is_err());
                break;
            }
            spent += quantity;
            let finished = tracker.spend_amount(quantity, false).unwrap();
            if spent < target {
                prop_assert!(!finished);
                prop_assert_eq!(tracker.change(), 0);
            } else {
                prop_assert!(finished);
                prop_assert_eq!(tracker.change(), spent - target);
            }
        }
    }

    #[test]
    fn base_tx_bytes_ignore_assembly_order(
        amounts in prop::collection::vec(1u64..10_000, 1..8),
        seed in any::<u64>(),
    ) {
        let owner = key(0).address();
        let outputs: Vec<TransferableOutput> = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| {
                TransferableOutput::new(
                    native(),
                    Output::SecpTransfer(AmountOutput::new(*a, OutputOwners::single(Address::new([i as u8; 20])))),
                )
            })
            .collect();
        let inputs: Vec<TransferableInput> = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| select_input(transfer((i as u8).wrapping_mul(37), i as u32, *a, owner), owner))
            .collect();

        let mut shuffled_outputs = outputs.clone();
        let mut shuffled_inputs = inputs.clone();
        let rotate = (seed as usize) % outputs.len();
        shuffled_outputs.rotate_left(rotate);
        shuffled_outputs.reverse();
        shuffled_inputs.rotate_right(rotate);

        let a = BaseTx::new(12345, chain_id(), outputs, inputs, vec![]).unwrap();
        let b = BaseTx::new(12345, chain_id(), shuffled_outputs, shuffled_inputs, vec![]).unwrap();
        prop_assert_eq!(a.to_vec(), b.to_vec());

        let again = BaseTx::new(
            12345,
            chain_id(),
            a.outputs().to_vec(),
            a.inputs().to_vec(),
            vec![],
        )
        .unwrap();
        prop_assert_eq!(again.to_vec(), a.to_vec());
    }

    #[test]
    fn selection_conserves_value(
        amounts in prop::collection::vec(1u64..1_000, 1..10),
        request in 1u64..5_000,
    ) {
        let me = key(0).address();
        let utxos: UtxoSet = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| transfer(i as u8, 0, *a, me))
            .collect();
        let builder = TxBuilder::new(ChainContext::avm::<Local>(chain_id(), native(), FEE));
        let payment = Payment::new(native(), request, vec![Address::new([9; 20])]);
        let res = builder.build_base_tx(&utxos, &payment, &SpendParams::new(vec![me], 1));

        let available: u64 = amounts.iter().sum();
        if available < request + FEE {
            prop_assert!(matches!(res, Err(AvmError::InsufficientFunds(_))));
        } else {
            let tx = res.unwrap();
            let base = tx.body().base();
            let spent: u64 = base.inputs().iter().map(|i| i.input.amount()).sum();
            let created: u64 = base.outputs().iter().filter_map(|o| o.amount()).sum();
            prop_assert_eq!(spent, created + FEE);
            prop_assert!(base
                .outputs()
                .iter()
                .any(|o| o.amount() == Some(request) && o.owners().addresses() == [Address::new([9; 20])]));
        }
    }

    #[test]
    fn signing_emits_a_credential_per_input(n in 0usize..6, signers in 1u8..4) {
        let keys: Vec<KeyPair> = (0..signers).map(key).collect();
        let mut chain = KeyChain::new();
        for k in keys.iter() {
            chain.add(k.clone());
        }

        let inputs: Vec<TransferableInput> = (0..n)
            .map(|i| {
                let signer = keys[i % keys.len()].address();
                select_input(transfer(i as u8, 0, 100, signer), signer)
            })
            .collect();
        let base = BaseTx::new(12345, chain_id(), vec![], inputs, vec![]).unwrap();
        let unsigned = UnsignedTx::new(ChainKind::Avm, TxBody::Base(base)).unwrap();
        let message = unsigned.signing_message();
        let ordered: Vec<TransferableInput> = unsigned.body().inputs().into_iter().cloned().collect();

        let tx = unsigned.sign(&chain).unwrap();
        prop_assert_eq!(tx.credentials().len(), n);
        for (input, credential) in ordered.iter().zip(tx.credentials()) {
            prop_assert_eq!(credential.signatures().len(), input.input.sig_indices().len());
            for (sig_idx, sig) in input.input.sig_indices().iter().zip(credential.signatures()) {
                prop_assert_eq!(KeyPair::recover(&message, sig).unwrap(), sig_idx.source);
            }
        }
    }
}

/// Spend `utxo` whole, signed by `signer`
fn select_input(utxo: Utxo, signer: Address) -> TransferableInput {
    let amount = utxo.output.amount().unwrap();
    let mut input = AmountInput::new(amount);
    input.add_sig_idx(utxo.owners().address_index(&signer).unwrap(), signer);
    TransferableInput::new(utxo.tx_id, utxo.output_index, utxo.asset_id, Input::SecpTransfer(input))
}
