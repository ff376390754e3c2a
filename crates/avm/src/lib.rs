//! # AVM
//!
//! Transaction construction for AVM-style UTXO chains: the asset exchange chain and the platform
//! chain.
//!
//! ## Crate Layout
//!
//! ### Types
//!
//! Wire types. `OutputOwners` holds the spending conditions shared by every output. Outputs,
//! inputs, and credentials are closed enums dispatched on their numeric type id. Transactions
//! keep their inputs and outputs in `SortedSeq`s, so they always serialize in canonical order.
//!
//! ### Asset and Select
//!
//! `AssetAmountDestination` tracks how much of each asset a build must gather. `select_spendable`
//! fills it from a caller-provided `UtxoSet`, then synthesizes the paid and change outputs.
//!
//! ### Builder
//!
//! `TxBuilder` assembles base, import, and export transactions for the chain described by a
//! `ChainContext`. Builds return an `UnsignedTx`, which `sign` turns into a `Tx` using any
//! `KeySource`.
//!
//! ### Nets and Enc
//!
//! Network parameters, chain kinds and fee policy, and the textual address format.
//!
//! ## Example
//!
//! ```
//! use avm::prelude::*;
//!
//! let mut keys = KeyChain::new();
//! let me = keys.generate();
//! let native = AssetId::new([1; 32]);
//!
//! let utxos: UtxoSet = vec![Utxo::new(
//!     TxId::new([2; 32]),
//!     0,
//!     native,
//!     Output::SecpTransfer(AmountOutput::new(1000, OutputOwners::single(me))),
//! )]
//! .into_iter()
//! .collect();
//!
//! let ctx = ChainContext::avm::<Local>(BlockchainId::new([3; 32]), native, 1);
//! let builder = TxBuilder::new(ctx);
//! let payment = Payment::new(native, 400, vec![Address::new([4; 20])]);
//! let unsigned = builder
//!     .build_base_tx(&utxos, &payment, &SpendParams::new(vec![me], 1))
//!     .unwrap();
//! let tx = unsigned.sign(&keys).unwrap();
//! assert_eq!(tx.credentials().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod asset;
pub mod builder;
pub mod enc;
pub mod errors;
pub mod keychain;
pub mod nets;
pub mod prelude;
pub mod select;
pub mod types;

pub use asset::*;
pub use builder::*;
pub use enc::*;
pub use errors::*;
pub use keychain::*;
pub use nets::*;
pub use select::*;
pub use types::*;
