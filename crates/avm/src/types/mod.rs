//! Holds AVM wire types: owner sets, outputs, inputs, UTXOs, credentials, and transactions.

pub mod credential;
pub mod input;
pub mod output;
pub mod owners;
pub mod tx;
pub mod utxo;

pub use credential::*;
pub use input::*;
pub use output::*;
pub use owners::*;
pub use tx::*;
pub use utxo::*;
