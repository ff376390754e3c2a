//! Re-exports of the commonly used types of `avm` and `avm-core`.

pub use crate::{
    asset::*,
    builder::*,
    enc::*,
    errors::*,
    keychain::*,
    nets::*,
    select::select_spendable,
    types::*,
};

pub use avm_core::{
    enc::{ByteCodec, Encoded, Encoding},
    ser::ByteFormat,
    Address, AssetId, BlockchainId, Seq, SortedSeq, TxId,
};
