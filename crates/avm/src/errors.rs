use thiserror::Error;

use avm_core::{enc::bases::EncodingError, ser::SerError, Address, AssetId};

/// Errors raised while building, validating, or signing transactions.
#[derive(Debug, Error)]
pub enum AvmError {
    /// A constructor or build argument failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Two outputs pay the same address in the same asset
    #[error("Duplicate output paying {address} in asset {asset_id}")]
    DuplicateOutput {
        /// The address paid twice
        address: Address,
        /// The asset paid twice
        asset_id: AssetId,
    },

    /// A textual address could not be parsed or encoded
    #[error("Address error: {0}")]
    Address(String),

    /// The UTXO snapshot cannot cover the requested amounts
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Inputs do not cover the required fee
    #[error("Fee of {required} not covered. Available: {available}")]
    Fee {
        /// The fee the chain requires
        required: u64,
        /// The amount available to pay it
        available: u64,
    },

    /// The chain does not accept fees in this asset
    #[error("Fees must be paid in {required}. Got {got}")]
    FeeAsset {
        /// The asset the chain accepts fees in
        required: AssetId,
        /// The asset offered
        got: AssetId,
    },

    /// No signing key is known for an address
    #[error("No key available for address {0}")]
    MissingKey(Address),

    /// An internal invariant does not hold. Indicates a bug or corrupted input.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Amount arithmetic overflowed
    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),

    /// Bubbled up from the wire codec
    #[error(transparent)]
    Ser(#[from] SerError),

    /// Bubbled up from a textual encoding
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Bubbled up from the ECDSA backend
    #[error(transparent)]
    Signing(#[from] k256::ecdsa::Error),
}

/// Type alias for results carrying an `AvmError`
pub type AvmResult<T> = Result<T, AvmError>;
