//! Network and chain definitions.
//!
//! A `NetworkParams` type fixes the network id and the bech32 human-readable part at compile
//! time. A `ChainContext` is the runtime configuration of a single chain on that network. It is
//! plain data and derives serde, so callers may load it from any format they like.
//!
//! ```
//! use avm::nets::{ChainContext, DefaultNetwork, Fuji, NetworkParams};
//! use avm_core::AssetId;
//!
//! let ctx = ChainContext::platform::<Fuji>(AssetId::default(), 1_000_000);
//! assert_eq!(ctx.network_id, 5);
//! assert_eq!(ctx.alias, "P");
//!
//! let default = ChainContext::default_platform(AssetId::default(), 1_000_000);
//! assert_eq!(default.network_id, DefaultNetwork::NETWORK_ID);
//! ```

use serde::{Deserialize, Serialize};

use avm_core::{AssetId, BlockchainId};

use crate::{
    enc::AddressEncoder,
    errors::{AvmError, AvmResult},
};

/// Compile-time parameters of a network.
pub trait NetworkParams {
    /// The numeric network id written into every transaction
    const NETWORK_ID: u32;
    /// The bech32 human-readable part of addresses on this network
    const HRP: &'static str;
}

/// The main network
#[derive(Debug, Clone, Copy)]
pub struct Mainnet;

impl NetworkParams for Mainnet {
    const NETWORK_ID: u32 = 1;
    const HRP: &'static str = "avax";
}

/// The public test network
#[derive(Debug, Clone, Copy)]
pub struct Fuji;

impl NetworkParams for Fuji {
    const NETWORK_ID: u32 = 5;
    const HRP: &'static str = "fuji";
}

/// A local development network
#[derive(Debug, Clone, Copy)]
pub struct Local;

impl NetworkParams for Local {
    const NETWORK_ID: u32 = 12345;
    const HRP: &'static str = "local";
}

/// The default network, selected by feature flag. Mainnet unless only `testnet` is enabled.
#[cfg(any(feature = "mainnet", not(feature = "testnet")))]
pub type DefaultNetwork = Mainnet;

/// The default network, selected by feature flag
#[cfg(all(feature = "testnet", not(feature = "mainnet")))]
pub type DefaultNetwork = Fuji;

/// The kind of chain a transaction targets. Determines transaction type ids and fee policy.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    /// The asset exchange chain
    Avm,
    /// The platform chain
    Platform,
}

/// The transaction body variants
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum TxKind {
    /// A transfer on the current chain
    Base,
    /// An import from another chain's shared memory
    Import,
    /// An export to another chain's shared memory
    Export,
}

impl ChainKind {
    /// The wire type id of a transaction body on this chain. The platform chain has no plain
    /// transfer transaction.
    pub fn tx_type_id(&self, kind: TxKind) -> Option<u32> {
        match (self, kind) {
            (ChainKind::Avm, TxKind::Base) => Some(0),
            (ChainKind::Avm, TxKind::Import) => Some(3),
            (ChainKind::Avm, TxKind::Export) => Some(4),
            (ChainKind::Platform, TxKind::Base) => None,
            (ChainKind::Platform, TxKind::Import) => Some(17),
            (ChainKind::Platform, TxKind::Export) => Some(18),
        }
    }

    /// Determine chain and body kind from a wire type id.
    pub fn from_tx_type_id(type_id: u32) -> Option<(ChainKind, TxKind)> {
        match type_id {
            0 => Some((ChainKind::Avm, TxKind::Base)),
            3 => Some((ChainKind::Avm, TxKind::Import)),
            4 => Some((ChainKind::Avm, TxKind::Export)),
            17 => Some((ChainKind::Platform, TxKind::Import)),
            18 => Some((ChainKind::Platform, TxKind::Export)),
            _ => None,
        }
    }

    /// True if the chain accepts fees paid in `asset_id`.
    pub fn accepts_fee_asset(&self, native_asset_id: &AssetId, asset_id: &AssetId) -> bool {
        match self {
            ChainKind::Avm => true,
            ChainKind::Platform => native_asset_id == asset_id,
        }
    }
}

/// Runtime configuration of one chain.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct ChainContext {
    /// The network id written into transactions
    pub network_id: u32,
    /// The chain's kind
    pub chain: ChainKind,
    /// The chain's id
    pub blockchain_id: BlockchainId,
    /// The id of the network's native asset
    pub native_asset_id: AssetId,
    /// The fee charged per transaction
    pub tx_fee: u64,
    /// The asset fees are paid in. Defaults to the native asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_asset_id: Option<AssetId>,
    /// The bech32 human-readable part of addresses
    pub hrp: String,
    /// The chain alias prefixed to textual addresses, e.g. `X`
    pub alias: String,
}

impl ChainContext {
    /// Context for an exchange chain on network `N`.
    pub fn avm<N: NetworkParams>(
        blockchain_id: BlockchainId,
        native_asset_id: AssetId,
        tx_fee: u64,
    ) -> Self {
        Self {
            network_id: N::NETWORK_ID,
            chain: ChainKind::Avm,
            blockchain_id,
            native_asset_id,
            tx_fee,
            fee_asset_id: None,
            hrp: N::HRP.to_owned(),
            alias: "X".to_owned(),
        }
    }

    /// Context for the platform chain on network `N`.
    pub fn platform<N: NetworkParams>(native_asset_id: AssetId, tx_fee: u64) -> Self {
        Self {
            network_id: N::NETWORK_ID,
            chain: ChainKind::Platform,
            blockchain_id: BlockchainId::PLATFORM,
            native_asset_id,
            tx_fee,
            fee_asset_id: None,
            hrp: N::HRP.to_owned(),
            alias: "P".to_owned(),
        }
    }

    /// Context for an exchange chain on the `DefaultNetwork`
    pub fn default_avm(blockchain_id: BlockchainId, native_asset_id: AssetId, tx_fee: u64) -> Self {
        Self::avm::<DefaultNetwork>(blockchain_id, native_asset_id, tx_fee)
    }

    /// Context for the platform chain on the `DefaultNetwork`
    pub fn default_platform(native_asset_id: AssetId, tx_fee: u64) -> Self {
        Self::platform::<DefaultNetwork>(native_asset_id, tx_fee)
    }

    /// Pay fees in a different asset. Validated when a transaction is built.
    pub fn with_fee_asset(mut self, asset_id: AssetId) -> Self {
        self.fee_asset_id = Some(asset_id);
        self
    }

    /// Resolve the fee asset and amount under the chain's fee policy.
    pub fn fee(&self) -> AvmResult<(AssetId, u64)> {
        let asset_id = self.fee_asset_id.unwrap_or(self.native_asset_id);
        if !self.chain.accepts_fee_asset(&self.native_asset_id, &asset_id) {
            return Err(AvmError::FeeAsset {
                required: self.native_asset_id,
                got: asset_id,
            });
        }
        Ok((asset_id, self.tx_fee))
    }

    /// The address encoder for this chain
    pub fn encoder(&self) -> AddressEncoder {
        AddressEncoder::new(&self.alias, &self.hrp)
    }
}
