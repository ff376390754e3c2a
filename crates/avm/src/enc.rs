//! Textual addresses.
//!
//! An address is written as `<chain alias>-<bech32>`, where the bech32 string carries the
//! network's human-readable part and the 20-byte address payload. E.g.
//! `X-avax1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqxpdk7q`.

use bech32::{FromBase32, ToBase32, Variant};

use avm_core::Address;

use crate::{
    errors::{AvmError, AvmResult},
    nets::NetworkParams,
};

/// Encodes and decodes the textual addresses of one chain.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AddressEncoder {
    alias: String,
    hrp: String,
}

impl AddressEncoder {
    /// Instantiate an encoder for a chain alias and human-readable part
    pub fn new(alias: &str, hrp: &str) -> Self {
        Self {
            alias: alias.to_owned(),
            hrp: hrp.to_owned(),
        }
    }

    /// Instantiate an encoder for a chain on network `N`
    pub fn for_network<N: NetworkParams>(alias: &str) -> Self {
        Self::new(alias, N::HRP)
    }

    /// The chain alias
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The human-readable part
    pub fn hrp(&self) -> &str {
        &self.hrp
    }

    /// Encode the bech32 part of an address, without the chain alias.
    pub fn to_bech32(&self, address: &Address) -> AvmResult<String> {
        bech32::encode(&self.hrp, address.as_bytes().to_base32(), Variant::Bech32)
            .map_err(|e| AvmError::Address(e.to_string()))
    }

    /// Encode an address as `<alias>-<bech32>`.
    pub fn encode_address(&self, address: &Address) -> AvmResult<String> {
        Ok(format!("{}-{}", self.alias, self.to_bech32(address)?))
    }

    /// Decode an address. The alias must match this chain's alias, and the human-readable part
    /// must match this network's.
    pub fn decode_address(&self, s: &str) -> AvmResult<Address> {
        let (alias, hrp, address) = parse_address(s)?;
        if alias != self.alias {
            return Err(AvmError::Address(format!(
                "expected chain alias {}. Got {}",
                self.alias, alias
            )));
        }
        if hrp != self.hrp {
            return Err(AvmError::Address(format!(
                "expected hrp {}. Got {}",
                self.hrp, hrp
            )));
        }
        Ok(address)
    }
}

/// Split a textual address into its chain alias, human-readable part, and payload.
pub fn parse_address(s: &str) -> AvmResult<(String, String, Address)> {
    let (alias, rest) = s
        .split_once('-')
        .ok_or_else(|| AvmError::Address(format!("missing chain alias in {:?}", s)))?;
    if alias.is_empty() {
        return Err(AvmError::Address(format!("empty chain alias in {:?}", s)));
    }
    let (hrp, data, variant) = bech32::decode(rest).map_err(|e| AvmError::Address(e.to_string()))?;
    if variant != Variant::Bech32 {
        return Err(AvmError::Address("expected bech32, got bech32m".to_owned()));
    }
    let payload = Vec::<u8>::from_base32(&data).map_err(|e| AvmError::Address(e.to_string()))?;
    let address = Address::from_exact(&payload).map_err(|e| AvmError::Address(e.to_string()))?;
    Ok((alias.to_owned(), hrp, address))
}
