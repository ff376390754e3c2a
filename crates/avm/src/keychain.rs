//! Signing keys.
//!
//! `UnsignedTx::sign` never touches key material directly. It asks a `KeySource` to resolve each
//! signer address to a handle and to sign the transaction's message with that handle. The
//! in-memory `KeyChain` is the default source. Hardware or remote signers implement the trait
//! themselves.

use std::collections::BTreeMap;

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};

use avm_core::{
    enc::bases::{decode_cb58, decode_hex, encode_cb58},
    hashes::hash160,
    Address,
};

use crate::{
    errors::{AvmError, AvmResult},
    types::credential::Signature,
};

/// Prefix of the textual private key format, `PrivateKey-<cb58>`
pub const PRIVATE_KEY_PREFIX: &str = "PrivateKey-";

/// Resolves signer addresses to keys and signs messages with them.
pub trait KeySource {
    /// The resolved key
    type Handle;

    /// Resolve the key for `address`. Fails with `MissingKey` if none is known.
    fn resolve(&self, address: &Address) -> AvmResult<Self::Handle>;

    /// Sign a 32-byte message with a resolved key
    fn sign(&self, handle: &Self::Handle, message: &[u8]) -> AvmResult<Signature>;
}

/// A secp256k1 key and its address.
#[derive(Clone)]
pub struct KeyPair {
    key: SigningKey,
    address: Address,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.key.to_bytes() == other.key.to_bytes()
    }
}

impl Eq for KeyPair {}

impl From<SigningKey> for KeyPair {
    fn from(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }
}

/// The address of a public key: `ripemd160(sha256(compressed point))`
fn address_of(key: &VerifyingKey) -> Address {
    Address::new(hash160(key.to_encoded_point(true).as_bytes()))
}

impl KeyPair {
    /// Generate a new key from the thread-local CSPRNG
    pub fn random() -> Self {
        SigningKey::random(&mut rand::thread_rng()).into()
    }

    /// Instantiate from a 32-byte scalar
    pub fn from_bytes(bytes: &[u8]) -> AvmResult<Self> {
        if bytes.len() != 32 {
            return Err(AvmError::Validation(format!(
                "private key must be 32 bytes. Got {}",
                bytes.len()
            )));
        }
        Ok(SigningKey::from_slice(bytes)?.into())
    }

    /// Instantiate from a hex-encoded scalar
    pub fn from_hex(s: &str) -> AvmResult<Self> {
        Self::from_bytes(&decode_hex(s)?)
    }

    /// Parse the `PrivateKey-<cb58>` format
    pub fn from_private_key_string(s: &str) -> AvmResult<Self> {
        let body = s.strip_prefix(PRIVATE_KEY_PREFIX).ok_or_else(|| {
            AvmError::Validation(format!("private key must start with {}", PRIVATE_KEY_PREFIX))
        })?;
        Self::from_bytes(&decode_cb58(body)?)
    }

    /// Write the `PrivateKey-<cb58>` format
    pub fn to_private_key_string(&self) -> String {
        format!("{}{}", PRIVATE_KEY_PREFIX, encode_cb58(&self.key.to_bytes()))
    }

    /// The 33-byte compressed public key
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    /// The address of this key
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte message. Returns `r ‖ s ‖ recovery_id`.
    pub fn sign(&self, message: &[u8]) -> AvmResult<Signature> {
        let (sig, recid) = self.key.sign_prehash_recoverable(message)?;
        let mut buf = [0u8; 65];
        buf[..64].copy_from_slice(&sig.to_bytes());
        buf[64] = recid.to_byte();
        Ok(Signature::new(buf))
    }

    /// Recover the address that produced `signature` over `message`.
    pub fn recover(message: &[u8], signature: &Signature) -> AvmResult<Address> {
        let bytes = signature.as_bytes();
        let sig = EcdsaSignature::from_slice(&bytes[..64])?;
        let recid = RecoveryId::from_byte(bytes[64]).ok_or_else(|| {
            AvmError::Validation(format!("invalid recovery id {}", bytes[64]))
        })?;
        let key = VerifyingKey::recover_from_prehash(message, &sig, recid)?;
        Ok(address_of(&key))
    }
}

/// An in-memory set of keys, indexed by address.
#[derive(Debug, Default, Clone)]
pub struct KeyChain {
    keys: BTreeMap<Address, KeyPair>,
}

impl KeyChain {
    /// An empty keychain
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Returns its address.
    pub fn add(&mut self, key: KeyPair) -> Address {
        let address = key.address();
        self.keys.insert(address, key);
        address
    }

    /// Generate and add a fresh key
    pub fn generate(&mut self) -> Address {
        self.add(KeyPair::random())
    }

    /// Add a key in the `PrivateKey-<cb58>` format
    pub fn import_key(&mut self, s: &str) -> AvmResult<Address> {
        Ok(self.add(KeyPair::from_private_key_string(s)?))
    }

    /// The addresses held, ascending
    pub fn addresses(&self) -> Vec<Address> {
        self.keys.keys().copied().collect()
    }

    /// The key for `address`
    pub fn get(&self, address: &Address) -> Option<&KeyPair> {
        self.keys.get(address)
    }

    /// True if a key for `address` is held
    pub fn has_address(&self, address: &Address) -> bool {
        self.keys.contains_key(address)
    }
}

impl KeySource for KeyChain {
    type Handle = KeyPair;

    fn resolve(&self, address: &Address) -> AvmResult<KeyPair> {
        self.get(address).cloned().ok_or(AvmError::MissingKey(*address))
    }

    fn sign(&self, handle: &KeyPair, message: &[u8]) -> AvmResult<Signature> {
        handle.sign(message)
    }
}
