//! Canonical bridge payloads.
//!
//! The serialization in this module is the wire contract of the protocol: validators on every
//! chain sign the keccak digest of these exact bytes, so field order and encoding must match
//! bit-for-bit across reimplementations. Integers are fixed-width big-endian, variable-length
//! fields carry a `u32` big-endian length prefix.

use std::fmt::{self, Debug, Formatter};

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::crypto::Hash;

/// The two asset shapes the bridge moves: unique (721-like) tokens and fungible-supply
/// (1155-like) tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Singular,
    Multiple,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Singular => "singular",
            AssetKind::Multiple => "multiple",
        }
    }
}

/// The chain-agnostic description of one asset movement. Immutable once constructed; the
/// digest of its canonical serialization is the message a quorum of validators signs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDescriptor {
    pub token_id: U256,
    pub source_chain: String,
    pub destination_chain: String,
    /// Recipient of the claimed asset on the destination chain.
    pub destination_user: String,
    /// Contract the asset was locked from on the source chain.
    pub source_contract: String,
    pub name: String,
    pub symbol: String,
    pub royalty_bps: u16,
    pub royalty_receiver: String,
    pub metadata_uri: String,
    /// Hash of the transaction that emitted the `Locked` event.
    pub source_tx_hash: B256,
    /// Zero for `Singular` assets, the moved amount for `Multiple`.
    pub token_amount: U256,
    pub kind: AssetKind,
    /// Claim fee, in the destination chain's base units.
    pub fee: U256,
}

impl Debug for TransferDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransferDescriptor [token: {}, {} -> {}, tx: {}]",
            self.token_id, self.source_chain, self.destination_chain, self.source_tx_hash
        )
    }
}

impl TransferDescriptor {
    /// The canonical serialization. Field order is fixed and shared by every deployment of
    /// the protocol.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_u256(&mut buf, self.token_id);
        put_str(&mut buf, &self.source_chain);
        put_str(&mut buf, &self.destination_chain);
        put_str(&mut buf, &self.destination_user);
        put_str(&mut buf, &self.source_contract);
        put_str(&mut buf, &self.name);
        put_str(&mut buf, &self.symbol);
        buf.extend_from_slice(&self.royalty_bps.to_be_bytes());
        put_str(&mut buf, &self.royalty_receiver);
        put_str(&mut buf, &self.metadata_uri);
        buf.extend_from_slice(self.source_tx_hash.as_slice());
        put_u256(&mut buf, self.token_amount);
        put_str(&mut buf, self.kind.as_str());
        put_u256(&mut buf, self.fee);
        buf
    }

    /// The digest validators sign to authorize the claim for this transfer.
    pub fn digest(&self) -> Hash {
        Hash::compute([self.canonical_bytes()])
    }

    /// The replay-protection identity of this transfer.
    pub fn transfer_key(&self) -> TransferKey {
        TransferKey {
            source_tx_hash: self.source_tx_hash,
            source_chain: self.source_chain.clone(),
        }
    }
}

/// Identifies one transfer for replay protection, independent of the rest of the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferKey {
    pub source_tx_hash: B256,
    pub source_chain: String,
}

pub(crate) fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
}

pub(crate) fn put_u256(buf: &mut Vec<u8>, value: U256) {
    buf.extend_from_slice(&value.to_be_bytes::<32>());
}
