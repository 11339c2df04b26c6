//! Universal cross-chain NFT bridge core.
//!
//! A chain-agnostic protocol engine for moving non-fungible assets between chains: assets
//! lock into escrow on their source chain and a quorum of validator signatures authorizes
//! minting a duplicate (or releasing the escrowed original) on the destination chain. The
//! engine is pure state-machine logic; everything chain-specific sits behind the adapter
//! traits in [`adapters`].

pub mod adapters;
pub mod cfg;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod escrow;
pub mod event;
pub mod identity;
pub mod message;
pub mod node;
pub mod processed;
pub mod validators;
