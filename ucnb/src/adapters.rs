//! The collaborator boundary between the protocol core and a concrete ledger.
//!
//! The engine never constructs transactions or touches a token standard directly; it drives
//! these traits and treats any failure as a rejection of the whole operation. An in-memory
//! backend lives here too, used by the test suite and the standalone node's local mode.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use anyhow::{Result, anyhow};

use crate::escrow::StorageId;

/// Token-standard operations on this chain: custody transfer into escrow, minting into a
/// collection, release out of escrow and ownership lookup.
pub trait TokenAdapter: Send {
    fn owner_of(&self, collection: &str, token_id: U256) -> Result<String>;

    /// Move `token_id` (or `amount` of it) out of the owner's hands into the given escrow
    /// location. Must fail if the current owner has not authorized the transfer.
    fn transfer_into(
        &mut self,
        escrow: StorageId,
        collection: &str,
        token_id: U256,
        amount: U256,
    ) -> Result<()>;

    /// Release a previously escrowed asset to `recipient`.
    fn release(
        &mut self,
        escrow: StorageId,
        collection: &str,
        token_id: U256,
        recipient: &str,
        amount: U256,
    ) -> Result<()>;

    /// Mint `token_id` into `collection`, owned by `recipient`, carrying the given royalty.
    fn mint_into(
        &mut self,
        collection: &str,
        recipient: &str,
        token_id: U256,
        amount: U256,
        royalty_bps: u16,
        royalty_receiver: &str,
    ) -> Result<()>;
}

/// Deploys duplicate collections on this chain.
pub trait CollectionFactory: Send {
    fn deploy_duplicate_collection(
        &mut self,
        name: &str,
        symbol: &str,
        royalty_bps: u16,
        royalty_receiver: &str,
    ) -> Result<String>;
}

/// The payment rail validator rewards travel over.
pub trait PaymentAdapter: Send {
    /// Signal that `amount` has been credited to `validator`'s withdrawable balance.
    fn credit_pending_reward(&mut self, validator: Address, amount: U256) -> Result<()>;

    /// Pay out `amount` to `validator`.
    fn pay_out(&mut self, validator: Address, amount: U256) -> Result<()>;
}

/// Everything the engine needs from a concrete chain. Blanket-implemented, so any type
/// carrying the three adapter traits qualifies.
pub trait ChainBackend: TokenAdapter + CollectionFactory + PaymentAdapter {}

impl<T: TokenAdapter + CollectionFactory + PaymentAdapter> ChainBackend for T {}

/// An in-memory single-chain backend implementing all three adapters. Token ownership is a
/// plain map; escrow locations own tokens under a synthetic `escrow:<id>` account.
#[derive(Debug, Default)]
pub struct InMemoryChain {
    /// (collection, token id) -> (owner, amount).
    tokens: HashMap<(String, U256), (String, U256)>,
    deployed: Vec<String>,
    credited: HashMap<Address, U256>,
    paid: HashMap<Address, U256>,
}

fn escrow_account(escrow: StorageId) -> String {
    format!("escrow:{escrow}")
}

impl InMemoryChain {
    pub fn new() -> InMemoryChain {
        Self::default()
    }

    /// Seed a token, for tests and local experimentation.
    pub fn put_token(&mut self, collection: &str, token_id: U256, owner: &str, amount: U256) {
        self.tokens.insert(
            (collection.to_owned(), token_id),
            (owner.to_owned(), amount),
        );
    }

    pub fn deployed_collections(&self) -> &[String] {
        &self.deployed
    }

    pub fn paid_out(&self, validator: Address) -> U256 {
        self.paid.get(&validator).copied().unwrap_or_default()
    }

    pub fn credited(&self, validator: Address) -> U256 {
        self.credited.get(&validator).copied().unwrap_or_default()
    }
}

impl TokenAdapter for InMemoryChain {
    fn owner_of(&self, collection: &str, token_id: U256) -> Result<String> {
        self.tokens
            .get(&(collection.to_owned(), token_id))
            .map(|(owner, _)| owner.clone())
            .ok_or_else(|| anyhow!("no token {token_id} in {collection}"))
    }

    fn transfer_into(
        &mut self,
        escrow: StorageId,
        collection: &str,
        token_id: U256,
        amount: U256,
    ) -> Result<()> {
        let entry = self
            .tokens
            .get_mut(&(collection.to_owned(), token_id))
            .ok_or_else(|| anyhow!("no token {token_id} in {collection}"))?;
        entry.0 = escrow_account(escrow);
        entry.1 = amount;
        Ok(())
    }

    fn release(
        &mut self,
        escrow: StorageId,
        collection: &str,
        token_id: U256,
        recipient: &str,
        amount: U256,
    ) -> Result<()> {
        let entry = self
            .tokens
            .get_mut(&(collection.to_owned(), token_id))
            .ok_or_else(|| anyhow!("no token {token_id} in {collection}"))?;
        if entry.0 != escrow_account(escrow) {
            return Err(anyhow!("token {token_id} is not held by escrow {escrow}"));
        }
        entry.0 = recipient.to_owned();
        entry.1 = amount;
        Ok(())
    }

    fn mint_into(
        &mut self,
        collection: &str,
        recipient: &str,
        token_id: U256,
        amount: U256,
        _royalty_bps: u16,
        _royalty_receiver: &str,
    ) -> Result<()> {
        self.tokens.insert(
            (collection.to_owned(), token_id),
            (recipient.to_owned(), amount),
        );
        Ok(())
    }
}

impl CollectionFactory for InMemoryChain {
    fn deploy_duplicate_collection(
        &mut self,
        _name: &str,
        symbol: &str,
        _royalty_bps: u16,
        _royalty_receiver: &str,
    ) -> Result<String> {
        let id = format!("wrapped-{}-{}", symbol.to_lowercase(), self.deployed.len());
        self.deployed.push(id.clone());
        Ok(id)
    }
}

impl PaymentAdapter for InMemoryChain {
    fn credit_pending_reward(&mut self, validator: Address, amount: U256) -> Result<()> {
        *self.credited.entry(validator).or_default() += amount;
        Ok(())
    }

    fn pay_out(&mut self, validator: Address, amount: U256) -> Result<()> {
        *self.paid.entry(validator).or_default() += amount;
        Ok(())
    }
}
