//! Escrow bookkeeping for locked assets.
//!
//! Exactly one storage location exists per (collection, chain) pair; it is allocated on the
//! first lock and reused for every later lock and unlock of that collection. The ledger also
//! tracks which individual assets are currently held, so a claim can tell a returning native
//! asset (unlock) apart from a wrapped one (mint).

use std::collections::{HashMap, HashSet};

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::identity::CollectionRef;

pub type StorageId = u64;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EscrowLedger {
    locations: HashMap<CollectionRef, StorageId>,
    held: HashSet<(CollectionRef, U256)>,
    next_id: StorageId,
}

impl EscrowLedger {
    pub fn new() -> EscrowLedger {
        Self::default()
    }

    /// The storage location for `collection`, allocating one on first use. Idempotent.
    pub fn get_or_create(&mut self, collection: &CollectionRef) -> StorageId {
        if let Some(id) = self.locations.get(collection) {
            return *id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.locations.insert(collection.clone(), id);
        id
    }

    pub fn has_escrow(&self, collection: &CollectionRef) -> bool {
        self.locations.contains_key(collection)
    }

    /// Mark `token_id` as held in `collection`'s escrow.
    pub fn deposit(&mut self, collection: &CollectionRef, token_id: U256) {
        self.held.insert((collection.clone(), token_id));
    }

    /// Mark `token_id` as released. Returns whether it was held.
    pub fn withdraw(&mut self, collection: &CollectionRef, token_id: U256) -> bool {
        self.held.remove(&(collection.clone(), token_id))
    }

    pub fn holds(&self, collection: &CollectionRef, token_id: U256) -> bool {
        self.held.contains(&(collection.clone(), token_id))
    }
}
