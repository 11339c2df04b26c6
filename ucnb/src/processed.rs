//! Write-once membership set of processed transfers. Entries are never removed, which is
//! what makes claim processing idempotent across the lifetime of the bridge.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    error::{BridgeError, Result},
    message::TransferKey,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessedSet {
    seen: HashSet<TransferKey>,
}

impl ProcessedSet {
    pub fn new() -> ProcessedSet {
        Self::default()
    }

    pub fn contains(&self, key: &TransferKey) -> bool {
        self.seen.contains(key)
    }

    pub fn insert(&mut self, key: TransferKey) -> Result<()> {
        if self.seen.contains(&key) {
            return Err(BridgeError::DataAlreadyProcessed(key.source_tx_hash));
        }
        self.seen.insert(key);
        Ok(())
    }
}
