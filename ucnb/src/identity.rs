//! The original ↔ duplicate collection identity registry.
//!
//! At most one duplicate collection is ever created per (original contract, original chain)
//! pair. Both lookup directions are recorded in one atomic registration and stay in agreement
//! forever; mappings are immutable once set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// A collection on a specific chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    pub contract: String,
    pub chain: String,
}

impl CollectionRef {
    pub fn new(contract: impl Into<String>, chain: impl Into<String>) -> CollectionRef {
        CollectionRef {
            contract: contract.into(),
            chain: chain.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetIdentityRegistry {
    duplicate_of: HashMap<CollectionRef, CollectionRef>,
    original_of: HashMap<CollectionRef, CollectionRef>,
}

impl AssetIdentityRegistry {
    pub fn new() -> AssetIdentityRegistry {
        Self::default()
    }

    /// The duplicate collection representing `original`, if one has been created.
    pub fn resolve_duplicate(&self, original: &CollectionRef) -> Option<&CollectionRef> {
        self.duplicate_of.get(original)
    }

    /// The origin represented by `duplicate`, if `duplicate` is a known duplicate collection.
    pub fn resolve_original(&self, duplicate: &CollectionRef) -> Option<&CollectionRef> {
        self.original_of.get(duplicate)
    }

    /// Record `original` ↔ `duplicate` in both directions. Fails without touching either
    /// direction if any entry already exists for one of the endpoints.
    pub fn register(&mut self, original: CollectionRef, duplicate: CollectionRef) -> Result<()> {
        if self.duplicate_of.contains_key(&original) || self.original_of.contains_key(&duplicate) {
            return Err(BridgeError::MappingAlreadyExists);
        }
        self.original_of.insert(duplicate.clone(), original.clone());
        self.duplicate_of.insert(original, duplicate);
        Ok(())
    }
}
