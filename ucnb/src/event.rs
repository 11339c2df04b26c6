//! Domain events emitted by the bridge engine for off-chain relayers.

use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::message::{AssetKind, TransferDescriptor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BridgeEvent {
    /// An asset moved into escrow on this chain, bound for `destination_chain`. Relayers
    /// build the transfer descriptor for the destination-side claim from this event.
    Locked {
        token_id: U256,
        source_chain: String,
        destination_chain: String,
        destination_user: String,
        source_contract: String,
        token_amount: U256,
        kind: AssetKind,
    },
    /// A validator-authorized claim completed on this chain.
    Claimed {
        descriptor: TransferDescriptor,
        /// The collection the asset now lives in on this chain.
        collection: String,
        /// True when a previously escrowed native asset was released rather than a
        /// duplicate minted.
        unlocked: bool,
    },
    ValidatorAdded {
        validator: Address,
    },
    ValidatorStatusChanged {
        validator: Address,
        active: bool,
    },
    ChainFeeChanged {
        fee: U256,
    },
    RoyaltyReceiverChanged {
        receiver: String,
    },
    RewardsClaimed {
        validator: Address,
        amount: U256,
    },
}

/// Append-only event delivery. Implementations must not fail; delivery to remote consumers
/// is somebody else's retry problem.
pub trait EventSink: Send {
    fn emit(&mut self, event: BridgeEvent);
}

/// A shared in-memory event log. Clones observe the same underlying log, so a test or local
/// node can keep a handle while the engine owns the sink.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<BridgeEvent>>>);

impl EventLog {
    pub fn new() -> EventLog {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<BridgeEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<BridgeEvent> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: BridgeEvent) {
        self.0.lock().unwrap().push(event);
    }
}

/// Emits events as structured log lines. Used by the standalone node binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&mut self, event: BridgeEvent) {
        tracing::info!(?event, "bridge event");
    }
}
