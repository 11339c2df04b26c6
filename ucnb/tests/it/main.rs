mod claim;
mod governance;
mod node;

use alloy::primitives::{B256, U256};
use ucnb::{
    adapters::InMemoryChain,
    cfg::Config,
    crypto::{SecretKey, ValidatorPublicKey, ValidatorSignature},
    engine::BridgeEngine,
    event::{BridgeEvent, EventLog},
    message::TransferDescriptor,
};

/// A pair of bridge deployments sharing one validator set, plus the relaying glue a test
/// needs to move assets between them.
struct TwoChains {
    keys: Vec<SecretKey>,
    bsc: BridgeEngine<InMemoryChain>,
    bsc_events: EventLog,
    eth: BridgeEngine<InMemoryChain>,
    eth_events: EventLog,
    next_tx: u8,
}

impl TwoChains {
    fn new(validators: usize) -> TwoChains {
        let keys: Vec<_> = (0..validators)
            .map(|_| SecretKey::new().unwrap())
            .collect();
        let (bsc, bsc_events) = deployment("BSC", &keys);
        let (eth, eth_events) = deployment("ETH", &keys);
        TwoChains {
            keys,
            bsc,
            bsc_events,
            eth,
            eth_events,
            next_tx: 0,
        }
    }

    fn relay_from_bsc(&mut self, fee: U256) -> TransferDescriptor {
        let events = self.bsc_events.clone();
        self.relay(&events, fee)
    }

    fn relay_from_eth(&mut self, fee: U256) -> TransferDescriptor {
        let events = self.eth_events.clone();
        self.relay(&events, fee)
    }

    /// Build the descriptor a relayer would assemble from the most recent `Locked` event on
    /// `events`, attaching collection metadata and a fresh source transaction hash.
    fn relay(&mut self, events: &EventLog, fee: U256) -> TransferDescriptor {
        let locked = events
            .snapshot()
            .into_iter()
            .rev()
            .find_map(|event| match event {
                BridgeEvent::Locked {
                    token_id,
                    source_chain,
                    destination_chain,
                    destination_user,
                    source_contract,
                    token_amount,
                    kind,
                } => Some(TransferDescriptor {
                    token_id,
                    source_chain,
                    destination_chain,
                    destination_user,
                    source_contract,
                    name: "Example".into(),
                    symbol: "EXM".into(),
                    royalty_bps: 250,
                    royalty_receiver: "0xartist".into(),
                    metadata_uri: "ipfs://meta".into(),
                    source_tx_hash: B256::ZERO,
                    token_amount,
                    kind,
                    fee,
                }),
                _ => None,
            })
            .unwrap();
        self.next_tx += 1;
        TransferDescriptor {
            source_tx_hash: B256::repeat_byte(self.next_tx),
            ..locked
        }
    }

    /// Signatures over `descriptor` from the first `n` validators.
    fn sign(&self, n: usize, descriptor: &TransferDescriptor) -> Approvals {
        self.keys[..n]
            .iter()
            .map(|k| (k.ecdsa_public_key(), k.sign_ecdsa(descriptor.digest())))
            .collect()
    }
}

type Approvals = Vec<(ValidatorPublicKey, ValidatorSignature)>;

fn config(chain: &str) -> Config {
    Config {
        chain: chain.into(),
        chain_fee: U256::ZERO,
        royalty_receiver: "0xroyalty".into(),
        genesis_validators: Vec::new(),
    }
}

fn deployment(chain: &str, keys: &[SecretKey]) -> (BridgeEngine<InMemoryChain>, EventLog) {
    let events = EventLog::new();
    let engine = BridgeEngine::with_validators(
        &config(chain),
        keys.iter().map(|k| k.ecdsa_public_key()),
        InMemoryChain::new(),
        Box::new(events.clone()),
    );
    (engine, events)
}
