//! End-to-end transfer scenarios across two bridge deployments sharing a validator set.

use alloy::primitives::U256;
use ucnb::{
    adapters::TokenAdapter,
    engine::LockRequest,
    error::BridgeError,
    event::BridgeEvent,
    identity::CollectionRef,
    message::AssetKind,
};

use crate::TwoChains;

fn lock_request(collection: &str, token_id: u64, destination_chain: &str) -> LockRequest {
    LockRequest {
        caller: "alice".into(),
        collection: collection.into(),
        token_id: U256::from(token_id),
        amount: U256::ZERO,
        kind: AssetKind::Singular,
        destination_chain: destination_chain.into(),
        destination_user: "0xuser".into(),
    }
}

#[test]
fn transfer_from_bsc_to_eth_creates_a_duplicate() {
    // 4 active validators, threshold 3.
    let mut chains = TwoChains::new(4);
    chains
        .bsc
        .backend_mut()
        .put_token("0xc", U256::from(1), "alice", U256::ZERO);

    chains.bsc.lock(lock_request("0xc", 1, "ETH")).unwrap();
    let descriptor = chains.relay_from_bsc(U256::from(100));
    let sigs = chains.sign(3, &descriptor);

    chains
        .eth
        .claim_singular(descriptor.clone(), &sigs, descriptor.fee)
        .unwrap();

    // A fresh duplicate collection exists on ETH, holds the token for the user, and the
    // identity mapping resolves in both directions.
    let deployed = chains.eth.backend().deployed_collections().to_vec();
    assert_eq!(deployed.len(), 1);
    assert_eq!(
        chains
            .eth
            .backend()
            .owner_of(&deployed[0], U256::from(1))
            .unwrap(),
        "0xuser"
    );
    let original = CollectionRef::new("0xc", "BSC");
    let duplicate = CollectionRef::new(&deployed[0], "ETH");
    assert_eq!(
        chains.eth.identities().resolve_duplicate(&original),
        Some(&duplicate)
    );
    assert_eq!(
        chains.eth.identities().resolve_original(&duplicate),
        Some(&original)
    );

    // Replaying the identical claim fails and changes nothing.
    assert!(matches!(
        chains
            .eth
            .claim_singular(descriptor.clone(), &sigs, descriptor.fee)
            .unwrap_err(),
        BridgeError::DataAlreadyProcessed(_)
    ));
    assert_eq!(chains.eth.backend().deployed_collections().len(), 1);
}

#[test]
fn round_trip_releases_the_original_from_escrow() {
    let mut chains = TwoChains::new(4);
    chains
        .bsc
        .backend_mut()
        .put_token("0xc", U256::from(1), "alice", U256::ZERO);

    // Out: BSC -> ETH.
    chains.bsc.lock(lock_request("0xc", 1, "ETH")).unwrap();
    let out = chains.relay_from_bsc(U256::from(100));
    let sigs = chains.sign(3, &out);
    chains.eth.claim_singular(out.clone(), &sigs, out.fee).unwrap();
    let wrapped = chains.eth.backend().deployed_collections()[0].clone();

    // Home: the user locks the wrapped token on ETH, bound for BSC. The lock event
    // advertises the original collection, not the wrapped one.
    let mut back = lock_request(&wrapped, 1, "BSC");
    back.caller = "0xuser".into();
    back.destination_user = "bob".into();
    chains.eth.lock(back).unwrap();
    let events = chains.eth_events.snapshot();
    assert!(matches!(
        events.last().unwrap(),
        BridgeEvent::Locked { source_chain, source_contract, .. }
            if source_chain == "BSC" && source_contract == "0xc"
    ));

    let home = chains.relay_from_eth(U256::from(100));
    let sigs = chains.sign(3, &home);
    chains
        .bsc
        .claim_singular(home.clone(), &sigs, home.fee)
        .unwrap();

    // The original was released from escrow, no new collection was deployed on BSC.
    assert_eq!(
        chains.bsc.backend().owner_of("0xc", U256::from(1)).unwrap(),
        "bob"
    );
    assert!(
        !chains
            .bsc
            .escrow()
            .holds(&CollectionRef::new("0xc", "BSC"), U256::from(1))
    );
    assert!(chains.bsc.backend().deployed_collections().is_empty());
    assert!(matches!(
        chains.bsc_events.snapshot().last().unwrap(),
        BridgeEvent::Claimed { unlocked: true, .. }
    ));
}

#[test]
fn fungible_amounts_survive_the_trip() {
    let mut chains = TwoChains::new(4);
    chains
        .bsc
        .backend_mut()
        .put_token("0xm", U256::from(9), "alice", U256::from(50));

    let mut request = lock_request("0xm", 9, "ETH");
    request.kind = AssetKind::Multiple;
    request.amount = U256::from(50);
    chains.bsc.lock(request).unwrap();

    let descriptor = chains.relay_from_bsc(U256::from(100));
    assert_eq!(descriptor.kind, AssetKind::Multiple);
    assert_eq!(descriptor.token_amount, U256::from(50));

    let sigs = chains.sign(3, &descriptor);
    // The singular entry point refuses a fungible descriptor.
    assert!(matches!(
        chains
            .eth
            .claim_singular(descriptor.clone(), &sigs, descriptor.fee)
            .unwrap_err(),
        BridgeError::InvalidNftType
    ));
    chains
        .eth
        .claim_multiple(descriptor.clone(), &sigs, descriptor.fee)
        .unwrap();

    let deployed = chains.eth.backend().deployed_collections().to_vec();
    assert_eq!(
        chains
            .eth
            .backend()
            .owner_of(&deployed[0], U256::from(9))
            .unwrap(),
        "0xuser"
    );
}

#[test]
fn sub_threshold_signatures_never_authorize_a_claim() {
    let mut chains = TwoChains::new(4);
    chains
        .bsc
        .backend_mut()
        .put_token("0xc", U256::from(1), "alice", U256::ZERO);
    chains.bsc.lock(lock_request("0xc", 1, "ETH")).unwrap();
    let descriptor = chains.relay_from_bsc(U256::from(100));

    // Many copies of two signers are still two distinct signers.
    let two = chains.sign(2, &descriptor);
    let many = [two.clone(), two.clone(), two].concat();
    assert!(matches!(
        chains
            .eth
            .claim_singular(descriptor.clone(), &many, descriptor.fee)
            .unwrap_err(),
        BridgeError::ThresholdNotReached { have: 2, need: 3 }
    ));
    assert!(chains.eth.backend().deployed_collections().is_empty());
}
