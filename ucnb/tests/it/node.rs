//! Driving a standalone bridge node through its handle.

use alloy::primitives::U256;
use ucnb::{
    adapters::InMemoryChain,
    engine::{BridgeEngine, LockRequest},
    error::BridgeError,
    event::EventLog,
    message::AssetKind,
    node::BridgeNode,
};

use crate::config;

#[tokio::test]
async fn node_serializes_operations_from_concurrent_handles() {
    let keys: Vec<_> = (0..4)
        .map(|_| ucnb::crypto::SecretKey::new().unwrap())
        .collect();
    let events = EventLog::new();
    let mut backend = InMemoryChain::new();
    backend.put_token("0xc", U256::from(1), "alice", U256::ZERO);
    let engine = BridgeEngine::with_validators(
        &config("ETH"),
        keys.iter().map(|k| k.ecdsa_public_key()),
        backend,
        Box::new(events.clone()),
    );

    let (node, handle) = BridgeNode::new(engine);
    let node = tokio::spawn(node.run());

    handle
        .lock(LockRequest {
            caller: "alice".into(),
            collection: "0xc".into(),
            token_id: U256::from(1),
            amount: U256::ZERO,
            kind: AssetKind::Singular,
            destination_chain: "BSC".into(),
            destination_user: "0xuser".into(),
        })
        .await
        .unwrap();
    assert_eq!(events.snapshot().len(), 1);

    // Submit the same vote from two clones of the handle; exactly one is counted.
    let voter = keys[0].ecdsa_public_key().to_address();
    let action = ucnb::validators::GovernanceAction::SetChainFee(U256::from(9));
    let other = handle.clone();
    let first = handle.vote(action.clone(), voter, None).await;
    let second = other.vote(action, voter, None).await;
    assert!(matches!(
        (first, second),
        (Ok(_), Err(BridgeError::AlreadyVoted)) | (Err(BridgeError::AlreadyVoted), Ok(_))
    ));

    drop(handle);
    drop(other);
    node.await.unwrap();
}
