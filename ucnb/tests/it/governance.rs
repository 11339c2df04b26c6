//! Validator-set governance exercised through whole deployments: admissions and removals
//! immediately move the signature threshold every later claim is checked against.

use alloy::primitives::U256;
use ucnb::{
    crypto::SecretKey,
    engine::LockRequest,
    error::BridgeError,
    message::AssetKind,
    validators::GovernanceAction,
};

use crate::TwoChains;

fn seed_and_lock(chains: &mut TwoChains) {
    chains
        .bsc
        .backend_mut()
        .put_token("0xc", U256::from(1), "alice", U256::ZERO);
    chains
        .bsc
        .lock(LockRequest {
            caller: "alice".into(),
            collection: "0xc".into(),
            token_id: U256::from(1),
            amount: U256::ZERO,
            kind: AssetKind::Singular,
            destination_chain: "ETH".into(),
            destination_user: "0xuser".into(),
        })
        .unwrap();
}

#[test]
fn admitting_a_validator_raises_the_claim_threshold() {
    let mut chains = TwoChains::new(4);
    seed_and_lock(&mut chains);

    // Three of four validators vote the fifth in, each proving the vote with a signature
    // over the action digest.
    let candidate = SecretKey::new().unwrap().ecdsa_public_key();
    let action = GovernanceAction::AddValidator(candidate);
    for (i, key) in chains.keys[..3].iter().enumerate() {
        let proof = key.sign_ecdsa(action.digest());
        let result = chains
            .eth
            .vote(action.clone(), key.ecdsa_public_key().to_address(), Some(&proof))
            .unwrap();
        assert_eq!(result.applied, i == 2);
    }
    assert_eq!(chains.eth.validators().active_count(), 5);
    assert_eq!(chains.eth.validators().threshold(), 4);
    // Governance is per deployment; the other chain's set is untouched.
    assert_eq!(chains.bsc.validators().active_count(), 4);

    // Three signatures authorized a claim before the admission; now they do not.
    let descriptor = chains.relay_from_bsc(U256::from(100));
    let three = chains.sign(3, &descriptor);
    assert!(matches!(
        chains
            .eth
            .claim_singular(descriptor.clone(), &three, descriptor.fee)
            .unwrap_err(),
        BridgeError::ThresholdNotReached { have: 3, need: 4 }
    ));
    let four = chains.sign(4, &descriptor);
    chains
        .eth
        .claim_singular(descriptor.clone(), &four, descriptor.fee)
        .unwrap();
}

#[test]
fn disabling_a_validator_lowers_the_bar_and_bars_its_signatures() {
    let mut chains = TwoChains::new(4);
    seed_and_lock(&mut chains);

    let target = chains.keys[3].ecdsa_public_key().to_address();
    let action = GovernanceAction::SetValidatorStatus {
        validator: target,
        active: false,
    };
    let approvals: Vec<_> = chains.keys[..3]
        .iter()
        .map(|k| (k.ecdsa_public_key(), k.sign_ecdsa(action.digest())))
        .collect();
    chains
        .eth
        .set_validator_status(target, false, &approvals)
        .unwrap();
    assert_eq!(chains.eth.validators().active_count(), 3);
    assert_eq!(chains.eth.validators().threshold(), 3);

    let descriptor = chains.relay_from_bsc(U256::from(100));

    // A signature from the disabled validator invalidates the whole set.
    let mut with_disabled = chains.sign(2, &descriptor);
    with_disabled.push((
        chains.keys[3].ecdsa_public_key(),
        chains.keys[3].sign_ecdsa(descriptor.digest()),
    ));
    assert!(matches!(
        chains
            .eth
            .claim_singular(descriptor.clone(), &with_disabled, descriptor.fee)
            .unwrap_err(),
        BridgeError::OnlyValidators
    ));

    // The three remaining validators are a quorum on their own.
    let three = chains.sign(3, &descriptor);
    chains
        .eth
        .claim_singular(descriptor.clone(), &three, descriptor.fee)
        .unwrap();
}

#[test]
fn fee_changes_require_agreement_on_one_value() {
    // 5 validators, threshold 4: a 2-2-1 split across three fee values applies nothing.
    let chains = TwoChains::new(5);
    let mut eth = chains.eth;
    let fees = [10u64, 10, 20, 20, 30];
    for (key, fee) in chains.keys.iter().zip(fees) {
        let result = eth
            .vote(
                GovernanceAction::SetChainFee(U256::from(fee)),
                key.ecdsa_public_key().to_address(),
                None,
            )
            .unwrap();
        assert!(!result.applied);
    }
    assert_eq!(eth.chain_fee(), U256::ZERO);
}

#[test]
fn claim_fees_fund_validator_rewards_on_the_claiming_chain() {
    let mut chains = TwoChains::new(4);
    seed_and_lock(&mut chains);

    let descriptor = chains.relay_from_bsc(U256::from(400));
    let sigs = chains.sign(3, &descriptor);
    chains
        .eth
        .claim_singular(descriptor.clone(), &sigs, descriptor.fee)
        .unwrap();

    let validator = chains.keys[0].ecdsa_public_key().to_address();
    assert_eq!(
        chains.eth.validators().entry(validator).unwrap().pending_reward,
        U256::from(100)
    );
    assert_eq!(
        chains.bsc.validators().entry(validator).unwrap().pending_reward,
        U256::ZERO
    );

    let digest = ucnb::validators::claim_rewards_digest(validator);
    let approvals: Vec<_> = chains.keys[..3]
        .iter()
        .map(|k| (k.ecdsa_public_key(), k.sign_ecdsa(digest)))
        .collect();
    assert_eq!(
        chains.eth.claim_rewards(validator, &approvals).unwrap(),
        U256::from(100)
    );
    assert_eq!(chains.eth.backend().paid_out(validator), U256::from(100));
}
