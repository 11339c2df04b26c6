//! The validator registry: the active validator set, per-action pending vote tallies, and the
//! consumed-signature set backing every governed mutation of the bridge.
//!
//! Thresholds are two-thirds-plus-one over the active validator count and are recomputed
//! against the count at the time each vote is cast, never snapshotted. A validator set change
//! mid-vote therefore shifts the bar for subsequent votes on the same action.

use std::collections::{BTreeMap, HashMap, HashSet};

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    crypto::{Hash, ValidatorPublicKey, ValidatorSignature},
    error::{BridgeError, Result},
    message::{put_str, put_u256},
};

/// One registered validator. Entries are never destroyed, only soft-disabled; the count of
/// active entries is the denominator of every threshold calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorEntry {
    pub public_key: ValidatorPublicKey,
    pub active: bool,
    pub pending_reward: U256,
}

/// A governed mutation of bridge configuration or the validator set itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovernanceAction {
    AddValidator(ValidatorPublicKey),
    SetValidatorStatus { validator: Address, active: bool },
    SetChainFee(U256),
    SetRoyaltyReceiver(String),
}

impl GovernanceAction {
    /// The digest a validator signs to authorize this action. Tagged per action kind so a
    /// signature for one action can never authorize another.
    pub fn digest(&self) -> Hash {
        let mut buf = Vec::new();
        match self {
            GovernanceAction::AddValidator(key) => {
                put_str(&mut buf, "ucnb.gov.add_validator");
                let bytes = key.as_bytes();
                buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                buf.extend_from_slice(&bytes);
            }
            GovernanceAction::SetValidatorStatus { validator, active } => {
                put_str(&mut buf, "ucnb.gov.set_validator_status");
                buf.extend_from_slice(validator.as_slice());
                buf.push(*active as u8);
            }
            GovernanceAction::SetChainFee(fee) => {
                put_str(&mut buf, "ucnb.gov.set_chain_fee");
                put_u256(&mut buf, *fee);
            }
            GovernanceAction::SetRoyaltyReceiver(receiver) => {
                put_str(&mut buf, "ucnb.gov.set_royalty_receiver");
                put_str(&mut buf, receiver);
            }
        }
        Hash::compute([buf])
    }

    /// The vote ledger this action's votes accumulate in.
    fn topic(&self) -> VoteTopic {
        match self {
            GovernanceAction::AddValidator(key) => VoteTopic::AddValidator(key.to_address()),
            GovernanceAction::SetValidatorStatus { validator, .. } => {
                VoteTopic::ValidatorStatus(*validator)
            }
            GovernanceAction::SetChainFee(_) => VoteTopic::ChainFee,
            GovernanceAction::SetRoyaltyReceiver(_) => VoteTopic::RoyaltyReceiver,
        }
    }

    /// The proposed value this action's votes are tallied under. Votes on the same topic for
    /// different values never combine.
    fn proposed_value(&self) -> ProposedValue {
        match self {
            GovernanceAction::AddValidator(_) => ProposedValue::Approve,
            GovernanceAction::SetValidatorStatus { active, .. } => ProposedValue::Status(*active),
            GovernanceAction::SetChainFee(fee) => ProposedValue::Fee(*fee),
            GovernanceAction::SetRoyaltyReceiver(receiver) => {
                ProposedValue::Receiver(receiver.clone())
            }
        }
    }
}

/// The digest a validator signs to approve paying out `validator`'s accrued rewards.
pub fn claim_rewards_digest(validator: Address) -> Hash {
    let mut buf = Vec::new();
    put_str(&mut buf, "ucnb.gov.claim_rewards");
    buf.extend_from_slice(validator.as_slice());
    Hash::compute([buf])
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum VoteTopic {
    AddValidator(Address),
    ValidatorStatus(Address),
    ChainFee,
    RoyaltyReceiver,
}

impl VoteTopic {
    fn concerns(&self, validator: Address) -> bool {
        match self {
            VoteTopic::AddValidator(addr) | VoteTopic::ValidatorStatus(addr) => *addr == validator,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ProposedValue {
    Approve,
    Status(bool),
    Fee(U256),
    Receiver(String),
}

/// Votes collected so far for one topic. A validator appears at most once in `voters`; where
/// the action carries a value, tallies are counted per distinct value.
#[derive(Debug, Clone, Default)]
struct PendingVote {
    voters: HashSet<Address>,
    tallies: HashMap<ProposedValue, usize>,
}

/// The outcome of casting one vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteResult {
    /// Whether this vote pushed its proposed value over the threshold and the action applied.
    pub applied: bool,
    /// Votes collected for this vote's proposed value, including this one.
    pub tally: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    entries: BTreeMap<Address, ValidatorEntry>,
    pending_votes: HashMap<VoteTopic, PendingVote>,
    used_signatures: HashSet<Vec<u8>>,
}

impl ValidatorRegistry {
    pub fn new(genesis: impl IntoIterator<Item = ValidatorPublicKey>) -> ValidatorRegistry {
        let mut registry = ValidatorRegistry::default();
        for key in genesis {
            registry.entries.insert(
                key.to_address(),
                ValidatorEntry {
                    public_key: key,
                    active: true,
                    pending_reward: U256::ZERO,
                },
            );
        }
        registry
    }

    pub fn is_validator(&self, validator: Address) -> bool {
        self.entries.get(&validator).is_some_and(|e| e.active)
    }

    pub fn active_count(&self) -> usize {
        self.entries.values().filter(|e| e.active).count()
    }

    /// Two-thirds-plus-one over the current active count.
    pub fn threshold(&self) -> usize {
        2 * self.active_count() / 3 + 1
    }

    pub fn active_validators(&self) -> Vec<Address> {
        self.entries
            .iter()
            .filter(|(_, e)| e.active)
            .map(|(addr, _)| *addr)
            .collect()
    }

    pub fn entry(&self, validator: Address) -> Option<&ValidatorEntry> {
        self.entries.get(&validator)
    }

    /// Cast `voter`'s vote for `action`. Where the action requires an approval signature
    /// (`proof`), the signature must verify under the voter's key for this action's digest
    /// and must never have been used before.
    ///
    /// Returns whether the action applied. Value-carrying actions apply only when a single
    /// proposed value reaches the threshold; the caller applies fee and royalty receiver
    /// changes itself when `applied` is set.
    pub fn vote(
        &mut self,
        action: &GovernanceAction,
        voter: Address,
        proof: Option<&ValidatorSignature>,
    ) -> Result<VoteResult> {
        if !self.is_validator(voter) {
            return Err(BridgeError::OnlyValidators);
        }
        match action {
            GovernanceAction::AddValidator(key) => {
                let candidate = key.to_address();
                if self.entries.contains_key(&candidate) {
                    return Err(BridgeError::ValidatorAlreadyExists(candidate));
                }
            }
            GovernanceAction::SetValidatorStatus { validator, .. } => {
                if !self.entries.contains_key(validator) {
                    return Err(BridgeError::ValidatorDoesNotExist(*validator));
                }
            }
            _ => {}
        }

        if let Some(signature) = proof {
            if self.used_signatures.contains(&signature.as_bytes()) {
                return Err(BridgeError::SignatureAlreadyUsed);
            }
            // The entry is present; `is_validator` was checked above.
            let key = &self.entries[&voter].public_key;
            key.verify(action.digest(), signature)?;
        }

        let pending = self.pending_votes.entry(action.topic()).or_default();
        if !pending.voters.insert(voter) {
            return Err(BridgeError::AlreadyVoted);
        }
        let tally = pending
            .tallies
            .entry(action.proposed_value())
            .and_modify(|t| *t += 1)
            .or_insert(1)
            .to_owned();

        if let Some(signature) = proof {
            self.used_signatures.insert(signature.as_bytes());
        }

        let applied = tally >= self.threshold();
        if applied {
            self.pending_votes.remove(&action.topic());
            match action {
                GovernanceAction::AddValidator(key) => self.insert_validator(*key),
                GovernanceAction::SetValidatorStatus { validator, active } => {
                    // Checked present above; unreachable entry means a vote raced a removal,
                    // which the serial execution model excludes.
                    if let Some(entry) = self.entries.get_mut(validator) {
                        entry.active = *active;
                    }
                }
                // Applied by the engine, which owns the fee and royalty configuration.
                GovernanceAction::SetChainFee(_) | GovernanceAction::SetRoyaltyReceiver(_) => {}
            }
        }

        Ok(VoteResult { applied, tally })
    }

    /// Admit a new validator on the strength of a pre-collected quorum of approval
    /// signatures over the addition digest. Each signature is consumed and can never be
    /// replayed into another addition.
    pub fn add_validator(
        &mut self,
        key: ValidatorPublicKey,
        approvals: &[(ValidatorPublicKey, ValidatorSignature)],
    ) -> Result<Address> {
        let candidate = key.to_address();
        if self.entries.contains_key(&candidate) {
            return Err(BridgeError::ValidatorAlreadyExists(candidate));
        }
        for (_, signature) in approvals {
            if self.used_signatures.contains(&signature.as_bytes()) {
                return Err(BridgeError::SignatureAlreadyUsed);
            }
        }
        self.verify_quorum(GovernanceAction::AddValidator(key).digest(), approvals)?;

        for (_, signature) in approvals {
            self.used_signatures.insert(signature.as_bytes());
        }
        self.insert_validator(key);
        Ok(candidate)
    }

    /// Flip a validator's active flag on a pre-collected quorum. The approval signatures
    /// are consumed, so a status change collected once cannot flip the validator again
    /// later. Disabling a validator shrinks the denominator used by all future threshold
    /// computations immediately.
    pub fn set_validator_status(
        &mut self,
        validator: Address,
        active: bool,
        approvals: &[(ValidatorPublicKey, ValidatorSignature)],
    ) -> Result<()> {
        if !self.entries.contains_key(&validator) {
            return Err(BridgeError::ValidatorDoesNotExist(validator));
        }
        for (_, signature) in approvals {
            if self.used_signatures.contains(&signature.as_bytes()) {
                return Err(BridgeError::SignatureAlreadyUsed);
            }
        }
        let action = GovernanceAction::SetValidatorStatus { validator, active };
        self.verify_quorum(action.digest(), approvals)?;

        for (_, signature) in approvals {
            self.used_signatures.insert(signature.as_bytes());
        }
        // Present; checked above.
        if let Some(entry) = self.entries.get_mut(&validator) {
            entry.active = active;
        }
        Ok(())
    }

    /// Verify a set of (signer, signature) pairs over `digest`: every signer must be an
    /// active validator and every signature must verify; repeated signers count once.
    /// Returns the number of distinct valid signers, which must reach the current threshold.
    pub fn verify_quorum(
        &self,
        digest: Hash,
        signatures: &[(ValidatorPublicKey, ValidatorSignature)],
    ) -> Result<usize> {
        let mut signers = HashSet::new();
        for (key, signature) in signatures {
            let signer = key.to_address();
            let Some(entry) = self.entries.get(&signer).filter(|e| e.active) else {
                return Err(BridgeError::OnlyValidators);
            };
            entry.public_key.verify(digest, signature)?;
            signers.insert(signer);
        }
        let need = self.threshold();
        if signers.len() < need {
            return Err(BridgeError::ThresholdNotReached {
                have: signers.len(),
                need,
            });
        }
        Ok(signers.len())
    }

    pub fn credit_reward(&mut self, validator: Address, amount: U256) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&validator)
            .ok_or(BridgeError::ValidatorDoesNotExist(validator))?;
        entry.pending_reward += amount;
        Ok(())
    }

    /// Check a reward claim without mutating anything: the validator must have accrued
    /// rewards and `approvals` must form an unused, valid quorum over the claim digest.
    /// Returns the amount that `settle_reward_claim` will pay.
    pub fn verify_reward_claim(
        &self,
        validator: Address,
        approvals: &[(ValidatorPublicKey, ValidatorSignature)],
    ) -> Result<U256> {
        let entry = self
            .entries
            .get(&validator)
            .ok_or(BridgeError::ValidatorDoesNotExist(validator))?;
        if entry.pending_reward.is_zero() {
            return Err(BridgeError::NoRewardsAvailable(validator));
        }
        for (_, signature) in approvals {
            if self.used_signatures.contains(&signature.as_bytes()) {
                return Err(BridgeError::SignatureAlreadyUsed);
            }
        }
        self.verify_quorum(claim_rewards_digest(validator), approvals)?;
        Ok(entry.pending_reward)
    }

    /// Consume the claim's approval signatures and reset the validator's accrued reward to
    /// zero. Must follow a successful `verify_reward_claim` with the same arguments.
    pub fn settle_reward_claim(
        &mut self,
        validator: Address,
        approvals: &[(ValidatorPublicKey, ValidatorSignature)],
    ) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&validator)
            .ok_or(BridgeError::ValidatorDoesNotExist(validator))?;
        entry.pending_reward = U256::ZERO;
        for (_, signature) in approvals {
            self.used_signatures.insert(signature.as_bytes());
        }
        Ok(())
    }

    fn insert_validator(&mut self, key: ValidatorPublicKey) {
        let validator = key.to_address();
        self.entries.insert(
            validator,
            ValidatorEntry {
                public_key: key,
                active: true,
                pending_reward: U256::ZERO,
            },
        );
        // Any in-flight votes scoped to the new validator are stale now.
        self.pending_votes.retain(|topic, _| !topic.concerns(validator));
    }
}
