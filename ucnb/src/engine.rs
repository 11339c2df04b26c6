//! The bridge engine: orchestrates lock and claim state transitions over the registries and
//! the chain adapters.
//!
//! Claims check their seven reject conditions in a fixed order before any effect, then run
//! external collaborator calls before local registry mutations, so a rejected or failed claim
//! leaves every registry untouched.

use alloy::primitives::{Address, U256};
use anyhow::anyhow;
use tracing::{debug, info};

use crate::{
    adapters::ChainBackend,
    cfg::Config,
    crypto::{ValidatorPublicKey, ValidatorSignature},
    error::{BridgeError, Result},
    escrow::EscrowLedger,
    event::{BridgeEvent, EventSink},
    identity::{AssetIdentityRegistry, CollectionRef},
    message::{AssetKind, TransferDescriptor},
    processed::ProcessedSet,
    validators::{GovernanceAction, ValidatorRegistry, VoteResult},
};

/// A user request to move an asset off this chain.
#[derive(Debug, Clone)]
pub struct LockRequest {
    /// The account initiating the lock; must own the asset.
    pub caller: String,
    /// The collection the asset belongs to on this chain.
    pub collection: String,
    pub token_id: U256,
    /// Zero for `Singular`, the moved amount for `Multiple`.
    pub amount: U256,
    pub kind: AssetKind,
    pub destination_chain: String,
    pub destination_user: String,
}

pub struct BridgeEngine<B> {
    chain: String,
    chain_fee: U256,
    royalty_receiver: String,
    validators: ValidatorRegistry,
    processed: ProcessedSet,
    identities: AssetIdentityRegistry,
    escrow: EscrowLedger,
    backend: B,
    events: Box<dyn EventSink>,
}

impl<B: ChainBackend> BridgeEngine<B> {
    pub fn new(config: &Config, backend: B, events: Box<dyn EventSink>) -> anyhow::Result<Self> {
        let genesis = config
            .genesis_validators
            .iter()
            .map(|s| ValidatorPublicKey::from_hex(s))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self::with_validators(config, genesis, backend, events))
    }

    pub fn with_validators(
        config: &Config,
        genesis: impl IntoIterator<Item = ValidatorPublicKey>,
        backend: B,
        events: Box<dyn EventSink>,
    ) -> Self {
        BridgeEngine {
            chain: config.chain.clone(),
            chain_fee: config.chain_fee,
            royalty_receiver: config.royalty_receiver.clone(),
            validators: ValidatorRegistry::new(genesis),
            processed: ProcessedSet::new(),
            identities: AssetIdentityRegistry::new(),
            escrow: EscrowLedger::new(),
            backend,
            events,
        }
    }

    /// Move an asset into escrow on this chain, bound for another chain. Authorized by
    /// ordinary ownership on this chain, not by the validator set; only claims mint or
    /// release value.
    pub fn lock(&mut self, request: LockRequest) -> Result<()> {
        if request.destination_chain == self.chain {
            return Err(BridgeError::DestinationSameAsSource);
        }
        if request.kind == AssetKind::Multiple && request.amount.is_zero() {
            return Err(BridgeError::TokenAmountIsZero);
        }
        if request.destination_user.is_empty() {
            return Err(BridgeError::ZeroAddress);
        }

        let collection = CollectionRef::new(&request.collection, &self.chain);
        let owner = self
            .backend
            .owner_of(&request.collection, request.token_id)?;
        if owner != request.caller {
            return Err(BridgeError::Adapter(anyhow!(
                "{} does not own token {} in {}",
                request.caller,
                request.token_id,
                request.collection
            )));
        }

        let storage = self.escrow.get_or_create(&collection);
        self.backend.transfer_into(
            storage,
            &request.collection,
            request.token_id,
            request.amount,
        )?;
        self.escrow.deposit(&collection, request.token_id);

        // A locked duplicate advertises the identity of its original, so the destination
        // chain routes the claim against the asset's true origin rather than chaining
        // wrapped-of-wrapped collections.
        let advertised = self
            .identities
            .resolve_original(&collection)
            .cloned()
            .unwrap_or(collection);

        info!(
            token = %request.token_id,
            collection = %request.collection,
            destination = %request.destination_chain,
            "locked asset"
        );
        self.events.emit(BridgeEvent::Locked {
            token_id: request.token_id,
            source_chain: advertised.chain,
            destination_chain: request.destination_chain,
            destination_user: request.destination_user,
            source_contract: advertised.contract,
            token_amount: request.amount,
            kind: request.kind,
        });
        Ok(())
    }

    /// Claim a unique asset on this chain.
    pub fn claim_singular(
        &mut self,
        descriptor: TransferDescriptor,
        signatures: &[(ValidatorPublicKey, ValidatorSignature)],
        paid_fee: U256,
    ) -> Result<()> {
        self.claim(descriptor, signatures, paid_fee, AssetKind::Singular)
    }

    /// Claim a fungible-supply asset on this chain.
    pub fn claim_multiple(
        &mut self,
        descriptor: TransferDescriptor,
        signatures: &[(ValidatorPublicKey, ValidatorSignature)],
        paid_fee: U256,
    ) -> Result<()> {
        self.claim(descriptor, signatures, paid_fee, AssetKind::Multiple)
    }

    fn claim(
        &mut self,
        descriptor: TransferDescriptor,
        signatures: &[(ValidatorPublicKey, ValidatorSignature)],
        paid_fee: U256,
        entry_point: AssetKind,
    ) -> Result<()> {
        // Reject conditions, in their fixed order, before any effect.
        if signatures.is_empty() {
            return Err(BridgeError::MustHaveSignatures);
        }
        if descriptor.destination_chain != self.chain {
            return Err(BridgeError::InvalidDestinationChain {
                destination: descriptor.destination_chain.clone(),
                chain: self.chain.clone(),
            });
        }
        if descriptor.kind != entry_point {
            return Err(BridgeError::InvalidNftType);
        }
        self.validators
            .verify_quorum(descriptor.digest(), signatures)?;
        let key = descriptor.transfer_key();
        if self.processed.contains(&key) {
            return Err(BridgeError::DataAlreadyProcessed(key.source_tx_hash));
        }
        if paid_fee < descriptor.fee {
            return Err(BridgeError::InsufficientFeeSent {
                sent: paid_fee,
                required: descriptor.fee,
            });
        }

        // External collaborator calls. Nothing local has been mutated yet, so a failure
        // here rejects the claim with all registries intact.
        let source = CollectionRef::new(&descriptor.source_contract, &descriptor.source_chain);
        let routed = self.route_claim(&source, &descriptor)?;

        let recipients = self.validators.active_validators();
        // Integer division; the remainder is deliberately left undistributed.
        let share = descriptor.fee / U256::from(recipients.len());
        if !share.is_zero() {
            for validator in &recipients {
                self.backend.credit_pending_reward(*validator, share)?;
            }
        }

        // Local mutations.
        match &routed {
            RoutedClaim::Unlocked { escrowed } => {
                self.escrow.withdraw(escrowed, descriptor.token_id);
            }
            RoutedClaim::MintedFresh { collection } => {
                self.identities.register(
                    source.clone(),
                    CollectionRef::new(collection, &self.chain),
                )?;
            }
            RoutedClaim::MintedExisting { .. } => {}
        }
        if !share.is_zero() {
            for validator in &recipients {
                self.validators.credit_reward(*validator, share)?;
            }
        }
        self.processed.insert(key)?;

        let (collection, unlocked) = match routed {
            RoutedClaim::Unlocked { escrowed } => (escrowed.contract, true),
            RoutedClaim::MintedFresh { collection }
            | RoutedClaim::MintedExisting { collection } => (collection, false),
        };
        info!(
            token = %descriptor.token_id,
            source = %descriptor.source_chain,
            %collection,
            unlocked,
            "claimed asset"
        );
        self.events.emit(BridgeEvent::Claimed {
            descriptor,
            collection,
            unlocked,
        });
        Ok(())
    }

    /// Decide mint-vs-unlock and perform the token-side externals.
    fn route_claim(
        &mut self,
        source: &CollectionRef,
        descriptor: &TransferDescriptor,
    ) -> Result<RoutedClaim> {
        // Source names a collection native to this chain whose asset sits in local escrow:
        // the asset is coming home, release the original.
        if source.chain == self.chain && self.escrow.holds(source, descriptor.token_id) {
            return self.unlock(source.clone(), descriptor);
        }

        if let Some(duplicate) = self.identities.resolve_duplicate(source).cloned() {
            // A previously locked duplicate returns out of its own escrow; otherwise the
            // asset enters this chain again and is minted into the existing duplicate.
            if self.escrow.holds(&duplicate, descriptor.token_id) {
                return self.unlock(duplicate, descriptor);
            }
            self.backend.mint_into(
                &duplicate.contract,
                &descriptor.destination_user,
                descriptor.token_id,
                descriptor.token_amount,
                descriptor.royalty_bps,
                &descriptor.royalty_receiver,
            )?;
            return Ok(RoutedClaim::MintedExisting {
                collection: duplicate.contract,
            });
        }

        let collection = self.backend.deploy_duplicate_collection(
            &descriptor.name,
            &descriptor.symbol,
            descriptor.royalty_bps,
            &descriptor.royalty_receiver,
        )?;
        self.backend.mint_into(
            &collection,
            &descriptor.destination_user,
            descriptor.token_id,
            descriptor.token_amount,
            descriptor.royalty_bps,
            &descriptor.royalty_receiver,
        )?;
        Ok(RoutedClaim::MintedFresh { collection })
    }

    fn unlock(
        &mut self,
        escrowed: CollectionRef,
        descriptor: &TransferDescriptor,
    ) -> Result<RoutedClaim> {
        let storage = self.escrow.get_or_create(&escrowed);
        self.backend.release(
            storage,
            &escrowed.contract,
            descriptor.token_id,
            &descriptor.destination_user,
            descriptor.token_amount,
        )?;
        Ok(RoutedClaim::Unlocked { escrowed })
    }

    /// Cast a governance vote. Fee and royalty receiver changes apply here once a single
    /// proposed value reaches the threshold.
    pub fn vote(
        &mut self,
        action: GovernanceAction,
        voter: Address,
        proof: Option<&ValidatorSignature>,
    ) -> Result<VoteResult> {
        if let GovernanceAction::SetRoyaltyReceiver(receiver) = &action
            && receiver.is_empty()
        {
            return Err(BridgeError::ZeroAddress);
        }

        let result = self.validators.vote(&action, voter, proof)?;
        debug!(?action, %voter, tally = result.tally, applied = result.applied, "vote cast");
        if result.applied {
            match action {
                GovernanceAction::AddValidator(key) => {
                    self.events.emit(BridgeEvent::ValidatorAdded {
                        validator: key.to_address(),
                    });
                }
                GovernanceAction::SetValidatorStatus { validator, active } => {
                    self.events
                        .emit(BridgeEvent::ValidatorStatusChanged { validator, active });
                }
                GovernanceAction::SetChainFee(fee) => {
                    self.chain_fee = fee;
                    self.events.emit(BridgeEvent::ChainFeeChanged { fee });
                }
                GovernanceAction::SetRoyaltyReceiver(receiver) => {
                    self.royalty_receiver = receiver.clone();
                    self.events
                        .emit(BridgeEvent::RoyaltyReceiverChanged { receiver });
                }
            }
        }
        Ok(result)
    }

    /// Admit a validator on a pre-collected quorum of approval signatures.
    pub fn add_validator(
        &mut self,
        key: ValidatorPublicKey,
        approvals: &[(ValidatorPublicKey, ValidatorSignature)],
    ) -> Result<Address> {
        let validator = self.validators.add_validator(key, approvals)?;
        info!(%validator, "validator added");
        self.events.emit(BridgeEvent::ValidatorAdded { validator });
        Ok(validator)
    }

    pub fn set_validator_status(
        &mut self,
        validator: Address,
        active: bool,
        approvals: &[(ValidatorPublicKey, ValidatorSignature)],
    ) -> Result<()> {
        self.validators
            .set_validator_status(validator, active, approvals)?;
        info!(%validator, active, "validator status changed");
        self.events
            .emit(BridgeEvent::ValidatorStatusChanged { validator, active });
        Ok(())
    }

    /// Pay out a validator's accrued rewards. The pending balance resets together with the
    /// payout signal; a failed payout leaves the balance intact.
    pub fn claim_rewards(
        &mut self,
        validator: Address,
        approvals: &[(ValidatorPublicKey, ValidatorSignature)],
    ) -> Result<U256> {
        let amount = self.validators.verify_reward_claim(validator, approvals)?;
        self.backend.pay_out(validator, amount)?;
        self.validators.settle_reward_claim(validator, approvals)?;
        info!(%validator, %amount, "rewards claimed");
        self.events
            .emit(BridgeEvent::RewardsClaimed { validator, amount });
        Ok(amount)
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn chain_fee(&self) -> U256 {
        self.chain_fee
    }

    pub fn royalty_receiver(&self) -> &str {
        &self.royalty_receiver
    }

    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    pub fn identities(&self) -> &AssetIdentityRegistry {
        &self.identities
    }

    pub fn escrow(&self) -> &EscrowLedger {
        &self.escrow
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

enum RoutedClaim {
    Unlocked { escrowed: CollectionRef },
    MintedFresh { collection: String },
    MintedExisting { collection: String },
}
