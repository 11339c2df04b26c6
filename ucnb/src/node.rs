//! A standalone bridge node: owns the engine and serializes all access to it through a
//! message channel, so callers on any task see the same single-writer execution model the
//! engine assumes.

use alloy::primitives::{Address, U256};
use anyhow::anyhow;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::{
    adapters::ChainBackend,
    crypto::{ValidatorPublicKey, ValidatorSignature},
    engine::{BridgeEngine, LockRequest},
    error::{BridgeError, Result},
    message::TransferDescriptor,
    validators::{GovernanceAction, VoteResult},
};

type Approvals = Vec<(ValidatorPublicKey, ValidatorSignature)>;

enum BridgeRequest {
    Lock {
        request: LockRequest,
        reply: oneshot::Sender<Result<()>>,
    },
    ClaimSingular {
        descriptor: TransferDescriptor,
        signatures: Approvals,
        paid_fee: U256,
        reply: oneshot::Sender<Result<()>>,
    },
    ClaimMultiple {
        descriptor: TransferDescriptor,
        signatures: Approvals,
        paid_fee: U256,
        reply: oneshot::Sender<Result<()>>,
    },
    Vote {
        action: GovernanceAction,
        voter: Address,
        proof: Option<ValidatorSignature>,
        reply: oneshot::Sender<Result<VoteResult>>,
    },
    AddValidator {
        key: ValidatorPublicKey,
        approvals: Approvals,
        reply: oneshot::Sender<Result<Address>>,
    },
    SetValidatorStatus {
        validator: Address,
        active: bool,
        approvals: Approvals,
        reply: oneshot::Sender<Result<()>>,
    },
    ClaimRewards {
        validator: Address,
        approvals: Approvals,
        reply: oneshot::Sender<Result<U256>>,
    },
}

/// A cheaply clonable handle submitting operations to a running [`BridgeNode`].
#[derive(Clone)]
pub struct BridgeHandle {
    requests: mpsc::UnboundedSender<BridgeRequest>,
}

impl BridgeHandle {
    async fn submit<T>(
        &self,
        request: BridgeRequest,
        reply: oneshot::Receiver<Result<T>>,
    ) -> Result<T> {
        self.requests
            .send(request)
            .map_err(|_| BridgeError::Adapter(anyhow!("bridge node stopped")))?;
        reply
            .await
            .map_err(|_| BridgeError::Adapter(anyhow!("bridge node stopped")))?
    }

    pub async fn lock(&self, request: LockRequest) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.submit(BridgeRequest::Lock { request, reply: tx }, rx).await
    }

    pub async fn claim_singular(
        &self,
        descriptor: TransferDescriptor,
        signatures: Approvals,
        paid_fee: U256,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.submit(
            BridgeRequest::ClaimSingular {
                descriptor,
                signatures,
                paid_fee,
                reply: tx,
            },
            rx,
        )
        .await
    }

    pub async fn claim_multiple(
        &self,
        descriptor: TransferDescriptor,
        signatures: Approvals,
        paid_fee: U256,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.submit(
            BridgeRequest::ClaimMultiple {
                descriptor,
                signatures,
                paid_fee,
                reply: tx,
            },
            rx,
        )
        .await
    }

    pub async fn vote(
        &self,
        action: GovernanceAction,
        voter: Address,
        proof: Option<ValidatorSignature>,
    ) -> Result<VoteResult> {
        let (tx, rx) = oneshot::channel();
        self.submit(
            BridgeRequest::Vote {
                action,
                voter,
                proof,
                reply: tx,
            },
            rx,
        )
        .await
    }

    pub async fn add_validator(
        &self,
        key: ValidatorPublicKey,
        approvals: Approvals,
    ) -> Result<Address> {
        let (tx, rx) = oneshot::channel();
        self.submit(
            BridgeRequest::AddValidator {
                key,
                approvals,
                reply: tx,
            },
            rx,
        )
        .await
    }

    pub async fn set_validator_status(
        &self,
        validator: Address,
        active: bool,
        approvals: Approvals,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.submit(
            BridgeRequest::SetValidatorStatus {
                validator,
                active,
                approvals,
                reply: tx,
            },
            rx,
        )
        .await
    }

    pub async fn claim_rewards(&self, validator: Address, approvals: Approvals) -> Result<U256> {
        let (tx, rx) = oneshot::channel();
        self.submit(
            BridgeRequest::ClaimRewards {
                validator,
                approvals,
                reply: tx,
            },
            rx,
        )
        .await
    }
}

pub struct BridgeNode<B> {
    engine: BridgeEngine<B>,
    requests: mpsc::UnboundedReceiver<BridgeRequest>,
}

impl<B: ChainBackend> BridgeNode<B> {
    pub fn new(engine: BridgeEngine<B>) -> (BridgeNode<B>, BridgeHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            BridgeNode {
                engine,
                requests: rx,
            },
            BridgeHandle { requests: tx },
        )
    }

    /// Process requests until every handle is dropped. Replies whose callers have gone away
    /// are discarded.
    pub async fn run(mut self) {
        info!(chain = %self.engine.chain(), "bridge node started");
        while let Some(request) = self.requests.recv().await {
            match request {
                BridgeRequest::Lock { request, reply } => {
                    let _ = reply.send(self.engine.lock(request));
                }
                BridgeRequest::ClaimSingular {
                    descriptor,
                    signatures,
                    paid_fee,
                    reply,
                } => {
                    let _ = reply.send(self.engine.claim_singular(
                        descriptor,
                        &signatures,
                        paid_fee,
                    ));
                }
                BridgeRequest::ClaimMultiple {
                    descriptor,
                    signatures,
                    paid_fee,
                    reply,
                } => {
                    let _ = reply.send(self.engine.claim_multiple(
                        descriptor,
                        &signatures,
                        paid_fee,
                    ));
                }
                BridgeRequest::Vote {
                    action,
                    voter,
                    proof,
                    reply,
                } => {
                    let _ = reply.send(self.engine.vote(action, voter, proof.as_ref()));
                }
                BridgeRequest::AddValidator {
                    key,
                    approvals,
                    reply,
                } => {
                    let _ = reply.send(self.engine.add_validator(key, &approvals));
                }
                BridgeRequest::SetValidatorStatus {
                    validator,
                    active,
                    approvals,
                    reply,
                } => {
                    let _ = reply.send(self.engine.set_validator_status(
                        validator,
                        active,
                        &approvals,
                    ));
                }
                BridgeRequest::ClaimRewards {
                    validator,
                    approvals,
                    reply,
                } => {
                    let _ = reply.send(self.engine.claim_rewards(validator, &approvals));
                }
            }
        }
        info!("bridge node stopped");
    }
}
