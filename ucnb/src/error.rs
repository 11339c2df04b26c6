use alloy::primitives::{Address, B256, U256};

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Every way a bridge operation can be rejected. All of these are recoverable and reported
/// synchronously to the caller; a rejected operation leaves bridge state untouched.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    // Authorization.
    #[error("caller is not an active validator")]
    OnlyValidators,
    #[error("threshold not reached: have {have}, need {need}")]
    ThresholdNotReached { have: usize, need: usize },
    #[error("invalid signature")]
    InvalidSignature,
    #[error("validator has already voted for this action")]
    AlreadyVoted,

    // Replay.
    #[error("signature has already been used")]
    SignatureAlreadyUsed,
    #[error("transfer already processed: {0}")]
    DataAlreadyProcessed(B256),

    // Validation.
    #[error("claim must carry at least one signature")]
    MustHaveSignatures,
    #[error("claim is destined for chain {destination}, this chain is {chain}")]
    InvalidDestinationChain { destination: String, chain: String },
    #[error("asset kind does not match the invoked entry point")]
    InvalidNftType,
    #[error("token amount must be non-zero")]
    TokenAmountIsZero,
    #[error("destination chain is the same as the source chain")]
    DestinationSameAsSource,
    #[error("address must not be empty")]
    ZeroAddress,

    // Economic.
    #[error("insufficient fee sent: sent {sent}, required {required}")]
    InsufficientFeeSent { sent: U256, required: U256 },
    #[error("no rewards available for {0}")]
    NoRewardsAvailable(Address),

    // Identity.
    #[error("validator already exists: {0}")]
    ValidatorAlreadyExists(Address),
    #[error("validator does not exist: {0}")]
    ValidatorDoesNotExist(Address),
    #[error("a duplicate collection is already registered for this origin")]
    MappingAlreadyExists,

    /// A collaborator (token standard, collection factory, payment rail) failed. The bridge
    /// has made no state change when this is returned.
    #[error("adapter error: {0}")]
    Adapter(#[from] anyhow::Error),
}
