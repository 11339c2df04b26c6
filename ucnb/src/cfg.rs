//! Node configuration, deserialized from TOML.

use std::path::Path;

use alloy::primitives::U256;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The identifier of the chain this node serves. Transfer descriptors name chains by
    /// these identifiers, so it must match what every other deployment calls this chain.
    pub chain: String,
    /// The fee charged per claim, denominated in the chain's native currency.
    #[serde(default = "chain_fee_default")]
    pub chain_fee: U256,
    /// Default royalty receiver for duplicate collections deployed on this chain.
    pub royalty_receiver: String,
    /// Hex-encoded public keys of the genesis validator set. 33 or 65 bytes selects ECDSA,
    /// 32 bytes Ed25519.
    #[serde(default)]
    pub genesis_validators: Vec<String>,
}

pub fn chain_fee_default() -> U256 {
    U256::ZERO
}

pub fn read_config(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    let config: Config = toml::from_str(&raw)
        .with_context(|| format!("cannot parse config file {}", path.display()))?;
    Ok(config)
}
