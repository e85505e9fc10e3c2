use std::env;
use std::num::NonZeroU64;

use crate::models::ContractSet;

pub const DEFAULT_EPOCH_LENGTH: NonZeroU64 = match NonZeroU64::new(200) {
    Some(epoch) => epoch,
    None => unreachable!(),
};

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: Option<String>,
    pub epoch_length: NonZeroU64,
    pub contracts: ContractSet,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing RPC_URL env var (or pass --rpc-url)")]
    MissingRpcUrl,
    #[error("EPOCH_LENGTH must be a positive integer, got {0:?}")]
    InvalidEpochLength(String),
    #[error("{var} is not a 0x-prefixed address: {value:?}")]
    InvalidAddress { var: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = lookup("RPC_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let epoch_length = match lookup("EPOCH_LENGTH") {
            Some(raw) => raw
                .trim()
                .parse::<NonZeroU64>()
                .map_err(|_| ConfigError::InvalidEpochLength(raw.clone()))?,
            None => DEFAULT_EPOCH_LENGTH,
        };

        let defaults = ContractSet::default();
        let address = |var, default| contract_address(&lookup, var, default);
        let contracts = ContractSet {
            validator_set: address("VALIDATOR_SET_CONTRACT", defaults.validator_set)?,
            slash_indicator: address("SLASH_INDICATOR_CONTRACT", defaults.slash_indicator)?,
            staking: address("STAKING_CONTRACT", defaults.staking)?,
            profile: address("PROFILE_CONTRACT", defaults.profile)?,
            finality_tracking: address("FINALITY_TRACKING_CONTRACT", defaults.finality_tracking)?,
        };

        Ok(Self {
            rpc_url,
            epoch_length,
            contracts,
        })
    }

    /// Resolves the endpoint, preferring an explicit override.
    pub fn rpc_url(&self, override_url: Option<&str>) -> Result<String, ConfigError> {
        override_url
            .map(str::to_string)
            .or_else(|| self.rpc_url.clone())
            .ok_or(ConfigError::MissingRpcUrl)
    }
}

fn contract_address<F>(
    lookup: &F,
    var: &'static str,
    default: String,
) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    let value = raw.trim().to_lowercase();
    if !value.starts_with("0x") || value.len() < 3 {
        return Err(ConfigError::InvalidAddress { var, value: raw });
    }
    Ok(value)
}
