use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Transaction object as embedded in `eth_getBlockByNumber` with full transactions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    #[serde(default)]
    pub from: String,
    /// `None` for contract creation.
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub gas: Option<String>,
    #[serde(default)]
    pub gas_price: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub gas_used: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Addresses of the system contracts whose incoming gas is accounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSet {
    pub validator_set: String,
    pub slash_indicator: String,
    pub staking: String,
    pub profile: String,
    pub finality_tracking: String,
}

impl Default for ContractSet {
    fn default() -> Self {
        Self {
            validator_set: "0x617c5d73662282ea7ffd231e020eca6d2b0d552f".to_string(),
            slash_indicator: "0xebfff2b32fa0df9c5c8c5d5aaa7e8b51d5207ba3".to_string(),
            staking: "0x545edb750eb8769c868429be9586f5857a768758".to_string(),
            profile: "0x840ebf1ca767cb690029e91856a357a43b85d035".to_string(),
            finality_tracking: "0xa30b2932cd8b8a89e34551cdfa13810af38da576".to_string(),
        }
    }
}

impl ContractSet {
    /// Every listed contract. Each one gets an accumulator slot per block.
    pub fn all(&self) -> [&str; 5] {
        [
            self.validator_set.as_str(),
            self.slash_indicator.as_str(),
            self.staking.as_str(),
            self.profile.as_str(),
            self.finality_tracking.as_str(),
        ]
    }

    /// Contracts actually matched against transaction destinations.
    /// Staking and finality tracking are listed but never matched.
    pub fn tracked(&self) -> [&str; 3] {
        [
            self.validator_set.as_str(),
            self.slash_indicator.as_str(),
            self.profile.as_str(),
        ]
    }

    pub fn is_tracked(&self, address: &str) -> bool {
        self.tracked().contains(&address)
    }
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractGasUsage {
    pub block: u64,
    pub contract: String,
    pub gas_used: u64,
}

/// Gas accumulated for a single block, keyed by contract address.
#[derive(Debug, Clone)]
pub struct BlockGasUsage {
    pub block: u64,
    pub totals: HashMap<String, u64>,
    pub failed_receipts: usize,
}

impl BlockGasUsage {
    pub fn new(block: u64, contracts: &ContractSet) -> Self {
        Self {
            block,
            totals: contracts
                .all()
                .iter()
                .map(|addr| (addr.to_string(), 0))
                .collect(),
            failed_receipts: 0,
        }
    }

    pub fn add(&mut self, contract: &str, gas_used: u64) {
        *self.totals.entry(contract.to_string()).or_insert(0) += gas_used;
    }

    /// Non-zero entries in map iteration order, which is unspecified.
    pub fn non_zero(&self) -> impl Iterator<Item = ContractGasUsage> + '_ {
        self.totals
            .iter()
            .filter(|(_, gas)| **gas != 0)
            .map(|(contract, gas)| ContractGasUsage {
                block: self.block,
                contract: contract.clone(),
                gas_used: *gas,
            })
    }
}

/// A report line read back for the statistics pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractGasInfo {
    pub block: u64,
    pub contract: String,
    pub gas_used: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GasStats {
    pub count: usize,
    pub min: u64,
    pub max: u64,
    pub median: u64,
    pub avg: f64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectSummary {
    pub blocks_selected: usize,
    pub blocks_processed: usize,
    pub blocks_skipped: usize,
    pub receipts_failed: usize,
    pub lines_written: usize,
}
