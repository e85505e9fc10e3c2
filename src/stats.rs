use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{ContractGasInfo, ContractSet, GasStats};

/// Smallest value, or 0 when there is no data.
pub fn min(values: &[u64]) -> u64 {
    values.iter().copied().min().unwrap_or(0)
}

/// Largest value, or 0 when there is no data.
pub fn max(values: &[u64]) -> u64 {
    values.iter().copied().max().unwrap_or(0)
}

/// Median over a sorted copy; the input keeps its order. Even-length input
/// yields the truncated mean of the two middle values.
pub fn median(values: &[u64]) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let sum = sorted[middle - 1] as u128 + sorted[middle] as u128;
        (sum / 2) as u64
    } else {
        sorted[middle]
    }
}

pub fn average(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: u128 = values.iter().map(|v| *v as u128).sum();
    sum as f64 / values.len() as f64
}

impl GasStats {
    pub fn compute(values: &[u64]) -> Self {
        Self {
            count: values.len(),
            min: min(values),
            max: max(values),
            median: median(values),
            avg: average(values),
        }
    }
}

/// Gas summed per block over the tracked contracts.
pub fn per_block_totals(records: &[ContractGasInfo], contracts: &ContractSet) -> BTreeMap<u64, u64> {
    let mut totals = BTreeMap::new();
    for record in records.iter().filter(|r| contracts.is_tracked(&r.contract)) {
        *totals.entry(record.block).or_insert(0u64) += record.gas_used;
    }
    totals
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportStats {
    pub blocks: GasStats,
    pub contracts: BTreeMap<String, GasStats>,
}

impl ReportStats {
    pub fn from_records(records: &[ContractGasInfo], contracts: &ContractSet) -> Self {
        let block_totals: Vec<u64> = per_block_totals(records, contracts).into_values().collect();

        let mut by_contract: BTreeMap<String, Vec<u64>> = BTreeMap::new();
        for record in records {
            by_contract
                .entry(record.contract.clone())
                .or_default()
                .push(record.gas_used);
        }

        Self {
            blocks: GasStats::compute(&block_totals),
            contracts: by_contract
                .into_iter()
                .map(|(contract, values)| (contract, GasStats::compute(&values)))
                .collect(),
        }
    }
}
