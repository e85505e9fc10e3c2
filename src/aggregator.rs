use std::io::Write;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    models::{BlockGasUsage, CollectSummary, ContractSet},
    report::ReportWriter,
    rpc::{RpcClient, RpcError},
};

pub struct GasAggregator<'a> {
    client: &'a RpcClient,
    contracts: &'a ContractSet,
}

impl<'a> GasAggregator<'a> {
    pub fn new(client: &'a RpcClient, contracts: &'a ContractSet) -> Self {
        Self { client, contracts }
    }

    /// Sums receipt gas per tracked contract for one block.
    ///
    /// Only a failed block fetch is returned as an error; a failed receipt
    /// drops that transaction and is counted in `failed_receipts`.
    pub async fn aggregate_block(&self, block: u64) -> Result<BlockGasUsage, RpcError> {
        let transactions = self.client.fetch_block_transactions(block).await?;
        let mut usage = BlockGasUsage::new(block, self.contracts);

        for tx in transactions {
            let Some(to) = tx.to.as_deref() else {
                continue;
            };
            if !self.contracts.is_tracked(to) {
                continue;
            }
            match self.client.fetch_gas_used(&tx.hash).await {
                Ok(gas_used) => usage.add(to, gas_used),
                Err(err) => {
                    usage.failed_receipts += 1;
                    warn!(block, tx = %tx.hash, "failed to fetch receipt: {}", err);
                }
            }
        }

        Ok(usage)
    }

    /// Processes `blocks` in order, writing non-zero totals to `report`.
    /// Only report write failures abort the run.
    pub async fn collect<W: Write>(
        &self,
        blocks: &[u64],
        report: &mut ReportWriter<W>,
    ) -> Result<CollectSummary> {
        let mut summary = CollectSummary {
            blocks_selected: blocks.len(),
            ..Default::default()
        };

        for &block in blocks {
            let usage = match self.aggregate_block(block).await {
                Ok(usage) => usage,
                Err(err) => {
                    summary.blocks_skipped += 1;
                    warn!(block, "failed to fetch block transactions: {}", err);
                    continue;
                }
            };

            let written = report
                .write_block(&usage)
                .with_context(|| format!("failed writing report lines for block {}", block))?;

            summary.blocks_processed += 1;
            summary.receipts_failed += usage.failed_receipts;
            summary.lines_written += written;
            info!(block, lines = written, failed_receipts = usage.failed_receipts, "processed block");
        }

        Ok(summary)
    }
}
