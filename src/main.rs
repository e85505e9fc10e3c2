use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use clap::Parser;

use reserved_gas_scanner::aggregator::GasAggregator;
use reserved_gas_scanner::cli::{Cli, Commands, Selection};
use reserved_gas_scanner::config::Config;
use reserved_gas_scanner::report::{self, ReportWriter};
use reserved_gas_scanner::rpc::RpcClient;
use reserved_gas_scanner::selector;
use reserved_gas_scanner::stats::ReportStats;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command {
        Commands::Collect {
            start,
            end,
            selection,
            count,
            output,
            rpc_url,
        } => {
            let url = config.rpc_url(rpc_url.as_deref())?;
            let client = RpcClient::new(&url)?;

            let blocks = match selection {
                Selection::Checkpoint => {
                    selector::checkpoint_blocks(start, end, config.epoch_length)
                }
                Selection::Random => selector::random_blocks(
                    start,
                    end,
                    count,
                    config.epoch_length,
                    &mut rand::thread_rng(),
                ),
            };
            tracing::info!(
                rpc = %client.url(),
                ?selection,
                blocks = blocks.len(),
                "starting collection"
            );

            let mut writer = ReportWriter::create(&output)
                .with_context(|| format!("failed to create {}", output.display()))?;
            let summary = GasAggregator::new(&client, &config.contracts)
                .collect(&blocks, &mut writer)
                .await?;
            writer
                .finish()
                .with_context(|| format!("failed to flush {}", output.display()))?;

            tracing::info!(
                processed = summary.blocks_processed,
                skipped = summary.blocks_skipped,
                failed_receipts = summary.receipts_failed,
                lines = summary.lines_written,
                "data written to {}",
                output.display()
            );
        }
        Commands::Stats { input } => {
            let stats = report_stats(&input, &config)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn report_stats(input: &Path, config: &Config) -> anyhow::Result<ReportStats> {
    let file = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let records = report::read_report(BufReader::new(file))
        .with_context(|| format!("failed to read {}", input.display()))?;
    let stats = ReportStats::from_records(&records, &config.contracts);
    tracing::info!(
        min = stats.blocks.min,
        max = stats.blocks.max,
        median = stats.blocks.median,
        avg = stats.blocks.avg,
        "per-block gas over {} blocks",
        stats.blocks.count
    );
    Ok(stats)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
