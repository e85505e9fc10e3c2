use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub const DEFAULT_REPORT_PATH: &str = "contract_gas_usage.txt";

#[derive(Parser, Debug)]
#[command(
    name = "reserved-gas-scanner",
    version,
    about = "Per-block gas usage of Ronin system contracts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan blocks and write per-contract gas totals to a report file
    Collect {
        /// First block of the range (inclusive)
        #[arg(long, default_value_t = 29_999_998)]
        start: u64,
        /// End of the range (exclusive for checkpoints, inclusive for random samples)
        #[arg(long, default_value_t = 31_000_000)]
        end: u64,
        #[arg(long, value_enum, default_value_t = Selection::Checkpoint)]
        selection: Selection,
        /// Sample size for `--selection random`
        #[arg(long, default_value_t = 3000)]
        count: u64,
        #[arg(long, default_value = DEFAULT_REPORT_PATH)]
        output: PathBuf,
        /// Override RPC_URL
        #[arg(long)]
        rpc_url: Option<String>,
    },
    /// Compute min/max/median/average over a previously written report
    Stats {
        #[arg(long, default_value = DEFAULT_REPORT_PATH)]
        input: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Last block of every epoch
    Checkpoint,
    /// Uniform random sample
    Random,
}
