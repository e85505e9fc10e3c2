pub mod aggregator;
pub mod cli;
pub mod config;
pub mod models;
pub mod report;
pub mod rpc;
pub mod selector;
pub mod stats;
