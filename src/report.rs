use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use tracing::warn;

use crate::models::{BlockGasUsage, ContractGasInfo, ContractGasUsage};

/// Line-oriented gas report. Flushed once, by [`ReportWriter::finish`].
pub struct ReportWriter<W: Write> {
    inner: W,
}

impl ReportWriter<BufWriter<File>> {
    /// Creates the report file, truncating any previous run.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_usage(&mut self, usage: &ContractGasUsage) -> io::Result<()> {
        writeln!(self.inner, "{}", format_line(usage))
    }

    /// Writes every non-zero entry of the block. Returns the number of lines.
    pub fn write_block(&mut self, block: &BlockGasUsage) -> io::Result<usize> {
        let mut written = 0;
        for usage in block.non_zero() {
            self.write_usage(&usage)?;
            written += 1;
        }
        Ok(written)
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

pub fn format_line(usage: &ContractGasUsage) -> String {
    format!(
        "Block: {}, Contract: {}, GasUsed: {}",
        usage.block, usage.contract, usage.gas_used
    )
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ReportLineError {
    #[error("expected 3 comma-separated fields, found {0}")]
    FieldCount(usize),
    #[error("field {0:?} is not of the form `<label>: <value>`")]
    MalformedField(String),
    #[error("unexpected label {found:?}, expected {expected:?}")]
    UnexpectedLabel {
        expected: &'static str,
        found: String,
    },
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

pub fn parse_line(line: &str) -> Result<ContractGasInfo, ReportLineError> {
    let parts: Vec<&str> = line.trim_end().split(", ").collect();
    let [block, contract, gas] = parts.as_slice() else {
        return Err(ReportLineError::FieldCount(parts.len()));
    };

    let block = field_value(block, "Block")?;
    let contract = field_value(contract, "Contract")?;
    let gas = field_value(gas, "GasUsed")?;

    Ok(ContractGasInfo {
        block: block
            .parse()
            .map_err(|_| ReportLineError::InvalidNumber(block.to_string()))?,
        contract: contract.to_string(),
        gas_used: gas
            .parse()
            .map_err(|_| ReportLineError::InvalidNumber(gas.to_string()))?,
    })
}

fn field_value<'a>(field: &'a str, expected: &'static str) -> Result<&'a str, ReportLineError> {
    let (label, value) = field
        .split_once(": ")
        .ok_or_else(|| ReportLineError::MalformedField(field.to_string()))?;
    if label != expected {
        return Err(ReportLineError::UnexpectedLabel {
            expected,
            found: label.to_string(),
        });
    }
    Ok(value)
}

/// Reads a report back. Malformed lines are logged and skipped.
pub fn read_report<R: BufRead>(reader: R) -> io::Result<Vec<ContractGasInfo>> {
    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(info) => out.push(info),
            Err(e) => warn!(line = idx + 1, "skipping report line {:?}: {}", line, e),
        }
    }
    Ok(out)
}
