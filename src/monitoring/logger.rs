use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use crate::settlement::SettlementOutcome;

const HEADER: &str = "timestamp,policy_id,product_type,reading_source,oracle_count,weather_index,triggered,payout_percentage,payout_amount";

/// Append-only CSV audit trail of settlement decisions.
pub struct CsvLogger {
    log_path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvLogger {
    pub fn new(log_path: impl AsRef<Path>) -> Result<Self> {
        let log_path = log_path.as_ref().to_path_buf();

        // Create CSV file with headers if it doesn't exist
        if !log_path.exists() {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .open(&log_path)
                .with_context(|| format!("Failed to create audit log: {}", log_path.display()))?;

            writeln!(file, "{}", HEADER)?;
        }

        Ok(Self {
            log_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn log_settlement(&self, outcome: &SettlementOutcome) -> Result<()> {
        let _guard = self.write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("audit log lock poisoned"))?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        writeln!(
            file,
            "{},{},{},{:?},{},{:.0},{},{:.2},{}",
            outcome.consensus.timestamp.to_rfc3339(),
            outcome.policy_id,
            outcome.product_type,
            outcome.reading.source,
            outcome.consensus.oracle_count,
            outcome.payout.weather_index,
            outcome.payout.triggered,
            outcome.payout.payout_percentage,
            outcome.payout.payout_amount,
        )?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
