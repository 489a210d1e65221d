//! Offline BLE credit ledger (§4.6, §6 `ble_credit_tx`).
//!
//! Credits earned while disconnected from the swarm coordinator are
//! recorded locally as JSON-lines rows and synced up once connectivity
//! returns. The log is append-only and keyed by `tx_id` so a crash between
//! "append" and "mark synced" never double-counts a transaction on replay.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::BleError;

/// One row of the offline ledger, matching the `ble_credit_tx` schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BleCreditTx {
    pub tx_id: String,
    pub payer_agent_id: String,
    pub payee_agent_id: String,
    pub amount: f64,
    pub resource_class: String,
    pub recorded_at_ms: u64,
    pub synced: bool,
}

/// Durable append-only store for [`BleCreditTx`] rows.
pub struct OfflineLedger {
    path: PathBuf,
    rows: Mutex<Vec<BleCreditTx>>,
}

impl OfflineLedger {
    /// Open (creating if absent) the ledger file at `path`, replaying any
    /// rows already on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BleError> {
        let path = path.as_ref().to_path_buf();
        let mut rows = Vec::new();
        if path.exists() {
            let file = File::open(&path).map_err(|e| BleError::LedgerIo(e.to_string()))?;
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|e| BleError::LedgerIo(e.to_string()))?;
                if line.trim().is_empty() {
                    continue;
                }
                let row: BleCreditTx =
                    serde_json::from_str(&line).map_err(|e| BleError::LedgerIo(e.to_string()))?;
                rows.push(row);
            }
        } else if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BleError::LedgerIo(e.to_string()))?;
        }
        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    /// Append a new transaction, rejecting duplicate `tx_id`s.
    pub fn record(&self, tx: BleCreditTx) -> Result<(), BleError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.tx_id == tx.tx_id) {
            return Ok(());
        }
        self.append_line(&tx)?;
        rows.push(tx);
        Ok(())
    }

    fn append_line(&self, tx: &BleCreditTx) -> Result<(), BleError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| BleError::LedgerIo(e.to_string()))?;
        let line = serde_json::to_string(tx).map_err(|e| BleError::LedgerIo(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| BleError::LedgerIo(e.to_string()))?;
        Ok(())
    }

    /// All transactions not yet marked synced, in recorded order.
    pub fn pending(&self) -> Vec<BleCreditTx> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !r.synced)
            .cloned()
            .collect()
    }

    /// Snapshot the pending transactions for a sync batch; does not mark
    /// them synced (callers do that after the coordinator acknowledges).
    pub fn export_batch(&self) -> Vec<BleCreditTx> {
        self.pending()
    }

    /// Mark the given transaction ids as synced, rewriting the log.
    pub fn mark_synced(&self, ids: &[String]) -> Result<(), BleError> {
        let synced: HashSet<&String> = ids.iter().collect();
        let mut rows = self.rows.lock().unwrap();
        for row in rows.iter_mut() {
            if synced.contains(&row.tx_id) {
                row.synced = true;
            }
        }
        self.rewrite(&rows)
    }

    fn rewrite(&self, rows: &[BleCreditTx]) -> Result<(), BleError> {
        let mut file = File::create(&self.path).map_err(|e| BleError::LedgerIo(e.to_string()))?;
        for row in rows {
            let line =
                serde_json::to_string(row).map_err(|e| BleError::LedgerIo(e.to_string()))?;
            writeln!(file, "{line}").map_err(|e| BleError::LedgerIo(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: &str) -> BleCreditTx {
        BleCreditTx {
            tx_id: id.to_string(),
            payer_agent_id: "swarm".to_string(),
            payee_agent_id: "agent-1".to_string(),
            amount: 4.0,
            resource_class: "cpu".to_string(),
            recorded_at_ms: 1_000,
            synced: false,
        }
    }

    #[test]
    fn record_and_read_pending() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OfflineLedger::open(dir.path().join("ledger.jsonl")).unwrap();
        ledger.record(tx("a")).unwrap();
        ledger.record(tx("b")).unwrap();
        assert_eq!(ledger.pending().len(), 2);
    }

    #[test]
    fn duplicate_tx_id_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OfflineLedger::open(dir.path().join("ledger.jsonl")).unwrap();
        ledger.record(tx("a")).unwrap();
        ledger.record(tx("a")).unwrap();
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn mark_synced_removes_from_pending() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OfflineLedger::open(dir.path().join("ledger.jsonl")).unwrap();
        ledger.record(tx("a")).unwrap();
        ledger.mark_synced(&["a".to_string()]).unwrap();
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn survives_reopen_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        {
            let ledger = OfflineLedger::open(&path).unwrap();
            ledger.record(tx("a")).unwrap();
        }
        let reopened = OfflineLedger::open(&path).unwrap();
        assert_eq!(reopened.pending().len(), 1);
        assert_eq!(reopened.pending()[0].tx_id, "a");
    }

    #[test]
    fn export_batch_matches_pending() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OfflineLedger::open(dir.path().join("ledger.jsonl")).unwrap();
        ledger.record(tx("a")).unwrap();
        assert_eq!(ledger.export_batch(), ledger.pending());
    }
}
