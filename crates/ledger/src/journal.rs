//! Journal persistence (JSON lines)
//!
//! One `LedgerEntry` per line, in application order. The file plus the
//! `LedgerConfig` it was produced under is enough to rebuild the ledger
//! with [`Ledger::replay`](crate::Ledger::replay).

use crate::ledger::LedgerEntry;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed journal entry at line {line}: {source}")]
    Malformed {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Failed to encode journal entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write entries as JSON lines
pub fn write_journal<W: Write>(writer: W, entries: &[LedgerEntry]) -> Result<(), JournalError> {
    let mut writer = BufWriter::new(writer);
    for entry in entries {
        serde_json::to_writer(&mut writer, entry)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read JSON-lines entries, skipping blank lines
pub fn read_journal<R: BufRead>(reader: R) -> Result<Vec<LedgerEntry>, JournalError> {
    let mut entries = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line).map_err(|source| JournalError::Malformed {
            line: idx + 1,
            source,
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Write a journal file, replacing any existing one
pub fn save(path: impl AsRef<Path>, entries: &[LedgerEntry]) -> Result<(), JournalError> {
    let file = File::create(path)?;
    write_journal(file, entries)
}

/// Load a journal file
pub fn load(path: impl AsRef<Path>) -> Result<Vec<LedgerEntry>, JournalError> {
    let file = File::open(path)?;
    read_journal(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ExecutionRequest, Ledger, LedgerConfig};
    use chrono::{TimeZone, Utc};
    use meridian_core::Action;
    use rust_decimal_macros::dec;

    #[test]
    fn test_journal_survives_serialization() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let mut ledger = Ledger::new(LedgerConfig::default()).unwrap();
        ledger.mark(0, now, dec!(250)).unwrap();
        ledger
            .apply(&ExecutionRequest {
                step: 1,
                timestamp: now,
                action: Action::OpenShort,
                size: dec!(12.5),
                price: dec!(250),
            })
            .unwrap();
        ledger.mark(2, now, dec!(240.75)).unwrap();

        let mut buffer = Vec::new();
        write_journal(&mut buffer, ledger.journal()).unwrap();
        let entries = read_journal(buffer.as_slice()).unwrap();

        assert_eq!(entries, ledger.journal());
        let replayed = Ledger::replay(LedgerConfig::default(), &entries).unwrap();
        assert_eq!(replayed.snapshot(), ledger.snapshot());
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let input = "\n{\"kind\":\"peak_reset\",\"step\":1,\"timestamp\":\"2024-01-01T00:00:00Z\"}\nnot json\n";
        let err = read_journal(input.as_bytes()).unwrap_err();
        assert!(matches!(err, JournalError::Malformed { line: 3, .. }));
    }
}
