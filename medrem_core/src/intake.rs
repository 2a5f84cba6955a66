//! Durable intake log.
//!
//! Confirmations are appended to a JSONL file with file locking. The
//! exclusive lock is held across the duplicate check AND the append,
//! which makes confirm's check-then-insert a single atomic unit even
//! across processes: of N racing confirms for the same dose slot,
//! exactly one inserts.

use crate::{ConfirmOutcome, DoseKey, Error, IntakeRecord, Result};
use chrono::{DateTime, NaiveDate, Utc};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only store of confirmed doses, queried for "already taken
/// today" checks and history.
///
/// Implementations must make [`append_unique`](IntakeLog::append_unique)
/// atomic per (medication, time, date) key.
pub trait IntakeLog: Send + Sync {
    /// Insert `record` unless a record with the same (medication,
    /// scheduled_time, date) identity already exists.
    fn append_unique(&self, record: &IntakeRecord) -> Result<ConfirmOutcome>;

    /// The dose slots already confirmed on `date`
    fn acknowledged_on(&self, date: NaiveDate) -> Result<HashSet<DoseKey>>;

    /// Records confirmed at or after `since`, most recent first
    fn recent(&self, since: DateTime<Utc>) -> Result<Vec<IntakeRecord>>;
}

/// JSONL-based intake log with fs2 file locking
pub struct JsonlIntakeLog {
    path: PathBuf,
}

impl JsonlIntakeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::storage)?;
        }
        Ok(())
    }

    /// Read all records under a shared lock. Missing file means an
    /// empty log.
    fn read_all(&self) -> Result<Vec<IntakeRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path).map_err(Error::storage)?;
        file.lock_shared().map_err(Error::storage)?;
        let records = read_records(&file);
        file.unlock().map_err(Error::storage)?;
        records
    }
}

impl IntakeLog for JsonlIntakeLog {
    fn append_unique(&self, record: &IntakeRecord) -> Result<ConfirmOutcome> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(Error::storage)?;

        // Exclusive lock spans the duplicate check and the append
        file.lock_exclusive().map_err(Error::storage)?;

        let result = append_unique_locked(&file, record);

        file.unlock().map_err(Error::storage)?;
        result
    }

    fn acknowledged_on(&self, date: NaiveDate) -> Result<HashSet<DoseKey>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.date == date)
            .map(|r| r.key())
            .collect())
    }

    fn recent(&self, since: DateTime<Utc>) -> Result<Vec<IntakeRecord>> {
        let mut records: Vec<_> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.confirmed_at >= since)
            .collect();
        records.sort_by(|a, b| b.confirmed_at.cmp(&a.confirmed_at));
        Ok(records)
    }
}

fn append_unique_locked(file: &File, record: &IntakeRecord) -> Result<ConfirmOutcome> {
    let existing = read_records(file)?;
    let duplicate = existing.iter().any(|r| {
        r.medication == record.medication
            && r.scheduled_time == record.scheduled_time
            && r.date == record.date
    });
    if duplicate {
        tracing::debug!(
            medication = %record.medication,
            time = %record.scheduled_time,
            date = %record.date,
            "confirmation already logged"
        );
        return Ok(ConfirmOutcome::Duplicate);
    }

    let line = serde_json::to_string(record).map_err(Error::storage)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(line.as_bytes()).map_err(Error::storage)?;
    writer.write_all(b"\n").map_err(Error::storage)?;
    writer.flush().map_err(Error::storage)?;

    tracing::debug!(id = %record.id, "appended intake record");
    Ok(ConfirmOutcome::Created)
}

/// Parse the record lines of an open log file.
///
/// A malformed line is logged and skipped rather than failing the
/// whole read; a dose it might have acknowledged will simply be
/// re-reminded, never hidden.
fn read_records(file: &File) -> Result<Vec<IntakeRecord>> {
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(Error::storage)?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<IntakeRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("skipping malformed intake record at line {}: {e}", line_num + 1);
            }
        }
    }

    Ok(records)
}
