//! Append-only record of every delivery attempt.
//!
//! Each attempt for a (job, target) pair is appended as one `DeliveryRecord`.
//! Records are never modified or removed. A journaled ledger also writes each
//! submitted job and each record as a JSON line and replays the file when
//! opened, so jobs can be looked up and resumed after a restart and keep
//! skipping targets that already succeeded.

use crate::dispatch::DispatchJob;
use crate::error::{DispatchError, Result};
use crate::retry::RetryPolicy;
use crate::translation::TranslationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

/// Delivery state of a (job, target) pair
///
/// `Pending -> Attempting -> {Success, RetryScheduled -> Attempting, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Pending,
    Attempting,
    RetryScheduled,
    Success,
    Failed,
}

impl DeliveryState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryState::Success | DeliveryState::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: DeliveryState) -> bool {
        use DeliveryState::*;
        matches!(
            (self, next),
            (Pending, Attempting)
                | (Attempting, Success)
                | (Attempting, RetryScheduled)
                | (Attempting, Failed)
                | (RetryScheduled, Attempting)
                | (RetryScheduled, Failed)
        )
    }

    /// Whether a record in this state may follow the pair's latest recorded state.
    ///
    /// Records are written when an attempt ends, so every step passes through
    /// `Attempting`. A failed pair starts over when its job is resumed.
    pub fn can_follow(self, previous: Option<DeliveryState>) -> bool {
        use DeliveryState::*;
        let from = match previous {
            None | Some(Failed) => Pending,
            Some(state) => state,
        };
        (from == Attempting || from.can_transition_to(Attempting))
            && Attempting.can_transition_to(self)
    }
}

/// One attempt outcome for one (job, target) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub job_id: Uuid,
    /// Target language code
    pub target: String,
    /// 1-based attempt number within this target's retry sequence
    pub attempt: u32,
    /// State the pair is in after this attempt
    pub state: DeliveryState,
    pub outcome: TranslationResult,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DeliveryRecord {
    pub fn is_success(&self) -> bool {
        self.state == DeliveryState::Success
    }
}

/// A submitted job with the settings needed to run it again
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournaledJob {
    pub job: DispatchJob,
    pub retry: RetryPolicy,
    #[serde(default)]
    pub allow_identity: bool,
}

/// One line of the journal file
#[derive(Deserialize)]
#[serde(untagged)]
enum JournalLine {
    Job { job: JournaledJob },
    Attempt(DeliveryRecord),
}

#[derive(Serialize)]
struct JobLine<'a> {
    job: &'a JournaledJob,
}

struct LedgerInner {
    records: Vec<DeliveryRecord>,
    jobs: Vec<JournaledJob>,
    journal: Option<File>,
}

/// Append one JSON line; a failed write is cut back off the file
fn append_line<T: Serialize>(journal: &mut File, value: &T) -> Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    let offset = journal.metadata()?.len();
    if let Err(e) = journal
        .write_all(line.as_bytes())
        .and_then(|_| journal.flush())
    {
        if let Err(truncate) = journal.set_len(offset) {
            warn!("Failed to drop partial journal line: {}", truncate);
        }
        return Err(e.into());
    }
    Ok(())
}

/// Shared, append-only delivery ledger.
///
/// A single mutex serializes appends so concurrent targets never lose writes.
pub struct DeliveryLedger {
    inner: Mutex<LedgerInner>,
}

impl DeliveryLedger {
    /// Ledger that lives only for the process lifetime
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(LedgerInner {
                records: Vec::new(),
                jobs: Vec::new(),
                journal: None,
            }),
        }
    }

    /// Ledger backed by a JSON-lines journal file (created if missing)
    ///
    /// An unparsable last line without a trailing newline is an append cut
    /// short by a crash: it is dropped from the file. Any other unparsable
    /// line fails with `LedgerFormat`.
    pub fn with_journal(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut records = Vec::new();
        let mut jobs = Vec::new();
        let mut torn_at = None;
        let mut unterminated = false;

        if path.exists() {
            let bytes = std::fs::read(path)?;
            let mut start = 0;
            while start < bytes.len() {
                let end = bytes[start..]
                    .iter()
                    .position(|b| *b == b'\n')
                    .map_or(bytes.len(), |i| start + i);
                let line = &bytes[start..end];

                if !line.iter().all(u8::is_ascii_whitespace) {
                    match serde_json::from_slice::<JournalLine>(line) {
                        Ok(JournalLine::Job { job }) => jobs.push(job),
                        Ok(JournalLine::Attempt(record)) => records.push(record),
                        Err(e) if end == bytes.len() => {
                            warn!(
                                "Dropping incomplete last line of {} at byte {}: {}",
                                path.display(),
                                start,
                                e
                            );
                            torn_at = Some(start as u64);
                            break;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                start = end + 1;
            }
            unterminated = torn_at.is_none() && bytes.last().is_some_and(|b| *b != b'\n');
            info!(
                "Replayed {} jobs and {} delivery records from {}",
                jobs.len(),
                records.len(),
                path.display()
            );
        }

        let mut journal = OpenOptions::new().create(true).append(true).open(path)?;
        if let Some(offset) = torn_at {
            journal.set_len(offset)?;
        }
        if unterminated {
            journal.write_all(b"\n")?;
        }

        Ok(Self {
            inner: Mutex::new(LedgerInner {
                records,
                jobs,
                journal: Some(journal),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append one attempt. Prior records are never touched.
    ///
    /// Fails with `InvalidTransition` when the state cannot follow the pair's
    /// latest record, e.g. anything after a success.
    pub fn record(&self, record: DeliveryRecord) -> Result<()> {
        let mut inner = self.lock();
        let previous = inner
            .records
            .iter()
            .rev()
            .find(|r| r.job_id == record.job_id && r.target == record.target)
            .map(|r| r.state);
        if !record.state.can_follow(previous) {
            return Err(DispatchError::InvalidTransition(format!(
                "job {} target {}: {:?} -> {:?}",
                record.job_id, record.target, previous, record.state
            )));
        }

        if let Some(journal) = inner.journal.as_mut() {
            append_line(journal, &record)?;
        }
        inner.records.push(record);
        Ok(())
    }

    /// Remember a submitted job so it can be restored after a restart
    pub fn record_job(&self, job: JournaledJob) -> Result<()> {
        let mut inner = self.lock();
        if let Some(journal) = inner.journal.as_mut() {
            append_line(journal, &JobLine { job: &job })?;
        }
        inner.jobs.push(job);
        Ok(())
    }

    /// Jobs recorded with `record_job`, in submission order
    pub fn submitted_jobs(&self) -> Vec<JournaledJob> {
        self.lock().jobs.clone()
    }

    /// All records of a job in the order they were appended
    pub fn history(&self, job_id: Uuid) -> Vec<DeliveryRecord> {
        self.lock()
            .records
            .iter()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect()
    }

    /// Whether the target already succeeded for this job
    pub fn is_duplicate(&self, job_id: Uuid, target: &str) -> bool {
        self.lock()
            .records
            .iter()
            .any(|r| r.job_id == job_id && r.target == target && r.is_success())
    }

    /// Most recent record for a (job, target) pair
    pub fn latest(&self, job_id: Uuid, target: &str) -> Option<DeliveryRecord> {
        self.lock()
            .records
            .iter()
            .rev()
            .find(|r| r.job_id == job_id && r.target == target)
            .cloned()
    }

    /// Successful record for a (job, target) pair, if any
    pub fn success_for(&self, job_id: Uuid, target: &str) -> Option<DeliveryRecord> {
        self.lock()
            .records
            .iter()
            .find(|r| r.job_id == job_id && r.target == target && r.is_success())
            .cloned()
    }

    /// Job ids in first-seen order
    pub fn jobs(&self) -> Vec<Uuid> {
        let inner = self.lock();
        let mut jobs: Vec<Uuid> = Vec::new();
        for record in &inner.records {
            if !jobs.contains(&record.job_id) {
                jobs.push(record.job_id);
            }
        }
        jobs
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DeliveryLedger {
    fn default() -> Self {
        Self::in_memory()
    }
}
