//! Inbound API over the dispatcher: submits jobs in the background and keeps
//! their reports until asked for.

use crate::dispatch::{
    CancellationToken, DispatchJob, DispatchOptions, DispatchReport, NotificationDispatcher,
};
use crate::error::{DispatchError, Result};
use crate::i18n::{Language, MetricsReport};
use crate::ledger::{DeliveryRecord, JournaledJob};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

/// Where a submitted job currently stands
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", content = "report", rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed(DispatchReport),
}

struct JobEntry {
    job: DispatchJob,
    options: DispatchOptions,
    cancel: CancellationToken,
    /// `None` while the job runs
    report: Arc<watch::Sender<Option<DispatchReport>>>,
}

/// Upper bound for `max_retries` accepted from a request
pub const DEFAULT_MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct NotificationService {
    dispatcher: NotificationDispatcher,
    defaults: DispatchOptions,
    max_retries_limit: u32,
    jobs: Arc<Mutex<HashMap<Uuid, JobEntry>>>,
}

impl NotificationService {
    pub fn new(dispatcher: NotificationDispatcher, defaults: DispatchOptions) -> Self {
        Self {
            dispatcher,
            defaults,
            max_retries_limit: DEFAULT_MAX_RETRIES_LIMIT,
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_max_retries_limit(mut self, limit: u32) -> Self {
        self.max_retries_limit = limit;
        self
    }

    /// Register the jobs the ledger journaled before a restart.
    ///
    /// Restored jobs are finished; their reports are rebuilt from the ledger
    /// and they can be resumed. Returns how many jobs were restored.
    pub fn restore(&self) -> usize {
        let mut jobs = self.jobs();
        let mut restored = 0;
        for JournaledJob {
            job,
            retry,
            allow_identity,
        } in self.dispatcher.ledger().submitted_jobs()
        {
            if jobs.contains_key(&job.id()) {
                continue;
            }
            let mut options = self.defaults.clone();
            options.retry = retry;
            options.allow_identity = allow_identity;
            options.source_language = job.source();
            options.priority = job.priority();
            options.emergency_type = job.emergency_type();

            let (report, _rx) = watch::channel(Some(self.dispatcher.recorded_report(&job)));
            jobs.insert(
                job.id(),
                JobEntry {
                    job,
                    options,
                    cancel: CancellationToken::new(),
                    report: Arc::new(report),
                },
            );
            restored += 1;
        }
        if restored > 0 {
            info!("Restored {} dispatch jobs from the ledger", restored);
        }
        restored
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Options a request starts from before its own overrides
    pub fn default_options(&self) -> &DispatchOptions {
        &self.defaults
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<Uuid, JobEntry>> {
        match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Validate the request and start it in the background.
    ///
    /// Validation errors are returned here; per-target failures only show up
    /// in the report.
    pub fn submit_dispatch<S: AsRef<str>>(
        &self,
        message: &str,
        target_codes: &[S],
        mut options: DispatchOptions,
    ) -> Result<Uuid> {
        if options.retry.max_retries > self.max_retries_limit {
            warn!(
                "Requested {} retries, limiting to {}",
                options.retry.max_retries, self.max_retries_limit
            );
            options.retry.max_retries = self.max_retries_limit;
        }

        let job = self.dispatcher.prepare(message, target_codes, &options)?;
        let job_id = job.id();
        self.dispatcher.ledger().record_job(JournaledJob {
            job: job.clone(),
            retry: options.retry,
            allow_identity: options.allow_identity,
        })?;

        let (report, _rx) = watch::channel(None);
        let entry = JobEntry {
            job,
            options,
            cancel: CancellationToken::new(),
            report: Arc::new(report),
        };

        self.spawn(&entry);
        self.jobs().insert(job_id, entry);
        info!("Submitted dispatch job {}", job_id);
        Ok(job_id)
    }

    fn spawn(&self, entry: &JobEntry) {
        let dispatcher = self.dispatcher.clone();
        let job = entry.job.clone();
        let options = entry.options.clone();
        let cancel = entry.cancel.clone();
        let report = entry.report.clone();

        tokio::spawn(async move {
            let result = dispatcher.run(&job, &options, &cancel).await;
            report.send_replace(Some(result));
        });
    }

    pub fn get_report(&self, job_id: Uuid) -> Result<JobStatus> {
        let jobs = self.jobs();
        let entry = jobs
            .get(&job_id)
            .ok_or_else(|| DispatchError::JobNotFound(job_id.to_string()))?;
        let status = match entry.report.borrow().as_ref() {
            Some(report) => JobStatus::Completed(report.clone()),
            None => JobStatus::Running,
        };
        Ok(status)
    }

    /// Wait for the job's current run to finish
    pub async fn wait(&self, job_id: Uuid) -> Result<DispatchReport> {
        let mut rx = self
            .jobs()
            .get(&job_id)
            .map(|entry| entry.report.subscribe())
            .ok_or_else(|| DispatchError::JobNotFound(job_id.to_string()))?;

        let report = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| DispatchError::JobNotFound(job_id.to_string()))?;
        report
            .clone()
            .ok_or_else(|| DispatchError::JobNotFound(job_id.to_string()))
    }

    /// Stop new attempts for a job. Finished jobs are left untouched.
    pub fn cancel(&self, job_id: Uuid) -> Result<()> {
        let jobs = self.jobs();
        let entry = jobs
            .get(&job_id)
            .ok_or_else(|| DispatchError::JobNotFound(job_id.to_string()))?;
        if entry.report.borrow().is_none() {
            info!("Cancelling dispatch job {}", job_id);
            entry.cancel.cancel();
        }
        Ok(())
    }

    /// Run a finished job again; targets that already succeeded are skipped.
    ///
    /// Resuming a job that is still running does nothing.
    pub fn resume(&self, job_id: Uuid) -> Result<()> {
        let mut jobs = self.jobs();
        let entry = jobs
            .get_mut(&job_id)
            .ok_or_else(|| DispatchError::JobNotFound(job_id.to_string()))?;
        if entry.report.borrow().is_none() {
            warn!("Dispatch job {} is still running, not resuming", job_id);
            return Ok(());
        }

        info!("Resuming dispatch job {}", job_id);
        entry.cancel = CancellationToken::new();
        entry.report.send_replace(None);
        self.spawn(entry);
        Ok(())
    }

    /// Ledger records of a job in append order
    pub fn history(&self, job_id: Uuid) -> Result<Vec<DeliveryRecord>> {
        if !self.jobs().contains_key(&job_id) {
            return Err(DispatchError::JobNotFound(job_id.to_string()));
        }
        Ok(self.dispatcher.ledger().history(job_id))
    }

    pub fn list_languages(&self) -> Vec<Language> {
        self.dispatcher.catalog().list()
    }

    pub fn metrics(&self) -> MetricsReport {
        self.dispatcher.metrics().report()
    }
}
