use super::{
    CancellationToken, DispatchJob, DispatchOptions, DispatchReport, Priority, TargetOutcome,
    TargetReport, CANCELLED_REASON, INTERRUPTED_REASON,
};
use crate::error::{DispatchError, Result};
use crate::i18n::{DispatchMetrics, Language, LanguageCatalog, TranslationValidator};
use crate::ledger::{DeliveryLedger, DeliveryRecord, DeliveryState};
use crate::translation::{TranslationProvider, TranslationRequest, TranslationResult};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

/// Fans a message out to every target language.
///
/// Targets run concurrently and independently: each has its own strictly
/// ordered retry sequence, and no target's failure affects another. The report
/// is built only after every target reached a terminal state.
#[derive(Clone)]
pub struct NotificationDispatcher {
    catalog: Arc<LanguageCatalog>,
    provider: Arc<dyn TranslationProvider>,
    ledger: Arc<DeliveryLedger>,
    metrics: Arc<DispatchMetrics>,
}

impl NotificationDispatcher {
    pub fn new(
        catalog: Arc<LanguageCatalog>,
        provider: Arc<dyn TranslationProvider>,
        ledger: Arc<DeliveryLedger>,
    ) -> Self {
        Self {
            catalog,
            provider,
            ledger,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn catalog(&self) -> &LanguageCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &DeliveryLedger {
        &self.ledger
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Validate a request given as language identifiers and build its job.
    ///
    /// Fails with `EmptyMessage`, `NoTargets` or `UnknownLanguage` before any
    /// translation happens.
    pub fn prepare<S: AsRef<str>>(
        &self,
        message: &str,
        target_codes: &[S],
        options: &DispatchOptions,
    ) -> Result<DispatchJob> {
        if message.trim().is_empty() {
            return Err(DispatchError::EmptyMessage);
        }
        let targets = self.catalog.resolve_all(target_codes)?;
        DispatchJob::new(message, &targets, options)
    }

    /// Dispatch `message` to `targets` and wait for every target to finish.
    pub async fn dispatch(
        &self,
        message: &str,
        targets: &[Language],
        options: &DispatchOptions,
    ) -> Result<DispatchReport> {
        if message.trim().is_empty() {
            return Err(DispatchError::EmptyMessage);
        }
        // Languages from another catalog must still be known here
        for target in targets {
            self.catalog.resolve(target.code())?;
        }
        let job = DispatchJob::new(message, targets, options)?;
        Ok(self.run(&job, options, &CancellationToken::new()).await)
    }

    /// Same as `dispatch`, with targets given as codes or display names.
    pub async fn dispatch_codes<S: AsRef<str>>(
        &self,
        message: &str,
        target_codes: &[S],
        options: &DispatchOptions,
    ) -> Result<DispatchReport> {
        let job = self.prepare(message, target_codes, options)?;
        Ok(self.run(&job, options, &CancellationToken::new()).await)
    }

    /// Run an already validated job.
    ///
    /// Running the same job again resumes it: targets the ledger already
    /// holds a success for are reported without calling the provider.
    pub async fn run(
        &self,
        job: &DispatchJob,
        options: &DispatchOptions,
        cancel: &CancellationToken,
    ) -> DispatchReport {
        let started_at = Utc::now();
        self.metrics.record_job();
        info!(
            "Dispatching job {} to {} languages via {} provider",
            job.id(),
            job.targets().len(),
            self.provider.name()
        );

        let source = match job.source() {
            Some(source) => Ok(source),
            None if self.is_delivered(job) => {
                debug!("Job {}: every target already delivered, skipping detection", job.id());
                Err(DispatchError::DetectionFailed("not attempted".to_string()))
            }
            None => match self.detect_source(job, options, cancel).await {
                Some(detected) => {
                    match &detected {
                        Ok(language) => debug!("Job {}: source language {}", job.id(), language),
                        Err(e) => warn!("Job {}: {}", job.id(), e),
                    }
                    detected
                }
                None => return self.cancelled_report(job, started_at),
            },
        };

        let outcomes = join_all(
            job.targets()
                .iter()
                .map(|target| self.run_target(job, *target, &source, options, cancel)),
        )
        .await;

        let targets: Vec<TargetReport> = job
            .targets()
            .iter()
            .zip(outcomes)
            .map(|(language, outcome)| TargetReport {
                language: *language,
                outcome,
            })
            .collect();

        let report = DispatchReport::new(job.id(), targets, started_at);
        info!(
            "Job {} finished ({:?}): {} successful, {} failed",
            job.id(),
            report.status,
            report.success_count(),
            report.failure_count()
        );
        report
    }

    /// Rebuild the report of a finished run from the ledger alone.
    ///
    /// Targets whose latest record is not terminal were cut off by a restart
    /// and are reported as interrupted.
    pub fn recorded_report(&self, job: &DispatchJob) -> DispatchReport {
        let targets = job
            .targets()
            .iter()
            .map(|target| {
                let latest = self.ledger.latest(job.id(), target.code());
                let outcome = match latest {
                    Some(DeliveryRecord {
                        state: DeliveryState::Success,
                        outcome: TranslationResult::Success { translated_text },
                        attempt,
                        ..
                    }) => TargetOutcome::Success {
                        text: self.deliverable(job, *target, translated_text),
                        attempts: attempt,
                    },
                    Some(DeliveryRecord {
                        state: DeliveryState::Failed,
                        outcome: TranslationResult::Failure { reason, .. },
                        attempt,
                        ..
                    }) => self.failure(job, *target, reason, attempt),
                    Some(record) => {
                        self.failure(job, *target, INTERRUPTED_REASON.to_string(), record.attempt)
                    }
                    None => self.failure(job, *target, INTERRUPTED_REASON.to_string(), 0),
                };
                TargetReport {
                    language: *target,
                    outcome,
                }
            })
            .collect();
        DispatchReport::new(job.id(), targets, job.created_at())
    }

    /// Detect the message language, bounded like a provider call.
    ///
    /// Returns `None` when the job was cancelled first.
    async fn detect_source(
        &self,
        job: &DispatchJob,
        options: &DispatchOptions,
        cancel: &CancellationToken,
    ) -> Option<Result<Language>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            detected = timeout(options.per_target_timeout, self.provider.detect_language(job.message())) => {
                Some(detected.unwrap_or_else(|_| {
                    Err(DispatchError::DetectionFailed(format!(
                        "timed out after {:?}",
                        options.per_target_timeout
                    )))
                }))
            }
        }
    }

    /// Whether the ledger holds a success for every target of the job
    fn is_delivered(&self, job: &DispatchJob) -> bool {
        job.targets()
            .iter()
            .all(|target| self.ledger.is_duplicate(job.id(), target.code()))
    }

    /// Outcome of a target that already succeeded in an earlier run
    fn delivered(&self, job: &DispatchJob, target: Language) -> Option<TargetOutcome> {
        let previous = self.ledger.success_for(job.id(), target.code())?;
        let TranslationResult::Success { translated_text } = previous.outcome else {
            return None;
        };
        debug!("Job {}: {} already delivered, skipping", job.id(), target.code());
        self.metrics.record_duplicate_skipped();
        Some(TargetOutcome::Success {
            text: self.deliverable(job, target, translated_text),
            attempts: previous.attempt,
        })
    }

    /// Report for a job cancelled before any target started
    fn cancelled_report(&self, job: &DispatchJob, started_at: DateTime<Utc>) -> DispatchReport {
        let targets = job
            .targets()
            .iter()
            .map(|target| TargetReport {
                language: *target,
                outcome: self
                    .delivered(job, *target)
                    .unwrap_or_else(|| self.cancelled(job, *target, 0)),
            })
            .collect();
        info!("Job {} cancelled during language detection", job.id());
        DispatchReport::new(job.id(), targets, started_at)
    }

    /// Drive one target to a terminal state.
    async fn run_target(
        &self,
        job: &DispatchJob,
        target: Language,
        source: &Result<Language>,
        options: &DispatchOptions,
        cancel: &CancellationToken,
    ) -> TargetOutcome {
        if let Some(outcome) = self.delivered(job, target) {
            return outcome;
        }

        let source = match source {
            Ok(source) => *source,
            Err(e) => {
                let reason = e.to_string();
                let now = Utc::now();
                self.append(job, target, 1, DeliveryState::Failed, TranslationResult::permanent(&reason), now);
                self.metrics.record_failure();
                return self.failure(job, target, reason, 1);
            }
        };

        let request = TranslationRequest::new(job.message(), source, target);
        if request.is_identity() {
            let now = Utc::now();
            if options.allow_identity {
                self.append(job, target, 1, DeliveryState::Success, TranslationResult::success(job.message()), now);
                self.metrics.record_success();
                return TargetOutcome::Success {
                    text: self.deliverable(job, target, job.message().to_string()),
                    attempts: 1,
                };
            }
            let reason = "source and target language are the same".to_string();
            self.append(job, target, 1, DeliveryState::Failed, TranslationResult::permanent(&reason), now);
            self.metrics.record_failure();
            return self.failure(job, target, reason, 1);
        }

        let max_attempts = options.retry.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            // Wait out the backoff; cancellation stops any further attempt
            let delay = options.retry.delay_for_attempt(attempt);
            let cancelled = if cancel.is_cancelled() {
                true
            } else if !delay.is_zero() {
                tokio::select! {
                    _ = sleep(delay) => false,
                    _ = cancel.cancelled() => true,
                }
            } else {
                false
            };
            if cancelled {
                if attempt > 0 {
                    let now = Utc::now();
                    self.append(job, target, attempt, DeliveryState::Failed, TranslationResult::permanent(CANCELLED_REASON), now);
                }
                return self.cancelled(job, target, attempt);
            }

            attempt += 1;
            let started_at = Utc::now();
            self.metrics.record_attempt();

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = timeout(options.per_target_timeout, self.provider.translate(&request)) => {
                    Some(result.unwrap_or_else(|_| {
                        TranslationResult::transient(format!(
                            "timed out after {:?}",
                            options.per_target_timeout
                        ))
                    }))
                }
            };

            let Some(result) = result else {
                self.append(job, target, attempt, DeliveryState::Failed, TranslationResult::permanent(CANCELLED_REASON), started_at);
                return self.cancelled(job, target, attempt);
            };

            match result {
                TranslationResult::Success { translated_text } => {
                    self.validate(job, target, &translated_text);
                    self.append(job, target, attempt, DeliveryState::Success, TranslationResult::success(&translated_text), started_at);
                    self.metrics.record_success();
                    if attempt > 1 {
                        debug!(
                            "Job {}: {} succeeded on attempt {}/{}",
                            job.id(),
                            target.code(),
                            attempt,
                            max_attempts
                        );
                    }
                    return TargetOutcome::Success {
                        text: self.deliverable(job, target, translated_text),
                        attempts: attempt,
                    };
                }
                TranslationResult::Failure { reason, retryable } => {
                    self.metrics.record_failure();
                    let remaining = max_attempts - attempt;
                    let terminal = !retryable || remaining == 0;
                    let state = if terminal {
                        DeliveryState::Failed
                    } else {
                        DeliveryState::RetryScheduled
                    };
                    self.append(job, target, attempt, state, TranslationResult::Failure { reason: reason.clone(), retryable }, started_at);

                    if terminal {
                        warn!(
                            "✗ Job {}: {} failed after {} attempt(s): {}",
                            job.id(),
                            target.code(),
                            attempt,
                            reason
                        );
                        return self.failure(job, target, reason, attempt);
                    }

                    self.metrics.record_retry();
                    warn!(
                        "Job {}: {} attempt {}/{} failed ({}), {} retries remaining",
                        job.id(),
                        target.code(),
                        attempt,
                        max_attempts,
                        reason,
                        remaining
                    );
                }
            }
        }
    }

    fn append(
        &self,
        job: &DispatchJob,
        target: Language,
        attempt: u32,
        state: DeliveryState,
        outcome: TranslationResult,
        started_at: DateTime<Utc>,
    ) {
        let record = DeliveryRecord {
            job_id: job.id(),
            target: target.code().to_string(),
            attempt,
            state,
            outcome,
            started_at,
            finished_at: Utc::now(),
        };
        if let Err(e) = self.ledger.record(record) {
            error!(
                "Failed to record attempt {} for job {} ({}): {}",
                attempt,
                job.id(),
                target.code(),
                e
            );
        }
    }

    fn validate(&self, job: &DispatchJob, target: Language, translated: &str) {
        let validation = TranslationValidator::validate(job.message(), translated);
        if validation.has_warnings() {
            warn!(
                "Translation validation warnings for {}: {:?}",
                target, validation.warnings
            );
        }
        if validation.has_errors() {
            warn!(
                "Translation validation errors for {}: {:?}",
                target, validation.errors
            );
        }
    }

    fn deliverable(&self, job: &DispatchJob, target: Language, text: String) -> String {
        match job.priority() {
            Priority::Normal => text,
            Priority::Urgent => target
                .strings()
                .format_emergency(&text, job.emergency_type()),
        }
    }

    fn failure(
        &self,
        job: &DispatchJob,
        target: Language,
        reason: String,
        attempts: u32,
    ) -> TargetOutcome {
        let fallback = match job.priority() {
            Priority::Urgent => Some(target.strings().format_fallback(job.message())),
            Priority::Normal => None,
        };
        TargetOutcome::Failure {
            reason,
            attempts,
            fallback,
        }
    }

    fn cancelled(&self, job: &DispatchJob, target: Language, attempts: u32) -> TargetOutcome {
        info!("Job {}: {} cancelled", job.id(), target.code());
        self.metrics.record_cancellation();
        self.failure(job, target, CANCELLED_REASON.to_string(), attempts)
    }
}
