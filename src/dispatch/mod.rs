//! Multilingual dispatch: jobs, options, reports and the dispatcher.

mod cancel;
mod dispatcher;

pub use cancel::CancellationToken;
pub use dispatcher::NotificationDispatcher;

use crate::error::{DispatchError, Result};
use crate::i18n::Language;
use crate::retry::{Backoff, RetryPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Reason attached to targets ended by cancellation
pub const CANCELLED_REASON: &str = "cancelled";

/// Reason attached to targets whose run stopped without a terminal record
pub const INTERRUPTED_REASON: &str = "interrupted";

/// Urgency of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Deliver the translation as-is
    #[default]
    Normal,
    /// Deliver as `[CODE] <EMERGENCY label>: <UPPERCASED TEXT>`
    Urgent,
}

/// Category of an emergency notification, shown next to the emergency label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyType {
    MedicalEmergency,
    NaturalDisaster,
    SafetyAlert,
    PoliceAssistance,
}

impl EmergencyType {
    pub const ALL: [EmergencyType; 4] = [
        EmergencyType::MedicalEmergency,
        EmergencyType::NaturalDisaster,
        EmergencyType::SafetyAlert,
        EmergencyType::PoliceAssistance,
    ];

    /// English label (e.g., "Natural Disaster")
    pub fn name(self) -> &'static str {
        match self {
            EmergencyType::MedicalEmergency => "Medical Emergency",
            EmergencyType::NaturalDisaster => "Natural Disaster",
            EmergencyType::SafetyAlert => "Safety Alert",
            EmergencyType::PoliceAssistance => "Police Assistance",
        }
    }
}

/// Per-dispatch settings
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub retry: RetryPolicy,
    /// Upper bound for a single provider call
    pub per_target_timeout: Duration,
    /// Declared source language; detected from the message when absent
    pub source_language: Option<Language>,
    /// Allow targets equal to the source (delivered untranslated)
    pub allow_identity: bool,
    pub priority: Priority,
    /// Emergency category; setting one makes the job urgent
    pub emergency_type: Option<EmergencyType>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            per_target_timeout: Duration::from_secs(10),
            source_language: None,
            allow_identity: false,
            priority: Priority::Normal,
            emergency_type: None,
        }
    }
}

impl DispatchOptions {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.retry.backoff = backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.per_target_timeout = timeout;
        self
    }

    pub fn with_source(mut self, source: Language) -> Self {
        self.source_language = Some(source);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_emergency_type(mut self, emergency_type: EmergencyType) -> Self {
        self.emergency_type = Some(emergency_type);
        self
    }

    pub fn allow_identity(mut self, allow: bool) -> Self {
        self.allow_identity = allow;
        self
    }
}

/// One multilingual notification request. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchJob {
    id: Uuid,
    message: String,
    source: Option<Language>,
    targets: Vec<Language>,
    priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    emergency_type: Option<EmergencyType>,
    created_at: DateTime<Utc>,
}

impl DispatchJob {
    /// Validate and create a job with a fresh id.
    ///
    /// Repeated targets are collapsed, keeping first-seen order.
    pub fn new(message: &str, targets: &[Language], options: &DispatchOptions) -> Result<Self> {
        if message.trim().is_empty() {
            return Err(DispatchError::EmptyMessage);
        }
        if targets.is_empty() {
            return Err(DispatchError::NoTargets);
        }

        let mut unique: Vec<Language> = Vec::with_capacity(targets.len());
        for target in targets {
            if !unique.contains(target) {
                unique.push(*target);
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            message: message.to_string(),
            source: options.source_language,
            targets: unique,
            priority: match options.emergency_type {
                Some(_) => Priority::Urgent,
                None => options.priority,
            },
            emergency_type: options.emergency_type,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> Option<Language> {
        self.source
    }

    pub fn targets(&self) -> &[Language] {
        &self.targets
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn emergency_type(&self) -> Option<EmergencyType> {
        self.emergency_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Final outcome for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetOutcome {
    Success {
        text: String,
        attempts: u32,
    },
    Failure {
        reason: String,
        attempts: u32,
        /// Original message with a localized notice, for urgent jobs
        #[serde(skip_serializing_if = "Option::is_none")]
        fallback: Option<String>,
    },
}

impl TargetOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TargetOutcome::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            TargetOutcome::Success { attempts, .. } | TargetOutcome::Failure { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TargetOutcome::Failure { reason, .. } if reason == CANCELLED_REASON)
    }
}

/// Outcome of a target together with its language
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    pub language: Language,
    #[serde(flatten)]
    pub outcome: TargetOutcome,
}

/// Aggregate status of a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    AllSucceeded,
    PartialFailure,
    AllFailed,
}

/// Result of a dispatch: one entry per requested target, in request order
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub job_id: Uuid,
    pub status: DispatchStatus,
    pub targets: Vec<TargetReport>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl DispatchReport {
    pub fn new(job_id: Uuid, targets: Vec<TargetReport>, started_at: DateTime<Utc>) -> Self {
        let succeeded = targets.iter().filter(|t| t.outcome.is_success()).count();
        let status = if succeeded == targets.len() {
            DispatchStatus::AllSucceeded
        } else if succeeded == 0 {
            DispatchStatus::AllFailed
        } else {
            DispatchStatus::PartialFailure
        };

        Self {
            job_id,
            status,
            targets,
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// Outcome for a language code
    pub fn get(&self, code: &str) -> Option<&TargetOutcome> {
        self.targets
            .iter()
            .find(|t| t.language.code() == code)
            .map(|t| &t.outcome)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| t.outcome.is_success())
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(code: &str) -> Language {
        Language::from_code(code).unwrap()
    }

    fn success() -> TargetOutcome {
        TargetOutcome::Success {
            text: "ok".to_string(),
            attempts: 1,
        }
    }

    fn failure(reason: &str) -> TargetOutcome {
        TargetOutcome::Failure {
            reason: reason.to_string(),
            attempts: 3,
            fallback: None,
        }
    }

    // ==================== Job Validation Tests ====================

    #[test]
    fn test_job_rejects_empty_message() {
        let result = DispatchJob::new("   ", &[lang("en")], &DispatchOptions::default());
        assert!(matches!(result, Err(DispatchError::EmptyMessage)));
    }

    #[test]
    fn test_job_rejects_no_targets() {
        let result = DispatchJob::new("Evacuate", &[], &DispatchOptions::default());
        assert!(matches!(result, Err(DispatchError::NoTargets)));
    }

    #[test]
    fn test_job_dedupes_targets_in_order() {
        let job = DispatchJob::new(
            "Evacuate",
            &[lang("ta"), lang("hi"), lang("ta")],
            &DispatchOptions::default(),
        )
        .unwrap();
        let codes: Vec<_> = job.targets().iter().map(|l| l.code()).collect();
        assert_eq!(codes, vec!["ta", "hi"]);
    }

    #[test]
    fn test_job_copies_options() {
        let options = DispatchOptions::default()
            .with_source(lang("en"))
            .with_priority(Priority::Urgent);
        let job = DispatchJob::new("Evacuate", &[lang("hi")], &options).unwrap();
        assert_eq!(job.source(), Some(lang("en")));
        assert_eq!(job.priority(), Priority::Urgent);
        assert_eq!(job.message(), "Evacuate");
    }

    #[test]
    fn test_emergency_type_makes_job_urgent() {
        let options = DispatchOptions::default().with_emergency_type(EmergencyType::NaturalDisaster);
        let job = DispatchJob::new("Flood warning", &[lang("hi")], &options).unwrap();
        assert_eq!(job.priority(), Priority::Urgent);
        assert_eq!(job.emergency_type(), Some(EmergencyType::NaturalDisaster));
    }

    #[test]
    fn test_emergency_type_names() {
        let names: Vec<_> = EmergencyType::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec!["Medical Emergency", "Natural Disaster", "Safety Alert", "Police Assistance"]
        );
        assert_eq!(
            serde_json::to_value(EmergencyType::PoliceAssistance).unwrap(),
            "police_assistance"
        );
    }

    #[test]
    fn test_job_json_restores_same_job() {
        let options = DispatchOptions::default()
            .with_source(lang("en"))
            .with_emergency_type(EmergencyType::MedicalEmergency);
        let job = DispatchJob::new("Ambulance on the way", &[lang("ta"), lang("bn")], &options)
            .unwrap();

        let json = serde_json::to_string(&job).unwrap();
        let restored: DispatchJob = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, job);
        assert_eq!(restored.targets()[1].native_name(), "বাংলা");
    }

    #[test]
    fn test_job_ids_are_unique() {
        let options = DispatchOptions::default();
        let a = DispatchJob::new("x", &[lang("hi")], &options).unwrap();
        let b = DispatchJob::new("x", &[lang("hi")], &options).unwrap();
        assert_ne!(a.id(), b.id());
    }

    // ==================== Options Tests ====================

    #[test]
    fn test_default_options() {
        let options = DispatchOptions::default();
        assert_eq!(options.retry.max_retries, 2);
        assert!(!options.allow_identity);
        assert_eq!(options.priority, Priority::Normal);
        assert!(options.source_language.is_none());
    }

    #[test]
    fn test_option_builders() {
        let options = DispatchOptions::default()
            .with_max_retries(5)
            .with_timeout(Duration::from_millis(50))
            .allow_identity(true);
        assert_eq!(options.retry.max_retries, 5);
        assert_eq!(options.per_target_timeout, Duration::from_millis(50));
        assert!(options.allow_identity);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_all_succeeded() {
        let report = DispatchReport::new(
            Uuid::new_v4(),
            vec![
                TargetReport { language: lang("hi"), outcome: success() },
                TargetReport { language: lang("ta"), outcome: success() },
            ],
            Utc::now(),
        );
        assert_eq!(report.status, DispatchStatus::AllSucceeded);
        assert_eq!(report.success_count(), 2);
    }

    #[test]
    fn test_report_partial_failure() {
        let report = DispatchReport::new(
            Uuid::new_v4(),
            vec![
                TargetReport { language: lang("hi"), outcome: success() },
                TargetReport { language: lang("ta"), outcome: failure("boom") },
            ],
            Utc::now(),
        );
        assert_eq!(report.status, DispatchStatus::PartialFailure);
        assert_eq!(report.failure_count(), 1);
        assert!(!report.get("ta").unwrap().is_success());
        assert!(report.get("bn").is_none());
    }

    #[test]
    fn test_report_all_failed() {
        let report = DispatchReport::new(
            Uuid::new_v4(),
            vec![TargetReport { language: lang("hi"), outcome: failure(CANCELLED_REASON) }],
            Utc::now(),
        );
        assert_eq!(report.status, DispatchStatus::AllFailed);
        assert!(report.get("hi").unwrap().is_cancelled());
    }

    #[test]
    fn test_report_json_shape() {
        let report = DispatchReport::new(
            Uuid::new_v4(),
            vec![TargetReport { language: lang("hi"), outcome: failure("boom") }],
            Utc::now(),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "all_failed");
        assert_eq!(json["targets"][0]["language"]["code"], "hi");
        assert_eq!(json["targets"][0]["status"], "failure");
        assert_eq!(json["targets"][0]["reason"], "boom");
        assert!(json["targets"][0].get("fallback").is_none());
    }
}
