//! Photo reporting.
//!
//! A report is a bounded set of reason flags mapped to one canonical reason
//! string, submitted exactly once through the submission flow.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::flow::{SubmissionRequest, Submitter};
use crate::services::{RemoteError, ReportService};

pub(crate) mod cli;

/// Shown when a report is filed with no specific flag set.
pub const DEFAULT_REASON: &str = "Inappropriate content";

const REASON_DELIMITER: &str = ", ";

/// The selectable report reasons, in the order they appear in the reason
/// string. This order is part of the wire contract with the review queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonFlag {
    SexualContent,
    Violence,
    Harassment,
    Spam,
}

impl ReasonFlag {
    pub const ALL: [ReasonFlag; 4] = [
        ReasonFlag::SexualContent,
        ReasonFlag::Violence,
        ReasonFlag::Harassment,
        ReasonFlag::Spam,
    ];

    /// The canonical human-readable reason for this flag.
    pub fn label(self) -> &'static str {
        match self {
            ReasonFlag::SexualContent => "Sexual content",
            ReasonFlag::Violence => "Violence or harm",
            ReasonFlag::Harassment => "Harassment or bullying",
            ReasonFlag::Spam => "Spam or scam",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            ReasonFlag::SexualContent => "Nudity or sexually explicit material.",
            ReasonFlag::Violence => "Graphic violence, self-harm, or threats.",
            ReasonFlag::Harassment => "Targets or demeans a person or group.",
            ReasonFlag::Spam => "Ads, scams, or repetitive junk.",
        }
    }
}

/// Which reasons the reporter ticked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonFlags {
    #[serde(default)]
    pub sexual_content: bool,
    #[serde(default)]
    pub violence: bool,
    #[serde(default)]
    pub harassment: bool,
    #[serde(default)]
    pub spam: bool,
}

impl ReasonFlags {
    pub fn is_set(&self, flag: ReasonFlag) -> bool {
        match flag {
            ReasonFlag::SexualContent => self.sexual_content,
            ReasonFlag::Violence => self.violence,
            ReasonFlag::Harassment => self.harassment,
            ReasonFlag::Spam => self.spam,
        }
    }

    /// Flip one flag, returning its new value.
    pub fn toggle(&mut self, flag: ReasonFlag) -> bool {
        let slot = match flag {
            ReasonFlag::SexualContent => &mut self.sexual_content,
            ReasonFlag::Violence => &mut self.violence,
            ReasonFlag::Harassment => &mut self.harassment,
            ReasonFlag::Spam => &mut self.spam,
        };
        *slot = !*slot;
        *slot
    }

    pub fn any(&self) -> bool {
        ReasonFlag::ALL.iter().any(|flag| self.is_set(*flag))
    }

    /// Canonical reason string: the labels of the set flags in declared
    /// order, comma-joined, or the default when nothing is set. Pure.
    pub fn reason_string(&self) -> String {
        let active: Vec<&str> = ReasonFlag::ALL
            .iter()
            .filter(|flag| self.is_set(**flag))
            .map(|flag| flag.label())
            .collect();
        if active.is_empty() {
            DEFAULT_REASON.to_string()
        } else {
            active.join(REASON_DELIMITER)
        }
    }
}

/// A photo report as entered by the user, before it becomes a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSubmission {
    pub image_url: String,
    pub subject_user_id: String,
    pub reporter_id: String,
    pub flags: ReasonFlags,
}

impl ReportSubmission {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let url = self.image_url.trim();
        if url.is_empty() {
            errors.push("Image URL is required".to_string());
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push("Image URL must start with http:// or https://".to_string());
        }
        if self.subject_user_id.trim().is_empty() {
            errors.push("Subject user ID is required".to_string());
        }
        if self.reporter_id.trim().is_empty() {
            errors.push("Reporter ID is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Build the immutable flow request for this report.
    pub fn to_request(&self, idempotency_key: &str) -> SubmissionRequest {
        let payload = ReportPayload {
            image_url: self.image_url.clone(),
            reason: self.flags.reason_string(),
        };
        SubmissionRequest::new(
            self.subject_user_id.clone(),
            self.reporter_id.clone(),
            serde_json::to_value(&payload).unwrap_or(serde_json::Value::Null),
            idempotency_key,
        )
    }
}

/// What the report submitter needs from the request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPayload {
    pub image_url: String,
    pub reason: String,
}

/// Sends a report request through the report service.
pub struct ReportSubmitter {
    service: Arc<dyn ReportService>,
}

impl ReportSubmitter {
    pub fn new(service: Arc<dyn ReportService>) -> Self {
        ReportSubmitter { service }
    }
}

#[async_trait]
impl Submitter for ReportSubmitter {
    async fn submit(&self, request: &SubmissionRequest) -> Result<(), RemoteError> {
        let payload: ReportPayload = serde_json::from_value(request.payload.clone())
            .map_err(|err| RemoteError::Payload(err.to_string()))?;

        let accepted = self
            .service
            .report_photo(
                &payload.image_url,
                &request.subject_id,
                &payload.reason,
                &request.idempotency_key,
            )
            .await?;

        if accepted {
            Ok(())
        } else {
            Err(RemoteError::Rejected(
                "the report was not accepted for review".to_string(),
            ))
        }
    }
}
