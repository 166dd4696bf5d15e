//! Webhook event classification
//!
//! Provider webhooks carry a free-form event-type string plus a status
//! string. Classification is two-staged: every event gets an exhaustive
//! [`ProviderVerdict`], and only decided verdicts map to a terminal
//! [`VerificationOutcome`] for the attempt. In-flight and unrecognized
//! events must never finalize a pending attempt.

use serde::{Deserialize, Serialize};

use crate::types::{AgeVerificationStatus, AttemptStatus, ProviderEvent};

/// Exhaustive classification of a provider webhook event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderVerdict {
    Approved,
    Rejected,
    /// The provider reports the check still in flight
    Pending,
    /// Unrecognized event-type/status pairing
    Unknown,
}

impl ProviderVerdict {
    /// Classify a provider event. Approval and rejection can arrive either
    /// through the event-type string or the payload status; approval is
    /// checked first.
    pub fn classify(event: &ProviderEvent) -> Self {
        if event.event_type.contains("Approved") || event.status == "Approved" {
            return Self::Approved;
        }
        if event.event_type.contains("Rejected") || event.status == "Rejected" {
            return Self::Rejected;
        }
        match event.status.as_str() {
            "Pending" | "Awaiting" | "Processing" => Self::Pending,
            _ => Self::Unknown,
        }
    }

    /// Terminal outcome for this verdict, if it decides the attempt.
    pub fn outcome(&self) -> Option<VerificationOutcome> {
        match self {
            Self::Approved => Some(VerificationOutcome::Completed),
            Self::Rejected => Some(VerificationOutcome::Failed),
            Self::Pending | Self::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProviderVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final classification of a decided identity check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Completed,
    Failed,
}

impl VerificationOutcome {
    /// Attempt status this outcome finalizes to.
    pub fn attempt_status(&self) -> AttemptStatus {
        match self {
            Self::Completed => AttemptStatus::Completed,
            Self::Failed => AttemptStatus::Failed,
        }
    }

    /// Profile verification status this outcome records.
    pub fn verification_status(&self) -> AgeVerificationStatus {
        match self {
            Self::Completed => AgeVerificationStatus::Verified,
            Self::Failed => AgeVerificationStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
