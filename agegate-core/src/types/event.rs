//! Inbound provider event types

use serde::{Deserialize, Serialize};

use super::attempt::SessionId;

/// Identity data the provider reports alongside a decided verification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationData {
    pub date_of_birth: Option<String>,
    pub age: Option<u32>,
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A provider webhook event after schema validation
///
/// The wire shape (PascalCase envelope) lives in the API layer; this is
/// the validated internal form the pipeline operates on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEvent {
    /// Provider event-type string, e.g. "KycIdentification.Approved"
    pub event_type: String,
    /// Provider-assigned identification id
    pub identification_id: String,
    /// External reference id, which carries our session id
    pub session_id: SessionId,
    /// Raw provider status string
    pub status: String,
    pub verification_data: Option<VerificationData>,
    pub rejection_reasons: Vec<String>,
}
