//! Provider webhook endpoint

use axum::{extract::State, Json};

use agegate_core::types::{ProviderEvent, SessionId, VerificationData};

use crate::dto::{VerificationDataDto, WebhookAck, WebhookEnvelope};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Receive a provider verification event
///
/// The body is taken as raw JSON and decoded by hand so malformed
/// payloads surface as 400 rather than the extractor's 422.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<WebhookAck>> {
    let envelope: WebhookEnvelope = serde_json::from_value(body)
        .map_err(|e| ApiError::Validation(format!("Invalid webhook payload: {}", e)))?;

    let event = parse_event(envelope)?;
    let processed = state.webhooks.process_event(event).await?;

    Ok(Json(WebhookAck {
        success: true,
        message: processed.message,
        status: processed.status,
    }))
}

// Helper functions

fn parse_event(envelope: WebhookEnvelope) -> Result<ProviderEvent, ApiError> {
    let payload = envelope.payload;

    if payload.external_reference_id.is_empty() {
        return Err(ApiError::Validation("Missing session ID".to_string()));
    }

    Ok(ProviderEvent {
        event_type: envelope.event_type,
        identification_id: payload.id,
        session_id: SessionId::new(payload.external_reference_id),
        status: payload.status,
        verification_data: payload.verification_data.map(verification_data_from_dto),
        rejection_reasons: payload.rejection_reasons.unwrap_or_default(),
    })
}

fn verification_data_from_dto(dto: VerificationDataDto) -> VerificationData {
    VerificationData {
        date_of_birth: dto.date_of_birth,
        age: dto.age,
        document_type: dto.document_type,
        document_number: dto.document_number,
        first_name: dto.first_name,
        last_name: dto.last_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(session_id: &str) -> WebhookEnvelope {
        serde_json::from_value(serde_json::json!({
            "EventType": "KycIdentification.Approved",
            "Payload": {
                "Id": "ident-123",
                "ExternalReferenceId": session_id,
                "Status": "Approved",
                "VerificationData": {
                    "DateOfBirth": "1990-05-04",
                    "Age": 35
                },
                "RejectionReasons": null
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_event_maps_fields() {
        let event = parse_event(envelope("abc12345_1700000000000")).unwrap();
        assert_eq!(event.event_type, "KycIdentification.Approved");
        assert_eq!(event.identification_id, "ident-123");
        assert_eq!(event.session_id.as_str(), "abc12345_1700000000000");
        assert_eq!(event.status, "Approved");
        assert_eq!(
            event.verification_data.unwrap().date_of_birth.as_deref(),
            Some("1990-05-04")
        );
        assert!(event.rejection_reasons.is_empty());
    }

    #[test]
    fn test_parse_event_rejects_empty_session() {
        let err = parse_event(envelope("")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg == "Missing session ID"));
    }
}
