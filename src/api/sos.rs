use actix_web::{web, HttpResponse, ResponseError};
use crate::database::MongoDB;
use crate::models::{CreateSosRequest, SosRequestResponse};
use crate::services::notifier::Notifier;
use crate::services::sos_service::{self, SosOutcome};
use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SosResponse {
    pub message: String,
    pub matched_donors: usize,
    pub notified_donors: usize,
    pub failed_donors: usize,
    pub request: SosRequestResponse,
}

impl From<SosOutcome> for SosResponse {
    fn from(outcome: SosOutcome) -> Self {
        let delivered = outcome.report.delivered();
        SosResponse {
            message: format!("SOS request created & alert sent to {} donors", delivered),
            matched_donors: outcome.report.matched(),
            notified_donors: delivered,
            failed_donors: outcome.report.failed(),
            request: SosRequestResponse::from(outcome.request),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/sos",
    tag = "SOS",
    request_body = CreateSosRequest,
    responses(
        (status = 201, description = "Request stored and matching donors alerted", body = SosResponse),
        (status = 400, description = "All fields are required")
    )
)]
pub async fn create_sos(
    db: web::Data<MongoDB>,
    notifier: web::Data<dyn Notifier>,
    request: web::Json<CreateSosRequest>,
) -> HttpResponse {
    log::info!(
        "🚨 POST /api/sos - group: {:?}, city: {:?}",
        request.blood_group,
        request.city
    );

    match sos_service::create_sos(&db, notifier.get_ref(), &request).await {
        Ok(outcome) => {
            let response = SosResponse::from(outcome);
            log::info!(
                "✅ SOS stored: {}/{} alerts delivered",
                response.notified_donors,
                response.matched_donors
            );
            HttpResponse::Created().json(response)
        }
        Err(e) => {
            log::error!("❌ SOS request failed: {}", e);
            e.error_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloodGroup, RequestStatus, SosRequest};
    use crate::services::sos_service::{DeliveryReport, NotificationOutcome};
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn test_response_reports_delivered_not_matched() {
        let outcome = SosOutcome {
            request: SosRequest {
                id: Some(ObjectId::new()),
                requester_name: "Anil".into(),
                email: "anil@example.com".into(),
                phone: None,
                blood_group: BloodGroup::OPositive,
                city: "New York".into(),
                status: RequestStatus::Pending,
                created_at: chrono::Utc::now(),
            },
            report: DeliveryReport {
                outcomes: vec![
                    NotificationOutcome {
                        donor_id: "a".into(),
                        email: "a@example.com".into(),
                        error: None,
                    },
                    NotificationOutcome {
                        donor_id: "b".into(),
                        email: "b@example.com".into(),
                        error: Some("bounced".into()),
                    },
                ],
            },
        };

        let json = serde_json::to_value(SosResponse::from(outcome)).unwrap();
        assert_eq!(json["message"], "SOS request created & alert sent to 1 donors");
        assert_eq!(json["matchedDonors"], 2);
        assert_eq!(json["notifiedDonors"], 1);
        assert_eq!(json["failedDonors"], 1);
        assert_eq!(json["request"]["status"], "pending");
        assert_eq!(json["request"]["bloodGroup"], "O+");
    }
}
