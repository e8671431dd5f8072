use crate::models::BloodGroup;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
}

/// Emergency request (`requests` collection). Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub requester_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub blood_group: BloodGroup,
    pub city: String,
    #[serde(default)]
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSosRequest {
    pub requester_name: Option<String>,
    pub email: Option<String>,
    pub blood_group: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SosRequestResponse {
    pub id: String,
    pub requester_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub blood_group: BloodGroup,
    pub city: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl From<SosRequest> for SosRequestResponse {
    fn from(request: SosRequest) -> Self {
        SosRequestResponse {
            id: request.id.map(|id| id.to_hex()).unwrap_or_default(),
            requester_name: request.requester_name,
            email: request.email,
            phone: request.phone,
            blood_group: request.blood_group,
            city: request.city,
            status: request.status,
            created_at: request.created_at,
        }
    }
}
