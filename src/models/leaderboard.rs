use crate::models::{BloodGroup, DonationRecord};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Same value as `id`, kept for clients keyed on `_id`
    #[serde(rename = "_id")]
    pub object_id: String,
    pub id: String,
    pub name: String,
    pub blood_group: Option<BloodGroup>,
    pub city: Option<String>,
    pub badges: Vec<String>,
    pub total_donations: usize,
    pub donation_history: Vec<DonationRecord>,
}
