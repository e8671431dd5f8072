use crate::utils::{error::AppError, validation};
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const DEFAULT_TARGET_DONORS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Upcoming => "upcoming",
            CampaignStatus::Active => "active",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled campaigns no longer take registrations.
    pub fn accepts_participants(&self) -> bool {
        matches!(self, CampaignStatus::Upcoming | CampaignStatus::Active)
    }

    pub fn closed() -> [CampaignStatus; 2] {
        [CampaignStatus::Completed, CampaignStatus::Cancelled]
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Ok(CampaignStatus::Upcoming),
            "active" => Ok(CampaignStatus::Active),
            "completed" => Ok(CampaignStatus::Completed),
            "cancelled" => Ok(CampaignStatus::Cancelled),
            other => Err(format!("Invalid campaign status: {}", other)),
        }
    }
}

/// Campaign document (`campaigns` collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    /// Event date
    pub date: DateTime<Utc>,
    pub location: String,
    pub organizer: String,
    /// Organizer contact email
    pub email: String,
    pub phone: Option<String>,
    pub city: String,
    /// Informational only, never enforced on join
    #[serde(default = "default_target")]
    pub target_donors: u32,
    /// Denormalized `participants.len()`
    #[serde(default)]
    pub registered_donors: u32,
    #[serde(default)]
    pub participants: BTreeSet<ObjectId>,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub blood_groups_needed: Vec<String>,
    pub created_at: DateTime<Utc>,
}

fn default_target() -> u32 {
    DEFAULT_TARGET_DONORS
}

impl Campaign {
    pub fn is_participant(&self, user_id: &ObjectId) -> bool {
        self.participants.contains(user_id)
    }

    pub fn ensure_open(&self) -> Result<(), AppError> {
        if self.status.accepts_participants() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Cannot join campaign. Campaign is {}.",
                self.status
            )))
        }
    }

    /// Checks whether `user_id` may join without mutating anything.
    pub fn ensure_joinable(&self, user_id: &ObjectId) -> Result<(), AppError> {
        self.ensure_open()?;

        if self.is_participant(user_id) {
            return Err(AppError::Validation(
                "You are already registered for this campaign".to_string(),
            ));
        }

        Ok(())
    }

    /// Adds the user and resyncs `registered_donors` with the set size.
    pub fn join(&mut self, user_id: ObjectId) -> Result<(), AppError> {
        self.ensure_joinable(&user_id)?;
        self.participants.insert(user_id);
        self.registered_donors = self.participants.len() as u32;
        Ok(())
    }

    /// Join with a raw user id: a closed campaign is reported before a
    /// malformed id, a malformed id before a duplicate.
    pub fn admit(&mut self, raw_user_id: &str) -> Result<ObjectId, AppError> {
        self.ensure_open()?;
        let user_id = validation::parse_object_id(raw_user_id, "user ID format")?;
        self.join(user_id)?;
        Ok(user_id)
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResponse {
    /// Same value as `id`, under the key the web client indexes by
    #[serde(rename = "_id")]
    pub object_id: String,
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub organizer: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: String,
    pub target_donors: u32,
    pub registered_donors: u32,
    pub participants: Vec<String>,
    pub status: CampaignStatus,
    pub blood_groups_needed: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Campaign> for CampaignResponse {
    fn from(campaign: Campaign) -> Self {
        let id = campaign.id.map(|id| id.to_hex()).unwrap_or_default();
        CampaignResponse {
            object_id: id.clone(),
            id,
            title: campaign.title,
            description: campaign.description,
            date: campaign.date,
            location: campaign.location,
            organizer: campaign.organizer,
            email: campaign.email,
            phone: campaign.phone,
            city: campaign.city,
            target_donors: campaign.target_donors,
            registered_donors: campaign.registered_donors,
            participants: campaign.participants.iter().map(|p| p.to_hex()).collect(),
            status: campaign.status,
            blood_groups_needed: campaign.blood_groups_needed,
            created_at: campaign.created_at,
        }
    }
}

/// Short form returned after a successful join.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinSummary {
    #[serde(rename = "_id")]
    pub object_id: String,
    pub id: String,
    pub title: String,
    pub registered_donors: u32,
    pub target_donors: u32,
}

impl From<&Campaign> for JoinSummary {
    fn from(campaign: &Campaign) -> Self {
        let id = campaign.id.map(|id| id.to_hex()).unwrap_or_default();
        JoinSummary {
            object_id: id.clone(),
            id,
            title: campaign.title.clone(),
            registered_donors: campaign.registered_donors,
            target_donors: campaign.target_donors,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// RFC 3339 or `YYYY-MM-DD`
    pub date: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub target_donors: Option<u32>,
    pub blood_groups_needed: Option<Vec<String>>,
}

/// Field updates. Participants and the registered count are only changed by joins.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub target_donors: Option<u32>,
    pub status: Option<CampaignStatus>,
    pub blood_groups_needed: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinCampaignRequest {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CampaignQuery {
    pub status: Option<String>,
    pub city: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(status: CampaignStatus, target: u32) -> Campaign {
        Campaign {
            id: Some(ObjectId::new()),
            title: "City Blood Drive".into(),
            description: "Annual drive".into(),
            date: "2024-06-01T00:00:00Z".parse().unwrap(),
            location: "Town Hall".into(),
            organizer: "Red Cross".into(),
            email: "drive@example.org".into(),
            phone: None,
            city: "Pune".into(),
            target_donors: target,
            registered_donors: 0,
            participants: BTreeSet::new(),
            status,
            blood_groups_needed: vec!["All".into()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_join_adds_participant_and_syncs_count() {
        let mut c = campaign(CampaignStatus::Upcoming, 50);
        c.join(ObjectId::new()).unwrap();
        c.join(ObjectId::new()).unwrap();

        assert_eq!(c.participants.len(), 2);
        assert_eq!(c.registered_donors, 2);
    }

    #[test]
    fn test_duplicate_join_fails_and_count_is_unchanged() {
        let mut c = campaign(CampaignStatus::Active, 50);
        let user = ObjectId::new();

        c.join(user).unwrap();
        let err = c.join(user).unwrap_err();

        assert_eq!(err.message(), "You are already registered for this campaign");
        assert_eq!(c.registered_donors, 1);
        assert_eq!(c.participants.len(), 1);
    }

    #[test]
    fn test_closed_campaigns_reject_joins_regardless_of_capacity() {
        for status in CampaignStatus::closed() {
            let mut c = campaign(status, 1_000);
            let err = c.join(ObjectId::new()).unwrap_err();
            assert_eq!(
                err.message(),
                format!("Cannot join campaign. Campaign is {}.", status)
            );
            assert_eq!(c.registered_donors, 0);
        }
    }

    #[test]
    fn test_target_is_not_a_cap() {
        let mut c = campaign(CampaignStatus::Active, 1);
        c.join(ObjectId::new()).unwrap();
        c.join(ObjectId::new()).unwrap();
        assert_eq!(c.registered_donors, 2);
    }

    #[test]
    fn test_missing_participants_field_defaults_to_empty() {
        let c: Campaign = serde_json::from_value(serde_json::json!({
            "title": "t", "description": "d", "date": "2024-06-01T00:00:00Z", "location": "l",
            "organizer": "o", "email": "e@x.org", "city": "c", "createdAt": "2024-05-01T00:00:00Z"
        }))
        .unwrap();

        assert!(c.participants.is_empty());
        assert_eq!(c.target_donors, DEFAULT_TARGET_DONORS);
        assert_eq!(c.status, CampaignStatus::Upcoming);
    }

    #[test]
    fn test_response_dates_are_rfc3339_and_ids_are_duplicated() {
        let c = campaign(CampaignStatus::Upcoming, 50);
        let hex = c.id.unwrap().to_hex();
        let json = serde_json::to_value(CampaignResponse::from(c)).unwrap();

        assert_eq!(json["date"], "2024-06-01T00:00:00Z");
        assert!(json["createdAt"].is_string());
        assert_eq!(json["_id"], hex);
        assert_eq!(json["id"], hex);
    }

    #[test]
    fn test_admit_reports_closed_status_before_bad_user_id() {
        let mut closed = campaign(CampaignStatus::Cancelled, 50);
        assert_eq!(
            closed.admit("not-an-id").unwrap_err().message(),
            "Cannot join campaign. Campaign is cancelled."
        );

        let mut open = campaign(CampaignStatus::Active, 50);
        assert_eq!(
            open.admit("not-an-id").unwrap_err().message(),
            "Invalid user ID format"
        );

        let user = ObjectId::new();
        assert_eq!(open.admit(&user.to_hex()).unwrap(), user);
        assert_eq!(
            open.admit(&user.to_hex()).unwrap_err().message(),
            "You are already registered for this campaign"
        );
        assert_eq!(open.registered_donors, 1);
    }
}
