use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ABO/Rh blood group, serialized as `"O+"`, `"AB-"` etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
    #[serde(rename = "AB+")]
    ABPositive,
    #[serde(rename = "AB-")]
    ABNegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
        BloodGroup::ABPositive,
        BloodGroup::ABNegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
            BloodGroup::ABPositive => "AB+",
            BloodGroup::ABNegative => "AB-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        BloodGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == normalized)
            .ok_or_else(|| format!("Invalid blood group: {}", s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Donor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Donor => "donor",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "donor" => Ok(Role::Donor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

/// Health checkup entered by an admin.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub date: DateTime<Utc>,
    pub weight: Option<f64>,
    pub blood_pressure: Option<String>,
    pub hemoglobin: Option<f64>,
    pub last_donation_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub eligible_for_donation: bool,
    pub medical_notes: Option<String>,
    pub checkup_by: Option<String>,
}

/// One past donation. Entries are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub blood_group: Option<BloodGroup>,
    /// Millilitres
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub certificate_id: Option<String>,
}

pub const DEFAULT_DONATION_ML: u32 = 450;

fn default_true() -> bool {
    true
}

fn default_quantity() -> u32 {
    DEFAULT_DONATION_ML
}

/// User document as stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    /// Always stored lowercase
    pub email: String,
    /// bcrypt hash
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub blood_group: Option<BloodGroup>,
    pub phone: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub is_donor: bool,
    #[serde(default)]
    pub needs_blood: bool,
    pub needs_blood_group: Option<BloodGroup>,
    #[serde(default)]
    pub medical_records: Vec<MedicalRecord>,
    #[serde(default)]
    pub donation_history: Vec<DonationRecord>,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

/// Public view of a user (never includes the password hash).
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub blood_group: Option<BloodGroup>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub is_donor: bool,
    pub needs_blood: bool,
    pub needs_blood_group: Option<BloodGroup>,
    pub medical_records: Vec<MedicalRecord>,
    pub donation_history: Vec<DonationRecord>,
    pub badges: Vec<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id_hex(),
            name: user.name,
            email: user.email,
            role: user.role,
            blood_group: user.blood_group,
            phone: user.phone,
            city: user.city,
            is_donor: user.is_donor,
            needs_blood: user.needs_blood,
            needs_blood_group: user.needs_blood_group,
            medical_records: user.medical_records,
            donation_history: user.donation_history,
            badges: user.badges,
            is_verified: user.is_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Participant summary used by campaign listings.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub blood_group: Option<BloodGroup>,
    pub city: Option<String>,
}

impl From<&User> for ParticipantInfo {
    fn from(user: &User) -> Self {
        ParticipantInfo {
            id: user.id_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
            blood_group: user.blood_group,
            city: user.city.clone(),
        }
    }
}

/// `PUT /api/auth/profile/{id}`. Password changes go through their own route.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub blood_group: Option<String>,
    pub is_donor: Option<bool>,
    pub needs_blood: Option<bool>,
    pub needs_blood_group: Option<String>,
    /// Admin only
    pub role: Option<String>,
    /// Admin only
    pub is_verified: Option<bool>,
    /// Admin only
    pub badges: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecordRequest {
    pub weight: Option<f64>,
    pub blood_pressure: Option<String>,
    pub hemoglobin: Option<f64>,
    /// RFC 3339 or `YYYY-MM-DD`
    pub last_donation_date: Option<String>,
    pub eligible_for_donation: Option<bool>,
    pub medical_notes: Option<String>,
    pub checkup_by: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecordRequest {
    /// Defaults to now
    pub date: Option<String>,
    pub location: Option<String>,
    pub blood_group: Option<String>,
    pub quantity: Option<u32>,
    pub certificate_id: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDonorRequest {
    pub blood_group: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub new_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blood_group_parsing_is_case_insensitive() {
        assert_eq!("ab-".parse::<BloodGroup>().unwrap(), BloodGroup::ABNegative);
        assert_eq!(" O+ ".parse::<BloodGroup>().unwrap(), BloodGroup::OPositive);
        assert!("C+".parse::<BloodGroup>().is_err());
        assert!("".parse::<BloodGroup>().is_err());
    }

    #[test]
    fn test_blood_group_wire_format() {
        let json = serde_json::to_string(&BloodGroup::ABPositive).unwrap();
        assert_eq!(json, "\"AB+\"");
    }

    #[test]
    fn test_user_document_defaults() {
        // Documents written before the history/badge fields existed still load
        let user: User = serde_json::from_value(serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "password": "$2b$10$hash",
            "bloodGroup": "B+",
            "createdAt": "2024-01-15T00:00:00Z",
            "updatedAt": "2024-01-15T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(user.role, Role::User);
        assert!(!user.is_donor);
        assert!(user.donation_history.is_empty());
        assert_eq!(user.blood_group, Some(BloodGroup::BPositive));
    }

    #[test]
    fn test_profile_hides_password() {
        let user = User {
            id: Some(ObjectId::new()),
            name: "Ravi".into(),
            email: "ravi@example.com".into(),
            password: "$2b$10$secret".into(),
            role: Role::Donor,
            blood_group: None,
            phone: None,
            city: None,
            is_donor: true,
            needs_blood: false,
            needs_blood_group: None,
            medical_records: vec![],
            donation_history: vec![],
            badges: vec![],
            is_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "donor");
        assert_eq!(json["isDonor"], true);
    }

    #[test]
    fn test_donation_quantity_default() {
        let record: DonationRecord =
            serde_json::from_value(serde_json::json!({ "date": "2024-01-15T00:00:00Z" })).unwrap();
        assert_eq!(record.quantity, DEFAULT_DONATION_ML);
    }
}
