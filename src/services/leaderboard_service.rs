use crate::{
    database::MongoDB,
    models::{LeaderboardEntry, User},
    utils::error::AppError,
};
use futures::TryStreamExt;
use mongodb::bson::doc;

impl From<User> for LeaderboardEntry {
    fn from(user: User) -> Self {
        let id = user.id_hex();
        LeaderboardEntry {
            object_id: id.clone(),
            id,
            total_donations: user.donation_history.len(),
            name: user.name,
            blood_group: user.blood_group,
            city: user.city,
            badges: user.badges,
            donation_history: user.donation_history,
        }
    }
}

/// Orders donors by number of recorded donations, most first. Donors with
/// no donations are kept at the end; ties keep their input order.
pub fn rank_donors(donors: Vec<User>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = donors
        .into_iter()
        .filter(|d| d.is_donor)
        .map(LeaderboardEntry::from)
        .collect();

    entries.sort_by(|a, b| b.total_donations.cmp(&a.total_donations));
    entries
}

pub async fn get_leaderboard(db: &MongoDB) -> Result<Vec<LeaderboardEntry>, AppError> {
    let donors: Vec<User> = db
        .users()
        .find(doc! { "isDonor": true })
        .await?
        .try_collect()
        .await?;

    log::debug!("🏆 Ranking {} donors", donors.len());
    Ok(rank_donors(donors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DonationRecord, Role, DEFAULT_DONATION_ML};
    use mongodb::bson::oid::ObjectId;

    fn donor(name: &str, donations: usize) -> User {
        let history = (0..donations)
            .map(|i| DonationRecord {
                date: chrono::Utc::now() - chrono::Duration::days(i as i64),
                location: None,
                blood_group: None,
                quantity: DEFAULT_DONATION_ML,
                certificate_id: None,
            })
            .collect();

        User {
            id: Some(ObjectId::new()),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password: "$2b$10$hash".into(),
            role: Role::Donor,
            blood_group: None,
            phone: None,
            city: None,
            is_donor: true,
            needs_blood: false,
            needs_blood_group: None,
            medical_records: vec![],
            donation_history: history,
            badges: vec![],
            is_verified: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_more_donations_rank_higher() {
        let ranked = rank_donors(vec![donor("B", 1), donor("A", 3)]);

        assert_eq!(ranked[0].name, "A");
        assert_eq!(ranked[0].total_donations, 3);
        assert_eq!(ranked[1].name, "B");
    }

    #[test]
    fn test_zero_donation_donors_are_listed_last() {
        let ranked = rank_donors(vec![donor("Zero", 0), donor("One", 1)]);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[1].name, "Zero");
        assert_eq!(ranked[1].total_donations, 0);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = rank_donors(vec![donor("First", 2), donor("Second", 2), donor("Third", 2)]);
        let names: Vec<_> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Third"]);
    }

    #[test]
    fn test_non_donors_are_excluded() {
        let mut user = donor("Plain", 4);
        user.is_donor = false;
        assert!(rank_donors(vec![user]).is_empty());
    }

    #[test]
    fn test_entry_wire_shape() {
        let user = donor("A", 2);
        let hex = user.id_hex();
        let json = serde_json::to_value(LeaderboardEntry::from(user)).unwrap();

        assert_eq!(json["_id"], hex);
        assert_eq!(json["id"], hex);
        assert_eq!(json["totalDonations"], 2);
        assert!(json["donationHistory"][0]["date"].is_string());
    }
}
