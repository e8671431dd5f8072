use crate::database::MongoDB;
use crate::models::{BloodGroup, DonationRecord, Role, User, DEFAULT_DONATION_ML};
use crate::services::auth_service;
use crate::utils::dates;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson};

const DEMO_PASSWORD: &str = "password123";

/// (name, email, group, city, phone)
const DEMO_DONORS: [(&str, &str, BloodGroup, &str, &str); 8] = [
    ("John Smith", "john.smith@example.com", BloodGroup::OPositive, "New York", "1234567890"),
    ("Sarah Johnson", "sarah.j@example.com", BloodGroup::ANegative, "Los Angeles", "1234567891"),
    ("Michael Brown", "michael.b@example.com", BloodGroup::BPositive, "Chicago", "1234567892"),
    ("Emily Davis", "emily.d@example.com", BloodGroup::ABPositive, "Houston", "1234567893"),
    ("David Wilson", "david.w@example.com", BloodGroup::ONegative, "Miami", "1234567894"),
    ("Lisa Anderson", "lisa.a@example.com", BloodGroup::APositive, "Seattle", "1234567895"),
    ("Robert Taylor", "robert.t@example.com", BloodGroup::BNegative, "Boston", "1234567896"),
    ("Jessica Martinez", "jessica.m@example.com", BloodGroup::ABNegative, "San Francisco", "1234567897"),
];

/// (Unix seconds, location, certificate)
const SAMPLE_DONATIONS: [(i64, &str, &str); 5] = [
    (1_705_276_800, "City Hospital", "CERT-001"),
    (1_710_892_800, "General Hospital", "CERT-002"),
    (1_717_977_600, "Memorial Hospital", "CERT-003"),
    (1_725_494_400, "Community Hospital", "CERT-004"),
    (1_730_419_200, "Central Hospital", "CERT-005"),
];

fn demo_user(
    (name, email, group, city, phone): (&str, &str, BloodGroup, &str, &str),
    password_hash: &str,
    now: DateTime<Utc>,
) -> User {
    User {
        id: None,
        name: name.to_string(),
        email: email.to_string(),
        password: password_hash.to_string(),
        role: Role::Donor,
        blood_group: Some(group),
        phone: Some(phone.to_string()),
        city: Some(city.to_string()),
        is_donor: true,
        needs_blood: false,
        needs_blood_group: None,
        medical_records: vec![],
        donation_history: vec![],
        badges: vec![],
        is_verified: false,
        created_at: now,
        updated_at: now,
    }
}

/// Gives the n-th donor between one and five sample donations in their own group.
pub fn sample_history(index: usize, group: Option<BloodGroup>) -> Vec<DonationRecord> {
    let count = index % SAMPLE_DONATIONS.len() + 1;
    SAMPLE_DONATIONS
        .iter()
        .take(count)
        .map(|(date, location, certificate)| DonationRecord {
            date: DateTime::from_timestamp(*date, 0).unwrap_or_default(),
            location: Some(location.to_string()),
            blood_group: group.or(Some(BloodGroup::OPositive)),
            quantity: DEFAULT_DONATION_ML,
            certificate_id: Some(certificate.to_string()),
        })
        .collect()
}

/// Donors with an empty donation history. A document that fails to decode
/// is an error for the whole batch.
pub async fn donors_without_history(db: &MongoDB) -> Result<Vec<User>, mongodb::error::Error> {
    db.users()
        .find(doc! { "isDonor": true, "donationHistory.0": { "$exists": false } })
        .await?
        .try_collect()
        .await
}

/// Inserts the demo donors that are missing, then backfills donation
/// history for donors that have none. Failures are logged, never fatal.
pub async fn seed_demo_donors(db: &MongoDB) {
    log::info!("🌱 Seeding demo donors...");

    let password_hash = match auth_service::hash_password(DEMO_PASSWORD) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("   ❌ Could not hash demo password: {}", e);
            return;
        }
    };

    let users = db.users();
    let now = dates::now();
    let mut created = 0;

    for donor in DEMO_DONORS {
        match users.find_one(doc! { "email": donor.1 }).await {
            Ok(Some(_)) => log::debug!("   ⏭️  {} already exists", donor.0),
            Ok(None) => match users.insert_one(demo_user(donor, &password_hash, now)).await {
                Ok(_) => created += 1,
                Err(e) => log::error!("   ❌ Failed to insert {}: {}", donor.0, e),
            },
            Err(e) => {
                log::error!("   ❌ Demo donor lookup failed: {}", e);
                return;
            }
        }
    }
    log::info!("   ✅ Created {} demo donors", created);

    let without_history = match donors_without_history(db).await {
        Ok(donors) => donors,
        Err(e) => {
            log::error!("   ❌ Failed to load donors for history backfill: {}", e);
            return;
        }
    };

    let mut updated = 0;
    for (index, donor) in without_history.iter().enumerate() {
        let Some(id) = donor.id else { continue };
        let history = match to_bson(&sample_history(index, donor.blood_group)) {
            Ok(history) => history,
            Err(e) => {
                log::error!("   ❌ Failed to encode history: {}", e);
                continue;
            }
        };

        match users
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "donationHistory": history, "updatedAt": dates::to_bson(now) } },
            )
            .await
        {
            Ok(_) => updated += 1,
            Err(e) => log::error!("   ❌ Failed to add history for {}: {}", donor.name, e),
        }
    }
    log::info!("   ✅ Added donation history to {} donors", updated);
}
