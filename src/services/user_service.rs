use crate::{
    database::MongoDB,
    models::{
        ChangePasswordRequest, DonationRecord, DonationRecordRequest, MedicalRecord,
        MedicalRecordRequest, RegisterDonorRequest, Role, UpdateProfileRequest, User, UserProfile,
        DEFAULT_DONATION_ML,
    },
    services::auth_service::{self, Claims},
    utils::{dates, error::AppError, validation},
};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson, Document};
use mongodb::options::ReturnDocument;

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// Builds the `$set` document for a profile update. Role, verification and
/// badges can only be changed by an admin.
pub fn build_profile_update(
    request: &UpdateProfileRequest,
    caller: &Claims,
) -> Result<Document, AppError> {
    if (request.role.is_some() || request.is_verified.is_some() || request.badges.is_some())
        && !caller.is_admin()
    {
        return Err(AppError::Forbidden(
            "Only admins can change role, verification or badges".to_string(),
        ));
    }

    let mut update = doc! {};

    if let Some(name) = &request.name {
        update.insert("name", validation::required(Some(name.as_str()), "Name")?);
    }
    if let Some(phone) = &request.phone {
        update.insert("phone", phone.trim());
    }
    if let Some(city) = &request.city {
        update.insert("city", city.trim());
    }
    if let Some(raw) = &request.blood_group {
        let group = auth_service::parse_blood_group(Some(raw.as_str()))?;
        update.insert("bloodGroup", group.map(|g| g.as_str()));
    }
    if let Some(is_donor) = request.is_donor {
        update.insert("isDonor", is_donor);
    }
    if let Some(needs_blood) = request.needs_blood {
        update.insert("needsBlood", needs_blood);
    }
    if let Some(raw) = &request.needs_blood_group {
        let group = auth_service::parse_blood_group(Some(raw.as_str()))?;
        update.insert("needsBloodGroup", group.map(|g| g.as_str()));
    }
    if let Some(raw) = &request.role {
        let role = raw.parse::<Role>().map_err(AppError::Validation)?;
        update.insert("role", role.as_str());
    }
    if let Some(is_verified) = request.is_verified {
        update.insert("isVerified", is_verified);
    }
    if let Some(badges) = &request.badges {
        update.insert("badges", badges.clone());
    }

    if update.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    update.insert("updatedAt", dates::now_bson());
    Ok(update)
}

pub fn build_medical_record(request: &MedicalRecordRequest) -> Result<MedicalRecord, AppError> {
    let last_donation_date = match validation::optional(request.last_donation_date.as_deref()) {
        Some(raw) => Some(dates::parse_timestamp(&raw)?),
        None => None,
    };

    Ok(MedicalRecord {
        date: dates::now(),
        weight: request.weight,
        blood_pressure: validation::optional(request.blood_pressure.as_deref()),
        hemoglobin: request.hemoglobin,
        last_donation_date,
        eligible_for_donation: request.eligible_for_donation.unwrap_or(true),
        medical_notes: validation::optional(request.medical_notes.as_deref()),
        checkup_by: validation::optional(request.checkup_by.as_deref()),
    })
}

pub fn build_donation_record(request: &DonationRecordRequest) -> Result<DonationRecord, AppError> {
    let date = match validation::optional(request.date.as_deref()) {
        Some(raw) => dates::parse_timestamp(&raw)?,
        None => dates::now(),
    };

    if request.quantity == Some(0) {
        return Err(AppError::Validation("Quantity must be positive".to_string()));
    }

    Ok(DonationRecord {
        date,
        location: validation::optional(request.location.as_deref()),
        blood_group: auth_service::parse_blood_group(request.blood_group.as_deref())?,
        quantity: request.quantity.unwrap_or(DEFAULT_DONATION_ML),
        certificate_id: validation::optional(request.certificate_id.as_deref()),
    })
}

pub async fn get_profile(db: &MongoDB, id: ObjectId) -> Result<UserProfile, AppError> {
    db.users()
        .find_one(doc! { "_id": id })
        .await?
        .map(UserProfile::from)
        .ok_or_else(user_not_found)
}

async fn set_fields(db: &MongoDB, id: ObjectId, update: Document) -> Result<User, AppError> {
    db.users()
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": update })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(user_not_found)
}

pub async fn update_profile(
    db: &MongoDB,
    id: ObjectId,
    request: &UpdateProfileRequest,
    caller: &Claims,
) -> Result<UserProfile, AppError> {
    let update = build_profile_update(request, caller)?;
    set_fields(db, id, update).await.map(UserProfile::from)
}

pub async fn add_medical_record(
    db: &MongoDB,
    id: ObjectId,
    request: &MedicalRecordRequest,
) -> Result<Vec<MedicalRecord>, AppError> {
    let record = build_medical_record(request)?;

    let user = db
        .users()
        .find_one_and_update(
            doc! { "_id": id },
            doc! {
                "$push": { "medicalRecords": to_bson(&record)? },
                "$set": { "updatedAt": dates::now_bson() },
            },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(user.medical_records)
}

/// Appends to the donation history. There is no edit or delete path.
pub async fn add_donation(
    db: &MongoDB,
    id: ObjectId,
    request: &DonationRecordRequest,
) -> Result<Vec<DonationRecord>, AppError> {
    let record = build_donation_record(request)?;

    let user = db
        .users()
        .find_one_and_update(
            doc! { "_id": id },
            doc! {
                "$push": { "donationHistory": to_bson(&record)? },
                "$set": { "updatedAt": dates::now_bson() },
            },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(user.donation_history)
}

pub async fn list_users(db: &MongoDB, filter: Document) -> Result<Vec<UserProfile>, AppError> {
    let users: Vec<User> = db.users().find(filter).await?.try_collect().await?;
    Ok(users.into_iter().map(UserProfile::from).collect())
}

pub async fn list_all(db: &MongoDB) -> Result<Vec<UserProfile>, AppError> {
    list_users(db, doc! {}).await
}

pub async fn list_donors(db: &MongoDB) -> Result<Vec<UserProfile>, AppError> {
    list_users(db, doc! { "isDonor": true }).await
}

pub async fn register_donor(
    db: &MongoDB,
    id: ObjectId,
    request: &RegisterDonorRequest,
) -> Result<UserProfile, AppError> {
    let (blood_group, city) = match (
        auth_service::parse_blood_group(request.blood_group.as_deref())?,
        validation::optional(request.city.as_deref()),
    ) {
        (Some(group), Some(city)) => (group, city),
        _ => {
            return Err(AppError::Validation(
                "Blood group and city are required to become a donor".to_string(),
            ))
        }
    };

    let mut update = doc! {
        "isDonor": true,
        "bloodGroup": blood_group.as_str(),
        "city": city,
        "updatedAt": dates::now_bson(),
    };
    if let Some(phone) = validation::optional(request.phone.as_deref()) {
        update.insert("phone", phone);
    }

    set_fields(db, id, update).await.map(UserProfile::from)
}

pub async fn change_password(
    db: &MongoDB,
    id: ObjectId,
    request: &ChangePasswordRequest,
) -> Result<UserProfile, AppError> {
    let new_password = request.new_password.as_deref().unwrap_or_default();
    let hashed = auth_service::hash_password(new_password)?;

    set_fields(
        db,
        id,
        doc! { "password": hashed, "updatedAt": dates::now_bson() },
    )
    .await
    .map(UserProfile::from)
}

pub async fn delete_user(db: &MongoDB, id: ObjectId) -> Result<(), AppError> {
    let result = db.users().delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(user_not_found());
    }

    // Keep campaign membership consistent with the directory
    let cleanup = db
        .campaigns()
        .update_many(
            doc! { "participants": id },
            vec![
                doc! { "$set": { "participants": { "$setDifference": ["$participants", [id]] } } },
                doc! { "$set": { "registeredDonors": { "$size": "$participants" } } },
            ],
        )
        .await?;

    log::info!(
        "🗑️ User {} deleted, removed from {} campaigns",
        id,
        cleanup.modified_count
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BloodGroup;

    fn claims(role: Role) -> Claims {
        Claims {
            sub: ObjectId::new().to_hex(),
            email: "someone@example.com".into(),
            role,
            iat: 0,
            exp: 0,
            jti: "jti".into(),
            iss: "hemolink".into(),
        }
    }

    #[test]
    fn test_profile_update_sets_given_fields() {
        let request = UpdateProfileRequest {
            city: Some(" Kochi ".into()),
            blood_group: Some("b-".into()),
            is_donor: Some(true),
            ..Default::default()
        };

        let update = build_profile_update(&request, &claims(Role::User)).unwrap();
        assert_eq!(update.get_str("city").unwrap(), "Kochi");
        assert_eq!(update.get_str("bloodGroup").unwrap(), "B-");
        assert!(update.get_bool("isDonor").unwrap());
        assert!(update.get("password").is_none());
        assert!(update.get_str("updatedAt").is_ok());
    }

    #[test]
    fn test_profile_update_admin_fields_need_admin() {
        let request = UpdateProfileRequest {
            role: Some("admin".into()),
            ..Default::default()
        };

        assert!(matches!(
            build_profile_update(&request, &claims(Role::Donor)),
            Err(AppError::Forbidden(_))
        ));

        let update = build_profile_update(&request, &claims(Role::Admin)).unwrap();
        assert_eq!(update.get_str("role").unwrap(), "admin");
    }

    #[test]
    fn test_profile_update_blank_group_clears_it() {
        let request = UpdateProfileRequest {
            needs_blood_group: Some("".into()),
            ..Default::default()
        };
        let update = build_profile_update(&request, &claims(Role::User)).unwrap();
        assert!(update.is_null("needsBloodGroup"));
    }

    #[test]
    fn test_profile_update_requires_something() {
        let err = build_profile_update(&UpdateProfileRequest::default(), &claims(Role::User))
            .unwrap_err();
        assert_eq!(err.message(), "No fields to update");
    }

    #[test]
    fn test_medical_record_defaults_to_eligible() {
        let record = build_medical_record(&MedicalRecordRequest {
            weight: Some(68.5),
            blood_pressure: Some("120/80".into()),
            hemoglobin: Some(14.2),
            last_donation_date: Some("2024-03-20".into()),
            eligible_for_donation: None,
            medical_notes: None,
            checkup_by: Some("Dr. Rao".into()),
        })
        .unwrap();

        assert!(record.eligible_for_donation);
        assert_eq!(record.last_donation_date.map(|d| d.timestamp()), Some(1_710_892_800));
    }

    #[test]
    fn test_donation_record() {
        let record = build_donation_record(&DonationRecordRequest {
            date: Some("2024-01-15".into()),
            location: Some("City Hospital".into()),
            blood_group: Some("O+".into()),
            quantity: None,
            certificate_id: Some("CERT-001".into()),
        })
        .unwrap();

        assert_eq!(record.date.timestamp(), 1_705_276_800);
        assert_eq!(record.quantity, DEFAULT_DONATION_ML);
        assert_eq!(record.blood_group, Some(BloodGroup::OPositive));

        let zero = build_donation_record(&DonationRecordRequest {
            date: None,
            location: None,
            blood_group: None,
            quantity: Some(0),
            certificate_id: None,
        });
        assert!(zero.is_err());
    }
}
