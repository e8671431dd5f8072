use crate::{
    database::MongoDB,
    models::{
        Campaign, CampaignQuery, CampaignStatus, CreateCampaignRequest, ParticipantInfo,
        UpdateCampaignRequest, User, DEFAULT_TARGET_DONORS,
    },
    utils::{dates, error::AppError, validation},
};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document, Regex};
use mongodb::options::ReturnDocument;

/// Escapes regex metacharacters so user input is matched literally.
pub fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn build_list_filter(query: &CampaignQuery) -> Result<Document, AppError> {
    let mut filter = doc! {};

    if let Some(status) = validation::optional(query.status.as_deref()) {
        let status = status
            .parse::<CampaignStatus>()
            .map_err(AppError::Validation)?;
        filter.insert("status", status.as_str());
    }

    if let Some(city) = validation::optional(query.city.as_deref()) {
        filter.insert(
            "city",
            Regex {
                pattern: escape_regex(&city),
                options: "i".to_string(),
            },
        );
    }

    Ok(filter)
}

pub fn build_campaign(request: &CreateCampaignRequest) -> Result<Campaign, AppError> {
    let fields = (
        validation::optional(request.title.as_deref()),
        validation::optional(request.description.as_deref()),
        validation::optional(request.date.as_deref()),
        validation::optional(request.location.as_deref()),
        validation::optional(request.organizer.as_deref()),
        validation::optional(request.email.as_deref()),
        validation::optional(request.city.as_deref()),
    );

    let (title, description, date, location, organizer, email, city) = match fields {
        (Some(t), Some(d), Some(dt), Some(l), Some(o), Some(e), Some(c)) => (t, d, dt, l, o, e, c),
        _ => {
            return Err(AppError::Validation(
                "Please provide all required fields: title, description, date, location, organizer, email, city"
                    .to_string(),
            ))
        }
    };

    let blood_groups_needed = match &request.blood_groups_needed {
        Some(groups) if !groups.is_empty() => groups.clone(),
        _ => vec!["All".to_string()],
    };

    Ok(Campaign {
        id: None,
        title,
        description,
        date: dates::parse_timestamp(&date)?,
        location,
        organizer,
        email,
        phone: validation::optional(request.phone.as_deref()),
        city,
        target_donors: request
            .target_donors
            .filter(|t| *t > 0)
            .unwrap_or(DEFAULT_TARGET_DONORS),
        registered_donors: 0,
        participants: Default::default(),
        status: CampaignStatus::Upcoming,
        blood_groups_needed,
        created_at: dates::now(),
    })
}

/// `$set` document for a field update. Never touches participants or the count.
pub fn build_update_doc(request: &UpdateCampaignRequest) -> Result<Document, AppError> {
    let mut update_doc = doc! {};

    let text_fields = [
        ("title", &request.title),
        ("description", &request.description),
        ("location", &request.location),
        ("organizer", &request.organizer),
        ("email", &request.email),
        ("city", &request.city),
    ];
    for (key, value) in text_fields {
        if let Some(value) = value {
            let value = validation::required(Some(value.as_str()), key)?;
            update_doc.insert(key, value);
        }
    }

    if let Some(phone) = &request.phone {
        update_doc.insert("phone", phone.trim());
    }
    if let Some(date) = &request.date {
        update_doc.insert("date", dates::to_bson(dates::parse_timestamp(date)?));
    }
    if let Some(target) = request.target_donors {
        update_doc.insert("targetDonors", target as i64);
    }
    if let Some(status) = request.status {
        update_doc.insert("status", status.as_str());
    }
    if let Some(groups) = &request.blood_groups_needed {
        update_doc.insert("bloodGroupsNeeded", groups.clone());
    }

    if update_doc.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    Ok(update_doc)
}

pub async fn list_campaigns(db: &MongoDB, query: &CampaignQuery) -> Result<Vec<Campaign>, AppError> {
    let filter = build_list_filter(query)?;

    let campaigns = db
        .campaigns()
        .find(filter)
        .sort(doc! { "createdAt": -1 })
        .await?
        .try_collect()
        .await?;

    Ok(campaigns)
}

pub async fn get_campaign(db: &MongoDB, id: ObjectId) -> Result<Campaign, AppError> {
    db.campaigns()
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))
}

pub async fn create_campaign(
    db: &MongoDB,
    request: &CreateCampaignRequest,
) -> Result<Campaign, AppError> {
    let mut campaign = build_campaign(request)?;

    let result = db.campaigns().insert_one(&campaign).await?;
    campaign.id = result.inserted_id.as_object_id();

    Ok(campaign)
}

pub async fn update_campaign(
    db: &MongoDB,
    id: ObjectId,
    request: &UpdateCampaignRequest,
) -> Result<Campaign, AppError> {
    let update_doc = build_update_doc(request)?;

    db.campaigns()
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": update_doc })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))
}

pub async fn delete_campaign(db: &MongoDB, id: ObjectId) -> Result<(), AppError> {
    let result = db.campaigns().delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Campaign not found".to_string()));
    }
    Ok(())
}

/// Adds `user_id` to the participant set.
///
/// The membership and status checks are repeated inside the update filter,
/// so two concurrent joins for the same user cannot both be applied. The
/// count is recomputed from the set size in the same write.
pub async fn join_campaign(
    db: &MongoDB,
    campaign_id: ObjectId,
    raw_user_id: &str,
) -> Result<Campaign, AppError> {
    // Validate against the current snapshot; the conditional write below decides
    let mut campaign = get_campaign(db, campaign_id).await?;
    let user_id = campaign.admit(raw_user_id)?;

    let closed: Vec<&str> = CampaignStatus::closed().iter().map(|s| s.as_str()).collect();
    let filter = doc! {
        "_id": campaign_id,
        "participants": { "$ne": user_id },
        "status": { "$nin": closed },
    };
    let pipeline = vec![
        doc! { "$set": {
            "participants": { "$setUnion": [ { "$ifNull": ["$participants", []] }, [user_id] ] }
        }},
        doc! { "$set": { "registeredDonors": { "$size": "$participants" } } },
    ];

    let updated = db
        .campaigns()
        .find_one_and_update(filter, pipeline)
        .return_document(ReturnDocument::After)
        .await?;

    match updated {
        Some(campaign) => Ok(campaign),
        None => {
            // Someone changed the document between the read and the write
            let current = get_campaign(db, campaign_id).await?;
            current.ensure_joinable(&user_id)?;
            Err(AppError::Internal(
                "Campaign changed while joining, please retry".to_string(),
            ))
        }
    }
}

pub async fn list_participants(
    db: &MongoDB,
    campaign: &Campaign,
) -> Result<Vec<ParticipantInfo>, AppError> {
    if campaign.participants.is_empty() {
        return Ok(vec![]);
    }

    let ids: Vec<ObjectId> = campaign.participants.iter().copied().collect();
    let users: Vec<User> = db
        .users()
        .find(doc! { "_id": { "$in": ids } })
        .await?
        .try_collect()
        .await?;

    Ok(users.iter().map(ParticipantInfo::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateCampaignRequest {
        CreateCampaignRequest {
            title: Some("Summer Drive".into()),
            description: Some("Give blood, save lives".into()),
            date: Some("2025-06-14".into()),
            location: Some("Civil Hospital".into()),
            organizer: Some("Rotary Club".into()),
            email: Some("rotary@example.org".into()),
            phone: None,
            city: Some("Jaipur".into()),
            target_donors: None,
            blood_groups_needed: None,
        }
    }

    #[test]
    fn test_build_campaign_defaults() {
        let campaign = build_campaign(&create_request()).unwrap();

        assert_eq!(campaign.status, CampaignStatus::Upcoming);
        assert_eq!(campaign.target_donors, DEFAULT_TARGET_DONORS);
        assert_eq!(campaign.registered_donors, 0);
        assert!(campaign.participants.is_empty());
        assert_eq!(campaign.blood_groups_needed, vec!["All".to_string()]);
    }

    #[test]
    fn test_build_campaign_requires_fields() {
        let mut request = create_request();
        request.organizer = None;
        assert!(matches!(
            build_campaign(&request),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_build_campaign_rejects_bad_date() {
        let mut request = create_request();
        request.date = Some("someday".into());
        assert!(build_campaign(&request).is_err());
    }

    #[test]
    fn test_list_filter() {
        let query = CampaignQuery {
            status: Some("Active".into()),
            city: Some("new (york)".into()),
        };
        let filter = build_list_filter(&query).unwrap();

        assert_eq!(filter.get_str("status").unwrap(), "active");
        let regex = match filter.get("city") {
            Some(mongodb::bson::Bson::RegularExpression(regex)) => regex,
            other => panic!("expected regex for city, got {:?}", other),
        };
        assert_eq!(regex.pattern, "new \\(york\\)");
        assert_eq!(regex.options, "i");
    }

    #[test]
    fn test_list_filter_rejects_unknown_status() {
        let query = CampaignQuery {
            status: Some("archived".into()),
            city: None,
        };
        assert!(build_list_filter(&query).is_err());
    }

    #[test]
    fn test_update_doc_only_contains_supplied_fields() {
        let request = UpdateCampaignRequest {
            title: Some("Winter Drive".into()),
            status: Some(CampaignStatus::Cancelled),
            target_donors: Some(80),
            ..Default::default()
        };

        let update = build_update_doc(&request).unwrap();
        assert_eq!(update.len(), 3);
        assert_eq!(update.get_str("status").unwrap(), "cancelled");
        assert_eq!(update.get_i64("targetDonors").unwrap(), 80);
        assert!(update.get("registeredDonors").is_none());
        assert!(update.get("participants").is_none());
    }

    #[test]
    fn test_update_doc_rejects_empty_and_blank() {
        assert!(build_update_doc(&UpdateCampaignRequest::default()).is_err());

        let blank = UpdateCampaignRequest {
            title: Some("   ".into()),
            ..Default::default()
        };
        assert!(build_update_doc(&blank).is_err());
    }

    #[test]
    fn test_escape_regex() {
        assert_eq!(escape_regex("St. Louis"), "St\\. Louis");
        assert_eq!(escape_regex("a+b"), "a\\+b");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_join_twice_against_live_database() {
        dotenv::dotenv().ok();
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db = MongoDB::new(&uri, "hemolink_test").await.unwrap();

        let campaign = create_campaign(&db, &create_request()).await.unwrap();
        let campaign_id = campaign.id.unwrap();
        let user = ObjectId::new().to_hex();

        let joined = join_campaign(&db, campaign_id, &user).await.unwrap();
        assert_eq!(joined.registered_donors, 1);

        let err = join_campaign(&db, campaign_id, &user).await.unwrap_err();
        assert_eq!(err.message(), "You are already registered for this campaign");
        assert_eq!(get_campaign(&db, campaign_id).await.unwrap().registered_donors, 1);

        delete_campaign(&db, campaign_id).await.unwrap();
    }
}
