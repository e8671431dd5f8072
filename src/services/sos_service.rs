use crate::{
    database::MongoDB,
    models::{BloodGroup, CreateSosRequest, RequestStatus, SosRequest, User},
    services::notifier::{EmailMessage, Notifier},
    utils::{dates, error::AppError, validation},
};
use futures::future::join_all;
use futures::TryStreamExt;
use mongodb::bson::doc;

/// Result of sending one alert.
#[derive(Debug, Clone)]
pub struct NotificationOutcome {
    pub donor_id: String,
    pub email: String,
    pub error: Option<String>,
}

impl NotificationOutcome {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-recipient outcomes of one SOS fan-out.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub outcomes: Vec<NotificationOutcome>,
}

impl DeliveryReport {
    pub fn matched(&self) -> usize {
        self.outcomes.len()
    }

    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.delivered()).count()
    }

    pub fn failed(&self) -> usize {
        self.matched() - self.delivered()
    }
}

#[derive(Debug)]
pub struct SosOutcome {
    pub request: SosRequest,
    pub report: DeliveryReport,
}

/// Exact group match (no cross-group compatibility) and a case-insensitive
/// substring match on city.
pub fn matches_donor(donor: &User, blood_group: BloodGroup, city: &str) -> bool {
    if !donor.is_donor || donor.blood_group != Some(blood_group) {
        return false;
    }

    let needle = city.trim().to_lowercase();
    donor
        .city
        .as_deref()
        .map(|c| c.to_lowercase().contains(&needle))
        .unwrap_or(false)
}

pub fn validate(input: &CreateSosRequest) -> Result<SosRequest, AppError> {
    let fields = (
        validation::optional(input.requester_name.as_deref()),
        validation::optional(input.email.as_deref()),
        validation::optional(input.blood_group.as_deref()),
        validation::optional(input.city.as_deref()),
    );

    let (requester_name, email, blood_group, city) = match fields {
        (Some(name), Some(email), Some(group), Some(city)) => (name, email, group, city),
        _ => return Err(AppError::Validation("All fields are required".to_string())),
    };

    let blood_group = blood_group
        .parse::<BloodGroup>()
        .map_err(AppError::Validation)?;

    Ok(SosRequest {
        id: None,
        requester_name,
        email,
        phone: validation::optional(input.phone.as_deref()),
        blood_group,
        city,
        status: RequestStatus::Pending,
        created_at: dates::now(),
    })
}

pub fn alert_email(request: &SosRequest, donor: &User) -> EmailMessage {
    let contact = match &request.phone {
        Some(phone) => format!("{} or {}", request.email, phone),
        None => request.email.clone(),
    };

    EmailMessage {
        to: donor.email.clone(),
        subject: format!(
            "Urgent Blood Donation Request - {} needed in {}",
            request.blood_group, request.city
        ),
        text: format!(
            "Hello {},\n\n\
             {} urgently needs {} blood in {}.\n\
             If you can help, please contact {} at {}.\n\n\
             Thank you for being a donor!\n\n\
             Best regards,\n\
             HemoLink Team",
            donor.name,
            request.requester_name,
            request.blood_group,
            request.city,
            request.requester_name,
            contact
        ),
    }
}

/// Sends every alert concurrently and waits for all of them. A failed send
/// is recorded in the report and never aborts the batch.
pub async fn notify_donors(
    notifier: &dyn Notifier,
    request: &SosRequest,
    donors: &[User],
) -> DeliveryReport {
    let sends = donors.iter().map(|donor| async move {
        let message = alert_email(request, donor);
        let outcome = NotificationOutcome {
            donor_id: donor.id_hex(),
            email: donor.email.clone(),
            error: notifier.send(&message).await.err().map(|e| e.to_string()),
        };

        if let Some(error) = &outcome.error {
            log::warn!(
                "⚠️  SOS alert to donor {} <{}> failed: {}",
                outcome.donor_id,
                outcome.email,
                error
            );
        }
        outcome
    });

    DeliveryReport {
        outcomes: join_all(sends).await,
    }
}

pub async fn find_matching_donors(
    db: &MongoDB,
    blood_group: BloodGroup,
    city: &str,
) -> Result<Vec<User>, AppError> {
    // Group narrows on the index; the city predicate stays in Rust
    let donors: Vec<User> = db
        .users()
        .find(doc! { "isDonor": true, "bloodGroup": blood_group.as_str() })
        .await?
        .try_collect()
        .await?;

    Ok(donors
        .into_iter()
        .filter(|d| matches_donor(d, blood_group, city))
        .collect())
}

/// Persists the request (even with zero matches), then alerts matching donors.
pub async fn create_sos(
    db: &MongoDB,
    notifier: &dyn Notifier,
    input: &CreateSosRequest,
) -> Result<SosOutcome, AppError> {
    let mut request = validate(input)?;

    let result = db.requests().insert_one(&request).await?;
    request.id = result.inserted_id.as_object_id();

    let donors = find_matching_donors(db, request.blood_group, &request.city).await?;
    log::info!(
        "🩸 SOS {} in {}: {} matching donors",
        request.blood_group,
        request.city,
        donors.len()
    );

    let report = notify_donors(notifier, &request, &donors).await;

    Ok(SosOutcome { request, report })
}
