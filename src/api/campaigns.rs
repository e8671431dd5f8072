use actix_web::{delete, get, post, put, web, HttpResponse, ResponseError};
use crate::database::MongoDB;
use crate::models::{
    CampaignQuery, CampaignResponse, CreateCampaignRequest, JoinCampaignRequest, JoinSummary,
    UpdateCampaignRequest,
};
use crate::services::auth_service::Claims;
use crate::services::campaign_service;
use crate::utils::{validation, AppError};
use mongodb::bson::oid::ObjectId;

fn campaign_id(path: &web::Path<String>) -> Result<ObjectId, AppError> {
    validation::parse_object_id(path.as_str(), "campaign ID")
}

/// GET /api/campaigns - newest first, optional `status` and `city` filters
#[utoipa::path(
    get,
    path = "/api/campaigns",
    tag = "Campaigns",
    params(
        ("status" = Option<String>, Query, description = "upcoming | active | completed | cancelled"),
        ("city" = Option<String>, Query, description = "Case-insensitive substring")
    ),
    responses((status = 200, description = "Campaigns", body = [CampaignResponse]))
)]
#[get("")]
pub async fn list_campaigns(
    db: web::Data<MongoDB>,
    query: web::Query<CampaignQuery>,
) -> HttpResponse {
    log::info!("📅 GET /api/campaigns - status: {:?}, city: {:?}", query.status, query.city);

    match campaign_service::list_campaigns(&db, &query).await {
        Ok(campaigns) => {
            let campaigns: Vec<CampaignResponse> =
                campaigns.into_iter().map(CampaignResponse::from).collect();
            HttpResponse::Ok().json(campaigns)
        }
        Err(e) => {
            log::error!("❌ Error fetching campaigns: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = String, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Campaign", body = CampaignResponse),
        (status = 404, description = "Campaign not found")
    )
)]
#[get("/{id}")]
pub async fn get_campaign(path: web::Path<String>, db: web::Data<MongoDB>) -> HttpResponse {
    log::info!("📅 GET /api/campaigns/{}", path);

    let result = async { campaign_service::get_campaign(&db, campaign_id(&path)?).await }.await;

    match result {
        Ok(campaign) => HttpResponse::Ok().json(CampaignResponse::from(campaign)),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/campaigns",
    tag = "Campaigns",
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Campaign created", body = CampaignResponse),
        (status = 400, description = "Missing required fields")
    )
)]
#[post("")]
pub async fn create_campaign(
    db: web::Data<MongoDB>,
    request: web::Json<CreateCampaignRequest>,
) -> HttpResponse {
    log::info!("➕ POST /api/campaigns - title: {:?}", request.title);

    match campaign_service::create_campaign(&db, &request).await {
        Ok(campaign) => {
            log::info!("✅ Campaign created: {}", campaign.title);
            HttpResponse::Created().json(serde_json::json!({
                "message": "Campaign created successfully!",
                "campaign": CampaignResponse::from(campaign)
            }))
        }
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = String, Path, description = "Campaign ID")),
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Campaign updated", body = CampaignResponse),
        (status = 403, description = "Admin rights required"),
        (status = 404, description = "Campaign not found")
    ),
    security(("bearer_auth" = []))
)]
#[put("/{id}")]
pub async fn update_campaign(
    claims: Claims,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateCampaignRequest>,
) -> HttpResponse {
    log::info!("✏️  PUT /api/campaigns/{}", path);

    let result = async {
        claims.require_admin()?;
        campaign_service::update_campaign(&db, campaign_id(&path)?, &request).await
    }
    .await;

    match result {
        Ok(campaign) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Campaign updated successfully",
            "campaign": CampaignResponse::from(campaign)
        })),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = String, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Campaign deleted"),
        (status = 403, description = "Admin rights required"),
        (status = 404, description = "Campaign not found")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/{id}")]
pub async fn delete_campaign(
    claims: Claims,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> HttpResponse {
    log::info!("🗑️  DELETE /api/campaigns/{}", path);

    let result = async {
        claims.require_admin()?;
        campaign_service::delete_campaign(&db, campaign_id(&path)?).await
    }
    .await;

    match result {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Campaign deleted successfully"
        })),
        Err(e) => e.error_response(),
    }
}

/// Checks the join payload before touching the database. The user id
/// format is checked later, once the campaign is known to be open.
pub fn parse_join(
    path: &str,
    request: Option<&JoinCampaignRequest>,
) -> Result<(ObjectId, String), AppError> {
    let raw_user = request
        .and_then(|r| validation::optional(r.user_id.as_deref()))
        .ok_or_else(|| {
            AppError::Validation("User ID is required. Please login to join campaigns.".to_string())
        })?;

    let campaign = validation::parse_object_id(path, "campaign ID")?;
    Ok((campaign, raw_user))
}

#[utoipa::path(
    post,
    path = "/api/campaigns/{id}/join",
    tag = "Campaigns",
    params(("id" = String, Path, description = "Campaign ID")),
    request_body = JoinCampaignRequest,
    responses(
        (status = 200, description = "Joined", body = JoinSummary),
        (status = 400, description = "Missing user, closed campaign or already registered"),
        (status = 404, description = "Campaign not found")
    )
)]
#[post("/{id}/join")]
pub async fn join_campaign(
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: Option<web::Json<JoinCampaignRequest>>,
) -> HttpResponse {
    log::info!("🙋 POST /api/campaigns/{}/join", path);

    let result = async {
        let (campaign_id, user_id) = parse_join(&path, request.as_deref())?;
        campaign_service::join_campaign(&db, campaign_id, &user_id).await
    }
    .await;

    match result {
        Ok(campaign) => {
            log::info!(
                "✅ Joined campaign {} ({}/{})",
                campaign.title,
                campaign.registered_donors,
                campaign.target_donors
            );
            HttpResponse::Ok().json(serde_json::json!({
                "message": "Successfully joined the campaign! 🎉",
                "campaign": JoinSummary::from(&campaign)
            }))
        }
        Err(e) => {
            log::warn!("⚠️  Join rejected for campaign {}: {}", path, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/campaigns/{id}/participants",
    tag = "Campaigns",
    params(("id" = String, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Participants with counts"),
        (status = 404, description = "Campaign not found")
    )
)]
#[get("/{id}/participants")]
pub async fn get_participants(path: web::Path<String>, db: web::Data<MongoDB>) -> HttpResponse {
    log::info!("👥 GET /api/campaigns/{}/participants", path);

    let result = async {
        let campaign = campaign_service::get_campaign(&db, campaign_id(&path)?).await?;
        let participants = campaign_service::list_participants(&db, &campaign).await?;
        Ok::<_, AppError>((campaign, participants))
    }
    .await;

    match result {
        Ok((campaign, participants)) => HttpResponse::Ok().json(serde_json::json!({
            "participants": participants,
            "registeredDonors": campaign.registered_donors,
            "targetDonors": campaign.target_donors
        })),
        Err(e) => e.error_response(),
    }
}
