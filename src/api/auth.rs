use actix_web::{web, HttpResponse, ResponseError};
use crate::config::Config;
use crate::database::MongoDB;
use crate::models::{
    ChangePasswordRequest, DonationRecordRequest, MedicalRecordRequest, RegisterDonorRequest,
    UpdateProfileRequest, UserProfile,
};
use crate::services::auth_service::{self, AuthResponse, Claims, LoginRequest, RegisterRequest};
use crate::services::user_service;
use crate::utils::validation;

fn user_id(path: &web::Path<String>) -> Result<mongodb::bson::oid::ObjectId, crate::utils::AppError> {
    validation::parse_object_id(path.as_str(), "user ID")
}

#[utoipa::path(
    get,
    path = "/api/auth/health",
    tag = "Auth",
    responses((status = 200, description = "Auth routes are up"))
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "OK",
        "message": "Auth routes are working",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Missing fields or user already exists")
    )
)]
pub async fn register(
    db: web::Data<MongoDB>,
    config: web::Data<Config>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /api/auth/register - email: {}", email);

    match auth_service::register(&db, &config.jwt, &request).await {
        Ok(response) => HttpResponse::Created().json(response),
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    config: web::Data<Config>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /api/auth/login - email: {}", request.email);

    match auth_service::login(&db, &config.jwt, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/profile/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    claims: Claims,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> HttpResponse {
    log::info!("👤 GET /api/auth/profile/{}", path);

    let result = async {
        claims.require_self_or_admin(&path)?;
        user_service::get_profile(&db, user_id(&path)?).await
    }
    .await;

    match result {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/auth/profile/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 403, description = "Not your profile, or admin-only field")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    claims: Claims,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateProfileRequest>,
) -> HttpResponse {
    log::info!("✏️  PUT /api/auth/profile/{}", path);

    let result = async {
        claims.require_self_or_admin(&path)?;
        user_service::update_profile(&db, user_id(&path)?, &request, &claims).await
    }
    .await;

    match result {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Profile updated",
            "user": user
        })),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/medical-record/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    request_body = MedicalRecordRequest,
    responses(
        (status = 200, description = "Medical record added"),
        (status = 403, description = "Admin rights required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_medical_record(
    claims: Claims,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<MedicalRecordRequest>,
) -> HttpResponse {
    log::info!("🩺 POST /api/auth/medical-record/{}", path);

    let result = async {
        claims.require_admin()?;
        user_service::add_medical_record(&db, user_id(&path)?, &request).await
    }
    .await;

    match result {
        Ok(records) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Medical record added",
            "medicalRecords": records
        })),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/donation/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    request_body = DonationRecordRequest,
    responses(
        (status = 200, description = "Donation recorded"),
        (status = 403, description = "Admin rights required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_donation(
    claims: Claims,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<DonationRecordRequest>,
) -> HttpResponse {
    log::info!("🩸 POST /api/auth/donation/{}", path);

    let result = async {
        claims.require_admin()?;
        user_service::add_donation(&db, user_id(&path)?, &request).await
    }
    .await;

    match result {
        Ok(history) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Donation recorded",
            "donationHistory": history
        })),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/all",
    tag = "Users",
    responses((status = 200, description = "All users", body = [UserProfile])),
    security(("bearer_auth" = []))
)]
pub async fn list_users(claims: Claims, db: web::Data<MongoDB>) -> HttpResponse {
    log::info!("📋 GET /api/auth/all");

    if let Err(e) = claims.require_admin() {
        return e.error_response();
    }

    match user_service::list_all(&db).await {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(e) => {
            log::error!("❌ Error fetching users: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/donors",
    tag = "Users",
    responses((status = 200, description = "Donors", body = [UserProfile])),
    security(("bearer_auth" = []))
)]
pub async fn list_donors(claims: Claims, db: web::Data<MongoDB>) -> HttpResponse {
    log::info!("📋 GET /api/auth/donors");

    if let Err(e) = claims.require_admin() {
        return e.error_response();
    }

    match user_service::list_donors(&db).await {
        Ok(donors) => HttpResponse::Ok().json(donors),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/donors-public",
    tag = "Users",
    responses((status = 200, description = "Donors", body = [UserProfile]))
)]
pub async fn list_donors_public(db: web::Data<MongoDB>) -> HttpResponse {
    log::info!("📋 GET /api/auth/donors-public");

    match user_service::list_donors(&db).await {
        Ok(donors) => HttpResponse::Ok().json(donors),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/auth/register-donor/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    request_body = RegisterDonorRequest,
    responses(
        (status = 200, description = "Registered as donor"),
        (status = 400, description = "Blood group and city are required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn register_donor(
    claims: Claims,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<RegisterDonorRequest>,
) -> HttpResponse {
    log::info!("🩸 PUT /api/auth/register-donor/{}", path);

    let result = async {
        claims.require_self(&path)?;
        user_service::register_donor(&db, user_id(&path)?, &request).await
    }
    .await;

    match result {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Successfully registered as donor",
            "user": user
        })),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/auth/change-password/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Password too short")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    claims: Claims,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<ChangePasswordRequest>,
) -> HttpResponse {
    log::info!("🔑 PUT /api/auth/change-password/{}", path);

    let result = async {
        claims.require_self_or_admin(&path)?;
        user_service::change_password(&db, user_id(&path)?, &request).await
    }
    .await;

    match result {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Password changed successfully",
            "user": user
        })),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/auth/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    claims: Claims,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
) -> HttpResponse {
    log::info!("🗑️  DELETE /api/auth/{}", path);

    let result = async {
        claims.require_admin()?;
        user_service::delete_user(&db, user_id(&path)?).await
    }
    .await;

    match result {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "message": "User deleted successfully"
        })),
        Err(e) => e.error_response(),
    }
}
