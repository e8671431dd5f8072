use actix_web::{web, HttpResponse, ResponseError};
use crate::database::MongoDB;
use crate::models::LeaderboardEntry;
use crate::services::leaderboard_service;

#[utoipa::path(
    get,
    path = "/api/leaderboard",
    tag = "Leaderboard",
    responses((status = 200, description = "Donors ranked by recorded donations", body = [LeaderboardEntry]))
)]
pub async fn get_leaderboard(db: web::Data<MongoDB>) -> HttpResponse {
    log::info!("🏆 GET /api/leaderboard");

    match leaderboard_service::get_leaderboard(&db).await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => {
            log::error!("❌ Error building leaderboard: {}", e);
            e.error_response()
        }
    }
}
