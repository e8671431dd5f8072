pub mod auth;
pub mod campaigns;
pub mod chatbot;
pub mod health;
pub mod leaderboard;
pub mod sos;
pub mod swagger;

use actix_web::{HttpRequest, HttpResponse};

/// GET / - service index
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "HemoLink API Server is running!",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "sos": "/api/sos",
            "campaigns": "/api/campaigns",
            "leaderboard": "/api/leaderboard",
            "chatbot": "/api/chatbot",
            "docs": "/swagger-ui/"
        }
    }))
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    log::warn!("⚠️  No route for {} {}", req.method(), req.path());
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Route not found",
        "path": req.path()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App};

    #[actix_web::test]
    async fn test_unknown_route_returns_json_404() {
        let app = test::init_service(
            App::new()
                .route("/", web::get().to(index))
                .default_service(web::to(not_found)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/nowhere").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Route not found");
        assert_eq!(body["path"], "/api/nowhere");
    }

    #[actix_web::test]
    async fn test_index_lists_endpoints() {
        let app = test::init_service(App::new().route("/", web::get().to(index))).await;
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(body["endpoints"]["sos"], "/api/sos");
    }
}
