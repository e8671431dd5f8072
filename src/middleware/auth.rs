use crate::{
    config::Config,
    services::auth_service::{self, Claims},
    utils::error::AppError,
};
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

/// Returns the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(headers: &HeaderMap, config: Option<&web::Data<Config>>) -> Result<Claims, AppError> {
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::Unauthorized("No token, authorization denied".to_string()))?;

    let config =
        config.ok_or_else(|| AppError::Internal("Auth configuration missing".to_string()))?;

    auth_service::verify_token(token, &config.jwt)
        .map_err(|_| AppError::Unauthorized("Token is not valid".to_string()))
}

/// Rejects requests without a valid bearer token and stores the decoded
/// [`Claims`] in the request extensions.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(req.headers(), req.app_data::<web::Data<Config>>()) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await })
            }
            Err(e) => {
                log::warn!("🔒 Rejected {} {}: {}", req.method(), req.path(), e);
                Box::pin(async move { Err(e.into()) })
            }
        }
    }
}

/// Handlers take `Claims` as an argument. Behind [`AuthMiddleware`] the
/// claims come from the extensions; elsewhere the header is verified here.
impl FromRequest for Claims {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<Claims>() {
            return ready(Ok(claims.clone()));
        }

        ready(authenticate(req.headers(), req.app_data::<web::Data<Config>>()).map_err(Error::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtSettings;
    use crate::models::{Role, User};
    use actix_web::{http::StatusCode, test, App, HttpResponse};
    use mongodb::bson::oid::ObjectId;
    use std::time::Duration;

    fn config() -> Config {
        Config {
            host: "127.0.0.1".into(),
            port: 5001,
            mongodb_uri: "mongodb://localhost:27017/hemolink".into(),
            database_name: "hemolink".into(),
            jwt: JwtSettings {
                secret: "middleware-secret".into(),
                issuer: "hemolink".into(),
                ttl_hours: 1,
            },
            allowed_origins: vec![],
            mail: None,
            gemini: None,
            http_timeout: Duration::from_secs(1),
            seed_demo_donors: false,
        }
    }

    fn token_for(role: Role, config: &Config) -> String {
        let user = User {
            id: Some(ObjectId::new()),
            name: "Tester".into(),
            email: "tester@example.com".into(),
            password: "x".into(),
            role,
            blood_group: None,
            phone: None,
            city: None,
            is_donor: false,
            needs_blood: false,
            needs_blood_group: None,
            medical_records: vec![],
            donation_history: vec![],
            badges: vec![],
            is_verified: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        auth_service::generate_jwt(&user, &config.jwt).unwrap()
    }

    async fn whoami(claims: Claims) -> HttpResponse {
        HttpResponse::Ok().body(claims.email)
    }

    async fn admin_only(claims: Claims) -> Result<HttpResponse, AppError> {
        claims.require_admin()?;
        Ok(HttpResponse::Ok().finish())
    }

    #[actix_web::test]
    async fn test_bearer_token_parsing() {
        let req = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(req.headers()), Some("abc.def"));

        let basic = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert_eq!(bearer_token(basic.headers()), None);
    }

    #[actix_web::test]
    async fn test_missing_token_is_401() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config()))
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .route("/me", web::get().to(whoami)),
                ),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/me").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn test_valid_token_reaches_handler() {
        let config = config();
        let token = token_for(Role::Donor, &config);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .route("/me", web::get().to(whoami)),
                ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "tester@example.com");
    }

    #[actix_web::test]
    async fn test_extractor_without_middleware_and_admin_guard() {
        let config = config();
        let donor = token_for(Role::Donor, &config);
        let admin = token_for(Role::Admin, &config);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .route("/admin", web::get().to(admin_only)),
        )
        .await;

        let anonymous = test::TestRequest::get().uri("/admin").to_request();
        assert_eq!(
            test::call_service(&app, anonymous).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let as_donor = test::TestRequest::get()
            .uri("/admin")
            .insert_header((AUTHORIZATION, format!("Bearer {}", donor)))
            .to_request();
        assert_eq!(
            test::call_service(&app, as_donor).await.status(),
            StatusCode::FORBIDDEN
        );

        let as_admin = test::TestRequest::get()
            .uri("/admin")
            .insert_header((AUTHORIZATION, format!("Bearer {}", admin)))
            .to_request();
        assert_eq!(test::call_service(&app, as_admin).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_garbage_token_is_401() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, "Bearer not-a-jwt"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
