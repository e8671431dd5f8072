mod api;
mod config;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io::{Error, ErrorKind};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::middleware::AuthMiddleware;
use crate::services::{DisabledGenerator, GeminiClient, HttpMailer, LogNotifier, Notifier, TextGenerator};

fn startup_error(context: &str, e: impl std::fmt::Display) -> Error {
    log::error!("❌ {}: {}", context, e);
    Error::new(ErrorKind::Other, format!("{}: {}", context, e))
}

fn build_notifier(config: &Config) -> std::io::Result<Arc<dyn Notifier>> {
    match &config.mail {
        Some(settings) => {
            log::info!("📧 Mail API configured: {}", settings.api_url);
            let mailer = HttpMailer::new(settings.clone(), config.http_timeout)
                .map_err(|e| startup_error("Failed to build mail client", e))?;
            Ok(Arc::new(mailer))
        }
        None => {
            log::warn!("⚠️  MAIL_API_URL/MAIL_API_KEY not set, SOS alerts will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

fn build_generator(config: &Config) -> std::io::Result<Arc<dyn TextGenerator>> {
    match &config.gemini {
        Some(settings) => {
            log::info!("🤖 Gemini model: {}", settings.model);
            let client = GeminiClient::new(settings.clone(), config.http_timeout)
                .map_err(|e| startup_error("Failed to build Gemini client", e))?;
            Ok(Arc::new(client))
        }
        None => {
            log::warn!("⚠️  GEMINI_API_KEY not set, chatbot will use fallback replies");
            Ok(Arc::new(DisabledGenerator))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Environment (.env is loaded inside)
    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    log::info!("🚀 Starting HemoLink Service...");
    log::info!("📊 Database: {}", config.database_name);

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.mongodb_uri, &config.database_name)
        .await
        .map_err(|e| startup_error("Failed to connect to MongoDB", e))?;

    log::info!("✅ MongoDB connected successfully");

    if config.seed_demo_donors {
        seeds::demo_donors_seed::seed_demo_donors(&db).await;
    }

    let notifier = web::Data::from(build_notifier(&config)?);
    let generator = web::Data::from(build_generator(&config)?);
    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config.clone());

    log::info!("🌐 Server starting on {}:{}", config.host, config.port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", config.host, config.port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", config.host, config.port);

    let allowed_origins = config.allowed_origins.clone();

    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(notifier.clone())
            .app_data(generator.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            .route("/", web::get().to(api::index))
            .route("/health", web::get().to(api::health::health_check))
            // Auth & user directory
            .service(
                web::scope("/api/auth")
                    .route("/health", web::get().to(api::auth::health))
                    .route("/register", web::post().to(api::auth::register))
                    .route("/login", web::post().to(api::auth::login))
                    .route("/donors-public", web::get().to(api::auth::list_donors_public))
                    // Protected endpoints requiring JWT authentication
                    .service(
                        web::resource("/profile/{id}")
                            .wrap(AuthMiddleware)
                            .route(web::get().to(api::auth::get_profile))
                            .route(web::put().to(api::auth::update_profile))
                    )
                    .service(
                        web::resource("/medical-record/{id}")
                            .wrap(AuthMiddleware)
                            .route(web::post().to(api::auth::add_medical_record))
                    )
                    .service(
                        web::resource("/donation/{id}")
                            .wrap(AuthMiddleware)
                            .route(web::post().to(api::auth::add_donation))
                    )
                    .service(
                        web::resource("/all")
                            .wrap(AuthMiddleware)
                            .route(web::get().to(api::auth::list_users))
                    )
                    .service(
                        web::resource("/donors")
                            .wrap(AuthMiddleware)
                            .route(web::get().to(api::auth::list_donors))
                    )
                    .service(
                        web::resource("/register-donor/{id}")
                            .wrap(AuthMiddleware)
                            .route(web::put().to(api::auth::register_donor))
                    )
                    .service(
                        web::resource("/change-password/{id}")
                            .wrap(AuthMiddleware)
                            .route(web::put().to(api::auth::change_password))
                    )
                    .service(
                        web::resource("/{id}")
                            .wrap(AuthMiddleware)
                            .route(web::delete().to(api::auth::delete_user))
                    )
            )
            // Campaigns: public except PUT/DELETE, which check the admin token
            .service(
                web::scope("/api/campaigns")
                    .service(api::campaigns::list_campaigns)
                    .service(api::campaigns::create_campaign)
                    .service(api::campaigns::get_participants)
                    .service(api::campaigns::join_campaign)
                    .service(api::campaigns::get_campaign)
                    .service(api::campaigns::update_campaign)
                    .service(api::campaigns::delete_campaign)
            )
            .route("/api/sos", web::post().to(api::sos::create_sos))
            .route("/api/leaderboard", web::get().to(api::leaderboard::get_leaderboard))
            .route("/api/chatbot/message", web::post().to(api::chatbot::send_message))
            .default_service(web::to(api::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
