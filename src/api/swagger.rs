use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HemoLink API",
        version = "1.0.0",
        description = "Blood donation coordination service.\n\n**Authentication:** profile, directory and admin endpoints require a JWT Bearer token from `/api/auth/login`.\n\n**Features:**\n- Donor registration and profiles\n- Emergency (SOS) requests with donor email alerts\n- Donation campaigns\n- Donor leaderboard\n- Chat assistant",
        contact(
            name = "HemoLink Team",
            email = "support@hemolink.app"
        )
    ),
    paths(
        // Health
        crate::api::health::health_check,

        // Auth
        crate::api::auth::health,
        crate::api::auth::register,
        crate::api::auth::login,

        // Users
        crate::api::auth::get_profile,
        crate::api::auth::update_profile,
        crate::api::auth::add_medical_record,
        crate::api::auth::add_donation,
        crate::api::auth::list_users,
        crate::api::auth::list_donors,
        crate::api::auth::list_donors_public,
        crate::api::auth::register_donor,
        crate::api::auth::change_password,
        crate::api::auth::delete_user,

        // Campaigns
        crate::api::campaigns::list_campaigns,
        crate::api::campaigns::get_campaign,
        crate::api::campaigns::create_campaign,
        crate::api::campaigns::update_campaign,
        crate::api::campaigns::delete_campaign,
        crate::api::campaigns::join_campaign,
        crate::api::campaigns::get_participants,

        // SOS, leaderboard, chat
        crate::api::sos::create_sos,
        crate::api::leaderboard::get_leaderboard,
        crate::api::chatbot::send_message,
    ),
    components(
        schemas(
            // Auth & users
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::UserInfo,
            crate::models::UserProfile,
            crate::models::UpdateProfileRequest,
            crate::models::MedicalRecordRequest,
            crate::models::DonationRecordRequest,
            crate::models::RegisterDonorRequest,
            crate::models::ChangePasswordRequest,
            crate::models::BloodGroup,
            crate::models::Role,

            // Campaigns
            crate::models::CampaignResponse,
            crate::models::CampaignStatus,
            crate::models::CreateCampaignRequest,
            crate::models::UpdateCampaignRequest,
            crate::models::JoinCampaignRequest,
            crate::models::JoinSummary,
            crate::models::ParticipantInfo,

            // SOS
            crate::models::CreateSosRequest,
            crate::models::SosRequestResponse,
            crate::api::sos::SosResponse,

            // Leaderboard & chat
            crate::models::LeaderboardEntry,
            crate::services::chatbot_service::ChatRequest,
            crate::services::chatbot_service::ChatReply,

            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and database connectivity."),
        (name = "Auth", description = "Registration and login. Returns a 24h JWT."),
        (name = "Users", description = "Profiles, medical records, donation history and the donor directory."),
        (name = "Campaigns", description = "Donation campaigns and participant tracking."),
        (name = "SOS", description = "Emergency blood requests. Matching donors are alerted by email."),
        (name = "Leaderboard", description = "Donors ranked by number of recorded donations."),
        (name = "Chatbot", description = "Blood donation assistant."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from /api/auth/login"))
                        .build()
                ),
            );
        }
    }
}
