//! Service configuration, read from environment variables (and `.env`).

use std::time::Duration;

const DEFAULT_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:5001",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:5001",
    "http://127.0.0.1:3000",
];

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub ttl_hours: i64,
}

/// Transactional mail API. `None` means messages are only logged.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub jwt: JwtSettings,
    pub allowed_origins: Vec<String>,
    pub mail: Option<MailSettings>,
    pub gemini: Option<GeminiSettings>,
    pub http_timeout: Duration,
    pub seed_demo_donors: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mongodb_uri = get("MONGODB_URI").ok_or("MONGODB_URI must be set")?;
        let secret = get("JWT_SECRET").ok_or("JWT_SECRET must be set")?;

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("Invalid PORT: {}", raw))?,
            None => 5001,
        };

        let ttl_hours = match get("JWT_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| format!("Invalid JWT_TTL_HOURS: {}", raw))?,
            None => 24,
        };

        let timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| format!("Invalid HTTP_TIMEOUT_SECS: {}", raw))?,
            None => 15,
        };

        let database_name = get("MONGODB_DATABASE")
            .or_else(|| database_from_uri(&mongodb_uri))
            .unwrap_or_else(|| "hemolink".to_string());

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            None => DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let mail = match (get("MAIL_API_URL"), get("MAIL_API_KEY")) {
            (Some(api_url), Some(api_key)) => Some(MailSettings {
                api_url,
                api_key,
                from: get("MAIL_FROM")
                    .unwrap_or_else(|| "HemoLink <no-reply@hemolink.app>".to_string()),
            }),
            _ => None,
        };

        let gemini = get("GEMINI_API_KEY").map(|api_key| GeminiSettings {
            api_key,
            model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-pro".to_string()),
        });

        let seed_demo_donors = get("SEED_DEMO_DONORS")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            mongodb_uri,
            database_name,
            jwt: JwtSettings {
                secret,
                issuer: get("JWT_ISSUER").unwrap_or_else(|| "hemolink".to_string()),
                ttl_hours,
            },
            allowed_origins,
            mail,
            gemini,
            http_timeout: Duration::from_secs(timeout_secs),
            seed_demo_donors,
        })
    }
}

/// `mongodb://host:27017/hemolink?retryWrites=true` -> `hemolink`
fn database_from_uri(uri: &str) -> Option<String> {
    let without_scheme = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    let (_, path) = without_scheme.split_once('/')?;
    let name = path.split('?').next().unwrap_or_default();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
