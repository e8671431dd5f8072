use crate::{
    config::JwtSettings,
    database::MongoDB,
    models::{BloodGroup, Role, User},
    utils::{dates, error::AppError, validation},
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const BCRYPT_COST: u32 = 10;
pub const MIN_PASSWORD_LEN: usize = 6;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id (ObjectId hex)
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub iss: String,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Access denied. Admin rights required.".to_string(),
            ))
        }
    }

    pub fn require_self_or_admin(&self, user_id: &str) -> Result<(), AppError> {
        if self.sub == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Access denied".to_string()))
        }
    }

    pub fn require_self(&self, user_id: &str) -> Result<(), AppError> {
        if self.sub == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("Access denied".to_string()))
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub blood_group: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub is_donor: Option<bool>,
    pub needs_blood: Option<bool>,
    pub needs_blood_group: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_donor: bool,
    pub blood_group: Option<BloodGroup>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub needs_blood: bool,
    pub needs_blood_group: Option<BloodGroup>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        UserInfo {
            id: user.id_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_donor: user.is_donor,
            blood_group: user.blood_group,
            city: user.city.clone(),
            phone: user.phone.clone(),
            needs_blood: user.needs_blood,
            needs_blood_group: user.needs_blood_group,
        }
    }
}

// Generate JWT token
pub fn generate_jwt(user: &User, settings: &JwtSettings) -> Result<String, AppError> {
    let now = Utc::now();

    let claims = Claims {
        sub: user.id_hex(),
        email: user.email.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(settings.ttl_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        iss: settings.issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str, settings: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[settings.issuer.as_str()]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(AppError::from)
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(hash(password, BCRYPT_COST)?)
}

pub fn parse_blood_group(raw: Option<&str>) -> Result<Option<BloodGroup>, AppError> {
    match validation::optional(raw) {
        Some(value) => value
            .parse::<BloodGroup>()
            .map(Some)
            .map_err(AppError::Validation),
        None => Ok(None),
    }
}

/// Validates a registration payload and builds the document to insert.
pub fn build_new_user(request: &RegisterRequest) -> Result<User, AppError> {
    let (name, email, password) = match (
        validation::optional(request.name.as_deref()),
        validation::optional(request.email.as_deref()),
        request.password.as_deref().filter(|p| !p.is_empty()),
    ) {
        (Some(name), Some(email), Some(password)) => (name, email.to_lowercase(), password),
        _ => {
            return Err(AppError::Validation(
                "Name, email, and password are required".to_string(),
            ))
        }
    };

    // Self-registration cannot grant admin
    let role = match validation::optional(request.role.as_deref()) {
        Some(raw) => match raw.parse::<Role>().map_err(AppError::Validation)? {
            Role::Admin => {
                return Err(AppError::Validation(
                    "Admin accounts cannot be self-registered".to_string(),
                ))
            }
            role => role,
        },
        None => Role::User,
    };

    let now = dates::now();

    Ok(User {
        id: None,
        name,
        email,
        password: hash_password(password)?,
        role,
        blood_group: parse_blood_group(request.blood_group.as_deref())?,
        phone: validation::optional(request.phone.as_deref()),
        city: validation::optional(request.city.as_deref()),
        is_donor: request.is_donor.unwrap_or(false),
        needs_blood: request.needs_blood.unwrap_or(false),
        needs_blood_group: parse_blood_group(request.needs_blood_group.as_deref())?,
        medical_records: vec![],
        donation_history: vec![],
        badges: vec![],
        is_verified: false,
        created_at: now,
        updated_at: now,
    })
}

// User registration
pub async fn register(
    db: &MongoDB,
    settings: &JwtSettings,
    request: &RegisterRequest,
) -> Result<AuthResponse, AppError> {
    let mut new_user = build_new_user(request)?;
    let collection = db.users();

    if collection
        .find_one(doc! { "email": &new_user.email })
        .await?
        .is_some()
    {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let result = collection.insert_one(&new_user).await.map_err(|e| {
        // Lost a race against the unique email index
        if e.to_string().contains("E11000") {
            AppError::Validation("User with this email already exists".to_string())
        } else {
            AppError::from(e)
        }
    })?;
    new_user.id = result.inserted_id.as_object_id();

    let token = generate_jwt(&new_user, settings)?;

    log::info!("✅ User registered successfully: {}", new_user.email);

    Ok(AuthResponse {
        success: true,
        message: "Registration successful".to_string(),
        token,
        user: UserInfo::from(&new_user),
    })
}

// User login
pub async fn login(
    db: &MongoDB,
    settings: &JwtSettings,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let email = request.email.trim().to_lowercase();

    let user = db
        .users()
        .find_one(doc! { "email": &email })
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify(&request.password, &user.password)? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = generate_jwt(&user, settings)?;

    Ok(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: UserInfo::from(&user),
    })
}
