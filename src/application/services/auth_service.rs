//! Authentication Service
//!
//! Registration with email OTP verification, login and JWT handling.
//! Passwords and OTPs are stored only as Argon2 hashes.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::dto::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, ResendOtpRequest, UserSummary,
    VerifyOtpRequest,
};
use crate::config::{JwtSettings, OtpSettings};
use crate::domain::{User, UserRepository};
use crate::infrastructure::email::OtpMailer;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;
use crate::shared::validation::{is_valid_username, normalize_email, validation_error};

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an unverified account and mail its OTP
    async fn register(&self, request: RegisterRequest) -> Result<MessageResponse, AuthError>;

    /// Confirm an email address with the mailed OTP
    async fn verify_otp(&self, request: VerifyOtpRequest) -> Result<MessageResponse, AuthError>;

    /// Authenticate by username or email and issue a JWT
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError>;

    /// Rotate the pending OTP and mail it again
    async fn resend_otp(&self, request: ResendOtpRequest) -> Result<MessageResponse, AuthError>;

    /// Load the account a token was issued to
    async fn current_user(&self, user_id: i64) -> Result<User, AuthError>;
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub email: String,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse::<i64>().map_err(|_| AuthError::InvalidToken)
    }
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Account exists but not verified. Please verify your email.")]
    AccountNotVerified,

    #[error("Username or email already exists")]
    AlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already verified")]
    AlreadyVerified,

    #[error("OTP is invalid or already used")]
    OtpUnavailable,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Please verify your email first")]
    EmailNotVerified,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Failed to send OTP email. Please try resend OTP.")]
    MailDelivery,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::InvalidCredentials
            | AuthError::EmailNotVerified
            | AuthError::TokenExpired
            | AuthError::InvalidToken => AppError::Unauthorized(err.to_string()),
            AuthError::Internal(msg) => AppError::Internal(msg),
            AuthError::Store(e) => e,
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

/// Decode and validate an HS256 token signed with `secret`.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// AuthService implementation
pub struct AuthServiceImpl<U, M>
where
    U: UserRepository + ?Sized,
    M: OtpMailer + ?Sized,
{
    user_repo: Arc<U>,
    mailer: Arc<M>,
    id_generator: Arc<SnowflakeGenerator>,
    jwt_settings: JwtSettings,
    otp_settings: OtpSettings,
}

impl<U, M> AuthServiceImpl<U, M>
where
    U: UserRepository + ?Sized,
    M: OtpMailer + ?Sized,
{
    /// Create a new AuthServiceImpl
    pub fn new(
        user_repo: Arc<U>,
        mailer: Arc<M>,
        id_generator: Arc<SnowflakeGenerator>,
        jwt_settings: JwtSettings,
        otp_settings: OtpSettings,
    ) -> Self {
        Self {
            user_repo,
            mailer,
            id_generator,
            jwt_settings,
            otp_settings,
        }
    }

    /// Hash a secret (password or OTP) using Argon2id
    fn hash_secret(&self, secret: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Hashing failed: {}", e)))
    }

    /// Verify a secret against its stored hash
    fn verify_secret(&self, secret: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid stored hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Numeric code of the configured length
    fn generate_otp(&self) -> String {
        let mut rng = rand::rng();
        (0..self.otp_settings.length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }

    fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::days(self.jwt_settings.expiry_days)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_settings.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Store a fresh OTP for `user` and return the plain code.
    async fn rotate_otp(&self, user: &User) -> Result<String, AuthError> {
        let otp = self.generate_otp();
        let otp_hash = self.hash_secret(&otp)?;
        let expires_at = Utc::now() + Duration::minutes(self.otp_settings.ttl_minutes);

        self.user_repo.set_otp(user.id, &otp_hash, expires_at).await?;
        Ok(otp)
    }
}

#[async_trait]
impl<U, M> AuthService for AuthServiceImpl<U, M>
where
    U: UserRepository + ?Sized + 'static,
    M: OtpMailer + ?Sized + 'static,
{
    async fn register(&self, mut request: RegisterRequest) -> Result<MessageResponse, AuthError> {
        // Rules apply to what gets stored, not to the raw input.
        request.username = request.username.trim().to_string();
        request.email = normalize_email(&request.email);

        request
            .validate()
            .map_err(|e| AuthError::Validation(validation_error(e).public_message()))?;

        let username = request.username.as_str();
        if !is_valid_username(username) {
            return Err(AuthError::Validation(
                "username: Username may not contain whitespace or '_'".into(),
            ));
        }
        let email = request.email.clone();

        let existing = match self.user_repo.find_by_username(username).await? {
            Some(user) => Some(user),
            None => self.user_repo.find_by_email(&email).await?,
        };
        if let Some(user) = existing {
            return Err(if user.is_verified {
                AuthError::AlreadyExists
            } else {
                AuthError::AccountNotVerified
            });
        }

        let password_hash = self.hash_secret(&request.password)?;
        let otp = self.generate_otp();
        let otp_hash = self.hash_secret(&otp)?;
        let expires_at = Utc::now() + Duration::minutes(self.otp_settings.ttl_minutes);

        let user = User::new_unverified(
            self.id_generator.generate(),
            username.to_string(),
            email,
            password_hash,
            otp_hash,
            expires_at,
        );

        let created = match self.user_repo.create(&user).await {
            Ok(created) => created,
            Err(AppError::Conflict(_)) => return Err(AuthError::AlreadyExists),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(user_id = created.id, username = %created.username, "User registered");

        // The account stays even if mail fails; the code can be resent.
        match self
            .mailer
            .send_otp(&created.email, &otp, self.otp_settings.ttl_minutes)
            .await
        {
            Ok(()) => Ok(MessageResponse::new(
                "Registration successful. OTP sent to your email.",
            )),
            Err(e) => {
                tracing::error!(user_id = created.id, error = %e, "OTP mail failed after registration");
                Ok(MessageResponse::new(
                    "Registration successful, but the OTP email could not be sent. Please resend OTP.",
                ))
            }
        }
    }

    async fn verify_otp(&self, request: VerifyOtpRequest) -> Result<MessageResponse, AuthError> {
        if request.email.trim().is_empty() || request.otp.trim().is_empty() {
            return Err(AuthError::Validation("Email and OTP are required".into()));
        }
        let email = normalize_email(&request.email);

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_verified {
            return Ok(MessageResponse::new("Email already verified"));
        }

        let (otp_hash, expires_at) = match (&user.otp_hash, user.otp_expires_at) {
            (Some(hash), Some(expires_at)) => (hash, expires_at),
            _ => return Err(AuthError::OtpUnavailable),
        };

        if expires_at < Utc::now() {
            return Err(AuthError::OtpExpired);
        }

        if !self.verify_secret(request.otp.trim(), otp_hash)? {
            return Err(AuthError::InvalidOtp);
        }

        self.user_repo.mark_verified(user.id).await?;
        tracing::info!(user_id = user.id, "Email verified");

        Ok(MessageResponse::new("Email verified successfully"))
    }

    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        request
            .validate()
            .map_err(|e| AuthError::Validation(validation_error(e).public_message()))?;

        let user = self
            .user_repo
            .find_by_identifier(request.identifier.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        if !self.verify_secret(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        tracing::debug!(user_id = user.id, "Login succeeded");

        Ok(LoginResponse {
            message: "Login successful".into(),
            user: UserSummary::from(&user),
            token,
        })
    }

    async fn resend_otp(&self, request: ResendOtpRequest) -> Result<MessageResponse, AuthError> {
        let email = normalize_email(&request.email);
        if email.is_empty() {
            return Err(AuthError::Validation("Email is required".into()));
        }

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let otp = self.rotate_otp(&user).await?;

        self.mailer
            .send_otp(&user.email, &otp, self.otp_settings.ttl_minutes)
            .await
            .map_err(|e| {
                tracing::error!(user_id = user.id, error = %e, "OTP resend failed");
                AuthError::MailDelivery
            })?;

        Ok(MessageResponse::new("New OTP sent to your email"))
    }

    async fn current_user(&self, user_id: i64) -> Result<User, AuthError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
