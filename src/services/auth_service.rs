//! Account lifecycle: registration, email verification, login, password reset.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{
    Config, RESET_TOKEN_TTL_HOURS, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER,
    VERIFICATION_TOKEN_TTL_HOURS,
};
use crate::domain::{NewUser, Password, PendingToken, User, UserResponse, UserRole};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::jobs::{EmailJob, Mailer};

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until the token expires
    #[schema(example = 2592000)]
    pub expires_in: i64,
}

/// Successful login: the bearer token and the profile it belongs to.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub user: UserResponse,
}

/// Input of [`AuthService::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub role: UserRole,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an unverified account and queue its verification email.
    async fn register(&self, registration: Registration) -> AppResult<User>;

    async fn verify_email(&self, token: &str) -> AppResult<()>;

    async fn login(&self, email: String, password: String) -> AppResult<LoginResponse>;

    /// Store a reset token and queue the reset email.
    async fn forgot_password(&self, email: String) -> AppResult<()>;

    async fn reset_password(&self, token: &str, password: String) -> AppResult<()>;

    async fn me(&self, user_id: Uuid) -> AppResult<User>;

    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    mailer: Arc<dyn Mailer>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            uow,
            mailer,
            config,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, registration: Registration) -> AppResult<User> {
        let users = self.uow.users();
        let email = registration.email.trim().to_lowercase();
        let phone_number = registration.phone_number.trim().to_string();

        if users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }
        if users.find_by_phone(&phone_number).await?.is_some() {
            return Err(AppError::conflict("Phone number already registered"));
        }

        let password_hash = Password::new(&registration.password)?.into_string();
        let verification = PendingToken::generate(VERIFICATION_TOKEN_TTL_HOURS);
        let token = verification.token.clone();

        let user = users
            .create(NewUser {
                name: registration.name.trim().to_string(),
                email,
                phone_number,
                password_hash,
                role: registration.role,
                verification,
            })
            .await?;

        self.mailer
            .enqueue(EmailJob::verification(&user.email, &self.config.frontend_url, &token))
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    async fn verify_email(&self, token: &str) -> AppResult<()> {
        let now = Utc::now();
        let user = self
            .uow
            .users()
            .find_by_verification_token(token)
            .await?
            .filter(|u| u.verification.as_ref().is_some_and(|p| p.is_valid(token, now)))
            .ok_or_else(|| AppError::bad_request("Invalid or expired verification token"))?;

        self.uow.users().mark_verified(user.id).await?;
        tracing::info!(user_id = %user.id, "Email verified");
        Ok(())
    }

    async fn login(&self, email: String, password: String) -> AppResult<LoginResponse> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.uow.users().find_by_email(&email).await? else {
            // Same hashing cost whether or not the account exists.
            Password::verify_dummy(&password);
            return Err(AppError::InvalidCredentials);
        };

        if !Password::from_hash(user.password_hash.as_str()).verify(&password) {
            return Err(AppError::InvalidCredentials);
        }
        if !user.is_verified {
            return Err(AppError::Unverified);
        }

        let token = generate_token(&user, &self.config)?;
        tracing::debug!(user_id = %user.id, "User logged in");
        Ok(LoginResponse {
            token,
            user: UserResponse::from(user),
        })
    }

    async fn forgot_password(&self, email: String) -> AppResult<()> {
        let email = email.trim().to_lowercase();
        let users = self.uow.users();
        let user = users
            .find_by_email(&email)
            .await?
            .ok_or_not_found("User")?;

        let reset = PendingToken::generate(RESET_TOKEN_TTL_HOURS);
        let token = reset.token.clone();
        users.set_reset_token(user.id, reset).await?;

        self.mailer
            .enqueue(EmailJob::password_reset(&user.email, &self.config.frontend_url, &token))
            .await?;

        tracing::info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    async fn reset_password(&self, token: &str, password: String) -> AppResult<()> {
        let now = Utc::now();
        let users = self.uow.users();
        let user = users
            .find_by_reset_token(token)
            .await?
            .filter(|u| u.password_reset.as_ref().is_some_and(|p| p.is_valid(token, now)))
            .ok_or_else(|| AppError::bad_request("Invalid or expired reset token"))?;

        let password_hash = Password::new(&password)?.into_string();
        users.reset_password(user.id, password_hash).await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    async fn me(&self, user_id: Uuid) -> AppResult<User> {
        self.uow
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User")
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{MockUnitOfWork, MockUserRepository, UserRepository};
    use crate::jobs::MockMailer;

    const SECRET: &str = "test-secret-key-with-at-least-32-chars";

    fn user(password: &str, verified: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone_number: "+250788000001".into(),
            password_hash: Password::new(password).unwrap().into_string(),
            role: UserRole::Agent,
            is_verified: verified,
            verification: None,
            password_reset: None,
            favorites: vec![],
            wishlist: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn service(users: MockUserRepository, mailer: MockMailer) -> Authenticator<MockUnitOfWork> {
        let users: Arc<dyn UserRepository> = Arc::new(users);
        let mut uow = MockUnitOfWork::new();
        uow.expect_users().returning(move || users.clone());
        Authenticator::new(Arc::new(uow), Arc::new(mailer), Config::with_secret(SECRET))
    }

    fn registration() -> Registration {
        Registration {
            name: " Ana ".into(),
            email: "Ana@Example.com".into(),
            password: "correct-horse".into(),
            phone_number: "+250788000001".into(),
            role: UserRole::Agent,
        }
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email == "ana@example.com")
            .returning(|_| Ok(Some(user("whatever-pass", true))));
        users.expect_create().never();

        let err = service(users, MockMailer::new())
            .register(registration())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "Email already registered"));
    }

    #[tokio::test]
    async fn test_register_rejects_taken_phone() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_find_by_phone()
            .returning(|_| Ok(Some(user("whatever-pass", true))));

        let err = service(users, MockMailer::new())
            .register(registration())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "Phone number already registered"));
    }

    #[tokio::test]
    async fn test_register_queues_verification_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_find_by_phone().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|new| {
                new.email == "ana@example.com"
                    && new.name == "Ana"
                    && new.role == UserRole::Agent
                    && new.verification.token.len() == 64
            })
            .returning(|new| {
                let mut created = user("correct-horse", false);
                created.verification = Some(new.verification);
                Ok(created)
            });

        let mut mailer = MockMailer::new();
        mailer
            .expect_enqueue()
            .withf(|job| job.to == "ana@example.com" && job.body.contains("/verify-email?token="))
            .times(1)
            .returning(|_| Ok(()));

        let created = service(users, mailer).register(registration()).await.unwrap();
        assert!(!created.is_verified);
    }

    #[tokio::test]
    async fn test_register_surfaces_mail_failure() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_find_by_phone().returning(|_| Ok(None));
        users
            .expect_create()
            .returning(|_| Ok(user("correct-horse", false)));

        let mut mailer = MockMailer::new();
        mailer
            .expect_enqueue()
            .returning(|_| Err(AppError::internal("queue down")));

        let result = service(users, mailer).register(registration()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_forgot_password_matches_mixed_case_email() {
        let account = user("correct-horse", true);
        let id = account.id;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email == "ana@example.com")
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));
        users
            .expect_set_reset_token()
            .withf(move |user_id, token| *user_id == id && token.token.len() == 64)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut mailer = MockMailer::new();
        mailer
            .expect_enqueue()
            .withf(|job| job.to == "ana@example.com")
            .times(1)
            .returning(|_| Ok(()));

        service(users, mailer)
            .forgot_password("  Ana@Example.COM ".into())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_success_issues_verifiable_token() {
        let account = user("correct-horse", true);
        let id = account.id;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(account.clone())));

        let auth = service(users, MockMailer::new());
        let response = auth
            .login("ANA@example.com".into(), "correct-horse".into())
            .await
            .unwrap();

        assert_eq!(response.user.id, id);
        assert_eq!(response.token.token_type, "Bearer");
        let claims = auth.verify_token(&response.token.access_token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role(), UserRole::Agent);
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email_look_the_same() {
        let account = user("correct-horse", true);
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(move |email| {
            Ok((email == "ana@example.com").then(|| account.clone()))
        });

        let auth = service(users, MockMailer::new());
        let wrong = auth
            .login("ana@example.com".into(), "battery-staple".into())
            .await
            .unwrap_err();
        let unknown = auth
            .login("nobody@example.com".into(), "battery-staple".into())
            .await
            .unwrap_err();

        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_requires_verified_email() {
        let account = user("correct-horse", false);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(account.clone())));

        let err = service(users, MockMailer::new())
            .login("ana@example.com".into(), "correct-horse".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unverified));
    }

    #[tokio::test]
    async fn test_verify_email_rejects_expired_token() {
        let mut account = user("correct-horse", false);
        account.verification = Some(PendingToken {
            token: "tok".into(),
            expires_at: Utc::now() - Duration::minutes(1),
        });
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_verification_token()
            .returning(move |_| Ok(Some(account.clone())));
        users.expect_mark_verified().never();

        let err = service(users, MockMailer::new())
            .verify_email("tok")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_verify_email_marks_user() {
        let mut account = user("correct-horse", false);
        account.verification = Some(PendingToken::generate(1));
        let token = account.verification.clone().unwrap().token;
        let id = account.id;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_verification_token()
            .returning(move |_| Ok(Some(account.clone())));
        users
            .expect_mark_verified()
            .withf(move |user_id| *user_id == id)
            .times(1)
            .returning(|_| Ok(()));

        service(users, MockMailer::new())
            .verify_email(&token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let err = service(users, MockMailer::new())
            .forgot_password("ghost@example.com".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reset_password_stores_new_hash() {
        let mut account = user("old-password", true);
        account.password_reset = Some(PendingToken::generate(1));
        let token = account.password_reset.clone().unwrap().token;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_reset_token()
            .returning(move |_| Ok(Some(account.clone())));
        users
            .expect_reset_password()
            .withf(|_, hash| Password::from_hash(hash.as_str()).verify("new-password"))
            .times(1)
            .returning(|_, _| Ok(()));

        service(users, MockMailer::new())
            .reset_password(&token, "new-password".into())
            .await
            .unwrap();
    }
}
