use crate::{
    errors::{ApiError, AuthError},
    models::user::{UserProfile, normalize_email},
    store::user::UserRepository,
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 5;

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| anyhow::anyhow!("failed to hash password"))?
        .to_string();
    Ok(hash)
}

fn check_password_rules(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn is_unique_violation(e: &anyhow::Error) -> bool {
    e.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation())
}

#[derive(Clone, Debug)]
pub struct AuthService {
    repo: UserRepository,
}

impl AuthService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    #[instrument(name = "AuthService: Register", skip(self, password))]
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<Uuid, ApiError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials.into());
        }
        check_password_rules(password)?;

        let hash = hash_password(password)?;
        self.repo
            .create_user(&email, name.trim(), &hash)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    tracing::warn!("Registration rejected: email already taken");
                    AuthError::UserAlreadyExists.into()
                } else {
                    ApiError::Internal(e)
                }
            })
    }

    #[instrument(
        name = "AuthService: Login attempt",
        skip(self, password),
        fields(user_email = %email)
    )]
    pub async fn login(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        // 1. Fetch User
        let user = self
            .repo
            .find_by_email(&normalize_email(email))
            .await
            .map_err(|e| {
                tracing::error!("Database error during login: {:?}", e);
                AuthError::Internal
            })?;

        let user = match user {
            Some(u) => u,
            None => {
                tracing::warn!("Login failed: User not found");
                return Err(AuthError::WrongCredentials);
            }
        };

        // 2. Parse Hash
        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
            tracing::error!("Critical: Failed to parse password hash from DB: {:?}", e);
            AuthError::Internal
        })?;

        // 3. Verify Password
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            tracing::warn!("Login failed: Invalid password provided");
            return Err(AuthError::WrongCredentials);
        }

        tracing::info!("User authenticated successfully");
        Ok(user.id)
    }

    /// A token can outlive its account; treat that as an invalid token.
    #[instrument(name = "AuthService: Profile", skip(self))]
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, ApiError> {
        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        Ok(user.into())
    }

    #[instrument(name = "AuthService: Update profile", skip(self, password))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<&str>,
        password: Option<&str>,
    ) -> Result<UserProfile, ApiError> {
        let current = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let hash = match password {
            Some(password) => {
                check_password_rules(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };
        let name = name.map(str::trim).unwrap_or(&current.name);

        let user = self
            .repo
            .update_profile(user_id, name, hash.as_deref())
            .await?
            .ok_or(AuthError::InvalidToken)?;
        Ok(user.into())
    }
}
