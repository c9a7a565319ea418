use std::fmt;
use std::sync::Arc;

use axum::Json;
use axum::RequestPartsExt;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::{ApiError, AuthError};
use crate::models::user::{UserProfile, normalize_email};
use crate::startup::AppState;

pub struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Sign a token for `user_id` that expires after `ttl`.
    pub fn issue(&self, user_id: Uuid, ttl: chrono::Duration) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (chrono::Utc::now() + ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            tracing::error!("JWT Encoding failed: {:?}", e);
            AuthError::TokenCreation
        })
    }
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Keys { .. }")
    }
}

impl FromRef<AppState> for Arc<Keys> {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthBody {
    pub access_token: String,
    pub token_type: String,
}

impl AuthBody {
    fn new(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfilePatch {
    name: Option<String>,
    password: Option<String>,
}

#[instrument(name = "HTTP: Register user", skip(state, payload))]
pub async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    state
        .auth_service
        .register(&payload.email, &payload.password, &payload.name)
        .await?;

    let profile = UserProfile {
        email: normalize_email(&payload.email),
        name: payload.name.trim().to_string(),
    };
    Ok((StatusCode::CREATED, Json(profile)))
}

#[instrument(
    name = "HTTP: Authorize Handler",
    skip(state, payload),
    fields(user_email = tracing::field::Empty)
)]
pub async fn authorize_handler(
    State(state): State<AppState>,
    payload: Result<Json<AuthPayload>, JsonRejection>,
) -> Result<Json<AuthBody>, ApiError> {
    let Json(payload) = payload?;
    tracing::Span::current().record("user_email", payload.email.as_str());
    tracing::info!("Received login request");

    let user_id = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            tracing::error!("Authorization failed: {:?}", e);
            e
        })?;

    let token = state
        .keys
        .issue(user_id, chrono::Duration::hours(state.token_ttl_hours))?;

    tracing::info!("JWT issued for user");
    Ok(Json(AuthBody::new(token)))
}

#[instrument(name = "HTTP: Profile", skip(state, claims), fields(user_id = %claims.sub))]
pub async fn me_handler(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.auth_service.profile(claims.user_id()?).await?;
    Ok(Json(profile))
}

#[instrument(name = "HTTP: Update profile", skip(state, claims, payload), fields(user_id = %claims.sub))]
pub async fn update_me_handler(
    State(state): State<AppState>,
    claims: Claims,
    payload: Result<Json<ProfilePatch>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let Json(patch) = payload?;
    let profile = state
        .auth_service
        .update_profile(
            claims.user_id()?,
            patch.name.as_deref(),
            patch.password.as_deref(),
        )
        .await?;
    Ok(Json(profile))
}

impl<S> FromRequestParts<S> for Claims
where
    Arc<Keys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    #[instrument(name = "Extracting Claims", skip(state, parts))]
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<Keys>::from_ref(state);

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| {
                tracing::warn!("No bearer token in Authorization header");
                AuthError::InvalidToken
            })?;

        let token_data = decode::<Claims>(bearer.token(), &keys.decoding, &Validation::default())
            .map_err(|e| {
                tracing::warn!("JWT decoding failed: {:?}", e);
                AuthError::InvalidToken
            })?;

        Ok(token_data.claims)
    }
}
