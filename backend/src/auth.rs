//! JWT authentication: registration, login, silent refresh, and the
//! [`AuthUser`] extractor that turns a bearer credential into explicit
//! per-request identity for the handlers downstream.
//!
//! Access tokens live 24 hours and carry the display identity; refresh
//! tokens live 7 days, carry only the user id, and are persisted on the user
//! row so a rotation invalidates the previous one.

use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::ApiError;
use uuid::Uuid;

use crate::database::{DatabaseError, User};
use crate::AppState;

const REFRESH_COOKIE: &str = "refreshToken";
const ACCESS_TOKEN_HOURS: i64 = 24;
const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub user_id: Uuid,
    pub full_name: String,
    pub partner_name: String,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub user_id: Uuid,
    pub exp: i64,
}

/// Verified principal for the current request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub full_name: String,
    pub partner_name: String,
}

pub fn issue_access_token(
    user_id: Uuid,
    full_name: &str,
    partner_name: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = AccessClaims {
        user_id,
        full_name: full_name.to_string(),
        partner_name: partner_name.to_string(),
        exp: (Utc::now() + Duration::hours(ACCESS_TOKEN_HOURS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn issue_refresh_token(
    user_id: Uuid,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = RefreshClaims {
        user_id,
        exp: (Utc::now() + Duration::days(REFRESH_TOKEN_DAYS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn decode_access_token(token: &str, secret: &str) -> Option<AccessClaims> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

fn decode_refresh_token(token: &str, secret: &str) -> Option<RefreshClaims> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

fn unauthorized(message: &str) -> (StatusCode, Json<ApiError>) {
    (StatusCode::UNAUTHORIZED, Json(ApiError::new(message)))
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        // Bearer header first, `token` cookie as fallback.
        let token = match bearer {
            Some(token) => token,
            None => CookieJar::from_headers(&parts.headers)
                .get("token")
                .map(|cookie| cookie.value().to_string())
                .ok_or_else(|| unauthorized("authentication required"))?,
        };

        let claims = decode_access_token(&token, &state.config.jwt_secret)
            .ok_or_else(|| unauthorized("invalid or expired token"))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            full_name: claims.full_name,
            partner_name: claims.partner_name,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub partner_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub full_name: String,
    pub partner_name: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            partner_name: user.partner_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: String,
    pub access_token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

fn refresh_cookie(token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::days(REFRESH_TOKEN_DAYS))
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, ""))
        .path("/")
        .build()
}

type AuthResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn internal_error(err: impl std::fmt::Display) -> (StatusCode, Json<ApiError>) {
    tracing::error!("auth failure: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new("internal server error")),
    )
}

async fn issue_session(
    state: &AppState,
    user: &User,
) -> Result<(String, String), (StatusCode, Json<ApiError>)> {
    let access_token = issue_access_token(
        user.id,
        &user.full_name,
        &user.partner_name,
        &state.config.jwt_secret,
    )
    .map_err(internal_error)?;
    let refresh_token =
        issue_refresh_token(user.id, &state.config.jwt_refresh_secret).map_err(internal_error)?;

    state
        .db
        .set_refresh_token(user.id, &refresh_token)
        .await
        .map_err(internal_error)?;

    Ok((access_token, refresh_token))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> AuthResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    if body.email.trim().is_empty() || body.password.is_empty() || body.full_name.trim().is_empty()
    {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("email, password and full name are required")),
        ));
    }

    let password_hash = bcrypt::hash(&body.password, bcrypt::DEFAULT_COST).map_err(internal_error)?;

    let user = state
        .db
        .create_user(&body.email, &password_hash, &body.full_name, &body.partner_name)
        .await
        .map_err(|err| match err {
            DatabaseError::EmailTaken => (
                StatusCode::CONFLICT,
                Json(ApiError::new("a user with this email already exists")),
            ),
            other => internal_error(other),
        })?;

    let (access_token, refresh_token) = issue_session(&state, &user).await?;

    Ok((
        StatusCode::CREATED,
        jar.add(refresh_cookie(refresh_token)),
        Json(AuthResponse {
            message: "user registered".to_string(),
            access_token,
            user: UserProfile::from(&user),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AuthResult<(CookieJar, Json<AuthResponse>)> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("email and password are required")),
        ));
    }

    let user = state
        .db
        .find_user_by_email(&body.email)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| unauthorized("invalid email or password"))?;

    let matches = bcrypt::verify(&body.password, &user.password_hash).map_err(internal_error)?;
    if !matches {
        return Err(unauthorized("invalid email or password"));
    }

    let (access_token, refresh_token) = issue_session(&state, &user).await?;

    Ok((
        jar.add(refresh_cookie(refresh_token)),
        Json(AuthResponse {
            message: "logged in".to_string(),
            access_token,
            user: UserProfile::from(&user),
        }),
    ))
}

/// POST /api/auth/refresh — silent token rotation.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> AuthResult<(CookieJar, Json<RefreshResponse>)> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| body.and_then(|Json(req)| req.refresh_token))
        .ok_or_else(|| unauthorized("no refresh token"))?;

    let forbidden = || {
        (
            StatusCode::FORBIDDEN,
            Json(ApiError::new("invalid refresh token")),
        )
    };

    let claims = decode_refresh_token(&presented, &state.config.jwt_refresh_secret)
        .ok_or_else(forbidden)?;

    let user = state
        .db
        .find_user_by_id(claims.user_id)
        .await
        .map_err(internal_error)?
        .filter(|user| user.refresh_token.as_deref() == Some(presented.as_str()))
        .ok_or_else(forbidden)?;

    let (access_token, refresh_token) = issue_session(&state, &user).await?;

    Ok((
        jar.add(refresh_cookie(refresh_token)),
        Json(RefreshResponse { access_token }),
    ))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AuthResult<Json<UserProfile>> {
    let user = state
        .db
        .find_user_by_id(user.user_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(ApiError::new("user not found"))))?;

    Ok(Json(UserProfile::from(&user)))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AuthResult<(CookieJar, Json<ApiError>)> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        state
            .db
            .clear_refresh_token(cookie.value())
            .await
            .map_err(internal_error)?;
    }

    Ok((
        jar.remove(removal_cookie()),
        Json(ApiError::new("logged out")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn access_token_round_trips_identity() {
        let user_id = Uuid::new_v4();
        let token = issue_access_token(user_id, "Dana Levi", "Noa", SECRET).expect("issue");
        let claims = decode_access_token(&token, SECRET).expect("decode");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.full_name, "Dana Levi");
        assert_eq!(claims.partner_name, "Noa");
    }

    #[test]
    fn access_token_rejects_wrong_secret() {
        let token = issue_access_token(Uuid::new_v4(), "Dana", "", SECRET).expect("issue");
        assert!(decode_access_token(&token, "other-secret").is_none());
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let token = issue_refresh_token(Uuid::new_v4(), SECRET).expect("issue");
        // Refresh claims lack the display fields an access token carries.
        assert!(decode_access_token(&token, SECRET).is_none());
        assert!(decode_refresh_token(&token, SECRET).is_some());
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert!(decode_access_token("not-a-jwt", SECRET).is_none());
        assert!(decode_refresh_token("", SECRET).is_none());
    }
}
