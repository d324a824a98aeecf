use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, AuthPayload, CurrentUserPayload, MessageResponse};
use crate::services::auth_service::{AccountInfo, AccountUpdateInput, RegisterInput};

const SESSION_ACCOUNT_KEY: &str = "account_id";

// ============================================================================
// Request types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or email; email lookup is case-insensitive.
    #[serde(alias = "username")]
    pub identifier: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct AccountUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password2: String,
}

// ============================================================================
// Identity resolution
// ============================================================================

/// How the acting identity was established. A bearer token always wins over
/// the ambient session; a present-but-unknown token is a hard 401 with no
/// session fallback.
pub enum ResolvedIdentity {
    Token(AccountInfo),
    Session(AccountInfo),
    Anonymous,
}

impl ResolvedIdentity {
    #[must_use]
    pub fn account(self) -> Option<AccountInfo> {
        match self {
            Self::Token(account) | Self::Session(account) => Some(account),
            Self::Anonymous => None,
        }
    }
}

/// Extract a bearer-style token from the Authorization header.
/// Both `Token <key>` and `Bearer <key>` prefixes are accepted.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?;

    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

pub async fn resolve_identity(
    state: &AppState,
    headers: &HeaderMap,
    session: &Session,
) -> Result<ResolvedIdentity, ApiError> {
    if let Some(key) = bearer_token(headers) {
        return match state.auth_service().resolve_token(&key).await? {
            Some(account) => Ok(ResolvedIdentity::Token(account)),
            None => Err(ApiError::Unauthorized("Invalid token".to_string())),
        };
    }

    let account_id = session
        .get::<i32>(SESSION_ACCOUNT_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    if let Some(account_id) = account_id
        && let Some(account) = state.store().get_account(account_id).await?
        && account.is_active
    {
        return Ok(ResolvedIdentity::Session(account.into()));
    }

    Ok(ResolvedIdentity::Anonymous)
}

/// Resolve the identity or fail with 401.
pub async fn require_identity(
    state: &AppState,
    headers: &HeaderMap,
    session: &Session,
) -> Result<AccountInfo, ApiError> {
    resolve_identity(state, headers, session)
        .await?
        .account()
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}

/// Resolve the identity and require the staff flag, or fail with 401/403.
pub async fn require_staff(
    state: &AppState,
    headers: &HeaderMap,
    session: &Session,
) -> Result<AccountInfo, ApiError> {
    let account = require_identity(state, headers, session).await?;
    if account.is_staff || account.is_superuser {
        Ok(account)
    } else {
        Err(ApiError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account (no alumni profile yet), returns the token on success.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthPayload>>), ApiError> {
    let result = state
        .auth_service()
        .register(RegisterInput {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            password2: payload.password2,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthPayload {
            token: result.token,
            user: result.account,
            alumni: None,
        })),
    ))
}

/// POST /auth/login
/// Resolve credentials, establish the session, and return the token
/// together with the linked alumni profile when one exists.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthPayload>>, ApiError> {
    if payload.identifier.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .login(&payload.identifier, &payload.password)
        .await?;

    session
        .insert(SESSION_ACCOUNT_KEY, result.account.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    let alumni = state.store().get_alumni_by_account(result.account.id).await?;

    Ok(Json(ApiResponse::success(AuthPayload {
        token: result.token,
        user: result.account,
        alumni,
    })))
}

/// POST /auth/logout
/// Token-authenticated logout revokes the token; a plain session logout only
/// clears the session so API clients keep their token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    match resolve_identity(&state, &headers, &session).await? {
        ResolvedIdentity::Token(account) => {
            let deleted = state.auth_service().revoke_token(account.id).await?;
            let _ = session.flush().await;
            if deleted {
                Ok(Json(ApiResponse::success(MessageResponse {
                    message: "Logout successful".to_string(),
                })))
            } else {
                Err(ApiError::NotFound("Token not found".to_string()))
            }
        }
        ResolvedIdentity::Session(_) => {
            let _ = session.flush().await;
            Ok(Json(ApiResponse::success(MessageResponse {
                message: "Logout successful".to_string(),
            })))
        }
        ResolvedIdentity::Anonymous => {
            Err(ApiError::Unauthorized("Not authenticated".to_string()))
        }
    }
}

/// GET /auth/user
/// Current identity, bearer token taking precedence over the session.
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
) -> Result<Json<ApiResponse<CurrentUserPayload>>, ApiError> {
    let account = require_identity(&state, &headers, &session).await?;
    let alumni = state.store().get_alumni_by_account(account.id).await?;

    Ok(Json(ApiResponse::success(CurrentUserPayload {
        user: account,
        alumni,
    })))
}

/// PATCH /auth/account
/// Allow-listed account field updates with duplicate checks.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<AccountUpdateRequest>,
) -> Result<Json<ApiResponse<AccountInfo>>, ApiError> {
    let account = require_identity(&state, &headers, &session).await?;

    let updated = state
        .auth_service()
        .update_account(
            account.id,
            AccountUpdateInput {
                first_name: payload.first_name,
                last_name: payload.last_name,
                email: payload.email,
                username: payload.username,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(updated)))
}

/// POST /auth/password
/// Change password; requires the current password and a matching new pair.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let account = require_identity(&state, &headers, &session).await?;

    state
        .auth_service()
        .change_password(
            account.id,
            &payload.current_password,
            &payload.new_password,
            &payload.new_password2,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}
