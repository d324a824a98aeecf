use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::require_identity;
use super::{ApiError, ApiResponse, AppState};
use crate::entities::alumni;
use crate::services::profile_service::ProfileWriteInput;

#[derive(Deserialize, Default)]
pub struct ProfileWriteRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub graduation_year: Option<i32>,
    pub current_company: Option<String>,
    pub job_title: Option<String>,
    pub industry: Option<String>,
    pub status: Option<String>,
    pub linkedin_url: Option<String>,
    pub bio: Option<String>,
}

impl From<ProfileWriteRequest> for ProfileWriteInput {
    fn from(req: ProfileWriteRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone.map(Some),
            degree: req.degree,
            field_of_study: req.field_of_study,
            graduation_year: req.graduation_year,
            current_company: req.current_company,
            job_title: req.job_title,
            industry: req.industry,
            status: req.status,
            linkedin_url: req.linkedin_url.map(Some),
            bio: req.bio,
        }
    }
}

/// GET /my-profile
pub async fn get_own_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
) -> Result<Json<ApiResponse<alumni::Model>>, ApiError> {
    let account = require_identity(&state, &headers, &session).await?;
    let profile = state.profile_service().get_own(account.id).await?;

    Ok(Json(ApiResponse::success(profile)))
}

/// POST /my-profile
/// Creates the caller's profile; a second call yields Conflict.
pub async fn create_own_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<ProfileWriteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<alumni::Model>>), ApiError> {
    let account = require_identity(&state, &headers, &session).await?;

    let profile = state
        .profile_service()
        .create_own(&account, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(profile))))
}

/// PATCH /my-profile
/// Partial merge into the linked profile.
pub async fn update_own_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<ProfileWriteRequest>,
) -> Result<Json<ApiResponse<alumni::Model>>, ApiError> {
    let account = require_identity(&state, &headers, &session).await?;

    let profile = state
        .profile_service()
        .update_own(account.id, payload.into())
        .await?;

    Ok(Json(ApiResponse::success(profile)))
}
