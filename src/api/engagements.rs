use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::require_identity;
use super::validation::{ENGAGEMENT_TYPES, validate_choice, validate_id, validate_limit, validate_page_params};
use super::{ApiError, ApiResponse, AppState, EngagementDto, Paged};
use crate::db::{EngagementFilter, EngagementInput, EngagementUpdate};
use crate::entities::engagements;
use crate::services::{AuditAction, EntityKind};

#[derive(Deserialize)]
pub struct EngagementListQuery {
    pub alumni: Option<i32>,
    pub partner: Option<i32>,
    pub engagement_type: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize)]
pub struct EngagementCreateRequest {
    pub alumni_id: i32,
    pub partner_id: i32,
    pub engagement_type: String,
    pub engagement_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Deserialize, Default)]
pub struct EngagementUpdateRequest {
    pub engagement_type: Option<String>,
    pub engagement_date: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct ByTypeQuery {
    #[serde(rename = "type")]
    pub engagement_type: String,
}

/// Resolve display names for a batch of engagements with two lookups per
/// referenced entity set instead of one per row.
async fn to_dtos(
    state: &AppState,
    rows: Vec<engagements::Model>,
) -> Result<Vec<EngagementDto>, ApiError> {
    let mut alumni_names: HashMap<i32, String> = HashMap::new();
    let mut partner_names: HashMap<i32, String> = HashMap::new();

    let mut dtos = Vec::with_capacity(rows.len());
    for engagement in rows {
        if !alumni_names.contains_key(&engagement.alumni_id)
            && let Some(alumnus) = state.store().get_alumni(engagement.alumni_id).await?
        {
            alumni_names.insert(
                engagement.alumni_id,
                format!("{} {}", alumnus.first_name, alumnus.last_name),
            );
        }
        if !partner_names.contains_key(&engagement.partner_id)
            && let Some(partner) = state.store().get_partner(engagement.partner_id).await?
        {
            partner_names.insert(engagement.partner_id, partner.name);
        }

        let alumni_name = alumni_names.get(&engagement.alumni_id).cloned();
        let partner_name = partner_names.get(&engagement.partner_id).cloned();
        dtos.push(EngagementDto {
            engagement,
            alumni_name,
            partner_name,
        });
    }

    Ok(dtos)
}

/// GET /engagements
pub async fn list_engagements(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Query(query): Query<EngagementListQuery>,
) -> Result<Json<ApiResponse<Paged<EngagementDto>>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    let (page, page_size) = validate_page_params(query.page, query.page_size)?;

    let (rows, total) = state
        .store()
        .list_engagements(
            EngagementFilter {
                alumni_id: query.alumni,
                partner_id: query.partner,
                engagement_type: query.engagement_type,
            },
            page,
            page_size,
        )
        .await?;

    Ok(Json(ApiResponse::success(Paged {
        items: to_dtos(&state, rows).await?,
        total,
        page,
        page_size,
    })))
}

/// POST /engagements
pub async fn create_engagement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<EngagementCreateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EngagementDto>>), ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;
    validate_choice("engagement_type", &payload.engagement_type, ENGAGEMENT_TYPES)?;

    let alumnus = state
        .store()
        .get_alumni(payload.alumni_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Alumni", payload.alumni_id))?;

    let partner = state
        .store()
        .get_partner(payload.partner_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner", payload.partner_id))?;

    let engagement = state
        .store()
        .create_engagement(EngagementInput {
            alumni_id: alumnus.id,
            partner_id: partner.id,
            engagement_type: payload.engagement_type,
            description: payload.description,
            engagement_date: payload.engagement_date,
            notes: payload.notes,
        })
        .await?;

    let alumni_name = format!("{} {}", alumnus.first_name, alumnus.last_name);

    state
        .audit()
        .record(
            EntityKind::Engagement,
            AuditAction::Created,
            Some((actor.id, &actor.username)),
            &format!("{} - {}", alumni_name, partner.name),
            &[],
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(EngagementDto {
            engagement,
            alumni_name: Some(alumni_name),
            partner_name: Some(partner.name),
        })),
    ))
}

/// GET /engagements/{id}
pub async fn get_engagement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<EngagementDto>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let engagement = state
        .store()
        .get_engagement(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Engagement", id))?;

    let mut dtos = to_dtos(&state, vec![engagement]).await?;
    let dto = dtos.pop().ok_or_else(|| ApiError::internal("Lost engagement row"))?;

    Ok(Json(ApiResponse::success(dto)))
}

/// PATCH /engagements/{id}
pub async fn update_engagement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
    Json(payload): Json<EngagementUpdateRequest>,
) -> Result<Json<ApiResponse<EngagementDto>>, ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    if let Some(engagement_type) = &payload.engagement_type {
        validate_choice("engagement_type", engagement_type, ENGAGEMENT_TYPES)?;
    }

    let updated = state
        .store()
        .update_engagement(
            id,
            EngagementUpdate {
                engagement_type: payload.engagement_type,
                description: payload.description,
                engagement_date: payload.engagement_date,
                notes: payload.notes,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Engagement", id))?;

    state
        .audit()
        .record(
            EntityKind::Engagement,
            AuditAction::Updated,
            Some((actor.id, &actor.username)),
            &format!("#{}", updated.id),
            &[],
        )
        .await;

    let mut dtos = to_dtos(&state, vec![updated]).await?;
    let dto = dtos.pop().ok_or_else(|| ApiError::internal("Lost engagement row"))?;

    Ok(Json(ApiResponse::success(dto)))
}

/// DELETE /engagements/{id}
pub async fn delete_engagement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let engagement = state
        .store()
        .get_engagement(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Engagement", id))?;

    state.store().delete_engagement(id).await?;

    state
        .audit()
        .record(
            EntityKind::Engagement,
            AuditAction::Deleted,
            Some((actor.id, &actor.username)),
            &format!("#{}", engagement.id),
            &[],
        )
        .await;

    Ok(Json(ApiResponse::success(())))
}

/// GET /engagements/recent?limit=
pub async fn recent_engagements(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Query(query): Query<RecentQuery>,
) -> Result<Json<ApiResponse<Vec<EngagementDto>>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    let limit = validate_limit(query.limit.unwrap_or(20))?;

    let rows = state.store().recent_engagements(limit).await?;

    Ok(Json(ApiResponse::success(to_dtos(&state, rows).await?)))
}

/// GET /engagements/by-type?type=
pub async fn engagements_by_type(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Query(query): Query<ByTypeQuery>,
) -> Result<Json<ApiResponse<Vec<EngagementDto>>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    validate_choice("type", &query.engagement_type, ENGAGEMENT_TYPES)?;

    let rows = state.store().engagements_by_type(&query.engagement_type).await?;

    Ok(Json(ApiResponse::success(to_dtos(&state, rows).await?)))
}
