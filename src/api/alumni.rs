use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::require_identity;
use super::validation::{validate_choice, validate_id, validate_page_params, validate_search_query};
use super::{
    AlumniDetailDto, AlumniStats, ApiError, ApiResponse, AppState, EngagementDto, Paged,
    counts_to_map, year_counts_to_map,
};
use crate::db::{AlumniFilter, AlumniInput, AlumniUpdate, EngagementInput};
use crate::entities::{alumni, engagements};
use crate::services::profile_service_impl::PROFILE_STATUSES;
use crate::services::{AuditAction, EntityKind, FieldChange};

#[derive(Deserialize)]
pub struct AlumniListQuery {
    pub status: Option<String>,
    pub degree: Option<String>,
    pub graduation_year: Option<i32>,
    pub industry: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize)]
pub struct AlumniCreateRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub degree: String,
    pub field_of_study: String,
    pub graduation_year: i32,
    #[serde(default)]
    pub current_company: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub industry: String,
    pub status: Option<String>,
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub bio: String,
}

#[derive(Deserialize, Default)]
pub struct AlumniUpdateRequest {
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

#[derive(Deserialize)]
pub struct CompanyQuery {
    pub company: String,
}

#[derive(Deserialize)]
pub struct RecordEngagementRequest {
    pub partner_id: i32,
    pub engagement_type: String,
    pub engagement_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
}

fn display_label(model: &alumni::Model) -> String {
    format!("{} {}", model.first_name, model.last_name)
}

fn model_changes(old: &alumni::Model, new: &alumni::Model) -> Vec<FieldChange> {
    [
        FieldChange::of("first_name", &old.first_name, &new.first_name),
        FieldChange::of("last_name", &old.last_name, &new.last_name),
        FieldChange::of("email", &old.email, &new.email),
        FieldChange::of("degree", &old.degree, &new.degree),
        FieldChange::of("field_of_study", &old.field_of_study, &new.field_of_study),
        FieldChange::of(
            "graduation_year",
            &old.graduation_year.to_string(),
            &new.graduation_year.to_string(),
        ),
        FieldChange::of("current_company", &old.current_company, &new.current_company),
        FieldChange::of("job_title", &old.job_title, &new.job_title),
        FieldChange::of("industry", &old.industry, &new.industry),
        FieldChange::of("status", &old.status, &new.status),
        FieldChange::of("bio", &old.bio, &new.bio),
    ]
    .into_iter()
    .flatten()
    .collect()
}

async fn engagement_dto(
    state: &AppState,
    engagement: engagements::Model,
) -> Result<EngagementDto, ApiError> {
    let alumni_name = state
        .store()
        .get_alumni(engagement.alumni_id)
        .await?
        .map(|a| display_label(&a));
    let partner_name = state
        .store()
        .get_partner(engagement.partner_id)
        .await?
        .map(|p| p.name);

    Ok(EngagementDto {
        engagement,
        alumni_name,
        partner_name,
    })
}

/// GET /alumni
pub async fn list_alumni(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Query(query): Query<AlumniListQuery>,
) -> Result<Json<ApiResponse<Paged<alumni::Model>>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    let (page, page_size) = validate_page_params(query.page, query.page_size)?;

    let (items, total) = state
        .store()
        .list_alumni(
            AlumniFilter {
                status: query.status,
                degree: query.degree,
                graduation_year: query.graduation_year,
                industry: query.industry,
                search: query.search,
                ordering: query.ordering,
            },
            page,
            page_size,
        )
        .await?;

    Ok(Json(ApiResponse::success(Paged {
        items,
        total,
        page,
        page_size,
    })))
}

/// POST /alumni
pub async fn create_alumni(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<AlumniCreateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<alumni::Model>>), ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;

    let mut errors: BTreeMap<String, String> = BTreeMap::new();
    if payload.first_name.trim().is_empty() {
        errors.insert("first_name".into(), "First name is required.".into());
    }
    if payload.last_name.trim().is_empty() {
        errors.insert("last_name".into(), "Last name is required.".into());
    }
    if !payload.email.contains('@') {
        errors.insert("email".into(), "Enter a valid email address.".into());
    } else if state.store().alumni_email_taken(&payload.email, None).await? {
        errors.insert("email".into(), "Email already has an alumni profile.".into());
    }
    if payload.field_of_study.trim().is_empty() {
        errors.insert(
            "field_of_study".into(),
            "Please specify your field of study.".into(),
        );
    }
    let status = payload.status.unwrap_or_else(|| "active".to_string());
    if !PROFILE_STATUSES.contains(&status.as_str()) {
        errors.insert(
            "status".into(),
            format!("Status must be one of: {}.", PROFILE_STATUSES.join(", ")),
        );
    }
    if !errors.is_empty() {
        return Err(ApiError::FieldErrors(errors));
    }

    let model = state
        .store()
        .create_alumni(
            AlumniInput {
                first_name: payload.first_name,
                last_name: payload.last_name,
                email: payload.email,
                phone: payload.phone,
                degree: payload.degree,
                field_of_study: payload.field_of_study,
                graduation_year: payload.graduation_year,
                current_company: payload.current_company,
                job_title: payload.job_title,
                industry: payload.industry,
                status,
                linkedin_url: payload.linkedin_url,
                bio: payload.bio,
            },
            None,
        )
        .await?;

    state
        .audit()
        .record(
            EntityKind::Alumni,
            AuditAction::Created,
            Some((actor.id, &actor.username)),
            &display_label(&model),
            &[],
        )
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(model))))
}

/// GET /alumni/{id}
pub async fn get_alumni(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AlumniDetailDto>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let model = state
        .store()
        .get_alumni(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Alumni", id))?;

    let mut engagement_dtos = Vec::new();
    for engagement in state.store().list_engagements_for_alumni(id).await? {
        engagement_dtos.push(engagement_dto(&state, engagement).await?);
    }

    Ok(Json(ApiResponse::success(AlumniDetailDto {
        alumni: model,
        engagements: engagement_dtos,
    })))
}

/// PATCH /alumni/{id}
pub async fn update_alumni(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
    Json(payload): Json<AlumniUpdateRequest>,
) -> Result<Json<ApiResponse<alumni::Model>>, ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let old = state
        .store()
        .get_alumni(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Alumni", id))?;

    let mut errors: BTreeMap<String, String> = BTreeMap::new();
    if let Some(field_of_study) = &payload.field_of_study
        && field_of_study.trim().is_empty()
    {
        errors.insert(
            "field_of_study".into(),
            "Please specify your field of study.".into(),
        );
    }
    if let Some(status) = &payload.status
        && !PROFILE_STATUSES.contains(&status.as_str())
    {
        errors.insert(
            "status".into(),
            format!("Status must be one of: {}.", PROFILE_STATUSES.join(", ")),
        );
    }
    if let Some(email) = &payload.email
        && state.store().alumni_email_taken(email, Some(id)).await?
    {
        errors.insert("email".into(), "Email already has an alumni profile.".into());
    }
    if !errors.is_empty() {
        return Err(ApiError::FieldErrors(errors));
    }

    let updated = state
        .store()
        .update_alumni(
            id,
            AlumniUpdate {
                first_name: payload.first_name,
                last_name: payload.last_name,
                email: payload.email,
                phone: payload.phone.map(Some),
                degree: payload.degree,
                field_of_study: payload.field_of_study,
                graduation_year: payload.graduation_year,
                current_company: payload.current_company,
                job_title: payload.job_title,
                industry: payload.industry,
                status: payload.status,
                linkedin_url: payload.linkedin_url.map(Some),
                bio: payload.bio,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Alumni", id))?;

    state
        .audit()
        .record(
            EntityKind::Alumni,
            AuditAction::Updated,
            Some((actor.id, &actor.username)),
            &display_label(&updated),
            &model_changes(&old, &updated),
        )
        .await;

    Ok(Json(ApiResponse::success(updated)))
}

/// DELETE /alumni/{id}
pub async fn delete_alumni(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let model = state
        .store()
        .get_alumni(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Alumni", id))?;

    state.store().delete_alumni(id).await?;

    state
        .audit()
        .record(
            EntityKind::Alumni,
            AuditAction::Deleted,
            Some((actor.id, &actor.username)),
            &display_label(&model),
            &[],
        )
        .await;

    Ok(Json(ApiResponse::success(())))
}

/// GET /alumni/statistics
pub async fn alumni_statistics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
) -> Result<Json<ApiResponse<AlumniStats>>, ApiError> {
    require_identity(&state, &headers, &session).await?;

    let total = state.store().count_alumni().await?;
    let active = state.store().count_alumni_by_status("active").await?;
    let by_degree = state.store().alumni_counts_by_degree().await?;
    let by_year = state.store().alumni_counts_by_graduation_year().await?;
    let by_industry = state.store().alumni_counts_by_industry().await?;

    Ok(Json(ApiResponse::success(AlumniStats {
        total_alumni: total,
        active_alumni: active,
        by_degree: counts_to_map(by_degree),
        by_graduation_year: year_counts_to_map(by_year),
        by_industry: counts_to_map(by_industry),
    })))
}

/// GET /alumni/search-by-company?company=
pub async fn search_by_company(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Query(query): Query<CompanyQuery>,
) -> Result<Json<ApiResponse<Vec<alumni::Model>>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    let company = validate_search_query(&query.company)?;

    let results = state.store().search_alumni_by_company(company).await?;

    Ok(Json(ApiResponse::success(results)))
}

/// POST /alumni/{id}/engagements
/// Record an engagement between this alumnus and a partner.
pub async fn record_engagement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
    Json(payload): Json<RecordEngagementRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EngagementDto>>), ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;
    validate_id(id)?;
    validate_choice(
        "engagement_type",
        &payload.engagement_type,
        super::validation::ENGAGEMENT_TYPES,
    )?;

    let alumnus = state
        .store()
        .get_alumni(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Alumni", id))?;

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

    state
        .audit()
        .record(
            EntityKind::Engagement,
            AuditAction::Created,
            Some((actor.id, &actor.username)),
            &format!("{} - {}", display_label(&alumnus), partner.name),
            &[],
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(EngagementDto {
            engagement,
            alumni_name: Some(display_label(&alumnus)),
            partner_name: Some(partner.name),
        })),
    ))
}
