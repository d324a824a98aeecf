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
use super::validation::{
    ENGAGEMENT_LEVELS, ENGAGEMENT_TYPES, PARTNER_TYPES, validate_choice, validate_id,
    validate_limit, validate_page_params,
};
use super::{
    ApiError, ApiResponse, AppState, EngagementDto, Paged, PartnerDetailDto, PartnerStats,
    TopPartnerDto, counts_to_map,
};
use crate::db::{EngagementInput, PartnerFilter, PartnerInput, PartnerUpdate};
use crate::entities::partners;
use crate::services::{AuditAction, EntityKind, FieldChange};

#[derive(Deserialize)]
pub struct PartnerListQuery {
    pub partner_type: Option<String>,
    pub engagement_level: Option<String>,
    pub industry: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize)]
pub struct PartnerCreateRequest {
    pub name: String,
    pub partner_type: String,
    #[serde(default)]
    pub description: String,
    pub website: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub primary_contact_name: String,
    #[serde(default)]
    pub primary_contact_email: String,
    #[serde(default)]
    pub primary_contact_phone: String,
    pub engagement_level: Option<String>,
    #[serde(default)]
    pub industry: String,
    pub employee_count: Option<i32>,
    pub partnership_start_date: Option<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Deserialize, Default)]
pub struct PartnerUpdateRequest {
    pub name: Option<String>,
    pub partner_type: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub primary_contact_name: Option<String>,
    pub primary_contact_email: Option<String>,
    pub primary_contact_phone: Option<String>,
    pub engagement_level: Option<String>,
    pub industry: Option<String>,
    pub employee_count: Option<i32>,
    pub partnership_start_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct TopEngagedQuery {
    pub limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct RecordEngagementRequest {
    pub alumni_id: i32,
    pub engagement_type: String,
    pub engagement_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
}

fn model_changes(old: &partners::Model, new: &partners::Model) -> Vec<FieldChange> {
    [
        FieldChange::of("name", &old.name, &new.name),
        FieldChange::of("partner_type", &old.partner_type, &new.partner_type),
        FieldChange::of("email", &old.email, &new.email),
        FieldChange::of(
            "engagement_level",
            &old.engagement_level,
            &new.engagement_level,
        ),
        FieldChange::of("industry", &old.industry, &new.industry),
        FieldChange::of(
            "primary_contact_name",
            &old.primary_contact_name,
            &new.primary_contact_name,
        ),
        FieldChange::of("notes", &old.notes, &new.notes),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// GET /partners
pub async fn list_partners(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Query(query): Query<PartnerListQuery>,
) -> Result<Json<ApiResponse<Paged<partners::Model>>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    let (page, page_size) = validate_page_params(query.page, query.page_size)?;

    let (items, total) = state
        .store()
        .list_partners(
            PartnerFilter {
                partner_type: query.partner_type,
                engagement_level: query.engagement_level,
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

/// POST /partners
pub async fn create_partner(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<PartnerCreateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<partners::Model>>), ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;

    let mut errors: BTreeMap<String, String> = BTreeMap::new();
    if payload.name.trim().is_empty() {
        errors.insert("name".into(), "Name is required.".into());
    } else if state.store().partner_name_taken(&payload.name, None).await? {
        errors.insert("name".into(), "Partner name already exists.".into());
    }
    if !PARTNER_TYPES.contains(&payload.partner_type.as_str()) {
        errors.insert(
            "partner_type".into(),
            format!("Must be one of: {}.", PARTNER_TYPES.join(", ")),
        );
    }
    if !payload.email.contains('@') {
        errors.insert("email".into(), "Enter a valid email address.".into());
    }
    let engagement_level = payload
        .engagement_level
        .unwrap_or_else(|| "prospective".to_string());
    if !ENGAGEMENT_LEVELS.contains(&engagement_level.as_str()) {
        errors.insert(
            "engagement_level".into(),
            format!("Must be one of: {}.", ENGAGEMENT_LEVELS.join(", ")),
        );
    }
    if !errors.is_empty() {
        return Err(ApiError::FieldErrors(errors));
    }

    let model = state
        .store()
        .create_partner(PartnerInput {
            name: payload.name,
            partner_type: payload.partner_type,
            description: payload.description,
            website: payload.website,
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
            city: payload.city,
            state: payload.state,
            country: payload.country,
            primary_contact_name: payload.primary_contact_name,
            primary_contact_email: payload.primary_contact_email,
            primary_contact_phone: payload.primary_contact_phone,
            engagement_level,
            industry: payload.industry,
            employee_count: payload.employee_count,
            partnership_start_date: payload.partnership_start_date,
            notes: payload.notes,
        })
        .await?;

    state
        .audit()
        .record(
            EntityKind::Partner,
            AuditAction::Created,
            Some((actor.id, &actor.username)),
            &model.name,
            &[],
        )
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(model))))
}

/// GET /partners/{id}
pub async fn get_partner(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PartnerDetailDto>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let model = state
        .store()
        .get_partner(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner", id))?;

    // Last 10 engagements, like the detail serializer
    let recent = state.store().list_engagements_for_partner(id, 10).await?;
    let engagement_count = state.store().count_engagements_for_partner(id).await?;

    let mut engagement_dtos = Vec::with_capacity(recent.len());
    for engagement in recent {
        let alumni_name = state
            .store()
            .get_alumni(engagement.alumni_id)
            .await?
            .map(|a| format!("{} {}", a.first_name, a.last_name));
        engagement_dtos.push(EngagementDto {
            engagement,
            alumni_name,
            partner_name: Some(model.name.clone()),
        });
    }

    Ok(Json(ApiResponse::success(PartnerDetailDto {
        partner: model,
        engagements: engagement_dtos,
        engagement_count,
    })))
}

/// PATCH /partners/{id}
pub async fn update_partner(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
    Json(payload): Json<PartnerUpdateRequest>,
) -> Result<Json<ApiResponse<partners::Model>>, ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let old = state
        .store()
        .get_partner(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner", id))?;

    let mut errors: BTreeMap<String, String> = BTreeMap::new();
    if let Some(name) = &payload.name
        && state.store().partner_name_taken(name, Some(id)).await?
    {
        errors.insert("name".into(), "Partner name already exists.".into());
    }
    if let Some(partner_type) = &payload.partner_type
        && !PARTNER_TYPES.contains(&partner_type.as_str())
    {
        errors.insert(
            "partner_type".into(),
            format!("Must be one of: {}.", PARTNER_TYPES.join(", ")),
        );
    }
    if let Some(level) = &payload.engagement_level
        && !ENGAGEMENT_LEVELS.contains(&level.as_str())
    {
        errors.insert(
            "engagement_level".into(),
            format!("Must be one of: {}.", ENGAGEMENT_LEVELS.join(", ")),
        );
    }
    if !errors.is_empty() {
        return Err(ApiError::FieldErrors(errors));
    }

    let updated = state
        .store()
        .update_partner(
            id,
            PartnerUpdate {
                name: payload.name,
                partner_type: payload.partner_type,
                description: payload.description,
                website: payload.website.map(Some),
                email: payload.email,
                phone: payload.phone,
                address: payload.address,
                city: payload.city,
                state: payload.state,
                country: payload.country,
                primary_contact_name: payload.primary_contact_name,
                primary_contact_email: payload.primary_contact_email,
                primary_contact_phone: payload.primary_contact_phone,
                engagement_level: payload.engagement_level,
                industry: payload.industry,
                employee_count: payload.employee_count.map(Some),
                partnership_start_date: payload.partnership_start_date.map(Some),
                notes: payload.notes,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Partner", id))?;

    state
        .audit()
        .record(
            EntityKind::Partner,
            AuditAction::Updated,
            Some((actor.id, &actor.username)),
            &updated.name,
            &model_changes(&old, &updated),
        )
        .await;

    Ok(Json(ApiResponse::success(updated)))
}

/// DELETE /partners/{id}
pub async fn delete_partner(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let model = state
        .store()
        .get_partner(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner", id))?;

    state.store().delete_partner(id).await?;

    state
        .audit()
        .record(
            EntityKind::Partner,
            AuditAction::Deleted,
            Some((actor.id, &actor.username)),
            &model.name,
            &[],
        )
        .await;

    Ok(Json(ApiResponse::success(())))
}

/// GET /partners/statistics
pub async fn partner_statistics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
) -> Result<Json<ApiResponse<PartnerStats>>, ApiError> {
    require_identity(&state, &headers, &session).await?;

    let total = state.store().count_partners().await?;
    let by_type = state.store().partner_counts_by_type().await?;
    let by_level = state.store().partner_counts_by_engagement_level().await?;
    let by_industry = state.store().partner_counts_by_industry().await?;

    Ok(Json(ApiResponse::success(PartnerStats {
        total_partners: total,
        by_type: counts_to_map(by_type),
        by_engagement_level: counts_to_map(by_level),
        by_industry: counts_to_map(by_industry),
    })))
}

/// GET /partners/top-engaged?limit=
pub async fn top_engaged(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Query(query): Query<TopEngagedQuery>,
) -> Result<Json<ApiResponse<Vec<TopPartnerDto>>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    let limit = validate_limit(query.limit.unwrap_or(10))?;

    let ranked = state.store().top_engaged_partners(limit).await?;
    let dtos = ranked
        .into_iter()
        .map(|(partner, engagement_count)| TopPartnerDto {
            partner,
            engagement_count,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /partners/{id}/engagements
/// Record an engagement between this partner and an alumnus.
pub async fn record_engagement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
    Json(payload): Json<RecordEngagementRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EngagementDto>>), ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;
    validate_id(id)?;
    validate_choice("engagement_type", &payload.engagement_type, ENGAGEMENT_TYPES)?;

    let partner = state
        .store()
        .get_partner(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner", id))?;

    let alumnus = state
        .store()
        .get_alumni(payload.alumni_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Alumni", payload.alumni_id))?;

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
