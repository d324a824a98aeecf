use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::require_identity;
use super::validation::{validate_id, validate_page_params};
use super::{ApiError, ApiResponse, AppState, Paged, ReportDto, ReportPreview};
use crate::entities::reports;
use crate::services::pdf::render_report_pdf;
use crate::services::{AuditAction, EntityKind, ReportKind, ReportService};

#[derive(Deserialize)]
pub struct ReportListQuery {
    pub report_type: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// The report kind arrives as a closed enum: an unknown value fails
/// deserialization with a 400 instead of being silently ignored.
#[derive(Deserialize)]
pub struct GenerateReportRequest {
    pub report_type: ReportKind,
}

async fn to_dto(state: &AppState, report: reports::Model) -> Result<ReportDto, ApiError> {
    let generated_by_name = match report.generated_by {
        Some(account_id) => state
            .store()
            .get_account(account_id)
            .await?
            .map(|a| a.username),
        None => None,
    };

    Ok(ReportDto {
        report,
        generated_by_name,
    })
}

/// GET /reports
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Query(query): Query<ReportListQuery>,
) -> Result<Json<ApiResponse<Paged<ReportDto>>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    let (page, page_size) = validate_page_params(query.page, query.page_size)?;

    let (rows, total) = state
        .store()
        .list_reports(query.report_type.as_deref(), page, page_size)
        .await?;

    let mut names: HashMap<i32, Option<String>> = HashMap::new();
    let mut items = Vec::with_capacity(rows.len());
    for report in rows {
        let generated_by_name = match report.generated_by {
            Some(account_id) => {
                if let Some(name) = names.get(&account_id) {
                    name.clone()
                } else {
                    let name = state
                        .store()
                        .get_account(account_id)
                        .await?
                        .map(|a| a.username);
                    names.insert(account_id, name.clone());
                    name
                }
            }
            None => None,
        };
        items.push(ReportDto {
            report,
            generated_by_name,
        });
    }

    Ok(Json(ApiResponse::success(Paged {
        items,
        total,
        page,
        page_size,
    })))
}

/// POST /reports/generate
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<GenerateReportRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReportDto>>), ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;

    let report = state
        .report_service()
        .generate(payload.report_type, Some(actor.id))
        .await?;

    state
        .audit()
        .record(
            EntityKind::Report,
            AuditAction::Created,
            Some((actor.id, &actor.username)),
            &report.title,
            &[],
        )
        .await;

    let dto = to_dto(&state, report).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

/// GET /reports/{id}
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ReportDto>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let report = state
        .store()
        .get_report(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Report", id))?;

    let dto = to_dto(&state, report).await?;

    Ok(Json(ApiResponse::success(dto)))
}

/// GET /reports/{id}/preview
/// Text-line rendering of the stored report payload.
pub async fn preview_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ReportPreview>>, ApiError> {
    require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let report = state
        .store()
        .get_report(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Report", id))?;

    let lines = ReportService::render_lines(&report);

    Ok(Json(ApiResponse::success(ReportPreview {
        title: report.title,
        lines,
    })))
}

/// GET /reports/{id}/pdf
/// PDF download; a missing PDF backend degrades to a clear 500.
pub async fn download_report_pdf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let report = state
        .store()
        .get_report(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Report", id))?;

    let lines = ReportService::render_lines(&report);
    let pdf = render_report_pdf(&report.title, &lines)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let response_headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"report_{}.pdf\"", report.id),
        ),
    ];

    Ok((response_headers, pdf).into_response())
}

/// DELETE /reports/{id}
pub async fn delete_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let actor = require_identity(&state, &headers, &session).await?;
    validate_id(id)?;

    let report = state
        .store()
        .get_report(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Report", id))?;

    state.store().delete_report(id).await?;

    state
        .audit()
        .record(
            EntityKind::Report,
            AuditAction::Deleted,
            Some((actor.id, &actor.username)),
            &report.title,
            &[],
        )
        .await;

    Ok(Json(ApiResponse::success(())))
}
