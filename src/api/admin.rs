use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::require_staff;
use super::validation::{ENGAGEMENT_LEVELS, validate_id, validate_page_params};
use super::{ApiError, ApiResponse, AppState, BulkActionResult, Paged};
use crate::entities::audit_entries;
use crate::services::profile_service_impl::PROFILE_STATUSES;
use crate::services::{AccountInfo, AuditAction, EntityKind, ExportKind, FieldChange};

#[derive(Deserialize)]
pub struct AuditLogQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Closed set of bulk actions on alumni; an unmatched action string fails
/// deserialization rather than being silently ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AlumniBulkAction {
    SetStatus {
        ids: Option<Vec<i32>>,
        from: Option<String>,
        to: String,
    },
    MarkEngaged {
        ids: Option<Vec<i32>>,
    },
    Delete {
        ids: Vec<i32>,
    },
}

/// Closed set of bulk actions on partners.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PartnerBulkAction {
    SetEngagementLevel {
        ids: Option<Vec<i32>>,
        from: Option<String>,
        to: String,
    },
    Delete {
        ids: Vec<i32>,
    },
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
) -> Result<Json<ApiResponse<Vec<AccountInfo>>>, ApiError> {
    require_staff(&state, &headers, &session).await?;

    let accounts = state.store().list_accounts().await?;
    let users = accounts.into_iter().map(AccountInfo::from).collect();

    Ok(Json(ApiResponse::success(users)))
}

/// POST /admin/users/{id}/toggle-status
/// Flip the active flag; accounts are deactivated, never hard-deleted.
pub async fn toggle_user_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AccountInfo>>, ApiError> {
    let actor = require_staff(&state, &headers, &session).await?;
    validate_id(id)?;

    if actor.id == id {
        return Err(ApiError::validation("You cannot deactivate your own account"));
    }

    let account = state
        .store()
        .get_account(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account", id))?;

    let was_active = account.is_active;
    let updated = state.store().set_account_active(id, !was_active).await?;

    let change = FieldChange::of(
        "is_active",
        &was_active.to_string(),
        &updated.is_active.to_string(),
    );
    let changes: Vec<FieldChange> = change.into_iter().collect();

    state
        .audit()
        .record(
            EntityKind::Account,
            AuditAction::StatusToggled,
            Some((actor.id, &actor.username)),
            &updated.username,
            &changes,
        )
        .await;

    Ok(Json(ApiResponse::success(AccountInfo::from(updated))))
}

/// GET /admin/audit-logs
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<ApiResponse<Paged<audit_entries::Model>>>, ApiError> {
    require_staff(&state, &headers, &session).await?;
    let (page, page_size) = validate_page_params(query.page, query.page_size)?;

    let (items, total) = state.store().list_audit_entries(page, page_size).await?;

    Ok(Json(ApiResponse::success(Paged {
        items,
        total,
        page,
        page_size,
    })))
}

/// POST /admin/alumni/bulk-action
/// Dispatches on the closed action enum; returns the number of rows touched
/// and records exactly one audit entry describing the whole action.
pub async fn alumni_bulk_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(action): Json<AlumniBulkAction>,
) -> Result<Json<ApiResponse<BulkActionResult>>, ApiError> {
    let actor = require_staff(&state, &headers, &session).await?;

    let (updated, label) = match action {
        AlumniBulkAction::SetStatus { ids, from, to } => {
            if !PROFILE_STATUSES.contains(&to.as_str()) {
                return Err(ApiError::field(
                    "to",
                    &format!("Status must be one of: {}.", PROFILE_STATUSES.join(", ")),
                ));
            }
            if let Some(from) = &from
                && !PROFILE_STATUSES.contains(&from.as_str())
            {
                return Err(ApiError::field(
                    "from",
                    &format!("Status must be one of: {}.", PROFILE_STATUSES.join(", ")),
                ));
            }

            let updated = state
                .store()
                .bulk_update_alumni_status(ids.as_deref(), from.as_deref(), &to)
                .await?;

            let label = from.map_or_else(
                || format!("set status '{to}'"),
                |from| format!("status '{from}' -> '{to}'"),
            );
            (updated, label)
        }
        AlumniBulkAction::MarkEngaged { ids } => {
            let updated = state
                .store()
                .bulk_touch_alumni_engagement(ids.as_deref())
                .await?;
            (updated, "marked engaged".to_string())
        }
        AlumniBulkAction::Delete { ids } => {
            if ids.is_empty() {
                return Err(ApiError::validation("ids must not be empty"));
            }
            let updated = state.store().bulk_delete_alumni(&ids).await?;
            (updated, format!("deleted {} row(s)", ids.len()))
        }
    };

    state
        .audit()
        .record(
            EntityKind::Alumni,
            AuditAction::BulkAction,
            Some((actor.id, &actor.username)),
            &format!("{label} ({updated} rows)"),
            &[],
        )
        .await;

    Ok(Json(ApiResponse::success(BulkActionResult { updated })))
}

/// POST /admin/partners/bulk-action
pub async fn partner_bulk_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(action): Json<PartnerBulkAction>,
) -> Result<Json<ApiResponse<BulkActionResult>>, ApiError> {
    let actor = require_staff(&state, &headers, &session).await?;

    let (updated, label) = match action {
        PartnerBulkAction::SetEngagementLevel { ids, from, to } => {
            if !ENGAGEMENT_LEVELS.contains(&to.as_str()) {
                return Err(ApiError::field(
                    "to",
                    &format!("Must be one of: {}.", ENGAGEMENT_LEVELS.join(", ")),
                ));
            }

            let updated = state
                .store()
                .bulk_update_partner_engagement_level(ids.as_deref(), from.as_deref(), &to)
                .await?;

            let label = from.map_or_else(
                || format!("set engagement level '{to}'"),
                |from| format!("engagement level '{from}' -> '{to}'"),
            );
            (updated, label)
        }
        PartnerBulkAction::Delete { ids } => {
            if ids.is_empty() {
                return Err(ApiError::validation("ids must not be empty"));
            }
            let updated = state.store().bulk_delete_partners(&ids).await?;
            (updated, format!("deleted {} row(s)", ids.len()))
        }
    };

    state
        .audit()
        .record(
            EntityKind::Partner,
            AuditAction::BulkAction,
            Some((actor.id, &actor.username)),
            &format!("{label} ({updated} rows)"),
            &[],
        )
        .await;

    Ok(Json(ApiResponse::success(BulkActionResult { updated })))
}

/// GET /admin/export/{kind}
/// CSV attachment; columns come from the admin registry.
pub async fn export_data(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Path(kind): Path<String>,
) -> Result<Response, ApiError> {
    require_staff(&state, &headers, &session).await?;

    let kind: ExportKind = kind
        .parse()
        .map_err(|()| ApiError::validation(format!("Unknown export type: {kind}")))?;

    let csv = state.export_service().export_csv(kind).await?;

    let response_headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", kind.filename()),
        ),
    ];

    Ok((response_headers, csv).into_response())
}
