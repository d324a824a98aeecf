use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SiteStats};

/// GET /stats
/// Landing-page counts; no authentication required.
pub async fn site_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SiteStats>>, ApiError> {
    let alumni_count = state.store().count_alumni().await?;
    let partner_count = state.store().count_partners().await?;
    let engagement_count = state.store().count_engagements().await?;

    Ok(Json(ApiResponse::success(SiteStats {
        alumni_count,
        partner_count,
        engagement_count,
    })))
}
