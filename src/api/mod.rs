use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

mod admin;
mod alumni;
pub mod auth;
mod engagements;
mod error;
mod observability;
mod partners;
mod profile;
mod reports;
mod stats;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn profile_service(&self) -> &Arc<dyn crate::services::ProfileService> {
        &self.shared.profile_service
    }

    #[must_use]
    pub fn report_service(&self) -> &crate::services::ReportService {
        &self.shared.report_service
    }

    #[must_use]
    pub fn export_service(&self) -> &crate::services::ExportService {
        &self.shared.export_service
    }

    #[must_use]
    pub fn audit(&self) -> &crate::services::AuditRecorder {
        &self.shared.audit
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.server.session_expiry_minutes,
        )));

    let cors_origins = config.server.cors_allowed_origins.clone();
    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let api_router = Router::new()
        .route("/stats", get(stats::site_stats))
        .route("/metrics", get(observability::get_metrics))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/user", get(auth::current_user))
        .route("/auth/account", patch(auth::update_account))
        .route("/auth/password", post(auth::change_password))
        .route(
            "/my-profile",
            get(profile::get_own_profile)
                .post(profile::create_own_profile)
                .patch(profile::update_own_profile),
        )
        .route(
            "/alumni",
            get(alumni::list_alumni).post(alumni::create_alumni),
        )
        .route("/alumni/statistics", get(alumni::alumni_statistics))
        .route("/alumni/search-by-company", get(alumni::search_by_company))
        .route(
            "/alumni/{id}",
            get(alumni::get_alumni)
                .patch(alumni::update_alumni)
                .delete(alumni::delete_alumni),
        )
        .route("/alumni/{id}/engagements", post(alumni::record_engagement))
        .route(
            "/partners",
            get(partners::list_partners).post(partners::create_partner),
        )
        .route("/partners/statistics", get(partners::partner_statistics))
        .route("/partners/top-engaged", get(partners::top_engaged))
        .route(
            "/partners/{id}",
            get(partners::get_partner)
                .patch(partners::update_partner)
                .delete(partners::delete_partner),
        )
        .route(
            "/partners/{id}/engagements",
            post(partners::record_engagement),
        )
        .route(
            "/engagements",
            get(engagements::list_engagements).post(engagements::create_engagement),
        )
        .route("/engagements/recent", get(engagements::recent_engagements))
        .route("/engagements/by-type", get(engagements::engagements_by_type))
        .route(
            "/engagements/{id}",
            get(engagements::get_engagement)
                .patch(engagements::update_engagement)
                .delete(engagements::delete_engagement),
        )
        .route("/reports", get(reports::list_reports))
        .route("/reports/generate", post(reports::generate_report))
        .route(
            "/reports/{id}",
            get(reports::get_report).delete(reports::delete_report),
        )
        .route("/reports/{id}/preview", get(reports::preview_report))
        .route("/reports/{id}/pdf", get(reports::download_report_pdf))
        .route("/admin/users", get(admin::list_users))
        .route(
            "/admin/users/{id}/toggle-status",
            post(admin::toggle_user_status),
        )
        .route("/admin/audit-logs", get(admin::list_audit_logs))
        .route("/admin/alumni/bulk-action", post(admin::alumni_bulk_action))
        .route(
            "/admin/partners/bulk-action",
            post(admin::partner_bulk_action),
        )
        .route("/admin/export/{kind}", get(admin::export_data))
        .layer(session_layer)
        .with_state(state);

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
