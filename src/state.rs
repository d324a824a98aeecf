use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AdminRegistry, AuditRecorder, AuthService, ExportService, ProfileService, ReportService,
    SeaOrmAuthService, SeaOrmProfileService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub profile_service: Arc<dyn ProfileService>,

    pub report_service: ReportService,

    pub export_service: ExportService,

    pub audit: AuditRecorder,

    pub registry: Arc<AdminRegistry>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let registry = Arc::new(AdminRegistry::new());

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let profile_service =
            Arc::new(SeaOrmProfileService::new(store.clone())) as Arc<dyn ProfileService>;

        let report_service = ReportService::new(store.clone());
        let export_service = ExportService::new(store.clone(), registry.clone());
        let audit = AuditRecorder::new(store.clone());

        Ok(Self {
            config,
            store,
            auth_service,
            profile_service,
            report_service,
            export_service,
            audit,
            registry,
        })
    }
}
