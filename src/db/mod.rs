use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::account::{Account, AccountFieldUpdate};
pub use repositories::alumni::{AlumniFilter, AlumniInput, AlumniUpdate, ProfileCreateOutcome};
pub use repositories::engagement::{EngagementFilter, EngagementInput, EngagementUpdate};
pub use repositories::partner::{PartnerFilter, PartnerInput, PartnerUpdate};

use crate::entities::{alumni, audit_entries, engagements, partners, reports};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn alumni_repo(&self) -> repositories::alumni::AlumniRepository {
        repositories::alumni::AlumniRepository::new(self.conn.clone())
    }

    fn partner_repo(&self) -> repositories::partner::PartnerRepository {
        repositories::partner::PartnerRepository::new(self.conn.clone())
    }

    fn engagement_repo(&self) -> repositories::engagement::EngagementRepository {
        repositories::engagement::EngagementRepository::new(self.conn.clone())
    }

    fn report_repo(&self) -> repositories::report::ReportRepository {
        repositories::report::ReportRepository::new(self.conn.clone())
    }

    fn audit_repo(&self) -> repositories::audit::AuditRepository {
        repositories::audit::AuditRepository::new(self.conn.clone())
    }

    // -- accounts --

    pub async fn create_account(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Account> {
        self.account_repo()
            .create(username, email, password_hash, first_name, last_name)
            .await
    }

    pub async fn get_account(&self, id: i32) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_username(username).await
    }

    pub async fn find_account_by_username_ci(&self, username: &str) -> Result<Option<Account>> {
        self.account_repo().find_by_username_ci(username).await
    }

    pub async fn find_account_by_email_ci(&self, email: &str) -> Result<Option<Account>> {
        self.account_repo().find_by_email_ci(email).await
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Account>> {
        self.account_repo().authenticate(username, password).await
    }

    pub async fn verify_account_password(&self, account_id: i32, password: &str) -> Result<bool> {
        self.account_repo()
            .verify_password(account_id, password)
            .await
    }

    pub async fn update_account_fields(
        &self,
        id: i32,
        update: AccountFieldUpdate,
    ) -> Result<Account> {
        self.account_repo().update_fields(id, update).await
    }

    pub async fn update_account_password(&self, id: i32, new_hash: &str) -> Result<()> {
        self.account_repo().update_password(id, new_hash).await
    }

    pub async fn touch_last_login(&self, id: i32) -> Result<()> {
        self.account_repo().touch_last_login(id).await
    }

    pub async fn set_account_active(&self, id: i32, is_active: bool) -> Result<Account> {
        self.account_repo().set_active(id, is_active).await
    }

    pub async fn account_username_taken(
        &self,
        username: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool> {
        self.account_repo().username_taken(username, exclude_id).await
    }

    pub async fn account_email_taken(&self, email: &str, exclude_id: Option<i32>) -> Result<bool> {
        self.account_repo().email_taken(email, exclude_id).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_repo().list_all().await
    }

    // -- auth tokens --

    pub async fn get_or_create_token(&self, account_id: i32) -> Result<String> {
        self.token_repo().get_or_create(account_id).await
    }

    pub async fn find_account_by_token(&self, key: &str) -> Result<Option<Account>> {
        self.token_repo().find_account_by_key(key).await
    }

    pub async fn delete_token_for_account(&self, account_id: i32) -> Result<bool> {
        self.token_repo().delete_for_account(account_id).await
    }

    pub async fn regenerate_token(&self, account_id: i32) -> Result<String> {
        self.token_repo().regenerate(account_id).await
    }

    // -- alumni --

    pub async fn create_alumni(
        &self,
        input: AlumniInput,
        account_id: Option<i32>,
    ) -> Result<alumni::Model> {
        self.alumni_repo().create(input, account_id).await
    }

    pub async fn create_alumni_for_account(
        &self,
        account_id: i32,
        input: AlumniInput,
    ) -> Result<ProfileCreateOutcome> {
        self.alumni_repo().create_for_account(account_id, input).await
    }

    pub async fn get_alumni(&self, id: i32) -> Result<Option<alumni::Model>> {
        self.alumni_repo().get(id).await
    }

    pub async fn get_alumni_by_account(&self, account_id: i32) -> Result<Option<alumni::Model>> {
        self.alumni_repo().get_by_account(account_id).await
    }

    pub async fn alumni_exists_for_account(&self, account_id: i32) -> Result<bool> {
        self.alumni_repo().exists_for_account(account_id).await
    }

    pub async fn alumni_email_taken(&self, email: &str, exclude_id: Option<i32>) -> Result<bool> {
        self.alumni_repo().email_taken(email, exclude_id).await
    }

    pub async fn list_alumni(
        &self,
        filter: AlumniFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<alumni::Model>, u64)> {
        self.alumni_repo().list(filter, page, page_size).await
    }

    pub async fn list_all_alumni(&self) -> Result<Vec<alumni::Model>> {
        self.alumni_repo().list_all().await
    }

    pub async fn search_alumni_by_company(&self, company: &str) -> Result<Vec<alumni::Model>> {
        self.alumni_repo().search_by_company(company).await
    }

    pub async fn update_alumni(
        &self,
        id: i32,
        update: AlumniUpdate,
    ) -> Result<Option<alumni::Model>> {
        self.alumni_repo().update(id, update).await
    }

    pub async fn delete_alumni(&self, id: i32) -> Result<bool> {
        self.alumni_repo().delete(id).await
    }

    pub async fn count_alumni(&self) -> Result<u64> {
        self.alumni_repo().count().await
    }

    pub async fn count_alumni_by_status(&self, status: &str) -> Result<u64> {
        self.alumni_repo().count_by_status(status).await
    }

    pub async fn alumni_counts_by_degree(&self) -> Result<Vec<(String, i64)>> {
        self.alumni_repo().counts_by_degree().await
    }

    pub async fn alumni_counts_by_graduation_year(&self) -> Result<Vec<(i32, i64)>> {
        self.alumni_repo().counts_by_graduation_year().await
    }

    pub async fn alumni_counts_by_industry(&self) -> Result<Vec<(String, i64)>> {
        self.alumni_repo().counts_by_industry().await
    }

    pub async fn bulk_update_alumni_status(
        &self,
        ids: Option<&[i32]>,
        from: Option<&str>,
        to: &str,
    ) -> Result<u64> {
        self.alumni_repo().bulk_update_status(ids, from, to).await
    }

    pub async fn bulk_touch_alumni_engagement(&self, ids: Option<&[i32]>) -> Result<u64> {
        self.alumni_repo().bulk_touch_last_engagement(ids).await
    }

    pub async fn bulk_delete_alumni(&self, ids: &[i32]) -> Result<u64> {
        self.alumni_repo().bulk_delete(ids).await
    }

    // -- partners --

    pub async fn create_partner(&self, input: PartnerInput) -> Result<partners::Model> {
        self.partner_repo().create(input).await
    }

    pub async fn get_partner(&self, id: i32) -> Result<Option<partners::Model>> {
        self.partner_repo().get(id).await
    }

    pub async fn partner_name_taken(&self, name: &str, exclude_id: Option<i32>) -> Result<bool> {
        self.partner_repo().name_taken(name, exclude_id).await
    }

    pub async fn list_partners(
        &self,
        filter: PartnerFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<partners::Model>, u64)> {
        self.partner_repo().list(filter, page, page_size).await
    }

    pub async fn list_all_partners(&self) -> Result<Vec<partners::Model>> {
        self.partner_repo().list_all().await
    }

    pub async fn update_partner(
        &self,
        id: i32,
        update: PartnerUpdate,
    ) -> Result<Option<partners::Model>> {
        self.partner_repo().update(id, update).await
    }

    pub async fn delete_partner(&self, id: i32) -> Result<bool> {
        self.partner_repo().delete(id).await
    }

    pub async fn count_partners(&self) -> Result<u64> {
        self.partner_repo().count().await
    }

    pub async fn partner_counts_by_type(&self) -> Result<Vec<(String, i64)>> {
        self.partner_repo().counts_by_type().await
    }

    pub async fn partner_counts_by_engagement_level(&self) -> Result<Vec<(String, i64)>> {
        self.partner_repo().counts_by_engagement_level().await
    }

    pub async fn partner_counts_by_industry(&self) -> Result<Vec<(String, i64)>> {
        self.partner_repo().counts_by_industry().await
    }

    pub async fn top_engaged_partners(&self, limit: u64) -> Result<Vec<(partners::Model, i64)>> {
        self.partner_repo().top_engaged(limit).await
    }

    pub async fn bulk_update_partner_engagement_level(
        &self,
        ids: Option<&[i32]>,
        from: Option<&str>,
        to: &str,
    ) -> Result<u64> {
        self.partner_repo()
            .bulk_update_engagement_level(ids, from, to)
            .await
    }

    pub async fn bulk_delete_partners(&self, ids: &[i32]) -> Result<u64> {
        self.partner_repo().bulk_delete(ids).await
    }

    // -- engagements --

    pub async fn create_engagement(&self, input: EngagementInput) -> Result<engagements::Model> {
        self.engagement_repo().create(input).await
    }

    pub async fn get_engagement(&self, id: i32) -> Result<Option<engagements::Model>> {
        self.engagement_repo().get(id).await
    }

    pub async fn list_engagements(
        &self,
        filter: EngagementFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<engagements::Model>, u64)> {
        self.engagement_repo().list(filter, page, page_size).await
    }

    pub async fn list_engagements_for_alumni(
        &self,
        alumni_id: i32,
    ) -> Result<Vec<engagements::Model>> {
        self.engagement_repo().list_for_alumni(alumni_id).await
    }

    pub async fn list_engagements_for_partner(
        &self,
        partner_id: i32,
        limit: u64,
    ) -> Result<Vec<engagements::Model>> {
        self.engagement_repo()
            .list_for_partner(partner_id, limit)
            .await
    }

    pub async fn recent_engagements(&self, limit: u64) -> Result<Vec<engagements::Model>> {
        self.engagement_repo().recent(limit).await
    }

    pub async fn engagements_by_type(
        &self,
        engagement_type: &str,
    ) -> Result<Vec<engagements::Model>> {
        self.engagement_repo().by_type(engagement_type).await
    }

    pub async fn list_all_engagements(&self) -> Result<Vec<engagements::Model>> {
        self.engagement_repo().list_all().await
    }

    pub async fn update_engagement(
        &self,
        id: i32,
        update: EngagementUpdate,
    ) -> Result<Option<engagements::Model>> {
        self.engagement_repo().update(id, update).await
    }

    pub async fn delete_engagement(&self, id: i32) -> Result<bool> {
        self.engagement_repo().delete(id).await
    }

    pub async fn count_engagements(&self) -> Result<u64> {
        self.engagement_repo().count().await
    }

    pub async fn count_engagements_for_partner(&self, partner_id: i32) -> Result<u64> {
        self.engagement_repo().count_for_partner(partner_id).await
    }

    pub async fn engagement_counts_by_type(&self) -> Result<Vec<(String, i64)>> {
        self.engagement_repo().counts_by_type().await
    }

    // -- reports --

    pub async fn create_report(
        &self,
        title: &str,
        report_type: &str,
        description: &str,
        data: serde_json::Value,
        generated_by: Option<i32>,
    ) -> Result<reports::Model> {
        self.report_repo()
            .create(title, report_type, description, data, generated_by)
            .await
    }

    pub async fn get_report(&self, id: i32) -> Result<Option<reports::Model>> {
        self.report_repo().get(id).await
    }

    pub async fn list_reports(
        &self,
        report_type: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<reports::Model>, u64)> {
        self.report_repo().list(report_type, page, page_size).await
    }

    pub async fn delete_report(&self, id: i32) -> Result<bool> {
        self.report_repo().delete(id).await
    }

    // -- audit --

    pub async fn add_audit_entry(
        &self,
        title: &str,
        category: &str,
        description: &str,
        actor_id: Option<i32>,
    ) -> Result<()> {
        self.audit_repo()
            .add(title, category, description, actor_id)
            .await
    }

    pub async fn list_audit_entries(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<audit_entries::Model>, u64)> {
        self.audit_repo().list(page, page_size).await
    }

    pub async fn count_audit_entries(&self) -> Result<u64> {
        self.audit_repo().count().await
    }
}
