use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set};

use crate::entities::{audit_entries, prelude::*};

pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Append-only; entries are never updated or deleted by normal flow.
    pub async fn add(
        &self,
        title: &str,
        category: &str,
        description: &str,
        actor_id: Option<i32>,
    ) -> Result<()> {
        let active = audit_entries::ActiveModel {
            title: Set(title.to_string()),
            category: Set(category.to_string()),
            description: Set(description.to_string()),
            actor_id: Set(actor_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        AuditEntries::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to insert audit entry")?;

        Ok(())
    }

    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<audit_entries::Model>, u64)> {
        let paginator = AuditEntries::find()
            .order_by_desc(audit_entries::Column::Id)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn count(&self) -> Result<u64> {
        AuditEntries::find()
            .count(&self.conn)
            .await
            .context("Failed to count audit entries")
    }
}
