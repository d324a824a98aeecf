use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{prelude::*, reports};

pub struct ReportRepository {
    conn: DatabaseConnection,
}

impl ReportRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        title: &str,
        report_type: &str,
        description: &str,
        data: serde_json::Value,
        generated_by: Option<i32>,
    ) -> Result<reports::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = reports::ActiveModel {
            title: Set(title.to_string()),
            report_type: Set(report_type.to_string()),
            description: Set(description.to_string()),
            data: Set(data),
            generated_by: Set(generated_by),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert report")
    }

    pub async fn get(&self, id: i32) -> Result<Option<reports::Model>> {
        Reports::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query report by ID")
    }

    pub async fn list(
        &self,
        report_type: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<reports::Model>, u64)> {
        let mut query = Reports::find().order_by_desc(reports::Column::CreatedAt);

        if let Some(report_type) = report_type {
            query = query.filter(reports::Column::ReportType.eq(report_type));
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Reports::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
