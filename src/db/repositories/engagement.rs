use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::{engagements, prelude::*};

#[derive(Debug, Clone, Default)]
pub struct EngagementInput {
    pub alumni_id: i32,
    pub partner_id: i32,
    pub engagement_type: String,
    pub description: String,
    pub engagement_date: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default)]
pub struct EngagementUpdate {
    pub engagement_type: Option<String>,
    pub description: Option<String>,
    pub engagement_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EngagementFilter {
    pub alumni_id: Option<i32>,
    pub partner_id: Option<i32>,
    pub engagement_type: Option<String>,
}

pub struct EngagementRepository {
    conn: DatabaseConnection,
}

impl EngagementRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, input: EngagementInput) -> Result<engagements::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = engagements::ActiveModel {
            alumni_id: Set(input.alumni_id),
            partner_id: Set(input.partner_id),
            engagement_type: Set(input.engagement_type),
            description: Set(input.description),
            engagement_date: Set(input.engagement_date),
            notes: Set(input.notes),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert engagement")
    }

    pub async fn get(&self, id: i32) -> Result<Option<engagements::Model>> {
        Engagements::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query engagement by ID")
    }

    pub async fn list(
        &self,
        filter: EngagementFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<engagements::Model>, u64)> {
        let mut query = Engagements::find();

        if let Some(alumni_id) = filter.alumni_id {
            query = query.filter(engagements::Column::AlumniId.eq(alumni_id));
        }
        if let Some(partner_id) = filter.partner_id {
            query = query.filter(engagements::Column::PartnerId.eq(partner_id));
        }
        if let Some(engagement_type) = filter.engagement_type {
            query = query.filter(engagements::Column::EngagementType.eq(engagement_type));
        }

        let paginator = query
            .order_by_desc(engagements::Column::EngagementDate)
            .paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn list_for_alumni(&self, alumni_id: i32) -> Result<Vec<engagements::Model>> {
        Engagements::find()
            .filter(engagements::Column::AlumniId.eq(alumni_id))
            .order_by_desc(engagements::Column::EngagementDate)
            .all(&self.conn)
            .await
            .context("Failed to list engagements for alumni")
    }

    pub async fn list_for_partner(
        &self,
        partner_id: i32,
        limit: u64,
    ) -> Result<Vec<engagements::Model>> {
        Engagements::find()
            .filter(engagements::Column::PartnerId.eq(partner_id))
            .order_by_desc(engagements::Column::EngagementDate)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list engagements for partner")
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<engagements::Model>> {
        Engagements::find()
            .order_by_desc(engagements::Column::EngagementDate)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list recent engagements")
    }

    pub async fn by_type(&self, engagement_type: &str) -> Result<Vec<engagements::Model>> {
        Engagements::find()
            .filter(engagements::Column::EngagementType.eq(engagement_type))
            .order_by_desc(engagements::Column::EngagementDate)
            .all(&self.conn)
            .await
            .context("Failed to list engagements by type")
    }

    pub async fn list_all(&self) -> Result<Vec<engagements::Model>> {
        Engagements::find()
            .order_by_desc(engagements::Column::EngagementDate)
            .all(&self.conn)
            .await
            .context("Failed to list engagements")
    }

    pub async fn update(
        &self,
        id: i32,
        update: EngagementUpdate,
    ) -> Result<Option<engagements::Model>> {
        let Some(existing) = Engagements::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: engagements::ActiveModel = existing.into();
        if let Some(v) = update.engagement_type {
            active.engagement_type = Set(v);
        }
        if let Some(v) = update.description {
            active.description = Set(v);
        }
        if let Some(v) = update.engagement_date {
            active.engagement_date = Set(v);
        }
        if let Some(v) = update.notes {
            active.notes = Set(v);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Engagements::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        Engagements::find()
            .count(&self.conn)
            .await
            .context("Failed to count engagements")
    }

    pub async fn count_for_partner(&self, partner_id: i32) -> Result<u64> {
        Engagements::find()
            .filter(engagements::Column::PartnerId.eq(partner_id))
            .count(&self.conn)
            .await
            .context("Failed to count engagements for partner")
    }

    pub async fn counts_by_type(&self) -> Result<Vec<(String, i64)>> {
        Engagements::find()
            .select_only()
            .column(engagements::Column::EngagementType)
            .column_as(engagements::Column::Id.count(), "count")
            .group_by(engagements::Column::EngagementType)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to group engagements by type")
    }
}
