use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;

use crate::entities::{engagements, partners, prelude::*};

#[derive(Debug, Clone, Default)]
pub struct PartnerInput {
    pub name: String,
    pub partner_type: String,
    pub description: String,
    pub website: Option<String>,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub primary_contact_name: String,
    pub primary_contact_email: String,
    pub primary_contact_phone: String,
    pub engagement_level: String,
    pub industry: String,
    pub employee_count: Option<i32>,
    pub partnership_start_date: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Default)]
pub struct PartnerUpdate {
    pub name: Option<String>,
    pub partner_type: Option<String>,
    pub description: Option<String>,
    pub website: Option<Option<String>>,
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
    pub employee_count: Option<Option<i32>>,
    pub partnership_start_date: Option<Option<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PartnerFilter {
    pub partner_type: Option<String>,
    pub engagement_level: Option<String>,
    pub industry: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

pub struct PartnerRepository {
    conn: DatabaseConnection,
}

impl PartnerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, input: PartnerInput) -> Result<partners::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = partners::ActiveModel {
            name: Set(input.name),
            partner_type: Set(input.partner_type),
            description: Set(input.description),
            website: Set(input.website),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            city: Set(input.city),
            state: Set(input.state),
            country: Set(input.country),
            primary_contact_name: Set(input.primary_contact_name),
            primary_contact_email: Set(input.primary_contact_email),
            primary_contact_phone: Set(input.primary_contact_phone),
            engagement_level: Set(input.engagement_level),
            industry: Set(input.industry),
            employee_count: Set(input.employee_count),
            partnership_start_date: Set(input.partnership_start_date),
            notes: Set(input.notes),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            last_engagement: Set(None),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert partner")
    }

    pub async fn get(&self, id: i32) -> Result<Option<partners::Model>> {
        Partners::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query partner by ID")
    }

    pub async fn name_taken(&self, name: &str, exclude_id: Option<i32>) -> Result<bool> {
        let mut query = Partners::find().filter(
            Expr::expr(Func::lower(Expr::col(partners::Column::Name))).eq(name.to_lowercase()),
        );
        if let Some(id) = exclude_id {
            query = query.filter(partners::Column::Id.ne(id));
        }

        Ok(query.one(&self.conn).await?.is_some())
    }

    pub async fn list(
        &self,
        filter: PartnerFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<partners::Model>, u64)> {
        let mut query = Partners::find();

        if let Some(partner_type) = filter.partner_type {
            query = query.filter(partners::Column::PartnerType.eq(partner_type));
        }
        if let Some(level) = filter.engagement_level {
            query = query.filter(partners::Column::EngagementLevel.eq(level));
        }
        if let Some(industry) = filter.industry {
            query = query.filter(partners::Column::Industry.eq(industry));
        }
        if let Some(search) = filter.search {
            query = query.filter(
                Condition::any()
                    .add(partners::Column::Name.contains(&search))
                    .add(partners::Column::Email.contains(&search))
                    .add(partners::Column::PrimaryContactName.contains(&search))
                    .add(partners::Column::Industry.contains(&search)),
            );
        }

        query = match filter.ordering.as_deref() {
            Some("created_at") => query.order_by_asc(partners::Column::CreatedAt),
            Some("engagement_level") => query.order_by_asc(partners::Column::EngagementLevel),
            Some("-engagement_level") => query.order_by_desc(partners::Column::EngagementLevel),
            Some("last_engagement") => query.order_by_asc(partners::Column::LastEngagement),
            Some("-last_engagement") => query.order_by_desc(partners::Column::LastEngagement),
            _ => query.order_by_desc(partners::Column::CreatedAt),
        };

        let paginator = query.paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn list_all(&self) -> Result<Vec<partners::Model>> {
        Partners::find()
            .order_by_desc(partners::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list partners")
    }

    pub async fn update(&self, id: i32, update: PartnerUpdate) -> Result<Option<partners::Model>> {
        let Some(existing) = Partners::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: partners::ActiveModel = existing.into();
        if let Some(v) = update.name {
            active.name = Set(v);
        }
        if let Some(v) = update.partner_type {
            active.partner_type = Set(v);
        }
        if let Some(v) = update.description {
            active.description = Set(v);
        }
        if let Some(v) = update.website {
            active.website = Set(v);
        }
        if let Some(v) = update.email {
            active.email = Set(v);
        }
        if let Some(v) = update.phone {
            active.phone = Set(v);
        }
        if let Some(v) = update.address {
            active.address = Set(v);
        }
        if let Some(v) = update.city {
            active.city = Set(v);
        }
        if let Some(v) = update.state {
            active.state = Set(v);
        }
        if let Some(v) = update.country {
            active.country = Set(v);
        }
        if let Some(v) = update.primary_contact_name {
            active.primary_contact_name = Set(v);
        }
        if let Some(v) = update.primary_contact_email {
            active.primary_contact_email = Set(v);
        }
        if let Some(v) = update.primary_contact_phone {
            active.primary_contact_phone = Set(v);
        }
        if let Some(v) = update.engagement_level {
            active.engagement_level = Set(v);
        }
        if let Some(v) = update.industry {
            active.industry = Set(v);
        }
        if let Some(v) = update.employee_count {
            active.employee_count = Set(v);
        }
        if let Some(v) = update.partnership_start_date {
            active.partnership_start_date = Set(v);
        }
        if let Some(v) = update.notes {
            active.notes = Set(v);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Partners::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        Partners::find()
            .count(&self.conn)
            .await
            .context("Failed to count partners")
    }

    pub async fn counts_by_type(&self) -> Result<Vec<(String, i64)>> {
        Partners::find()
            .select_only()
            .column(partners::Column::PartnerType)
            .column_as(partners::Column::Id.count(), "count")
            .group_by(partners::Column::PartnerType)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to group partners by type")
    }

    pub async fn counts_by_engagement_level(&self) -> Result<Vec<(String, i64)>> {
        Partners::find()
            .select_only()
            .column(partners::Column::EngagementLevel)
            .column_as(partners::Column::Id.count(), "count")
            .group_by(partners::Column::EngagementLevel)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to group partners by engagement level")
    }

    pub async fn counts_by_industry(&self) -> Result<Vec<(String, i64)>> {
        Partners::find()
            .select_only()
            .column(partners::Column::Industry)
            .column_as(partners::Column::Id.count(), "count")
            .filter(partners::Column::Industry.ne(""))
            .group_by(partners::Column::Industry)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to group partners by industry")
    }

    /// Partners ordered by how many engagements they have, highest first.
    pub async fn top_engaged(&self, limit: u64) -> Result<Vec<(partners::Model, i64)>> {
        let counts: Vec<(i32, i64)> = Engagements::find()
            .select_only()
            .column(engagements::Column::PartnerId)
            .column_as(engagements::Column::Id.count(), "count")
            .group_by(engagements::Column::PartnerId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count engagements per partner")?;

        let count_map: HashMap<i32, i64> = counts.into_iter().collect();

        let partners = self.list_all().await?;
        let mut ranked: Vec<(partners::Model, i64)> = partners
            .into_iter()
            .map(|p| {
                let count = count_map.get(&p.id).copied().unwrap_or(0);
                (p, count)
            })
            .collect();

        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(ranked)
    }

    pub async fn bulk_update_engagement_level(
        &self,
        ids: Option<&[i32]>,
        from: Option<&str>,
        to: &str,
    ) -> Result<u64> {
        let mut update = Partners::update_many()
            .col_expr(
                partners::Column::EngagementLevel,
                Expr::value(to.to_string()),
            )
            .col_expr(
                partners::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            );

        if let Some(ids) = ids {
            update = update.filter(partners::Column::Id.is_in(ids.to_vec()));
        }
        if let Some(from) = from {
            update = update.filter(partners::Column::EngagementLevel.eq(from));
        }

        let result = update.exec(&self.conn).await?;
        Ok(result.rows_affected)
    }

    pub async fn bulk_delete(&self, ids: &[i32]) -> Result<u64> {
        let result = Partners::delete_many()
            .filter(partners::Column::Id.is_in(ids.to_vec()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
