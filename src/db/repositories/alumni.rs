use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{alumni, prelude::*};

/// Fields accepted when creating an alumni profile.
#[derive(Debug, Clone, Default)]
pub struct AlumniInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub degree: String,
    pub field_of_study: String,
    pub graduation_year: i32,
    pub current_company: String,
    pub job_title: String,
    pub industry: String,
    pub status: String,
    pub linkedin_url: Option<String>,
    pub bio: String,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct AlumniUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub graduation_year: Option<i32>,
    pub current_company: Option<String>,
    pub job_title: Option<String>,
    pub industry: Option<String>,
    pub status: Option<String>,
    pub linkedin_url: Option<Option<String>>,
    pub bio: Option<String>,
}

/// List filters, mirrored from the admin list endpoint's query string.
#[derive(Debug, Clone, Default)]
pub struct AlumniFilter {
    pub status: Option<String>,
    pub degree: Option<String>,
    pub graduation_year: Option<i32>,
    pub industry: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// Outcome of a linked profile creation; the existence check runs inside the
/// same transaction as the insert, and the unique index on `account_id` is
/// the backstop for races the check cannot see.
#[derive(Debug)]
pub enum ProfileCreateOutcome {
    Created(alumni::Model),
    AccountAlreadyLinked,
    EmailTaken,
}

pub struct AlumniRepository {
    conn: DatabaseConnection,
}

impl AlumniRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn active_from_input(input: AlumniInput, account_id: Option<i32>) -> alumni::ActiveModel {
        let now = chrono::Utc::now().to_rfc3339();

        alumni::ActiveModel {
            account_id: Set(account_id),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            phone: Set(input.phone),
            degree: Set(input.degree),
            field_of_study: Set(input.field_of_study),
            graduation_year: Set(input.graduation_year),
            current_company: Set(input.current_company),
            job_title: Set(input.job_title),
            industry: Set(input.industry),
            status: Set(input.status),
            linkedin_url: Set(input.linkedin_url),
            bio: Set(input.bio),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            last_engagement: Set(None),
            ..Default::default()
        }
    }

    pub async fn create(
        &self,
        input: AlumniInput,
        account_id: Option<i32>,
    ) -> Result<alumni::Model> {
        let model = Self::active_from_input(input, account_id)
            .insert(&self.conn)
            .await
            .context("Failed to insert alumni profile")?;

        Ok(model)
    }

    /// Create a profile linked to an account, enforcing the one-profile
    /// invariant with an explicit existence check inside a transaction.
    pub async fn create_for_account(
        &self,
        account_id: i32,
        input: AlumniInput,
    ) -> Result<ProfileCreateOutcome> {
        let txn = self.conn.begin().await?;

        let existing = Alumni::find()
            .filter(alumni::Column::AccountId.eq(account_id))
            .one(&txn)
            .await
            .context("Failed to check for existing profile")?;

        if existing.is_some() {
            txn.rollback().await?;
            return Ok(ProfileCreateOutcome::AccountAlreadyLinked);
        }

        let insert = Self::active_from_input(input, Some(account_id))
            .insert(&txn)
            .await;

        match insert {
            Ok(model) => {
                txn.commit().await?;
                Ok(ProfileCreateOutcome::Created(model))
            }
            Err(err) => {
                txn.rollback().await?;
                let message = err.to_string();
                if message.contains("UNIQUE") && message.contains("account_id") {
                    Ok(ProfileCreateOutcome::AccountAlreadyLinked)
                } else if message.contains("UNIQUE") && message.contains("email") {
                    Ok(ProfileCreateOutcome::EmailTaken)
                } else {
                    Err(err).context("Failed to insert alumni profile")
                }
            }
        }
    }

    pub async fn get(&self, id: i32) -> Result<Option<alumni::Model>> {
        Alumni::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query alumni by ID")
    }

    pub async fn get_by_account(&self, account_id: i32) -> Result<Option<alumni::Model>> {
        Alumni::find()
            .filter(alumni::Column::AccountId.eq(account_id))
            .one(&self.conn)
            .await
            .context("Failed to query alumni by account")
    }

    pub async fn exists_for_account(&self, account_id: i32) -> Result<bool> {
        Ok(self.get_by_account(account_id).await?.is_some())
    }

    pub async fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> Result<bool> {
        let mut query = Alumni::find().filter(
            Expr::expr(Func::lower(Expr::col(alumni::Column::Email))).eq(email.to_lowercase()),
        );
        if let Some(id) = exclude_id {
            query = query.filter(alumni::Column::Id.ne(id));
        }

        Ok(query.one(&self.conn).await?.is_some())
    }

    pub async fn list(
        &self,
        filter: AlumniFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<alumni::Model>, u64)> {
        let mut query = Alumni::find();

        if let Some(status) = filter.status {
            query = query.filter(alumni::Column::Status.eq(status));
        }
        if let Some(degree) = filter.degree {
            query = query.filter(alumni::Column::Degree.eq(degree));
        }
        if let Some(year) = filter.graduation_year {
            query = query.filter(alumni::Column::GraduationYear.eq(year));
        }
        if let Some(industry) = filter.industry {
            query = query.filter(alumni::Column::Industry.eq(industry));
        }
        if let Some(search) = filter.search {
            query = query.filter(
                Condition::any()
                    .add(alumni::Column::FirstName.contains(&search))
                    .add(alumni::Column::LastName.contains(&search))
                    .add(alumni::Column::Email.contains(&search))
                    .add(alumni::Column::CurrentCompany.contains(&search)),
            );
        }

        query = match filter.ordering.as_deref() {
            Some("created_at") => query.order_by_asc(alumni::Column::CreatedAt),
            Some("graduation_year") => query.order_by_asc(alumni::Column::GraduationYear),
            Some("-graduation_year") => query.order_by_desc(alumni::Column::GraduationYear),
            Some("last_engagement") => query.order_by_asc(alumni::Column::LastEngagement),
            Some("-last_engagement") => query.order_by_desc(alumni::Column::LastEngagement),
            _ => query.order_by_desc(alumni::Column::CreatedAt),
        };

        let paginator = query.paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn list_all(&self) -> Result<Vec<alumni::Model>> {
        Alumni::find()
            .order_by_desc(alumni::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list alumni")
    }

    pub async fn search_by_company(&self, company: &str) -> Result<Vec<alumni::Model>> {
        Alumni::find()
            .filter(alumni::Column::CurrentCompany.contains(company))
            .order_by_desc(alumni::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to search alumni by company")
    }

    pub async fn update(&self, id: i32, update: AlumniUpdate) -> Result<Option<alumni::Model>> {
        let Some(existing) = Alumni::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: alumni::ActiveModel = existing.into();
        if let Some(v) = update.first_name {
            active.first_name = Set(v);
        }
        if let Some(v) = update.last_name {
            active.last_name = Set(v);
        }
        if let Some(v) = update.email {
            active.email = Set(v);
        }
        if let Some(v) = update.phone {
            active.phone = Set(v);
        }
        if let Some(v) = update.degree {
            active.degree = Set(v);
        }
        if let Some(v) = update.field_of_study {
            active.field_of_study = Set(v);
        }
        if let Some(v) = update.graduation_year {
            active.graduation_year = Set(v);
        }
        if let Some(v) = update.current_company {
            active.current_company = Set(v);
        }
        if let Some(v) = update.job_title {
            active.job_title = Set(v);
        }
        if let Some(v) = update.industry {
            active.industry = Set(v);
        }
        if let Some(v) = update.status {
            active.status = Set(v);
        }
        if let Some(v) = update.linkedin_url {
            active.linkedin_url = Set(v);
        }
        if let Some(v) = update.bio {
            active.bio = Set(v);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Alumni::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        Alumni::find()
            .count(&self.conn)
            .await
            .context("Failed to count alumni")
    }

    pub async fn count_by_status(&self, status: &str) -> Result<u64> {
        Alumni::find()
            .filter(alumni::Column::Status.eq(status))
            .count(&self.conn)
            .await
            .context("Failed to count alumni by status")
    }

    pub async fn counts_by_degree(&self) -> Result<Vec<(String, i64)>> {
        Alumni::find()
            .select_only()
            .column(alumni::Column::Degree)
            .column_as(alumni::Column::Id.count(), "count")
            .group_by(alumni::Column::Degree)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to group alumni by degree")
    }

    pub async fn counts_by_graduation_year(&self) -> Result<Vec<(i32, i64)>> {
        Alumni::find()
            .select_only()
            .column(alumni::Column::GraduationYear)
            .column_as(alumni::Column::Id.count(), "count")
            .group_by(alumni::Column::GraduationYear)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to group alumni by graduation year")
    }

    pub async fn counts_by_industry(&self) -> Result<Vec<(String, i64)>> {
        Alumni::find()
            .select_only()
            .column(alumni::Column::Industry)
            .column_as(alumni::Column::Id.count(), "count")
            .filter(alumni::Column::Industry.ne(""))
            .group_by(alumni::Column::Industry)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to group alumni by industry")
    }

    /// Bulk status update. With `ids` the action applies to those rows;
    /// otherwise to every row whose current status equals `from`.
    pub async fn bulk_update_status(
        &self,
        ids: Option<&[i32]>,
        from: Option<&str>,
        to: &str,
    ) -> Result<u64> {
        let mut update = Alumni::update_many()
            .col_expr(alumni::Column::Status, Expr::value(to.to_string()))
            .col_expr(
                alumni::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            );

        if let Some(ids) = ids {
            update = update.filter(alumni::Column::Id.is_in(ids.to_vec()));
        }
        if let Some(from) = from {
            update = update.filter(alumni::Column::Status.eq(from));
        }

        let result = update.exec(&self.conn).await?;
        Ok(result.rows_affected)
    }

    pub async fn bulk_touch_last_engagement(&self, ids: Option<&[i32]>) -> Result<u64> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut update = Alumni::update_many()
            .col_expr(alumni::Column::LastEngagement, Expr::value(Some(now.clone())))
            .col_expr(alumni::Column::UpdatedAt, Expr::value(now));

        if let Some(ids) = ids {
            update = update.filter(alumni::Column::Id.is_in(ids.to_vec()));
        }

        let result = update.exec(&self.conn).await?;
        Ok(result.rows_affected)
    }

    pub async fn bulk_delete(&self, ids: &[i32]) -> Result<u64> {
        let result = Alumni::delete_many()
            .filter(alumni::Column::Id.is_in(ids.to_vec()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
