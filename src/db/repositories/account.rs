use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{accounts, prelude::*};

/// Account data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: String,
    pub last_login: Option<String>,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            is_active: model.is_active,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            date_joined: model.date_joined,
            last_login: model.last_login,
        }
    }
}

/// Allow-listed account fields for partial updates.
#[derive(Debug, Clone, Default)]
pub struct AccountFieldUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Account> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = accounts::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            is_active: Set(true),
            is_staff: Set(false),
            is_superuser: Set(false),
            date_joined: Set(now),
            last_login: Set(None),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert account")?;

        Ok(Account::from(model))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Account>> {
        let account = Accounts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    /// Exact (case-sensitive) username lookup.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>> {
        let account = Accounts::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query account by username")?;

        Ok(account.map(Account::from))
    }

    /// Case-insensitive username lookup.
    pub async fn find_by_username_ci(&self, username: &str) -> Result<Option<Account>> {
        let account = Accounts::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(accounts::Column::Username)))
                    .eq(username.to_lowercase()),
            )
            .one(&self.conn)
            .await
            .context("Failed to query account by username (ci)")?;

        Ok(account.map(Account::from))
    }

    /// Case-insensitive email lookup.
    pub async fn find_by_email_ci(&self, email: &str) -> Result<Option<Account>> {
        let account = Accounts::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(accounts::Column::Email)))
                    .eq(email.to_lowercase()),
            )
            .one(&self.conn)
            .await
            .context("Failed to query account by email (ci)")?;

        Ok(account.map(Account::from))
    }

    /// Primary authentication path: exact username match, password verify,
    /// active flag. Returns the account only when all three hold.
    /// Note: Argon2 verification is CPU-intensive and runs in `spawn_blocking`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Account>> {
        let account = Accounts::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query account for authentication")?;

        let Some(account) = account else {
            return Ok(None);
        };

        if !verify_hash(&account.password_hash, password).await? {
            return Ok(None);
        }

        if !account.is_active {
            return Ok(None);
        }

        Ok(Some(Account::from(account)))
    }

    /// Verifies a password directly against a specific account's stored hash,
    /// without the active-flag gate of [`Self::authenticate`].
    pub async fn verify_password(&self, account_id: i32, password: &str) -> Result<bool> {
        let account = Accounts::find_by_id(account_id)
            .one(&self.conn)
            .await
            .context("Failed to query account for password verification")?;

        let Some(account) = account else {
            return Ok(false);
        };

        verify_hash(&account.password_hash, password).await
    }

    pub async fn update_fields(&self, id: i32, update: AccountFieldUpdate) -> Result<Account> {
        let account = Accounts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for update")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {id}"))?;

        let mut active: accounts::ActiveModel = account.into();
        if let Some(first_name) = update.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = update.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(email) = update.email {
            active.email = Set(email);
        }
        if let Some(username) = update.username {
            active.username = Set(username);
        }

        let model = active.update(&self.conn).await?;
        Ok(Account::from(model))
    }

    pub async fn update_password(&self, id: i32, new_hash: &str) -> Result<()> {
        let account = Accounts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for password update")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {id}"))?;

        let mut active: accounts::ActiveModel = account.into();
        active.password_hash = Set(new_hash.to_string());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn touch_last_login(&self, id: i32) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        Accounts::update_many()
            .col_expr(accounts::Column::LastLogin, Expr::value(Some(now)))
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn set_active(&self, id: i32, is_active: bool) -> Result<Account> {
        let account = Accounts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for status toggle")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {id}"))?;

        let mut active: accounts::ActiveModel = account.into();
        active.is_active = Set(is_active);

        let model = active.update(&self.conn).await?;
        Ok(Account::from(model))
    }

    /// Whether another account (any but `exclude_id`) already holds this username.
    pub async fn username_taken(&self, username: &str, exclude_id: Option<i32>) -> Result<bool> {
        let mut query = Accounts::find().filter(
            Expr::expr(Func::lower(Expr::col(accounts::Column::Username)))
                .eq(username.to_lowercase()),
        );
        if let Some(id) = exclude_id {
            query = query.filter(accounts::Column::Id.ne(id));
        }

        Ok(query.one(&self.conn).await?.is_some())
    }

    pub async fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> Result<bool> {
        let mut query = Accounts::find().filter(
            Expr::expr(Func::lower(Expr::col(accounts::Column::Email))).eq(email.to_lowercase()),
        );
        if let Some(id) = exclude_id {
            query = query.filter(accounts::Column::Id.ne(id));
        }

        Ok(query.one(&self.conn).await?.is_some())
    }

    pub async fn list_all(&self) -> Result<Vec<Account>> {
        let rows = Accounts::find()
            .order_by_asc(accounts::Column::Username)
            .all(&self.conn)
            .await
            .context("Failed to list accounts")?;

        Ok(rows.into_iter().map(Account::from).collect())
    }
}

async fn verify_hash(stored_hash: &str, password: &str) -> Result<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();

    // Run CPU-intensive password verification in a blocking task
    let is_valid = task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&stored_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        let argon2 = Argon2::default();
        Ok::<bool, anyhow::Error>(
            argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")??;

    Ok(is_valid)
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the library defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random token key (64 character hex string)
#[must_use]
pub fn generate_token_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_keys_are_64_hex_chars() {
        let key = generate_token_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_and_key_are_unique_per_call() {
        assert_ne!(generate_token_key(), generate_token_key());
    }
}
