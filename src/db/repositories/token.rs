use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::account::{Account, generate_token_key};
use crate::entities::{auth_tokens, prelude::*};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get the account's token, creating one if absent.
    ///
    /// The insert uses ON CONFLICT DO NOTHING on the unique `account_id`
    /// column so two concurrent logins can never mint two keys: the loser of
    /// the race reads back the winner's row.
    pub async fn get_or_create(&self, account_id: i32) -> Result<String> {
        let active = auth_tokens::ActiveModel {
            account_id: Set(account_id),
            key: Set(generate_token_key()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        AuthTokens::insert(active)
            .on_conflict(
                OnConflict::column(auth_tokens::Column::AccountId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert auth token")?;

        let token = AuthTokens::find()
            .filter(auth_tokens::Column::AccountId.eq(account_id))
            .one(&self.conn)
            .await
            .context("Failed to read back auth token")?
            .ok_or_else(|| anyhow::anyhow!("Token missing after get-or-create"))?;

        Ok(token.key)
    }

    /// Resolve a bearer key to its owning account.
    pub async fn find_account_by_key(&self, key: &str) -> Result<Option<Account>> {
        let result = AuthTokens::find()
            .filter(auth_tokens::Column::Key.eq(key))
            .find_also_related(Accounts)
            .one(&self.conn)
            .await
            .context("Failed to query auth token by key")?;

        Ok(result.and_then(|(_, account)| account.map(Account::from)))
    }

    pub async fn delete_for_account(&self, account_id: i32) -> Result<bool> {
        let result = AuthTokens::delete_many()
            .filter(auth_tokens::Column::AccountId.eq(account_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete auth token")?;

        Ok(result.rows_affected > 0)
    }

    /// Replace the account's token with a fresh key.
    pub async fn regenerate(&self, account_id: i32) -> Result<String> {
        self.delete_for_account(account_id).await?;
        self.get_or_create(account_id).await
    }
}
