//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::repositories::account::hash_password;
use crate::db::{Account, AccountFieldUpdate, Store};
use crate::services::auth_service::{
    AccountInfo, AccountUpdateInput, AuthError, AuthService, LoginResult, RegisterInput,
};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let config = self.security.clone();

        // Argon2id hashing is CPU-intensive; keep it off the async runtime.
        task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task panicked: {e}")))?
            .map_err(Into::into)
    }

    /// Credential resolution for a login identifier, in strict order:
    ///
    /// 1. direct authentication with the identifier as the exact username;
    /// 2. case-insensitive username lookup, then re-authentication with the
    ///    resolved exact username;
    /// 3. if the identifier contains an "@", case-insensitive email lookup,
    ///    then re-authentication with that account's username;
    /// 4. final fallback: look the account up case-insensitively (username,
    ///    or email when the identifier has an "@") and verify the trimmed
    ///    password against the stored hash plus the active flag directly.
    ///
    /// A whitespace-only password never passes the fallback step.
    async fn resolve_credentials(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        let identifier = identifier.trim();

        if let Some(account) = self.store.authenticate(identifier, password).await? {
            return Ok(account);
        }

        if let Some(candidate) = self.store.find_account_by_username_ci(identifier).await?
            && let Some(account) = self
                .store
                .authenticate(&candidate.username, password)
                .await?
        {
            return Ok(account);
        }

        if identifier.contains('@')
            && let Some(candidate) = self.store.find_account_by_email_ci(identifier).await?
            && let Some(account) = self
                .store
                .authenticate(&candidate.username, password)
                .await?
        {
            return Ok(account);
        }

        let candidate = if identifier.contains('@') {
            match self.store.find_account_by_username_ci(identifier).await? {
                Some(account) => Some(account),
                None => self.store.find_account_by_email_ci(identifier).await?,
            }
        } else {
            self.store.find_account_by_username_ci(identifier).await?
        };

        if let Some(candidate) = candidate {
            let trimmed = password.trim();
            if !trimmed.is_empty()
                && self
                    .store
                    .verify_account_password(candidate.id, trimmed)
                    .await?
                && candidate.is_active
            {
                return Ok(candidate);
            }
        }

        Err(AuthError::InvalidCredentials)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, input: RegisterInput) -> Result<LoginResult, AuthError> {
        let mut errors: BTreeMap<String, String> = BTreeMap::new();

        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();

        if username.is_empty() {
            errors.insert("username".into(), "Username is required.".into());
        } else if self.store.account_username_taken(&username, None).await? {
            errors.insert("username".into(), "Username already exists.".into());
        }

        if email.is_empty() {
            errors.insert("email".into(), "Email is required.".into());
        } else if !email.contains('@') {
            errors.insert("email".into(), "Enter a valid email address.".into());
        } else if self.store.account_email_taken(&email, None).await? {
            errors.insert("email".into(), "Email already registered.".into());
        }

        if input.password.len() < self.security.min_password_length {
            errors.insert(
                "password".into(),
                format!(
                    "Password must be at least {} characters.",
                    self.security.min_password_length
                ),
            );
        } else if input.password != input.password2 {
            errors.insert("password".into(), "Passwords must match.".into());
        }

        if input.first_name.trim().is_empty() {
            errors.insert("first_name".into(), "First name is required.".into());
        }
        if input.last_name.trim().is_empty() {
            errors.insert("last_name".into(), "Last name is required.".into());
        }

        if !errors.is_empty() {
            return Err(AuthError::Fields(errors));
        }

        let password_hash = self.hash(&input.password).await?;

        let account = self
            .store
            .create_account(
                &username,
                &email,
                &password_hash,
                input.first_name.trim(),
                input.last_name.trim(),
            )
            .await?;

        let token = self.store.get_or_create_token(account.id).await?;

        info!("Registered account: {}", account.username);

        Ok(LoginResult {
            token,
            account: AccountInfo::from(account),
        })
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<LoginResult, AuthError> {
        let account = self.resolve_credentials(identifier, password).await?;

        self.store.touch_last_login(account.id).await?;
        let token = self.store.get_or_create_token(account.id).await?;

        info!("Login: {}", account.username);

        Ok(LoginResult {
            token,
            account: AccountInfo::from(account),
        })
    }

    async fn resolve_token(&self, key: &str) -> Result<Option<AccountInfo>, AuthError> {
        let account = self.store.find_account_by_token(key).await?;
        Ok(account.map(AccountInfo::from))
    }

    async fn revoke_token(&self, account_id: i32) -> Result<bool, AuthError> {
        let deleted = self.store.delete_token_for_account(account_id).await?;
        Ok(deleted)
    }

    async fn get_account(&self, account_id: i32) -> Result<AccountInfo, AuthError> {
        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        Ok(AccountInfo::from(account))
    }

    async fn update_account(
        &self,
        account_id: i32,
        update: AccountUpdateInput,
    ) -> Result<AccountInfo, AuthError> {
        let mut errors: BTreeMap<String, String> = BTreeMap::new();

        if let Some(username) = &update.username {
            if username.trim().is_empty() {
                errors.insert("username".into(), "Username cannot be blank.".into());
            } else if self
                .store
                .account_username_taken(username.trim(), Some(account_id))
                .await?
            {
                errors.insert("username".into(), "Username already exists.".into());
            }
        }

        if let Some(email) = &update.email {
            if email.trim().is_empty() || !email.contains('@') {
                errors.insert("email".into(), "Enter a valid email address.".into());
            } else if self
                .store
                .account_email_taken(email.trim(), Some(account_id))
                .await?
            {
                errors.insert("email".into(), "Email already registered.".into());
            }
        }

        if !errors.is_empty() {
            return Err(AuthError::Fields(errors));
        }

        let account = self
            .store
            .update_account_fields(
                account_id,
                AccountFieldUpdate {
                    first_name: update.first_name,
                    last_name: update.last_name,
                    email: update.email.map(|e| e.trim().to_string()),
                    username: update.username.map(|u| u.trim().to_string()),
                },
            )
            .await?;

        Ok(AccountInfo::from(account))
    }

    async fn change_password(
        &self,
        account_id: i32,
        current_password: &str,
        new_password: &str,
        new_password2: &str,
    ) -> Result<(), AuthError> {
        let mut errors: BTreeMap<String, String> = BTreeMap::new();

        if new_password.len() < self.security.min_password_length {
            errors.insert(
                "new_password".into(),
                format!(
                    "New password must be at least {} characters.",
                    self.security.min_password_length
                ),
            );
        } else if new_password != new_password2 {
            errors.insert("new_password".into(), "Passwords must match.".into());
        } else if new_password == current_password {
            errors.insert(
                "new_password".into(),
                "New password must be different from current password.".into(),
            );
        }

        if !errors.is_empty() {
            return Err(AuthError::Fields(errors));
        }

        let is_valid = self
            .store
            .verify_account_password(account_id, current_password)
            .await?;

        if !is_valid {
            errors.insert(
                "current_password".into(),
                "Current password is incorrect.".into(),
            );
            return Err(AuthError::Fields(errors));
        }

        let new_hash = self.hash(new_password).await?;
        self.store
            .update_account_password(account_id, &new_hash)
            .await?;

        info!("Password changed for account {account_id}");

        Ok(())
    }
}
