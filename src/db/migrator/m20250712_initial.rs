use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Default token key for the seeded admin (regenerate after first login)
const DEFAULT_TOKEN_KEY: &str = "alumnet_default_token_please_regenerate";

/// Hash the default admin password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"admin";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Accounts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AuthTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Alumni)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Partners)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Engagements)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Reports)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_alumni_graduation_year")
                    .table(Alumni)
                    .col(crate::entities::alumni::Column::GraduationYear)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_alumni_status")
                    .table(Alumni)
                    .col(crate::entities::alumni::Column::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_partners_partner_type")
                    .table(Partners)
                    .col(crate::entities::partners::Column::PartnerType)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_partners_engagement_level")
                    .table(Partners)
                    .col(crate::entities::partners::Column::EngagementLevel)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_engagements_alumni_date")
                    .table(Engagements)
                    .col(crate::entities::engagements::Column::AlumniId)
                    .col(crate::entities::engagements::Column::EngagementDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_engagements_partner_date")
                    .table(Engagements)
                    .col(crate::entities::engagements::Column::PartnerId)
                    .col(crate::entities::engagements::Column::EngagementDate)
                    .to_owned(),
            )
            .await?;

        // Seed default admin account with hashed password and a usable token
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Accounts)
            .columns([
                crate::entities::accounts::Column::Username,
                crate::entities::accounts::Column::Email,
                crate::entities::accounts::Column::PasswordHash,
                crate::entities::accounts::Column::FirstName,
                crate::entities::accounts::Column::LastName,
                crate::entities::accounts::Column::IsActive,
                crate::entities::accounts::Column::IsStaff,
                crate::entities::accounts::Column::IsSuperuser,
                crate::entities::accounts::Column::DateJoined,
            ])
            .values_panic([
                "admin".into(),
                "admin@example.com".into(),
                password_hash.into(),
                "Admin".into(),
                "User".into(),
                true.into(),
                true.into(),
                true.into(),
                now.clone().into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        let insert_token = sea_orm_migration::sea_query::Query::insert()
            .into_table(AuthTokens)
            .columns([
                crate::entities::auth_tokens::Column::AccountId,
                crate::entities::auth_tokens::Column::Key,
                crate::entities::auth_tokens::Column::CreatedAt,
            ])
            .values_panic([1.into(), DEFAULT_TOKEN_KEY.into(), now.into()])
            .to_owned();

        manager.exec_stmt(insert_token).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Engagements).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reports).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Partners).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Alumni).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthTokens).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts).to_owned())
            .await?;

        Ok(())
    }
}
