use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub first_name: String,

    pub last_name: String,

    pub is_active: bool,

    pub is_staff: bool,

    pub is_superuser: bool,

    pub date_joined: String,

    pub last_login: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::alumni::Entity")]
    Alumni,
    #[sea_orm(has_one = "super::auth_tokens::Entity")]
    AuthTokens,
}

impl Related<super::alumni::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alumni.def()
    }
}

impl Related<super::auth_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
