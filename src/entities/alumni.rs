use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "alumni")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning account, nullable one-to-one.
    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub account_id: Option<i32>,

    pub first_name: String,

    pub last_name: String,

    #[sea_orm(unique)]
    pub email: String,

    pub phone: Option<String>,

    pub degree: String,

    pub field_of_study: String,

    pub graduation_year: i32,

    pub current_company: String,

    pub job_title: String,

    pub industry: String,

    /// One of: active, inactive, lost_contact
    pub status: String,

    pub linkedin_url: Option<String>,

    pub bio: String,

    pub created_at: String,

    pub updated_at: String,

    pub last_engagement: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
    #[sea_orm(has_many = "super::engagements::Entity")]
    Engagements,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::engagements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Engagements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
