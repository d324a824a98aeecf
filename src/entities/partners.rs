use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "partners")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    /// One of: corporate, nonprofit, government, educational, other
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

    /// One of: gold, silver, bronze, prospective
    pub engagement_level: String,

    pub industry: String,

    pub employee_count: Option<i32>,

    pub partnership_start_date: Option<String>,

    pub notes: String,

    pub created_at: String,

    pub updated_at: String,

    pub last_engagement: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::engagements::Entity")]
    Engagements,
}

impl Related<super::engagements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Engagements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
