use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "engagements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub alumni_id: i32,

    pub partner_id: i32,

    /// One of: networking_event, mentorship, interview, collaboration, donation, other
    pub engagement_type: String,

    pub description: String,

    pub engagement_date: String,

    pub notes: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::alumni::Entity",
        from = "Column::AlumniId",
        to = "super::alumni::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Alumni,
    #[sea_orm(
        belongs_to = "super::partners::Entity",
        from = "Column::PartnerId",
        to = "super::partners::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Partners,
}

impl Related<super::alumni::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alumni.def()
    }
}

impl Related<super::partners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partners.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
