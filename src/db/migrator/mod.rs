use sea_orm_migration::prelude::*;

mod m20250712_initial;
mod m20250809_add_audit_entries;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250712_initial::Migration),
            Box::new(m20250809_add_audit_entries::Migration),
        ]
    }
}
