use sea_orm_migration::prelude::*;

mod m20260301_000001_create_identity_tables;
mod m20260301_000002_create_school_tables;
mod m20260302_000001_create_discipline_tables;
mod m20260302_000002_create_event_tables;
mod m20260303_000001_create_communication_tables;
mod m20260304_000001_create_listing_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_identity_tables::Migration),
            Box::new(m20260301_000002_create_school_tables::Migration),
            Box::new(m20260302_000001_create_discipline_tables::Migration),
            Box::new(m20260302_000002_create_event_tables::Migration),
            Box::new(m20260303_000001_create_communication_tables::Migration),
            Box::new(m20260304_000001_create_listing_tables::Migration),
        ]
    }
}
