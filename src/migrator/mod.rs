use sea_orm_migration::prelude::*;

mod m20250712_000001_create_users_elders;
mod m20250712_000002_create_call_schedules;
mod m20250719_000003_create_calls;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250712_000001_create_users_elders::Migration),
            Box::new(m20250712_000002_create_call_schedules::Migration),
            Box::new(m20250719_000003_create_calls::Migration),
        ]
    }
}
