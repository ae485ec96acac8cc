use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CallSchedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CallSchedules::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CallSchedules::ElderId).integer().not_null())
                    .col(
                        ColumnDef::new(CallSchedules::DayOfWeek)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CallSchedules::Time).time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-call_schedule-elder_id")
                            .from(CallSchedules::Table, CallSchedules::ElderId)
                            .to(Elders::Table, Elders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The hourly sweep filters on (day_of_week, time)
        manager
            .create_index(
                Index::create()
                    .name("idx-call_schedule-day-time")
                    .table(CallSchedules::Table)
                    .col(CallSchedules::DayOfWeek)
                    .col(CallSchedules::Time)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CallSchedules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CallSchedules {
    Table,
    Id,
    ElderId,
    DayOfWeek,
    Time,
}

#[derive(DeriveIden)]
enum Elders {
    Table,
    Id,
}
