use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create Calls Table
        manager
            .create_table(
                Table::create()
                    .table(Calls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Calls::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Calls::VapiCallId).string().unique_key())
                    .col(ColumnDef::new(Calls::ElderId).integer().not_null())
                    .col(ColumnDef::new(Calls::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Calls::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Calls::EndedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Calls::Status).string().not_null())
                    .col(ColumnDef::new(Calls::Summary).text())
                    .col(ColumnDef::new(Calls::Emotion).string())
                    .col(ColumnDef::new(Calls::Tags).json_binary())
                    .col(ColumnDef::new(Calls::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Calls::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-call-elder_id")
                            .from(Calls::Table, Calls::ElderId)
                            .to(Elders::Table, Elders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-call-user_id")
                            .from(Calls::Table, Calls::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-call-vapi_call_id")
                    .table(Calls::Table)
                    .col(Calls::VapiCallId)
                    .to_owned(),
            )
            .await?;

        // Create CallMessages Table
        manager
            .create_table(
                Table::create()
                    .table(CallMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CallMessages::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CallMessages::CallId).integer().not_null())
                    .col(ColumnDef::new(CallMessages::Role).string().not_null())
                    .col(ColumnDef::new(CallMessages::Message).text().not_null())
                    .col(
                        ColumnDef::new(CallMessages::Timestamp)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-call_message-call_id")
                            .from(CallMessages::Table, CallMessages::CallId)
                            .to(Calls::Table, Calls::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CallMessages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Calls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Calls {
    Table,
    Id,
    VapiCallId,
    ElderId,
    UserId,
    StartedAt,
    EndedAt,
    Status,
    Summary,
    Emotion,
    Tags,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CallMessages {
    Table,
    Id,
    CallId,
    Role,
    Message,
    Timestamp,
}

#[derive(DeriveIden)]
enum Elders {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
