use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create Users Table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // Create Elders Table
        manager
            .create_table(
                Table::create()
                    .table(Elders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Elders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Elders::UserId).integer().not_null())
                    .col(ColumnDef::new(Elders::Name).string().not_null())
                    .col(ColumnDef::new(Elders::Age).integer().not_null())
                    .col(ColumnDef::new(Elders::Gender).string().not_null())
                    .col(ColumnDef::new(Elders::Relation).string().not_null())
                    .col(ColumnDef::new(Elders::Phone).string().not_null())
                    .col(ColumnDef::new(Elders::ResidenceType).string().not_null())
                    .col(ColumnDef::new(Elders::HealthCondition).string().not_null())
                    .col(ColumnDef::new(Elders::BeginDate).date_time().not_null())
                    .col(ColumnDef::new(Elders::EndDate).date_time())
                    .col(
                        ColumnDef::new(Elders::AskMeal)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Elders::AskMedication)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Elders::AskEmotion)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Elders::AskSpecialEvent)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Elders::AdditionalInfo).string())
                    .col(
                        ColumnDef::new(Elders::InviteCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Elders::VoipDeviceToken).string())
                    .col(ColumnDef::new(Elders::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Elders::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-elder-user_id")
                            .from(Elders::Table, Elders::UserId)
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
                    .name("idx-elder-invite_code")
                    .table(Elders::Table)
                    .col(Elders::InviteCode)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Elders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Elders {
    Table,
    Id,
    UserId,
    Name,
    Age,
    Gender,
    Relation,
    Phone,
    ResidenceType,
    HealthCondition,
    BeginDate,
    EndDate,
    AskMeal,
    AskMedication,
    AskEmotion,
    AskSpecialEvent,
    AdditionalInfo,
    InviteCode,
    VoipDeviceToken,
    CreatedAt,
    UpdatedAt,
}
