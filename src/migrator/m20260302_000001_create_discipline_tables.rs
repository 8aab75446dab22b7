use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SeverityScales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SeverityScales::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SeverityScales::Name).string().not_null())
                    .col(
                        ColumnDef::new(SeverityScales::Score)
                            .integer()
                            .default(0)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SeverityScales::Description).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DisciplinaryActions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DisciplinaryActions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DisciplinaryActions::Name).string().not_null())
                    .col(ColumnDef::new(DisciplinaryActions::Description).text())
                    .col(
                        ColumnDef::new(DisciplinaryActions::SeverityScaleId)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_disciplinary_actions_severity_scale")
                            .from(
                                DisciplinaryActions::Table,
                                DisciplinaryActions::SeverityScaleId,
                            )
                            .to(SeverityScales::Table, SeverityScales::Id)
                            .on_delete(ForeignKeyAction::NoAction)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DisciplinaryIncidents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DisciplinaryIncidents::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DisciplinaryIncidents::LearnerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisciplinaryIncidents::DisciplinaryActionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisciplinaryIncidents::OccurredAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisciplinaryIncidents::Description)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisciplinaryIncidents::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_disciplinary_incidents_learner")
                            .from(DisciplinaryIncidents::Table, DisciplinaryIncidents::LearnerId)
                            .to(Learners::Table, Learners::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_disciplinary_incidents_action")
                            .from(
                                DisciplinaryIncidents::Table,
                                DisciplinaryIncidents::DisciplinaryActionId,
                            )
                            .to(DisciplinaryActions::Table, DisciplinaryActions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_disciplinary_incidents_learner_id")
                    .table(DisciplinaryIncidents::Table)
                    .col(DisciplinaryIncidents::LearnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DisciplinaryIncidents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DisciplinaryActions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SeverityScales::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SeverityScales {
    Table,
    Id,
    Name,
    Score,
    Description,
}

#[derive(DeriveIden)]
enum DisciplinaryActions {
    Table,
    Id,
    Name,
    Description,
    SeverityScaleId,
}

#[derive(DeriveIden)]
enum DisciplinaryIncidents {
    Table,
    Id,
    LearnerId,
    DisciplinaryActionId,
    OccurredAt,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Learners {
    Table,
    Id,
}
