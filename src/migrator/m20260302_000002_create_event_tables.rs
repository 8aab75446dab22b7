use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SchoolEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SchoolEvents::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SchoolEvents::Name).string().not_null())
                    .col(ColumnDef::new(SchoolEvents::Description).text())
                    .col(ColumnDef::new(SchoolEvents::StartDate).date_time().not_null())
                    .col(ColumnDef::new(SchoolEvents::EndDate).date_time().not_null())
                    .col(
                        ColumnDef::new(SchoolEvents::RequiresConsent)
                            .boolean()
                            .default(false)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // NoAction on both sides. Event and activity group deletion remove
        // these rows explicitly.
        manager
            .create_table(
                Table::create()
                    .table(ParticipatingActivityGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParticipatingActivityGroups::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ParticipatingActivityGroups::EventId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParticipatingActivityGroups::ActivityGroupId)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participating_activity_groups_event")
                            .from(
                                ParticipatingActivityGroups::Table,
                                ParticipatingActivityGroups::EventId,
                            )
                            .to(SchoolEvents::Table, SchoolEvents::Id)
                            .on_delete(ForeignKeyAction::NoAction)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participating_activity_groups_group")
                            .from(
                                ParticipatingActivityGroups::Table,
                                ParticipatingActivityGroups::ActivityGroupId,
                            )
                            .to(ActivityGroups::Table, ActivityGroups::Id)
                            .on_delete(ForeignKeyAction::NoAction)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ParentPermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParentPermissions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParentPermissions::EventId).string().not_null())
                    .col(ColumnDef::new(ParentPermissions::LearnerId).string().not_null())
                    .col(ColumnDef::new(ParentPermissions::ParentId).string().not_null())
                    .col(
                        ColumnDef::new(ParentPermissions::Granted)
                            .boolean()
                            .default(false)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParentPermissions::RespondedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parent_permissions_event")
                            .from(ParentPermissions::Table, ParentPermissions::EventId)
                            .to(SchoolEvents::Table, SchoolEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parent_permissions_learner")
                            .from(ParentPermissions::Table, ParentPermissions::LearnerId)
                            .to(Learners::Table, Learners::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parent_permissions_parent")
                            .from(ParentPermissions::Table, ParentPermissions::ParentId)
                            .to(Parents::Table, Parents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parent_permissions_event_id")
                    .table(ParentPermissions::Table)
                    .col(ParentPermissions::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParentPermissions::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(ParticipatingActivityGroups::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(SchoolEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SchoolEvents {
    Table,
    Id,
    Name,
    Description,
    StartDate,
    EndDate,
    RequiresConsent,
}

#[derive(DeriveIden)]
enum ParticipatingActivityGroups {
    Table,
    Id,
    EventId,
    ActivityGroupId,
}

#[derive(DeriveIden)]
enum ParentPermissions {
    Table,
    Id,
    EventId,
    LearnerId,
    ParentId,
    Granted,
    RespondedAt,
}

#[derive(DeriveIden)]
enum ActivityGroups {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Learners {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Parents {
    Table,
    Id,
}
