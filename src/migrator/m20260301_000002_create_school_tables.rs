use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SchoolGrades::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SchoolGrades::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SchoolGrades::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Teachers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Teachers::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Teachers::FirstName).string().not_null())
                    .col(ColumnDef::new(Teachers::LastName).string().not_null())
                    .col(ColumnDef::new(Teachers::Email).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AgeGroups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AgeGroups::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(AgeGroups::Name).string().not_null())
                    .col(ColumnDef::new(AgeGroups::MinAge).integer().not_null())
                    .col(ColumnDef::new(AgeGroups::MaxAge).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActivityGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityGroups::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivityGroups::Name).string().not_null())
                    .col(ColumnDef::new(ActivityGroups::AgeGroupId).string().not_null())
                    .col(ColumnDef::new(ActivityGroups::TeacherId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_groups_age_group")
                            .from(ActivityGroups::Table, ActivityGroups::AgeGroupId)
                            .to(AgeGroups::Table, AgeGroups::Id)
                            .on_delete(ForeignKeyAction::NoAction)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_groups_teacher")
                            .from(ActivityGroups::Table, ActivityGroups::TeacherId)
                            .to(Teachers::Table, Teachers::Id)
                            .on_delete(ForeignKeyAction::NoAction)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Parents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Parents::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Parents::FirstName).string().not_null())
                    .col(ColumnDef::new(Parents::LastName).string().not_null())
                    .col(ColumnDef::new(Parents::IdNumber).string())
                    .col(ColumnDef::new(Parents::Email).string())
                    .col(
                        ColumnDef::new(Parents::ReceiveNotifications)
                            .boolean()
                            .default(true)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Parents::ReceiveEmails)
                            .boolean()
                            .default(true)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Parents::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Parents::UpdatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parents_email")
                    .table(Parents::Table)
                    .col(Parents::Email)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ParentAddresses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParentAddresses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParentAddresses::ParentId).string().not_null())
                    .col(ColumnDef::new(ParentAddresses::Line1).string().not_null())
                    .col(ColumnDef::new(ParentAddresses::Line2).string())
                    .col(ColumnDef::new(ParentAddresses::City).string().not_null())
                    .col(ColumnDef::new(ParentAddresses::PostalCode).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parent_addresses_parent")
                            .from(ParentAddresses::Table, ParentAddresses::ParentId)
                            .to(Parents::Table, Parents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmergencyContacts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmergencyContacts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EmergencyContacts::ParentId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmergencyContacts::Name).string().not_null())
                    .col(ColumnDef::new(EmergencyContacts::Relationship).string())
                    .col(
                        ColumnDef::new(EmergencyContacts::ContactNumber)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_emergency_contacts_parent")
                            .from(EmergencyContacts::Table, EmergencyContacts::ParentId)
                            .to(Parents::Table, Parents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Learners::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Learners::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Learners::FirstName).string().not_null())
                    .col(ColumnDef::new(Learners::LastName).string().not_null())
                    .col(ColumnDef::new(Learners::IdNumber).string())
                    .col(ColumnDef::new(Learners::DateOfBirth).date())
                    .col(ColumnDef::new(Learners::SchoolGradeId).string())
                    .col(ColumnDef::new(Learners::SchoolClass).string())
                    .col(ColumnDef::new(Learners::MedicalAidParentId).string())
                    .col(ColumnDef::new(Learners::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Learners::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_learners_school_grade")
                            .from(Learners::Table, Learners::SchoolGradeId)
                            .to(SchoolGrades::Table, SchoolGrades::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_learners_medical_aid_parent")
                            .from(Learners::Table, Learners::MedicalAidParentId)
                            .to(Parents::Table, Parents::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_learners_school_grade_id")
                    .table(Learners::Table)
                    .col(Learners::SchoolGradeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LearnerParents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LearnerParents::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LearnerParents::LearnerId).string().not_null())
                    .col(ColumnDef::new(LearnerParents::ParentId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_learner_parents_learner")
                            .from(LearnerParents::Table, LearnerParents::LearnerId)
                            .to(Learners::Table, Learners::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_learner_parents_parent")
                            .from(LearnerParents::Table, LearnerParents::ParentId)
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
                    .name("idx_learner_parents_learner_id")
                    .table(LearnerParents::Table)
                    .col(LearnerParents::LearnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContactNumbers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContactNumbers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContactNumbers::LearnerId).string())
                    .col(ColumnDef::new(ContactNumbers::ParentId).string())
                    .col(ColumnDef::new(ContactNumbers::Number).string().not_null())
                    .col(
                        ColumnDef::new(ContactNumbers::IsPrimary)
                            .boolean()
                            .default(false)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contact_numbers_learner")
                            .from(ContactNumbers::Table, ContactNumbers::LearnerId)
                            .to(Learners::Table, Learners::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contact_numbers_parent")
                            .from(ContactNumbers::Table, ContactNumbers::ParentId)
                            .to(Parents::Table, Parents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmailAddresses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailAddresses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailAddresses::LearnerId).string())
                    .col(ColumnDef::new(EmailAddresses::ParentId).string())
                    .col(ColumnDef::new(EmailAddresses::Email).string().not_null())
                    .col(
                        ColumnDef::new(EmailAddresses::IsPrimary)
                            .boolean()
                            .default(false)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_addresses_learner")
                            .from(EmailAddresses::Table, EmailAddresses::LearnerId)
                            .to(Learners::Table, Learners::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_addresses_parent")
                            .from(EmailAddresses::Table, EmailAddresses::ParentId)
                            .to(Parents::Table, Parents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailAddresses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContactNumbers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LearnerParents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Learners::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EmergencyContacts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ParentAddresses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Parents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActivityGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AgeGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Teachers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SchoolGrades::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SchoolGrades {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Teachers {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
}

#[derive(DeriveIden)]
enum AgeGroups {
    Table,
    Id,
    Name,
    MinAge,
    MaxAge,
}

#[derive(DeriveIden)]
enum ActivityGroups {
    Table,
    Id,
    Name,
    AgeGroupId,
    TeacherId,
}

#[derive(DeriveIden)]
enum Parents {
    Table,
    Id,
    FirstName,
    LastName,
    IdNumber,
    Email,
    ReceiveNotifications,
    ReceiveEmails,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ParentAddresses {
    Table,
    Id,
    ParentId,
    Line1,
    Line2,
    City,
    PostalCode,
}

#[derive(DeriveIden)]
enum EmergencyContacts {
    Table,
    Id,
    ParentId,
    Name,
    Relationship,
    ContactNumber,
}

#[derive(DeriveIden)]
enum Learners {
    Table,
    Id,
    FirstName,
    LastName,
    IdNumber,
    DateOfBirth,
    SchoolGradeId,
    SchoolClass,
    MedicalAidParentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LearnerParents {
    Table,
    Id,
    LearnerId,
    ParentId,
}

#[derive(DeriveIden)]
enum ContactNumbers {
    Table,
    Id,
    LearnerId,
    ParentId,
    Number,
    IsPrimary,
}

#[derive(DeriveIden)]
enum EmailAddresses {
    Table,
    Id,
    LearnerId,
    ParentId,
    Email,
    IsPrimary,
}
