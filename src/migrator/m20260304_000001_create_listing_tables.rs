use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ListingTiers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ListingTiers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ListingTiers::Name).string().not_null())
                    .col(ColumnDef::new(ListingTiers::Description).text())
                    .col(
                        ColumnDef::new(ListingTiers::PriceCents)
                            .big_integer()
                            .default(0)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ListingTiers::MaxImages)
                            .integer()
                            .default(5)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BusinessListings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BusinessListings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BusinessListings::TierId).string().not_null())
                    .col(ColumnDef::new(BusinessListings::OwnerId).string())
                    .col(ColumnDef::new(BusinessListings::Name).string().not_null())
                    .col(ColumnDef::new(BusinessListings::Description).text())
                    .col(ColumnDef::new(BusinessListings::Phone).string())
                    .col(ColumnDef::new(BusinessListings::Email).string())
                    .col(ColumnDef::new(BusinessListings::Website).string())
                    .col(
                        ColumnDef::new(BusinessListings::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BusinessListings::UpdatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_business_listings_tier")
                            .from(BusinessListings::Table, BusinessListings::TierId)
                            .to(ListingTiers::Table, ListingTiers::Id)
                            .on_delete(ForeignKeyAction::NoAction)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        for (table, fk_name) in [
            (ListingLines::Products, "fk_listing_products_listing"),
            (ListingLines::Services, "fk_listing_services_listing"),
        ] {
            manager
                .create_table(
                    Table::create()
                        .table(table)
                        .if_not_exists()
                        .col(ColumnDef::new(ListingLines::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(ListingLines::ListingId).string().not_null())
                        .col(ColumnDef::new(ListingLines::Name).string().not_null())
                        .col(ColumnDef::new(ListingLines::Description).text())
                        .col(
                            ColumnDef::new(ListingLines::PriceCents)
                                .big_integer()
                                .default(0)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name(fk_name)
                                .from(table, ListingLines::ListingId)
                                .to(BusinessListings::Table, BusinessListings::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(ListingImages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ListingImages::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ListingImages::ListingId).string().not_null())
                    .col(ColumnDef::new(ListingImages::FileName).string().not_null())
                    .col(ColumnDef::new(ListingImages::ContentType).string().not_null())
                    .col(
                        ColumnDef::new(ListingImages::SizeBytes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ListingImages::Url).string().not_null())
                    .col(ColumnDef::new(ListingImages::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_listing_images_listing")
                            .from(ListingImages::Table, ListingImages::ListingId)
                            .to(BusinessListings::Table, BusinessListings::Id)
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
            .drop_table(Table::drop().table(ListingImages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ListingLines::Services).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ListingLines::Products).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BusinessListings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ListingTiers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ListingTiers {
    Table,
    Id,
    Name,
    Description,
    PriceCents,
    MaxImages,
}

#[derive(DeriveIden)]
enum BusinessListings {
    Table,
    Id,
    TierId,
    OwnerId,
    Name,
    Description,
    Phone,
    Email,
    Website,
    CreatedAt,
    UpdatedAt,
}

/// Products and services share one column layout.
#[derive(DeriveIden, Clone, Copy)]
enum ListingLines {
    #[sea_orm(iden = "listing_products")]
    Products,
    #[sea_orm(iden = "listing_services")]
    Services,
    Id,
    ListingId,
    Name,
    Description,
    PriceCents,
}

#[derive(DeriveIden)]
enum ListingImages {
    Table,
    Id,
    ListingId,
    FileName,
    ContentType,
    SizeBytes,
    Url,
    CreatedAt,
}
