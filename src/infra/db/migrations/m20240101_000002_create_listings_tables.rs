//! Migration: locations and properties.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Locations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Locations::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Locations::Country).string().not_null())
                    .col(ColumnDef::new(Locations::Province).string().not_null())
                    .col(ColumnDef::new(Locations::City).string().not_null())
                    .col(ColumnDef::new(Locations::District).string().null())
                    .col(ColumnDef::new(Locations::Street).string().null())
                    .col(ColumnDef::new(Locations::Latitude).double().null())
                    .col(ColumnDef::new(Locations::Longitude).double().null())
                    .col(
                        ColumnDef::new(Locations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Locations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_locations_city")
                    .table(Locations::Table)
                    .col(Locations::City)
                    .to_owned(),
            )
            .await?;

        // location_id carries no foreign key: the location is removed before
        // its property during delete.
        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Properties::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Properties::Title).string().not_null())
                    .col(ColumnDef::new(Properties::Description).text().not_null())
                    .col(ColumnDef::new(Properties::Price).double().not_null())
                    .col(ColumnDef::new(Properties::Bedrooms).integer().not_null())
                    .col(ColumnDef::new(Properties::Bathrooms).integer().not_null())
                    .col(ColumnDef::new(Properties::Area).double().not_null())
                    .col(ColumnDef::new(Properties::PropertyType).string_len(16).not_null())
                    .col(ColumnDef::new(Properties::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Properties::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Properties::LocationId).uuid().not_null())
                    .col(
                        ColumnDef::new(Properties::Images)
                            .array(ColumnType::Text)
                            .not_null()
                            .default(Expr::cust("'{}'::text[]")),
                    )
                    .col(
                        ColumnDef::new(Properties::Details)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Properties::Amenities)
                            .array(ColumnType::Text)
                            .not_null()
                            .default(Expr::cust("'{}'::text[]")),
                    )
                    .col(
                        ColumnDef::new(Properties::Views)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Properties::AverageRating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Properties::TotalReviews)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Properties::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Properties::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_properties_owner")
                            .from(Properties::Table, Properties::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_properties_owner_id", Properties::OwnerId),
            ("idx_properties_created_at", Properties::CreatedAt),
            ("idx_properties_price", Properties::Price),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Properties::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Locations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    Country,
    Province,
    City,
    District,
    Street,
    Latitude,
    Longitude,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Properties {
    Table,
    Id,
    Title,
    Description,
    Price,
    Bedrooms,
    Bathrooms,
    Area,
    PropertyType,
    Status,
    OwnerId,
    LocationId,
    Images,
    Details,
    Amenities,
    Views,
    AverageRating,
    TotalReviews,
    CreatedAt,
    UpdatedAt,
}
