//! Migration to create the measurements table.
//!
//! One row per simulated speed test. Ownership is either a user id or an
//! anonymous session token; the provider reference survives provider
//! deletion as NULL.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Measurements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Measurements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Measurements::UserId).uuid().null())
                    .col(ColumnDef::new(Measurements::SessionToken).uuid().null())
                    .col(ColumnDef::new(Measurements::ProviderId).uuid().null())
                    .col(
                        ColumnDef::new(Measurements::DownloadMbps)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Measurements::UploadMbps).double().not_null())
                    .col(ColumnDef::new(Measurements::PingMs).integer().not_null())
                    .col(ColumnDef::new(Measurements::JitterMs).integer().null())
                    .col(
                        ColumnDef::new(Measurements::PacketLossPct)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Measurements::ConnectionType)
                            .text()
                            .not_null()
                            .default("multi"),
                    )
                    .col(ColumnDef::new(Measurements::IpAddress).text().null())
                    .col(
                        ColumnDef::new(Measurements::TestDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_measurements_user")
                            .from(Measurements::Table, Measurements::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_measurements_provider")
                            .from(Measurements::Table, Measurements::ProviderId)
                            .to(Providers::Table, Providers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_measurements_test_date")
                    .table(Measurements::Table)
                    .col(Measurements::TestDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Measurements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Measurements {
    Table,
    Id,
    UserId,
    SessionToken,
    ProviderId,
    DownloadMbps,
    UploadMbps,
    PingMs,
    JitterMs,
    PacketLossPct,
    ConnectionType,
    IpAddress,
    TestDate,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Providers {
    Table,
    Id,
}
