//! Migration to create the network_issues table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NetworkIssues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NetworkIssues::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NetworkIssues::ServiceName).text().not_null())
                    .col(ColumnDef::new(NetworkIssues::IssueType).text().not_null())
                    .col(
                        ColumnDef::new(NetworkIssues::Severity)
                            .text()
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(NetworkIssues::ReportedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(NetworkIssues::ResolvedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(NetworkIssues::IsResolved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NetworkIssues::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum NetworkIssues {
    Table,
    Id,
    ServiceName,
    IssueType,
    Severity,
    ReportedAt,
    ResolvedAt,
    IsResolved,
}
