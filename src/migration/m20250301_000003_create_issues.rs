//! Create issue table.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_reports::Report;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Issue::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Issue::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Issue::ReportId).uuid().not_null())
                    .col(ColumnDef::new(Issue::Severity).string_len(20).not_null())
                    .col(ColumnDef::new(Issue::Title).string_len(500).not_null())
                    .col(ColumnDef::new(Issue::Description).text().not_null())
                    .col(ColumnDef::new(Issue::Recommendation).text())
                    .col(
                        ColumnDef::new(Issue::Confidence)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Issue::SeverityWeight)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Issue::Location).string_len(500))
                    .col(
                        ColumnDef::new(Issue::Resolved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Issue::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Issue::Table, Issue::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issue_report_created")
                    .table(Issue::Table)
                    .col(Issue::ReportId)
                    .col(Issue::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Issue::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Issue {
    Table,
    Id,
    ReportId,
    Severity,
    Title,
    Description,
    Recommendation,
    Confidence,
    SeverityWeight,
    Location,
    Resolved,
    CreatedAt,
}
