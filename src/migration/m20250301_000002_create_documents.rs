//! Create document table.

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
                    .table(Document::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Document::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Document::ReportId).uuid().not_null())
                    .col(ColumnDef::new(Document::Filename).string_len(500).not_null())
                    .col(ColumnDef::new(Document::MimeType).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Document::SizeBytes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Document::FilePath).string_len(1000).not_null())
                    .col(ColumnDef::new(Document::ExtractedData).json())
                    .col(
                        ColumnDef::new(Document::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Document::Table, Document::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_document_report")
                    .table(Document::Table)
                    .col(Document::ReportId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Document::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Document {
    Table,
    Id,
    ReportId,
    Filename,
    MimeType,
    SizeBytes,
    FilePath,
    ExtractedData,
    CreatedAt,
}
