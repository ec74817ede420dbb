//! Create api_credential table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiCredential::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApiCredential::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApiCredential::Provider).string_len(20).not_null())
                    .col(ColumnDef::new(ApiCredential::Label).string().not_null())
                    .col(ColumnDef::new(ApiCredential::EncryptedSecret).text().not_null())
                    .col(
                        ColumnDef::new(ApiCredential::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ApiCredential::IsValid).boolean())
                    .col(
                        ColumnDef::new(ApiCredential::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ApiCredential::LastUsedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiCredential::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ApiCredential {
    Table,
    Id,
    Provider,
    Label,
    EncryptedSecret,
    IsActive,
    IsValid,
    CreatedAt,
    LastUsedAt,
}
