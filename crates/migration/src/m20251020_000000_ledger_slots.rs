//! Slot table for persisted sub-ledgers.
//!
//! One row per scope key (`{pool}:{identity}`). The payload is the full JSON
//! snapshot of the sub-ledger and is overwritten on every save.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum LedgerSlots {
    Table,
    ScopeKey,
    Pool,
    Version,
    Payload,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LedgerSlots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerSlots::ScopeKey)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerSlots::Pool).string().not_null())
                    .col(
                        ColumnDef::new(LedgerSlots::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(LedgerSlots::Payload).text().not_null())
                    .col(ColumnDef::new(LedgerSlots::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_slots-pool")
                    .table(LedgerSlots::Table)
                    .col(LedgerSlots::Pool)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerSlots::Table).to_owned())
            .await?;
        Ok(())
    }
}
