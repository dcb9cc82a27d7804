use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // domains table: one row per (tld, domain)
        manager
            .create_table(
                Table::create()
                    .table(Domains::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Domains::Tld).string().not_null())
                    .col(ColumnDef::new(Domains::Domain).string().not_null())
                    .col(ColumnDef::new(Domains::Fqdn).string().not_null())
                    .col(ColumnDef::new(Domains::FirstSeen).string().not_null())
                    .col(ColumnDef::new(Domains::LastSeen).string().not_null())
                    .col(
                        ColumnDef::new(Domains::Ns)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Domains::A)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Domains::Aaaa)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Domains::Ds)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Domains::Source).string().not_null())
                    .col(ColumnDef::new(Domains::ZoneFileDate).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(Domains::Tld)
                            .col(Domains::Domain),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_domains_first_seen")
                    .table(Domains::Table)
                    .col(Domains::FirstSeen)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_domains_last_seen")
                    .table(Domains::Table)
                    .col(Domains::LastSeen)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_domains_fqdn")
                    .table(Domains::Table)
                    .col(Domains::Fqdn)
                    .to_owned(),
            )
            .await?;

        // sync_stats table: append-only per-TLD sync log
        manager
            .create_table(
                Table::create()
                    .table(SyncStats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncStats::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SyncStats::Tld).string().not_null())
                    .col(ColumnDef::new(SyncStats::Inserted).big_integer().not_null())
                    .col(ColumnDef::new(SyncStats::Updated).big_integer().not_null())
                    .col(
                        ColumnDef::new(SyncStats::TotalChanges)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SyncStats::SyncTime).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sync_stats_sync_time")
                    .table(SyncStats::Table)
                    .col(SyncStats::SyncTime)
                    .to_owned(),
            )
            .await?;

        // sync_metadata table: one recency row per TLD
        manager
            .create_table(
                Table::create()
                    .table(SyncMetadata::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncMetadata::Tld)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SyncMetadata::LastSync).string().not_null())
                    .col(
                        ColumnDef::new(SyncMetadata::DomainCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncMetadata::SyncCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SyncMetadata::FirstSync).string().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncMetadata::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SyncStats::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Domains::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Domains {
    Table,
    Tld,
    Domain,
    Fqdn,
    FirstSeen,
    LastSeen,
    Ns,
    A,
    Aaaa,
    Ds,
    Source,
    ZoneFileDate,
}

#[derive(DeriveIden)]
enum SyncStats {
    Table,
    Id,
    Tld,
    Inserted,
    Updated,
    TotalChanges,
    SyncTime,
}

#[derive(DeriveIden)]
enum SyncMetadata {
    Table,
    Tld,
    LastSync,
    DomainCount,
    SyncCount,
    FirstSync,
}
