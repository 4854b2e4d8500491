//! Create `society_form` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SocietyForm::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SocietyForm::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SocietyForm::SocietyId).string().not_null())
                    .col(ColumnDef::new(SocietyForm::Title).string_len(255).not_null())
                    .col(ColumnDef::new(SocietyForm::Description).text().null())
                    .col(ColumnDef::new(SocietyForm::FormSchema).json_binary().not_null())
                    .col(
                        ColumnDef::new(SocietyForm::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(SocietyForm::MaxSubmissions).integer().null())
                    .col(
                        ColumnDef::new(SocietyForm::SubmissionsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SocietyForm::StartDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SocietyForm::EndDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SocietyForm::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SocietyForm::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_society_form_society_id")
                    .table(SocietyForm::Table)
                    .col(SocietyForm::SocietyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_society_form_is_active")
                    .table(SocietyForm::Table)
                    .col(SocietyForm::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SocietyForm::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SocietyForm {
    Table,
    Id,
    SocietyId,
    Title,
    Description,
    FormSchema,
    IsActive,
    MaxSubmissions,
    SubmissionsCount,
    StartDate,
    EndDate,
    CreatedAt,
    UpdatedAt,
}
