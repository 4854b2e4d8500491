//! Create `form_response` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FormResponse::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormResponse::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FormResponse::FormId).string().not_null())
                    .col(
                        ColumnDef::new(FormResponse::SubmissionData)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FormResponse::SubmitterEmail)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FormResponse::SubmitterName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FormResponse::SubmitterPhone).string_len(20).null())
                    .col(ColumnDef::new(FormResponse::FilesJson).json_binary().null())
                    .col(ColumnDef::new(FormResponse::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(FormResponse::UserAgent).text().null())
                    .col(ColumnDef::new(FormResponse::HoneypotValue).string_len(255).null())
                    .col(
                        ColumnDef::new(FormResponse::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_form_response_form")
                            .from(FormResponse::Table, FormResponse::FormId)
                            .to(SocietyForm::Table, SocietyForm::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_form_response_form_id")
                    .table(FormResponse::Table)
                    .col(FormResponse::FormId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_form_response_created_at")
                    .table(FormResponse::Table)
                    .col(FormResponse::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // One submission per submitter per form
        manager
            .create_index(
                Index::create()
                    .name("idx_form_response_form_email_unique")
                    .table(FormResponse::Table)
                    .col(FormResponse::FormId)
                    .col(FormResponse::SubmitterEmail)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FormResponse::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FormResponse {
    Table,
    Id,
    FormId,
    SubmissionData,
    SubmitterEmail,
    SubmitterName,
    SubmitterPhone,
    FilesJson,
    IpAddress,
    UserAgent,
    HoneypotValue,
    CreatedAt,
}

#[derive(Iden)]
enum SocietyForm {
    Table,
    Id,
}
