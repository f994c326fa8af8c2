use sea_orm_migration::{prelude::*, schema::*};

use crate::m20240101_000001_create_tenancy_tables::{Companies, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BillingClients::Table)
                    .if_not_exists()
                    .col(pk_auto(BillingClients::Id))
                    .col(integer(BillingClients::CompanyId))
                    .col(string(BillingClients::Name))
                    .col(string(BillingClients::BillingCurrency).default("EUR"))
                    .col(double_null(BillingClients::DefaultHourlyRate))
                    .col(timestamp_with_time_zone(BillingClients::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_clients_company_id")
                            .from(BillingClients::Table, BillingClients::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_billing_clients_company_name_unique")
                    .table(BillingClients::Table)
                    .col(BillingClients::CompanyId)
                    .col(BillingClients::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BillingProjects::Table)
                    .if_not_exists()
                    .col(pk_auto(BillingProjects::Id))
                    .col(integer(BillingProjects::CompanyId))
                    .col(integer(BillingProjects::ClientId))
                    .col(string(BillingProjects::Name))
                    .col(double_null(BillingProjects::DefaultHourlyRate))
                    .col(timestamp_with_time_zone(BillingProjects::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_projects_client_id")
                            .from(BillingProjects::Table, BillingProjects::ClientId)
                            .to(BillingClients::Table, BillingClients::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BillingProjectMappings::Table)
                    .if_not_exists()
                    .col(pk_auto(BillingProjectMappings::Id))
                    .col(integer(BillingProjectMappings::CompanyId))
                    .col(integer(BillingProjectMappings::ProjectId))
                    .col(string(BillingProjectMappings::JiraInstance))
                    .col(string(BillingProjectMappings::JiraProjectKey))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_project_mappings_project_id")
                            .from(BillingProjectMappings::Table, BillingProjectMappings::ProjectId)
                            .to(BillingProjects::Table, BillingProjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_billing_project_mappings_unique")
                    .table(BillingProjectMappings::Table)
                    .col(BillingProjectMappings::ProjectId)
                    .col(BillingProjectMappings::JiraInstance)
                    .col(BillingProjectMappings::JiraProjectKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BillingRates::Table)
                    .if_not_exists()
                    .col(pk_auto(BillingRates::Id))
                    .col(integer(BillingRates::CompanyId))
                    .col(integer(BillingRates::ProjectId))
                    .col(string_null(BillingRates::UserEmail))
                    .col(string_null(BillingRates::IssueType))
                    .col(double(BillingRates::HourlyRate))
                    .col(date_null(BillingRates::ValidFrom))
                    .col(date_null(BillingRates::ValidTo))
                    .col(timestamp_with_time_zone(BillingRates::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_rates_project_id")
                            .from(BillingRates::Table, BillingRates::ProjectId)
                            .to(BillingProjects::Table, BillingProjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BillingWorklogClassifications::Table)
                    .if_not_exists()
                    .col(pk_auto(BillingWorklogClassifications::Id))
                    .col(integer(BillingWorklogClassifications::CompanyId))
                    .col(string(BillingWorklogClassifications::WorklogId))
                    .col(string(BillingWorklogClassifications::JiraInstance))
                    .col(boolean(BillingWorklogClassifications::IsBillable).default(true))
                    .col(double_null(BillingWorklogClassifications::OverrideHourlyRate))
                    .col(text_null(BillingWorklogClassifications::Note))
                    .col(timestamp_with_time_zone(BillingWorklogClassifications::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_worklog_classifications_company_id")
                            .from(
                                BillingWorklogClassifications::Table,
                                BillingWorklogClassifications::CompanyId,
                            )
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_billing_worklog_classifications_unique")
                    .table(BillingWorklogClassifications::Table)
                    .col(BillingWorklogClassifications::CompanyId)
                    .col(BillingWorklogClassifications::WorklogId)
                    .col(BillingWorklogClassifications::JiraInstance)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(pk_auto(Invoices::Id))
                    .col(integer(Invoices::CompanyId))
                    .col(integer(Invoices::ClientId))
                    .col(integer_null(Invoices::ProjectId))
                    .col(date(Invoices::PeriodStart))
                    .col(date(Invoices::PeriodEnd))
                    .col(string(Invoices::Status).default("DRAFT"))
                    .col(string(Invoices::Currency))
                    .col(double(Invoices::SubtotalAmount).default(0.0))
                    .col(double(Invoices::TaxesAmount).default(0.0))
                    .col(double(Invoices::TotalAmount).default(0.0))
                    .col(string(Invoices::GroupBy))
                    .col(timestamp_with_time_zone_null(Invoices::IssuedAt))
                    .col(timestamp_with_time_zone_null(Invoices::VoidedAt))
                    .col(integer(Invoices::CreatedBy))
                    .col(timestamp_with_time_zone(Invoices::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoices_client_id")
                            .from(Invoices::Table, Invoices::ClientId)
                            .to(BillingClients::Table, BillingClients::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoices_created_by")
                            .from(Invoices::Table, Invoices::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InvoiceLineItems::Table)
                    .if_not_exists()
                    .col(pk_auto(InvoiceLineItems::Id))
                    .col(integer(InvoiceLineItems::InvoiceId))
                    .col(string(InvoiceLineItems::LineType).default("work"))
                    .col(string(InvoiceLineItems::GroupKey))
                    .col(string(InvoiceLineItems::Description))
                    .col(double(InvoiceLineItems::QuantityHours))
                    .col(double(InvoiceLineItems::HourlyRate))
                    .col(double(InvoiceLineItems::Amount))
                    .col(integer(InvoiceLineItems::SortOrder).default(0))
                    .col(text_null(InvoiceLineItems::Metadata))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoice_line_items_invoice_id")
                            .from(InvoiceLineItems::Table, InvoiceLineItems::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InvoiceLineItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillingWorklogClassifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillingRates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillingProjectMappings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillingProjects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillingClients::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum BillingClients {
    Table,
    Id,
    CompanyId,
    Name,
    BillingCurrency,
    DefaultHourlyRate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BillingProjects {
    Table,
    Id,
    CompanyId,
    ClientId,
    Name,
    DefaultHourlyRate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BillingProjectMappings {
    Table,
    Id,
    CompanyId,
    ProjectId,
    JiraInstance,
    JiraProjectKey,
}

#[derive(DeriveIden)]
enum BillingRates {
    Table,
    Id,
    CompanyId,
    ProjectId,
    UserEmail,
    IssueType,
    HourlyRate,
    ValidFrom,
    ValidTo,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BillingWorklogClassifications {
    Table,
    Id,
    CompanyId,
    WorklogId,
    JiraInstance,
    IsBillable,
    OverrideHourlyRate,
    Note,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Invoices {
    Table,
    Id,
    CompanyId,
    ClientId,
    ProjectId,
    PeriodStart,
    PeriodEnd,
    Status,
    Currency,
    SubtotalAmount,
    TaxesAmount,
    TotalAmount,
    GroupBy,
    IssuedAt,
    VoidedAt,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum InvoiceLineItems {
    Table,
    Id,
    InvoiceId,
    LineType,
    GroupKey,
    Description,
    QuantityHours,
    HourlyRate,
    Amount,
    SortOrder,
    Metadata,
}
