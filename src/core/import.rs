//! Import reconciliation - Merging invoice items and spreadsheet rows into the catalog.
//!
//! Invoice items arrive already tagged by the operator as either a new product
//! or a link to an existing one. Spreadsheet rows always create products and go
//! through a duplicate-code pre-flight that aborts the whole batch before the
//! first write. Each batch is one transaction: a failing item leaves the catalog
//! exactly as it was, so re-running a fixed batch behaves like a first run.

use crate::{
    core::{
        audit::{self, LogEntry, MODULE_IMPORTS},
        product::{ensure_code_available, find_active, generate_unique_code, insert_product},
        stock,
    },
    entities::{Category, Product, SupplierCode, product, supplier_code},
    errors::{CodeConflict, Error, Result},
};
use chrono::Utc;
use sea_orm::{DatabaseTransaction, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Separator between supplier aliases in `short_code`.
pub const ALIAS_SEPARATOR: &str = " / ";

/// What to do with one invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ItemAction {
    /// Register a new product from the line
    Create {
        /// Canonical code; generated from the category when absent
        #[serde(default)]
        code: Option<String>,
        /// Category of the new product
        category: Category,
        /// Reorder threshold of the new product
        #[serde(default)]
        min_stock: i32,
    },
    /// Add the line's units to an existing product
    Link {
        /// Target product
        product_id: i64,
    },
}

/// One validated invoice line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceItem {
    /// The provider's code for the item, if the invoice carries one
    pub supplier_code: Option<String>,
    /// Line description
    pub description: String,
    /// Units received, at least 1
    pub quantity: i32,
    /// Operator decision for the line
    pub action: ItemAction,
}

/// A validated invoice ready for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceImport {
    /// Issuer name, stored on every new supplier alias
    pub provider: String,
    /// Lines in document order
    pub items: Vec<InvoiceItem>,
}

/// One typed spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    /// Row number as shown by the spreadsheet program (header is row 1)
    pub row_number: usize,
    /// Explicit canonical code (CODIGO)
    pub code: Option<String>,
    /// Supplier alias (CLAVE_PROV)
    pub supplier_code: Option<String>,
    /// DESCRIPCION
    pub description: String,
    /// CATEGORIA, already coerced to a known category
    pub category: Category,
    /// STOCK
    pub stock: i32,
    /// MINIMO
    pub min_stock: i32,
}

/// A spreadsheet after row validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetImport {
    /// Rows to import
    pub rows: Vec<SheetRow>,
    /// Rows left out for missing description or category
    pub skipped_rows: Vec<usize>,
}

/// Outcome of an import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Ids of products created by the batch
    pub created: Vec<i64>,
    /// Ids of existing products that received units
    pub linked: Vec<i64>,
    /// Total units booked into stock
    pub units_added: i64,
    /// Spreadsheet rows that were skipped
    pub skipped_rows: Vec<usize>,
}

/// Appends `alias` to a `short_code` unless it is already part of it.
#[must_use]
pub fn merge_short_code(existing: &str, alias: &str) -> String {
    let existing = existing.trim();
    let alias = alias.trim();
    if alias.is_empty() || existing.contains(alias) {
        existing.to_string()
    } else if existing.is_empty() {
        alias.to_string()
    } else {
        format!("{existing}{ALIAS_SEPARATOR}{alias}")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Reconciles an invoice against the catalog.
///
/// # Errors
/// - [`Error::Validation`] for an empty invoice, blank description or bad quantity
/// - [`Error::DuplicateCode`] when a `create` line names a taken code
/// - [`Error::ProductNotFound`] when a `link` line targets a missing or archived product
pub async fn import_invoice(
    db: &DatabaseConnection,
    invoice: InvoiceImport,
) -> Result<ImportSummary> {
    let provider = invoice.provider.trim().to_string();
    if provider.is_empty() {
        return Err(Error::validation("Invoice provider cannot be empty"));
    }
    if invoice.items.is_empty() {
        return Err(Error::validation("Invoice has no items to import"));
    }
    for (index, item) in invoice.items.iter().enumerate() {
        if item.description.trim().is_empty() {
            return Err(Error::validation(format!(
                "Item {} has no description",
                index + 1
            )));
        }
        stock::validate_quantity(item.quantity)?;
        if let ItemAction::Create { min_stock, .. } = item.action {
            if min_stock < 0 {
                return Err(Error::validation(format!(
                    "Item {} has a negative minimum stock",
                    index + 1
                )));
            }
        }
    }

    let txn = db.begin().await?;
    let mut summary = ImportSummary::default();

    for item in &invoice.items {
        let description = item.description.trim();
        let alias = non_blank(item.supplier_code.as_deref());

        match &item.action {
            ItemAction::Create {
                code,
                category,
                min_stock,
            } => {
                let code = match non_blank(code.as_deref()) {
                    Some(code) => {
                        ensure_code_available(&txn, code, description).await?;
                        code.to_string()
                    }
                    None => generate_unique_code(&txn, *category).await?,
                };
                let created = insert_product(
                    &txn,
                    &code,
                    alias.unwrap_or_default(),
                    description,
                    *category,
                    *min_stock,
                )
                .await?;
                stock::increment(&txn, created.id, item.quantity).await?;
                if let Some(alias) = alias {
                    insert_alias(&txn, created.id, alias, &provider).await?;
                }
                summary.created.push(created.id);
            }
            ItemAction::Link { product_id } => {
                let target = find_active(&txn, *product_id).await?;
                if let Some(alias) = alias {
                    link_alias(&txn, &target, alias, &provider).await?;
                }
                stock::increment(&txn, target.id, item.quantity).await?;
                summary.linked.push(target.id);
            }
        }
        summary.units_added += i64::from(item.quantity);
    }

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "import_invoice",
            MODULE_IMPORTS,
            format!(
                "Invoice from {provider}: {} created, {} linked, {} unit(s)",
                summary.created.len(),
                summary.linked.len(),
                summary.units_added
            ),
        )
        .with_details(json!({
            "provider": provider,
            "created": summary.created,
            "linked": summary.linked,
            "units_added": summary.units_added,
        })),
    )
    .await;

    txn.commit().await?;
    info!(
        "Imported invoice from {provider} with {} item(s)",
        invoice.items.len()
    );
    Ok(summary)
}

/// Creates one product per spreadsheet row, or nothing at all.
///
/// Explicit codes are checked against the catalog and against each other
/// before the first insert; every collision is reported together.
///
/// # Errors
/// - [`Error::Validation`] for an empty sheet or negative numbers
/// - [`Error::DuplicateCode`] listing every colliding code
pub async fn import_spreadsheet(
    db: &DatabaseConnection,
    sheet: SheetImport,
) -> Result<ImportSummary> {
    if sheet.rows.is_empty() && sheet.skipped_rows.is_empty() {
        return Err(Error::validation("Spreadsheet has no rows to import"));
    }
    for row in &sheet.rows {
        if row.stock < 0 || row.min_stock < 0 {
            return Err(Error::validation(format!(
                "Row {}: stock and minimum cannot be negative",
                row.row_number
            )));
        }
    }

    let txn = db.begin().await?;

    let conflicts = find_code_conflicts(&txn, &sheet.rows).await?;
    if !conflicts.is_empty() {
        return Err(Error::DuplicateCode { conflicts });
    }

    let mut summary = ImportSummary {
        skipped_rows: sheet.skipped_rows.clone(),
        ..Default::default()
    };

    for row in &sheet.rows {
        let code = match non_blank(row.code.as_deref()) {
            Some(code) => code.to_string(),
            None => generate_unique_code(&txn, row.category).await?,
        };
        let created = insert_product(
            &txn,
            &code,
            non_blank(row.supplier_code.as_deref()).unwrap_or_default(),
            row.description.trim(),
            row.category,
            row.min_stock,
        )
        .await?;
        if row.stock > 0 {
            stock::increment(&txn, created.id, row.stock).await?;
        }
        summary.created.push(created.id);
        summary.units_added += i64::from(row.stock);
    }

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "import_spreadsheet",
            MODULE_IMPORTS,
            format!(
                "Spreadsheet import: {} product(s), {} unit(s), {} row(s) skipped",
                summary.created.len(),
                summary.units_added,
                summary.skipped_rows.len()
            ),
        )
        .with_details(json!({
            "created": summary.created,
            "units_added": summary.units_added,
            "skipped_rows": summary.skipped_rows,
        })),
    )
    .await;

    txn.commit().await?;
    info!(
        "Imported {} spreadsheet row(s), skipped {}",
        summary.created.len(),
        summary.skipped_rows.len()
    );
    Ok(summary)
}

/// Explicit codes that already exist or appear more than once in the batch,
/// in row order.
async fn find_code_conflicts(
    txn: &DatabaseTransaction,
    rows: &[SheetRow],
) -> Result<Vec<CodeConflict>> {
    let explicit: Vec<(&str, &SheetRow)> = rows
        .iter()
        .filter_map(|row| non_blank(row.code.as_deref()).map(|code| (code, row)))
        .collect();
    if explicit.is_empty() {
        return Ok(Vec::new());
    }

    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for (code, _) in &explicit {
        *occurrences.entry(*code).or_default() += 1;
    }

    let existing: HashSet<String> = Product::find()
        .filter(product::Column::Code.is_in(explicit.iter().map(|(code, _)| *code)))
        .all(txn)
        .await?
        .into_iter()
        .map(|p| p.code)
        .collect();

    let conflicts = explicit
        .into_iter()
        .filter(|(code, _)| existing.contains(*code) || occurrences[code] > 1)
        .map(|(code, row)| CodeConflict {
            code: code.to_string(),
            description: row.description.trim().to_string(),
        })
        .collect();
    Ok(conflicts)
}

async fn insert_alias(
    txn: &DatabaseTransaction,
    product_id: i64,
    alias: &str,
    provider: &str,
) -> Result<supplier_code::Model> {
    supplier_code::ActiveModel {
        product_id: Set(product_id),
        code: Set(alias.to_string()),
        provider: Set(provider.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(Into::into)
}

/// Records `alias` for an existing product once and folds it into `short_code`.
async fn link_alias(
    txn: &DatabaseTransaction,
    target: &product::Model,
    alias: &str,
    provider: &str,
) -> Result<()> {
    let known = SupplierCode::find()
        .filter(supplier_code::Column::ProductId.eq(target.id))
        .filter(supplier_code::Column::Code.eq(alias))
        .one(txn)
        .await?;
    if known.is_none() {
        insert_alias(txn, target.id, alias, provider).await?;
    }

    let merged = merge_short_code(&target.short_code, alias);
    if merged != target.short_code {
        let mut product: product::ActiveModel = target.clone().into();
        product.short_code = Set(merged);
        product.updated_at = Set(Utc::now());
        product.update(txn).await?;
    }
    Ok(())
}
