//! Product business logic - Catalog maintenance for inventory items.
//!
//! This module creates, looks up, updates and archives products. Initial stock
//! and manual additions go through the stock ledger on the same transaction as
//! their audit entry; nothing here writes `stock` directly. Products are never
//! hard-deleted so loans and incidents keep their references.

use crate::{
    core::{
        audit::{self, LogEntry, MODULE_PRODUCTS},
        stock,
    },
    entities::{Category, Product, SupplierCode, product, supplier_code},
    errors::{CodeConflict, Error, Result},
};
use chrono::Utc;
use rand::Rng;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

const CODE_GENERATION_ATTEMPTS: usize = 10;

/// Input for a manually registered product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    /// Canonical code; generated from the category when absent
    pub code: Option<String>,
    /// Supplier aliases shown next to the code
    pub short_code: String,
    /// What the product is
    pub description: String,
    /// Product category
    pub category: Category,
    /// Units on hand at registration
    pub stock: i32,
    /// Reorder threshold
    pub min_stock: i32,
}

/// Editable product fields. Stock is not among them.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpdate {
    /// Supplier aliases shown next to the code
    pub short_code: String,
    /// What the product is
    pub description: String,
    /// Product category
    pub category: Category,
    /// Reorder threshold
    pub min_stock: i32,
}

/// Retrieves all active (non-archived) products, ordered by code.
pub async fn get_all_active_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::IsArchived.eq(false))
        .order_by_asc(product::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by its unique ID, archived or not.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Resolves a scanned or typed code to an active product.
///
/// The canonical code wins; otherwise the code is looked up among the
/// supplier aliases recorded during invoice imports.
pub async fn find_product_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<Option<product::Model>> {
    let code = code.trim();
    if code.is_empty() {
        return Ok(None);
    }

    if let Some(found) = Product::find()
        .filter(product::Column::Code.eq(code))
        .filter(product::Column::IsArchived.eq(false))
        .one(db)
        .await?
    {
        return Ok(Some(found));
    }

    let alias = SupplierCode::find()
        .filter(supplier_code::Column::Code.eq(code))
        .order_by_asc(supplier_code::Column::Id)
        .one(db)
        .await?;

    let Some(alias) = alias else {
        debug!("No product or supplier alias matches code '{code}'");
        return Ok(None);
    };

    Ok(Product::find_by_id(alias.product_id)
        .one(db)
        .await?
        .filter(|p| !p.is_archived))
}

/// Active products at or below their reorder threshold, lowest stock first.
pub async fn get_low_stock_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    let mut low: Vec<product::Model> = get_all_active_products(db)
        .await?
        .into_iter()
        .filter(product::Model::is_low_stock)
        .collect();
    low.sort_by_key(|p| (p.stock, p.code.clone()));
    Ok(low)
}

/// Creates a product and books its initial stock.
///
/// # Errors
/// - [`Error::Validation`] for an empty description or negative stock/minimum
/// - [`Error::DuplicateCode`] if the code is already taken (archived products included)
pub async fn create_product(db: &DatabaseConnection, new: NewProduct) -> Result<product::Model> {
    let description = new.description.trim().to_string();
    if description.is_empty() {
        return Err(Error::validation("Product description cannot be empty"));
    }
    if new.stock < 0 {
        return Err(Error::validation("Initial stock cannot be negative"));
    }
    if new.min_stock < 0 {
        return Err(Error::validation("Minimum stock cannot be negative"));
    }
    let requested_code = new
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let txn = db.begin().await?;

    let code = match requested_code {
        Some(code) => {
            ensure_code_available(&txn, &code, &description).await?;
            code
        }
        None => generate_unique_code(&txn, new.category).await?,
    };

    let mut created = insert_product(
        &txn,
        &code,
        new.short_code.trim(),
        &description,
        new.category,
        new.min_stock,
    )
    .await?;

    if new.stock > 0 {
        created = stock::increment(&txn, created.id, new.stock).await?;
    }

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "create_product",
            MODULE_PRODUCTS,
            format!("Registered {} with {} unit(s)", created.snapshot(), created.stock),
        )
        .with_details(json!({
            "product_id": created.id,
            "code": created.code,
            "category": created.category,
            "stock": created.stock,
        })),
    )
    .await;

    txn.commit().await?;
    info!("Created product {} ({})", created.code, created.id);
    Ok(created)
}

/// Updates descriptive fields and the reorder threshold of an active product.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    update: ProductUpdate,
) -> Result<product::Model> {
    let description = update.description.trim().to_string();
    if description.is_empty() {
        return Err(Error::validation("Product description cannot be empty"));
    }
    if update.min_stock < 0 {
        return Err(Error::validation("Minimum stock cannot be negative"));
    }

    let txn = db.begin().await?;

    let mut product: product::ActiveModel = find_active(&txn, product_id).await?.into();
    product.short_code = Set(update.short_code.trim().to_string());
    product.description = Set(description);
    product.category = Set(update.category);
    product.min_stock = Set(update.min_stock);
    product.updated_at = Set(Utc::now());
    let updated = product.update(&txn).await?;

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "update_product",
            MODULE_PRODUCTS,
            format!("Updated {}", updated.snapshot()),
        ),
    )
    .await;

    txn.commit().await?;
    Ok(updated)
}

/// Soft deletes a product by archiving it, preserving loan and incident history.
///
/// # Errors
/// Returns [`Error::ProductNotFound`] if the product does not exist or is already archived.
pub async fn archive_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let txn = db.begin().await?;

    let mut product: product::ActiveModel = find_active(&txn, product_id).await?.into();
    product.is_archived = Set(true);
    product.updated_at = Set(Utc::now());
    let archived = product.update(&txn).await?;

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "archive_product",
            MODULE_PRODUCTS,
            format!("Archived {}", archived.snapshot()),
        ),
    )
    .await;

    txn.commit().await?;
    info!("Archived product {}", archived.code);
    Ok(archived)
}

/// Manually adds units to an active product (purchases without an invoice,
/// found items, stock counts).
pub async fn add_stock(
    db: &DatabaseConnection,
    product_id: i64,
    quantity: i32,
    note: Option<String>,
) -> Result<product::Model> {
    stock::validate_quantity(quantity)?;

    let txn = db.begin().await?;

    find_active(&txn, product_id).await?;
    let updated = stock::increment(&txn, product_id, quantity).await?;

    audit::record_quietly(
        &txn,
        LogEntry::new(
            "add_stock",
            MODULE_PRODUCTS,
            format!("Added {quantity} unit(s) to {}", updated.snapshot()),
        )
        .with_details(json!({
            "product_id": product_id,
            "quantity": quantity,
            "stock_after": updated.stock,
            "note": note,
        })),
    )
    .await;

    txn.commit().await?;
    info!("Added {quantity} unit(s) to product {product_id}");
    Ok(updated)
}

/// Loads a product that exists and is not archived.
pub(crate) async fn find_active<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .filter(|p| !p.is_archived)
        .ok_or_else(|| Error::ProductNotFound {
            id: product_id.to_string(),
        })
}

/// Inserts a product row with zero stock; callers book stock through the ledger.
pub(crate) async fn insert_product<C>(
    db: &C,
    code: &str,
    short_code: &str,
    description: &str,
    category: Category,
    min_stock: i32,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    product::ActiveModel {
        code: Set(code.to_string()),
        short_code: Set(short_code.to_string()),
        description: Set(description.to_string()),
        category: Set(category),
        stock: Set(0),
        min_stock: Set(min_stock),
        is_archived: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| Error::from_insert(e, code, description))
}

/// Fails with [`Error::DuplicateCode`] if any product, archived or not, holds `code`.
pub(crate) async fn ensure_code_available<C>(db: &C, code: &str, description: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let taken = Product::find()
        .filter(product::Column::Code.eq(code))
        .one(db)
        .await?;

    if taken.is_some() {
        return Err(Error::DuplicateCode {
            conflicts: vec![CodeConflict {
                code: code.to_string(),
                description: description.to_string(),
            }],
        });
    }
    Ok(())
}

/// Builds a candidate code: category prefix, timestamp and a random suffix,
/// e.g. `HER-261018143005-042`.
#[must_use]
pub fn generate_code(category: Category) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!(
        "{}-{}-{suffix:03}",
        category.code_prefix(),
        Utc::now().format("%y%m%d%H%M%S")
    )
}

/// Generates codes until one is free.
pub(crate) async fn generate_unique_code<C>(db: &C, category: Category) -> Result<String>
where
    C: ConnectionTrait,
{
    for _ in 0..CODE_GENERATION_ATTEMPTS {
        let candidate = generate_code(category);
        let taken = Product::find()
            .filter(product::Column::Code.eq(candidate.as_str()))
            .one(db)
            .await?;
        if taken.is_none() {
            return Ok(candidate);
        }
    }

    Err(Error::validation(format!(
        "Could not generate a free {} code, please enter one manually",
        category.code_prefix()
    )))
}
