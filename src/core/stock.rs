//! Stock ledger - The only code path that writes `products.stock`.
//!
//! Both directions are single conditional `UPDATE` statements run on the
//! caller's transaction, next to the loan, incident or import row that explains
//! the movement. A decrement that would take stock below zero matches no row,
//! so two concurrent requests can never oversell the same units.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{prelude::*, sea_query::Expr};
use tracing::debug;

/// Rejects zero and negative movement quantities.
pub fn validate_quantity(quantity: i32) -> Result<i32> {
    if quantity < 1 {
        return Err(Error::validation(format!(
            "Quantity must be at least 1, got {quantity}"
        )));
    }
    Ok(quantity)
}

/// Takes `quantity` units out of an active product.
///
/// Runs `UPDATE products SET stock = stock - q WHERE id = ? AND stock >= q AND
/// is_archived = false`. When nothing matched, the product is re-read to tell a
/// missing or archived product apart from a short one.
///
/// # Errors
/// - [`Error::Validation`] if `quantity` is below 1
/// - [`Error::ProductNotFound`] if the product does not exist or is archived
/// - [`Error::InsufficientStock`] carrying the available units
pub async fn decrement<C>(db: &C, product_id: i64, quantity: i32) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    validate_quantity(quantity)?;

    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::IsArchived.eq(false))
        .filter(product::Column::Stock.gte(quantity))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let current = Product::find_by_id(product_id).one(db).await?;
        return Err(match current {
            Some(p) if !p.is_archived => Error::InsufficientStock {
                product_id,
                available: p.stock,
                requested: quantity,
            },
            _ => Error::ProductNotFound {
                id: product_id.to_string(),
            },
        });
    }

    debug!("Stock of product {product_id} decreased by {quantity}");
    reload(db, product_id).await
}

/// Puts `quantity` units back into a product.
///
/// Archived products still accept units, since a tool loaned before archival
/// can come back afterwards.
///
/// # Errors
/// - [`Error::Validation`] if `quantity` is below 1
/// - [`Error::ProductNotFound`] if the product does not exist
pub async fn increment<C>(db: &C, product_id: i64, quantity: i32) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    validate_quantity(quantity)?;

    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).add(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ProductNotFound {
            id: product_id.to_string(),
        });
    }

    debug!("Stock of product {product_id} increased by {quantity}");
    reload(db, product_id).await
}

async fn reload<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            id: product_id.to_string(),
        })
}
