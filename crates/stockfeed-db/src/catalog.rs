//! The two catalog queries: the group×product left join feeding the
//! aggregator, and the monthly price lookup feeding the price book.

use rust_decimal::Decimal;
use sqlx::PgPool;
use stockfeed_core::{PriceBook, SourceRow};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// One row of the `product_groups` × `products` left join.
///
/// Product columns are nullable as a block: a group with no products yields
/// one row where all of them are `NULL`. `group_id` is nullable only at the
/// type level so the aggregator's drop-unattributable-row path stays
/// reachable; the schema itself cannot produce a `NULL` group id.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogJoinRow {
    pub group_id: Option<i64>,
    pub group_name: String,
    pub group_slug: Option<String>,
    pub group_headline: Option<String>,
    pub group_tagline: Option<String>,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_slug: Option<String>,
    pub qty: Option<i32>,
    pub stock_control: Option<bool>,
    pub product_hidden: Option<bool>,
}

impl From<CatalogJoinRow> for SourceRow {
    fn from(row: CatalogJoinRow) -> Self {
        Self {
            group_id: row.group_id,
            group_name: row.group_name,
            group_slug: row.group_slug,
            group_headline: row.group_headline,
            group_tagline: row.group_tagline,
            product_id: row.product_id,
            product_name: row.product_name,
            product_description: row.product_description,
            product_slug: row.product_slug,
            quantity: row.qty,
            stock_control: row.stock_control,
            product_hidden: row.product_hidden,
        }
    }
}

/// A row from the `product_pricing` table, monthly cycle only.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PricingRow {
    pub rel_id: i64,
    /// `NULL`, `0`, and `-1` all mean "no real price"; normalization happens
    /// in the engine, not here.
    pub monthly: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetches the flat catalog row stream in deterministic presentation order.
///
/// Ordering is `(display_order, id)` for groups and then products, so
/// repeated runs over unchanged data produce an identical document. Hidden
/// products are always selected; visibility is the engine's decision.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_catalog_rows(pool: &PgPool) -> Result<Vec<SourceRow>, DbError> {
    let rows = sqlx::query_as::<_, CatalogJoinRow>(
        "SELECT \
             g.id AS group_id, \
             g.name AS group_name, \
             g.slug AS group_slug, \
             g.headline AS group_headline, \
             g.tagline AS group_tagline, \
             p.id AS product_id, \
             p.name AS product_name, \
             p.description AS product_description, \
             p.slug AS product_slug, \
             p.qty, \
             p.stock_control, \
             p.hidden AS product_hidden \
         FROM product_groups g \
         LEFT JOIN products p ON p.group_id = g.id \
         ORDER BY g.display_order, g.id, p.display_order, p.id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(SourceRow::from).collect())
}

/// Loads every monthly product price into a [`PriceBook`].
///
/// One query up front instead of one lookup per product row; rows whose
/// monthly column is `NULL` are skipped and resolve to "missing" (zero) in
/// the engine.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_price_book(pool: &PgPool) -> Result<PriceBook, DbError> {
    let rows = sqlx::query_as::<_, PricingRow>(
        "SELECT rel_id, monthly \
         FROM product_pricing \
         WHERE rel_type = 'product'",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| row.monthly.map(|price| (row.rel_id, price)))
        .collect())
}
