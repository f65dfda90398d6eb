//! Aggregation of flat group×product rows into the nested catalog.
//!
//! One linear pass over an already-materialized row set: group skeletons are
//! created on first sight of a group id, products are assembled through
//! [`crate::extract`] and appended in row order. The fold owns all of its
//! state explicitly, so the same input always yields the same document.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::app_config::AppConfig;
use crate::catalog::{CatalogDocument, CatalogGroup, CatalogProduct};
use crate::extract;

/// One row of the flat group×product left join.
///
/// A group with no products yields a single row with every product field
/// `None`. `product_slug` is part of the queried shape but does not feed the
/// output; order URLs are built from the group slug.
#[derive(Debug, Clone, Default)]
pub struct SourceRow {
    /// `None` models a row whose group reference could not be resolved;
    /// such rows are dropped, they cannot be attributed to any group.
    pub group_id: Option<i64>,
    pub group_name: String,
    pub group_slug: Option<String>,
    pub group_headline: Option<String>,
    pub group_tagline: Option<String>,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_slug: Option<String>,
    pub quantity: Option<i32>,
    pub stock_control: Option<bool>,
    pub product_hidden: Option<bool>,
}

/// Monthly prices keyed by product id, pre-loaded in full so the aggregation
/// pass is a pure in-memory fold with no lookups crossing an async boundary.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    monthly: HashMap<i64, Decimal>,
}

impl PriceBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product_id: i64, monthly: Decimal) {
        self.monthly.insert(product_id, monthly);
    }

    /// The raw monthly price for a product, or `None` when the pricing
    /// source has no row for it. Callers treat `None` as zero.
    #[must_use]
    pub fn monthly(&self, product_id: i64) -> Option<Decimal> {
        self.monthly.get(&product_id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.monthly.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.monthly.is_empty()
    }
}

impl FromIterator<(i64, Decimal)> for PriceBook {
    fn from_iter<I: IntoIterator<Item = (i64, Decimal)>>(iter: I) -> Self {
        Self {
            monthly: iter.into_iter().collect(),
        }
    }
}

/// Engine knobs, threaded explicitly instead of read from process state.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// Prefix for order URLs, e.g. `"https://panel.example.com/store/"`.
    pub base_url: String,
    /// When false, hidden products are left out of their group's list.
    pub include_hidden: bool,
}

impl CatalogSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            include_hidden: config.display_hidden,
        }
    }
}

/// Folds `rows` into groups, preserving first-seen group order and row-order
/// product lists.
///
/// A row with no group id is dropped; a hidden product is skipped when
/// `settings.include_hidden` is false (its group skeleton is still created);
/// a product with no price row gets a `0.00` price. No row can fail the pass.
#[must_use]
pub fn build_catalog(
    rows: &[SourceRow],
    prices: &PriceBook,
    settings: &CatalogSettings,
) -> Vec<CatalogGroup> {
    let mut groups: Vec<CatalogGroup> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let Some(group_id) = row.group_id else {
            tracing::debug!(group_name = %row.group_name, "dropping catalog row with no group id");
            continue;
        };

        let slot = *index.entry(group_id).or_insert_with(|| {
            groups.push(CatalogGroup {
                id: group_id,
                name: row.group_name.clone(),
                slug: row.group_slug.clone().unwrap_or_default(),
                headline: row.group_headline.clone().unwrap_or_default(),
                tagline: row.group_tagline.clone().unwrap_or_default(),
                products: Vec::new(),
            });
            groups.len() - 1
        });

        if !settings.include_hidden && row.product_hidden.unwrap_or(false) {
            continue;
        }

        let Some(product_id) = row.product_id else {
            continue; // group-only row from the left join
        };

        let group_slug = groups[slot].slug.clone();
        let product = assemble_product(product_id, row, prices, &group_slug, settings);
        groups[slot].products.push(product);
    }

    groups
}

/// Wraps [`build_catalog`] in the response envelope. The engine has no fatal
/// path, so `success` is always true from its perspective.
#[must_use]
pub fn build_document(
    rows: &[SourceRow],
    prices: &PriceBook,
    settings: &CatalogSettings,
) -> CatalogDocument {
    CatalogDocument {
        success: true,
        products: build_catalog(rows, prices, settings),
    }
}

/// Assembles one product from its row: splits the description, runs the
/// extraction rules, normalizes price and stock, and builds the order URL.
fn assemble_product(
    product_id: i64,
    row: &SourceRow,
    prices: &PriceBook,
    group_slug: &str,
    settings: &CatalogSettings,
) -> CatalogProduct {
    let name = row.product_name.clone().unwrap_or_default();
    let description = extract::split_description_lines(row.product_description.as_deref());
    let specs = extract::extract_specs(&description);
    let quantity = row.quantity.unwrap_or(0);
    let stock_control = row.stock_control.unwrap_or(false);
    let catalog_url = extract::catalog_url(&settings.base_url, group_slug, &name);

    CatalogProduct {
        id: product_id,
        name,
        description,
        cpu: specs.cpu,
        ram: specs.ram,
        storage: specs.storage,
        bandwidth: specs.bandwidth,
        location: specs.location,
        quantity,
        price: extract::normalize_price(prices.monthly(product_id)),
        in_stock: extract::in_stock(quantity, stock_control),
        catalog_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RamMb;

    fn settings() -> CatalogSettings {
        CatalogSettings {
            base_url: "http://h/".to_string(),
            include_hidden: true,
        }
    }

    fn group_only_row(group_id: i64, name: &str) -> SourceRow {
        SourceRow {
            group_id: Some(group_id),
            group_name: name.to_string(),
            group_slug: Some(name.to_lowercase()),
            group_headline: Some(format!("{name} headline")),
            group_tagline: Some(format!("{name} tagline")),
            ..SourceRow::default()
        }
    }

    fn product_row(group_id: i64, product_id: i64, product_name: &str) -> SourceRow {
        SourceRow {
            product_id: Some(product_id),
            product_name: Some(product_name.to_string()),
            product_description: Some(
                "(4 vCores)\r\n8GB\r\n100GB\r\n2TB\r\nLocated in London".to_string(),
            ),
            product_slug: Some(product_name.to_lowercase().replace(' ', "-")),
            quantity: Some(5),
            stock_control: Some(true),
            product_hidden: Some(false),
            ..group_only_row(group_id, "VPS")
        }
    }

    fn prices_of(pairs: &[(i64, Decimal)]) -> PriceBook {
        pairs.iter().copied().collect()
    }

    #[test]
    fn groups_preserve_first_seen_order() {
        let rows = vec![
            product_row(7, 1, "Plan A"),
            product_row(2, 2, "Plan B"),
            product_row(7, 3, "Plan C"),
        ];
        let groups = build_catalog(&rows, &PriceBook::new(), &settings());

        let ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![7, 2]);
    }

    #[test]
    fn every_product_lands_under_exactly_one_group() {
        let rows = vec![
            product_row(7, 1, "Plan A"),
            product_row(2, 2, "Plan B"),
            product_row(7, 3, "Plan C"),
        ];
        let groups = build_catalog(&rows, &PriceBook::new(), &settings());

        let total: usize = groups.iter().map(CatalogGroup::product_count).sum();
        assert_eq!(total, 3);
        assert_eq!(groups[0].products.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(groups[1].products[0].id, 2);
    }

    #[test]
    fn group_with_no_products_still_appears() {
        let rows = vec![group_only_row(4, "Empty")];
        let groups = build_catalog(&rows, &PriceBook::new(), &settings());

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, 4);
        assert!(groups[0].products.is_empty());
    }

    #[test]
    fn nullable_group_fields_default_to_empty_strings() {
        let rows = vec![SourceRow {
            group_id: Some(9),
            group_name: "Bare".to_string(),
            ..SourceRow::default()
        }];
        let groups = build_catalog(&rows, &PriceBook::new(), &settings());

        assert_eq!(groups[0].slug, "");
        assert_eq!(groups[0].headline, "");
        assert_eq!(groups[0].tagline, "");
    }

    #[test]
    fn row_without_group_id_is_dropped() {
        let rows = vec![
            SourceRow {
                group_id: None,
                group_name: "Orphan".to_string(),
                ..SourceRow::default()
            },
            product_row(1, 1, "Plan A"),
        ];
        let groups = build_catalog(&rows, &PriceBook::new(), &settings());

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, 1);
    }

    #[test]
    fn missing_price_row_yields_zero_price() {
        let rows = vec![product_row(1, 1, "Plan A")];
        let groups = build_catalog(&rows, &PriceBook::new(), &settings());

        assert_eq!(groups[0].products[0].price, Decimal::new(0, 2));
    }

    #[test]
    fn price_resolves_through_the_price_book() {
        let rows = vec![product_row(1, 1, "Plan A")];
        let prices = prices_of(&[(1, Decimal::new(1999, 2))]);
        let groups = build_catalog(&rows, &prices, &settings());

        assert_eq!(groups[0].products[0].price, Decimal::new(1999, 2));
    }

    #[test]
    fn free_sentinel_price_normalizes_to_zero() {
        let rows = vec![product_row(1, 1, "Plan A")];
        let prices = prices_of(&[(1, Decimal::new(-1, 0))]);
        let groups = build_catalog(&rows, &prices, &settings());

        assert_eq!(groups[0].products[0].price, Decimal::new(0, 2));
    }

    #[test]
    fn extraction_feeds_product_spec_fields() {
        let rows = vec![product_row(1, 1, "Plan A")];
        let groups = build_catalog(&rows, &PriceBook::new(), &settings());

        let product = &groups[0].products[0];
        assert_eq!(product.cpu, "4");
        assert_eq!(product.ram, RamMb(Some(8192)));
        assert_eq!(product.storage, "100");
        assert_eq!(product.bandwidth, "2");
        assert_eq!(product.location, "London");
        assert_eq!(
            product.description,
            vec!["(4 vCores)", "8GB", "100GB", "2TB", "Located in London"]
        );
    }

    #[test]
    fn unparseable_description_degrades_to_defaults_but_keeps_raw_lines() {
        let mut row = product_row(1, 1, "Plan A");
        row.product_description = Some("no match here".to_string());
        let groups = build_catalog(&[row], &PriceBook::new(), &settings());

        let product = &groups[0].products[0];
        assert_eq!(product.cpu, "");
        assert_eq!(product.ram, RamMb(None));
        assert_eq!(product.storage, "");
        assert_eq!(product.bandwidth, "");
        assert_eq!(product.location, "");
        assert_eq!(product.description, vec!["no match here"]);
    }

    #[test]
    fn order_url_uses_group_slug_and_hyphenated_name() {
        let rows = vec![product_row(1, 1, "Basic Plan")];
        let groups = build_catalog(&rows, &PriceBook::new(), &settings());

        assert_eq!(groups[0].products[0].catalog_url, "http://h/vps/basic-plan");
    }

    #[test]
    fn hidden_product_is_skipped_when_hidden_excluded() {
        let mut hidden = product_row(1, 1, "Hidden Plan");
        hidden.product_hidden = Some(true);
        let rows = vec![hidden, product_row(1, 2, "Visible Plan")];
        let opts = CatalogSettings {
            include_hidden: false,
            ..settings()
        };
        let groups = build_catalog(&rows, &PriceBook::new(), &opts);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].product_count(), 1);
        assert_eq!(groups[0].products[0].id, 2);
    }

    #[test]
    fn hidden_only_group_still_yields_its_skeleton() {
        let mut hidden = product_row(3, 1, "Hidden Plan");
        hidden.product_hidden = Some(true);
        let opts = CatalogSettings {
            include_hidden: false,
            ..settings()
        };
        let groups = build_catalog(&[hidden], &PriceBook::new(), &opts);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].products.is_empty());
    }

    #[test]
    fn hidden_product_is_kept_when_hidden_included() {
        let mut hidden = product_row(1, 1, "Hidden Plan");
        hidden.product_hidden = Some(true);
        let groups = build_catalog(&[hidden], &PriceBook::new(), &settings());

        assert_eq!(groups[0].product_count(), 1);
    }

    #[test]
    fn stock_flag_follows_quantity_and_stock_control() {
        let mut controlled_empty = product_row(1, 1, "A");
        controlled_empty.quantity = Some(0);
        controlled_empty.stock_control = Some(true);

        let mut uncontrolled_empty = product_row(1, 2, "B");
        uncontrolled_empty.quantity = Some(0);
        uncontrolled_empty.stock_control = Some(false);

        let rows = vec![controlled_empty, uncontrolled_empty, product_row(1, 3, "C")];
        let groups = build_catalog(&rows, &PriceBook::new(), &settings());

        let stock: Vec<bool> = groups[0].products.iter().map(|p| p.in_stock).collect();
        assert_eq!(stock, vec![false, true, true]);
    }

    #[test]
    fn rebuild_on_same_rows_is_structurally_identical() {
        let rows = vec![
            product_row(7, 1, "Plan A"),
            product_row(2, 2, "Plan B"),
            group_only_row(5, "Empty"),
        ];
        let prices = prices_of(&[(1, Decimal::new(1999, 2)), (2, Decimal::ZERO)]);

        let first = build_document(&rows, &prices, &settings());
        let second = build_document(&rows, &prices, &settings());

        let a = serde_json::to_value(&first).expect("serialize first");
        let b = serde_json::to_value(&second).expect("serialize second");
        assert_eq!(a, b);
    }

    #[test]
    fn document_always_reports_success() {
        let doc = build_document(&[], &PriceBook::new(), &settings());
        assert!(doc.success);
        assert!(doc.products.is_empty());
    }

    #[test]
    fn price_book_from_iterator_and_lookup() {
        let prices = prices_of(&[(1, Decimal::new(500, 2)), (2, Decimal::new(1000, 2))]);
        assert_eq!(prices.len(), 2);
        assert!(!prices.is_empty());
        assert_eq!(prices.monthly(1), Some(Decimal::new(500, 2)));
        assert_eq!(prices.monthly(3), None);
    }
}
