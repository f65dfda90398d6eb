use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// A catalog category and its products, in presentation order.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogGroup {
    pub id: i64,
    pub name: String,
    /// URL path segment for the group, e.g. `"vps"`. Empty when unset upstream.
    pub slug: String,
    pub headline: String,
    pub tagline: String,
    pub products: Vec<CatalogProduct>,
}

impl CatalogGroup {
    /// Returns the number of products attached to this group.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// Returns `true` if at least one product in the group can be ordered.
    #[must_use]
    pub fn has_stock(&self) -> bool {
        self.products.iter().any(|p| p.in_stock)
    }
}

/// One orderable plan inside a [`CatalogGroup`], with spec fields extracted
/// from its free-text description.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogProduct {
    pub id: i64,
    pub name: String,
    /// Raw description lines, retained verbatim regardless of extraction
    /// outcome so consumers can re-derive or override the parsed fields.
    pub description: Vec<String>,
    /// vCore count as displayed, e.g. `"4"`. Empty when line 0 did not parse.
    pub cpu: String,
    pub ram: RamMb,
    /// Disk size in GB as displayed, e.g. `"100"`. Empty when unparsed.
    pub storage: String,
    /// Transfer allowance in TB as displayed, e.g. `"2"`. Empty when unparsed.
    pub bandwidth: String,
    /// Datacenter location, e.g. `"London"`. Empty when unparsed.
    pub location: String,
    pub quantity: i32,
    /// Normalized monthly price; never negative, two-decimal scale.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub in_stock: bool,
    /// Canonical order URL. Only spaces are hyphenated; other characters in
    /// the product name pass through unescaped, matching upstream behavior.
    pub catalog_url: String,
}

/// RAM in megabytes, or absent when the description line did not parse.
///
/// Serializes as a JSON number (`8192`) or the empty string (`""`). The
/// string sentinel is part of the consumer contract and mirrors the other
/// spec fields, which default to `""` on extraction failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RamMb(pub Option<u32>);

impl RamMb {
    /// RAM from a whole number of gigabytes; absent if the MB value would
    /// overflow, matching the extraction sentinel.
    #[must_use]
    pub fn from_gb(gb: u32) -> Self {
        Self(gb.checked_mul(1024))
    }

    #[must_use]
    pub fn as_mb(self) -> Option<u32> {
        self.0
    }
}

impl Serialize for RamMb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(mb) => serializer.serialize_u32(mb),
            None => serializer.serialize_str(""),
        }
    }
}

/// The top-level response document.
///
/// The field is named `products` even though it holds groups; that is the
/// published wire contract and is kept as-is.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogDocument {
    pub success: bool,
    pub products: Vec<CatalogGroup>,
}
