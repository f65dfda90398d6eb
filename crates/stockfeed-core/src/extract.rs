//! Positional attribute extraction from free-text product descriptions.
//!
//! Descriptions follow a line convention where the position of a line, not
//! its content alone, decides which field it feeds: line 0 is CPU, line 1 is
//! RAM, and so on. Extraction is a fixed table of independent
//! `(line index, pattern, field)` rules; each rule defaults on mismatch and
//! no rule can fail the row. See [`crate::aggregate`] for how these compose
//! into full catalog assembly.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::catalog::RamMb;

static CPU_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\s*vCores\)").expect("valid cpu regex"));
static GB_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)GB").expect("valid gb regex"));
static TB_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)TB").expect("valid tb regex"));
static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Located in (.*)").expect("valid location regex"));

/// Which output field a [`LineRule`] feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecField {
    Cpu,
    Ram,
    Storage,
    Bandwidth,
    Location,
}

/// One positional extraction rule. The pattern is only ever applied to the
/// line at `line`; rules are independent of each other.
struct LineRule {
    line: usize,
    pattern: &'static LazyLock<Regex>,
    field: SpecField,
}

static RULES: [LineRule; 5] = [
    LineRule { line: 0, pattern: &CPU_RE, field: SpecField::Cpu },
    LineRule { line: 1, pattern: &GB_RE, field: SpecField::Ram },
    LineRule { line: 2, pattern: &GB_RE, field: SpecField::Storage },
    LineRule { line: 3, pattern: &TB_RE, field: SpecField::Bandwidth },
    LineRule { line: 4, pattern: &LOCATION_RE, field: SpecField::Location },
];

/// Spec fields extracted from a product description. Every field defaults to
/// its "unparsed" value, so an empty or unrecognized description yields a
/// fully defaulted struct rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecFields {
    pub cpu: String,
    pub ram: RamMb,
    pub storage: String,
    pub bandwidth: String,
    pub location: String,
}

/// Splits a raw description into lines for positional extraction.
///
/// Handles both `\r\n` and `\n` terminators; the terminator itself is not
/// part of any line. `None` or empty input yields no lines.
#[must_use]
pub fn split_description_lines(description: Option<&str>) -> Vec<String> {
    match description {
        Some(text) if !text.is_empty() => text.lines().map(ToOwned::to_owned).collect(),
        _ => Vec::new(),
    }
}

/// Runs the positional rule table over `lines`.
///
/// A missing line, a non-matching line, or a numeric overflow leaves the
/// corresponding field at its default; lines beyond the table are ignored.
#[must_use]
pub fn extract_specs(lines: &[String]) -> SpecFields {
    let mut specs = SpecFields::default();

    for rule in &RULES {
        let Some(line) = lines.get(rule.line) else {
            continue;
        };
        let Some(value) = rule.pattern.captures(line).and_then(|c| c.get(1)) else {
            continue;
        };
        let value = value.as_str();

        match rule.field {
            SpecField::Cpu => specs.cpu = value.to_owned(),
            SpecField::Ram => {
                specs.ram = value.parse::<u32>().ok().map(RamMb::from_gb).unwrap_or_default();
            }
            SpecField::Storage => specs.storage = value.to_owned(),
            SpecField::Bandwidth => specs.bandwidth = value.to_owned(),
            SpecField::Location => specs.location = value.trim().to_owned(),
        }
    }

    specs
}

/// Normalizes a raw monthly price to a non-negative two-decimal amount.
///
/// The pricing source uses `0` for "unset" and `-1` for "free"; both land on
/// `0.00`, as does a missing price row. The two sentinels are intentionally
/// indistinguishable downstream.
#[must_use]
pub fn normalize_price(raw: Option<Decimal>) -> Decimal {
    match raw {
        Some(price) if price > Decimal::ZERO => {
            price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        }
        _ => Decimal::new(0, 2),
    }
}

/// A product can be ordered when units remain or stock control is off.
#[must_use]
pub fn in_stock(quantity: i32, stock_control: bool) -> bool {
    quantity > 0 || !stock_control
}

/// Builds the canonical order URL: base, group slug, hyphenated product name.
///
/// Only spaces are replaced; other special characters pass through
/// unescaped. Known upstream limitation, kept as-is.
#[must_use]
pub fn catalog_url(base_url: &str, group_slug: &str, product_name: &str) -> String {
    let handle = product_name.to_lowercase().replace(' ', "-");
    format!("{base_url}{group_slug}/{handle}")
}
