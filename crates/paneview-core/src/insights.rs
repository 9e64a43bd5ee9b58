//! # Dashboard Insights
//!
//! Summary numbers and lookups computed from cached collections. Pure
//! functions over slices; nothing here is cached.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Customer, Product, Quote};
use crate::view::Tabular;
use crate::TOP_CUSTOMER_LIMIT;

/// Distinct values in first-seen order, skipping blanks.
fn distinct<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .filter(|v| seen.insert(*v))
        .map(str::to_owned)
        .collect()
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total_customers: usize,
    pub active_customers: usize,
    pub branches: Vec<String>,
    /// Active customers with the highest price multiplier.
    pub top_customers: Vec<Customer>,
}

pub fn customer_stats(customers: &[Customer]) -> CustomerStats {
    let mut top: Vec<Customer> = customers.iter().filter(|c| c.is_active).cloned().collect();
    top.sort_by(|a, b| b.price_multiplier.total_cmp(&a.price_multiplier));
    top.truncate(TOP_CUSTOMER_LIMIT);

    CustomerStats {
        total_customers: customers.len(),
        active_customers: customers.iter().filter(|c| c.is_active).count(),
        branches: distinct(customers.iter().map(|c| c.default_branch.as_str())),
        top_customers: top,
    }
}

pub fn find_customer<'a>(customers: &'a [Customer], customer_id: &str) -> Option<&'a Customer> {
    customers.iter().find(|c| c.customer_id == customer_id)
}

pub fn customers_in_branch<'a>(customers: &'a [Customer], branch: &str) -> Vec<&'a Customer> {
    customers.iter().filter(|c| c.default_branch == branch).collect()
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    /// Products that are priced and stocked somewhere.
    pub total_products: usize,
    /// Every product in the catalog, active or not.
    pub catalog_size: usize,
    pub branch_codes: Vec<String>,
    pub metal_finishes: Vec<String>,
    pub product_types: Vec<String>,
}

/// Counts and option lists over active products only. Unpriced or
/// out-of-stock items only show up in `catalog_size`.
pub fn product_stats(products: &[Product]) -> ProductStats {
    let active: Vec<&Product> = products.iter().filter(|p| p.is_active()).collect();
    ProductStats {
        total_products: active.len(),
        catalog_size: products.len(),
        branch_codes: distinct(
            active
                .iter()
                .flat_map(|p| p.branches.iter().map(|b| b.branch.as_str())),
        ),
        metal_finishes: distinct(active.iter().map(|p| p.metal_finish.as_str())),
        product_types: distinct(active.iter().map(|p| p.product_type.as_str())),
    }
}

pub fn find_product<'a>(products: &'a [Product], item_number: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.item_number == item_number)
}

/// Products with an entry for `branch`, whatever its quantity.
pub fn products_in_branch<'a>(products: &'a [Product], branch: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.is_stocked_at(branch)).collect()
}

// =============================================================================
// Quotes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStats {
    pub total_quotes: usize,
    pub active_quotes: usize,
    /// Sum of item prices over active quotes.
    pub total_value: f64,
    pub customers: Vec<String>,
}

pub fn quote_stats(quotes: &[Quote], now: DateTime<Utc>) -> QuoteStats {
    let active: Vec<&Quote> = quotes.iter().filter(|q| q.is_active_at(now)).collect();
    QuoteStats {
        total_quotes: quotes.len(),
        active_quotes: active.len(),
        total_value: active.iter().map(|q| q.item_price).sum(),
        customers: distinct(quotes.iter().map(|q| q.customer.as_str())),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuoteSummary {
    pub count: usize,
    pub total_value: f64,
}

/// Quote count and value per customer name.
pub fn summarize_quotes_by_customer(quotes: &[Quote]) -> BTreeMap<String, CustomerQuoteSummary> {
    let mut summary: BTreeMap<String, CustomerQuoteSummary> = BTreeMap::new();
    for quote in quotes {
        let entry = summary.entry(quote.customer.clone()).or_default();
        entry.count += 1;
        entry.total_value += quote.item_price;
    }
    summary
}

pub fn total_quote_value(quotes: &[Quote]) -> f64 {
    quotes.iter().map(|q| q.item_price).sum()
}

pub fn find_quote<'a>(quotes: &'a [Quote], identifier: &str) -> Option<&'a Quote> {
    quotes.iter().find(|q| q.identifier() == identifier)
}

/// Quotes whose customer name or D365 code equals `customer`.
pub fn quotes_for_customer<'a>(quotes: &'a [Quote], customer: &str) -> Vec<&'a Quote> {
    quotes
        .iter()
        .filter(|q| q.customer == customer || q.d365_customer == customer)
        .collect()
}

// =============================================================================
// Filter Options
// =============================================================================

/// Sorted distinct values of one column, for a filter dropdown.
pub fn column_options<T: Tabular>(records: &[T], column: T::Column) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.value(column).display())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BranchStock;
    use crate::view::columns::ProductColumn;
    use chrono::TimeZone;

    fn customer(id: &str, branch: &str, active: bool, multiplier: f64) -> Customer {
        Customer {
            customer_id: id.into(),
            billing_name: format!("{id} Inc"),
            contact_name: String::new(),
            default_branch: branch.into(),
            is_active: active,
            price_multiplier: multiplier,
        }
    }

    fn product(item: &str, price: f64, stock: &[(&str, f64)], finish: &str) -> Product {
        Product {
            item_number: item.into(),
            description: String::new(),
            branches: stock
                .iter()
                .map(|(b, q)| BranchStock { branch: (*b).into(), quantity: *q })
                .collect(),
            glass_type: String::new(),
            metal_finish: finish.into(),
            product_type: "Shower".into(),
            list_price: price,
            width_begin: 0.0,
            width_end: 0.0,
            height_begin: 0.0,
            height_end: 0.0,
        }
    }

    fn quote(customer: &str, price: f64, expires: &str) -> Quote {
        Quote {
            customer: customer.into(),
            d365_customer: format!("D-{customer}"),
            expiration_date: expires.into(),
            item_number: format!("IT-{customer}-{price}"),
            item_price: price,
            status: None,
            id: None,
        }
    }

    #[test]
    fn test_customer_stats() {
        let mut customers: Vec<Customer> = (0..12)
            .map(|i| customer(&format!("C{i}"), "North", true, i as f64))
            .collect();
        customers.push(customer("X", "South", false, 99.0));

        let stats = customer_stats(&customers);

        assert_eq!(stats.total_customers, 13);
        assert_eq!(stats.active_customers, 12);
        assert_eq!(stats.branches, ["North", "South"]);
        assert_eq!(stats.top_customers.len(), 10);
        assert_eq!(stats.top_customers[0].customer_id, "C11");
        assert!(stats.top_customers.iter().all(|c| c.is_active));
    }

    #[test]
    fn test_product_stats() {
        let products = vec![
            product("A", 10.0, &[("N", 1.0)], "Chrome"),
            product("B", 0.0, &[("N", 5.0)], "Bronze"),
            product("C", 10.0, &[("S", 0.0)], "Chrome"),
            product("D", 10.0, &[], ""),
        ];

        let stats = product_stats(&products);

        assert_eq!(stats.total_products, 1);
        assert_eq!(stats.catalog_size, 4);
        assert_eq!(stats.branch_codes, ["N"]);
        assert_eq!(stats.metal_finishes, ["Chrome"]);
        assert_eq!(stats.product_types, ["Shower"]);
        assert_eq!(products_in_branch(&products, "S").len(), 1);
        assert_eq!(find_product(&products, "B").map(|p| p.list_price), Some(0.0));
    }

    #[test]
    fn test_quote_stats_count_only_active_value() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let quotes = vec![
            quote("Acme", 100.0, ""),
            quote("Acme", 50.0, "2024-12-31"),
            quote("Birch", 25.0, "2024-01-01"),
        ];

        let stats = quote_stats(&quotes, now);

        assert_eq!(stats.total_quotes, 3);
        assert_eq!(stats.active_quotes, 2);
        assert_eq!(stats.total_value, 150.0);
        assert_eq!(stats.customers, ["Acme", "Birch"]);
        assert_eq!(total_quote_value(&quotes), 175.0);
    }

    #[test]
    fn test_quote_summaries_and_lookups() {
        let quotes = vec![quote("Acme", 10.0, ""), quote("Acme", 5.0, ""), quote("Birch", 1.0, "")];

        let summary = summarize_quotes_by_customer(&quotes);
        assert_eq!(summary["Acme"], CustomerQuoteSummary { count: 2, total_value: 15.0 });
        assert_eq!(summary["Birch"].count, 1);

        assert_eq!(quotes_for_customer(&quotes, "D-Birch").len(), 1);
        assert!(find_quote(&quotes, "IT-Acme-5").is_some());
    }

    #[test]
    fn test_column_options_are_sorted_and_distinct() {
        let products = vec![
            product("A", 1.0, &[], "Chrome"),
            product("B", 1.0, &[], "Bronze"),
            product("C", 1.0, &[], "Chrome"),
            product("D", 1.0, &[], ""),
        ];
        assert_eq!(column_options(&products, ProductColumn::MetalFinish), ["Bronze", "Chrome"]);
    }

    #[test]
    fn test_customer_lookups() {
        let customers = vec![customer("A", "North", true, 1.0), customer("B", "South", true, 1.0)];
        assert_eq!(find_customer(&customers, "B").map(|c| c.default_branch.as_str()), Some("South"));
        assert_eq!(customers_in_branch(&customers, "North").len(), 1);
    }
}
