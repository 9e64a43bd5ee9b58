//! # Domain Types
//!
//! Records served by the workflow API and the resource kinds the dashboard
//! tracks.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │    Product      │   │     Quote       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  CustomerId *   │   │  ItemNumber *   │   │  Customer *     │       │
//! │  │  BillingName    │   │  Description    │   │  D365Customer   │       │
//! │  │  DefaultBranch  │   │  Branches[]     │   │  ItemNumber     │       │
//! │  │  IsActive       │   │  ListPrice      │   │  ItemPrice      │       │
//! │  │  PriceMultiplier│   │  MetalFinish    │   │  ExpirationDate │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────────────────────────┐     │
//! │  │  ResourceKind   │   │  OrderResponse ─► CustomerOrderRecord    │     │
//! │  │  Customers      │   │                  └─► ShipperOrder[]      │     │
//! │  │  Products       │   └─────────────────────────────────────────┘     │
//! │  │  Quotes         │                                                   │
//! │  └─────────────────┘   * identifying field, must be non-empty          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names on the wire are PascalCase. Descriptive fields default when
//! the API leaves them out; identifying fields are checked by
//! [`Resource::validate`](crate::envelope::Resource::validate).

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Resource Kind
// =============================================================================

/// The remote collections the dashboard keeps cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ResourceKind {
    Customers,
    Products,
    Quotes,
}

impl ResourceKind {
    /// Every tracked kind, in display order.
    pub const ALL: [ResourceKind; 3] = [Self::Customers, Self::Products, Self::Quotes];

    /// Name of the list field inside the response envelope.
    pub const fn list_field(self) -> &'static str {
        match self {
            Self::Customers => "Customers",
            Self::Products => "Products",
            Self::Quotes => "CustomerQuotes",
        }
    }

    /// Default path segment of the resource endpoint.
    pub const fn default_path(self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Products => "products",
            Self::Quotes => "CustomerQuotes",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Products => "products",
            Self::Quotes => "quotes",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A billing customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "PascalCase")]
#[ts(export)]
pub struct Customer {
    pub customer_id: String,
    #[serde(default)]
    pub billing_name: String,
    #[serde(default)]
    pub contact_name: String,
    /// Branch code the customer normally orders from.
    #[serde(default)]
    pub default_branch: String,
    #[serde(default)]
    pub is_active: bool,
    /// Multiplier applied to list prices for this customer.
    #[serde(default)]
    pub price_multiplier: f64,
}

// =============================================================================
// Product
// =============================================================================

/// Stock held at one branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "PascalCase")]
#[ts(export)]
pub struct BranchStock {
    pub branch: String,
    #[serde(default)]
    pub quantity: f64,
}

/// A catalog item with per-branch stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "PascalCase")]
#[ts(export)]
pub struct Product {
    pub item_number: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub branches: Vec<BranchStock>,
    #[serde(default)]
    pub glass_type: String,
    #[serde(default)]
    pub metal_finish: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub list_price: f64,
    #[serde(default)]
    pub width_begin: f64,
    #[serde(default)]
    pub width_end: f64,
    #[serde(default)]
    pub height_begin: f64,
    #[serde(default)]
    pub height_end: f64,
}

impl Product {
    /// Stock summed over every branch.
    pub fn total_quantity(&self) -> f64 {
        self.branches.iter().map(|b| b.quantity).sum()
    }

    /// Quantity held at `branch`, zero when the branch carries none.
    pub fn quantity_at(&self, branch: &str) -> f64 {
        self.branches
            .iter()
            .filter(|b| b.branch == branch)
            .map(|b| b.quantity)
            .sum()
    }

    pub fn is_stocked_at(&self, branch: &str) -> bool {
        self.branches.iter().any(|b| b.branch == branch)
    }

    /// Priced and in stock somewhere.
    pub fn is_active(&self) -> bool {
        self.list_price > 0.0 && self.branches.iter().any(|b| b.quantity > 0.0)
    }
}

// =============================================================================
// Quote
// =============================================================================

/// A priced quote line for one customer.
///
/// Older responses name the customer code `CustomerId` and some carry a
/// dedicated `Id`/`QuoteId`; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "PascalCase")]
#[ts(export)]
pub struct Quote {
    pub customer: String,
    #[serde(rename = "D365Customer", alias = "CustomerId", default)]
    pub d365_customer: String,
    #[serde(default)]
    pub expiration_date: String,
    #[serde(default)]
    pub item_number: String,
    #[serde(default)]
    pub item_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "Id", alias = "QuoteId", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Quote {
    /// Identifier used for lookups: `Id` when present, else the item number.
    pub fn identifier(&self) -> &str {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => &self.item_number,
        }
    }

    /// Status for display; quotes without one read as "Unknown".
    pub fn status_label(&self) -> &str {
        match self.status.as_deref() {
            Some(status) if !status.is_empty() => status,
            _ => "Unknown",
        }
    }

    /// Parsed expiration, `None` when blank or unparseable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.expiration_date)
    }

    /// A quote without an expiration never expires; one with an
    /// unreadable expiration is treated as expired.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        if self.expiration_date.trim().is_empty() {
            return true;
        }
        self.expires_at().is_some_and(|at| at > now)
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) and plain dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Orders
// =============================================================================

/// One shipment row in an order lookup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ShipperOrder {
    pub order_number: String,
    pub invoice_number: String,
    pub shipper_id: String,
    pub customer_name: String,
    pub customer_po: String,
    pub date_ordered: String,
    pub date_requested: String,
    /// The live API spells this key with a trailing space.
    #[serde(rename = "DateShipped ", alias = "DateShipped")]
    pub date_shipped: String,
    pub carrier_name: String,
    pub carrier_tracking: String,
    pub invoice_status: String,
    pub order_status: String,
}

/// Orders for one customer code.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CustomerOrderRecord {
    pub customer_code: String,
    pub shipper: Vec<ShipperOrder>,
}

/// Body returned by the order lookup endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OrderResponse {
    pub records: Vec<CustomerOrderRecord>,
    pub request_status: Option<String>,
    pub log: Option<String>,
}

impl OrderResponse {
    /// Every shipment across all customer codes.
    pub fn shipments(&self) -> impl Iterator<Item = &ShipperOrder> {
        self.records.iter().flat_map(|r| r.shipper.iter())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_customer_decodes_pascal_case() {
        let customer: Customer = serde_json::from_value(serde_json::json!({
            "CustomerId": "C-100",
            "BillingName": "Acme Glass",
            "ContactName": "Jo",
            "DefaultBranch": "North",
            "IsActive": true,
            "PriceMultiplier": 0.85
        }))
        .unwrap();

        assert_eq!(customer.customer_id, "C-100");
        assert_eq!(customer.default_branch, "North");
        assert!(customer.is_active);
        assert_eq!(customer.price_multiplier, 0.85);
    }

    #[test]
    fn test_product_quantities() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "ItemNumber": "SH-1",
            "ListPrice": 120.0,
            "Branches": [
                { "Branch": "North", "Quantity": 3 },
                { "Branch": "South", "Quantity": 4 }
            ]
        }))
        .unwrap();

        assert_eq!(product.total_quantity(), 7.0);
        assert_eq!(product.quantity_at("South"), 4.0);
        assert_eq!(product.quantity_at("East"), 0.0);
        assert!(product.is_active());
    }

    #[test]
    fn test_quote_accepts_renamed_fields() {
        let quote: Quote = serde_json::from_value(serde_json::json!({
            "Customer": "Acme Glass",
            "CustomerId": "C-100",
            "QuoteId": "Q-9",
            "ItemNumber": "SH-1",
            "ItemPrice": 99.5
        }))
        .unwrap();

        assert_eq!(quote.d365_customer, "C-100");
        assert_eq!(quote.identifier(), "Q-9");
        assert_eq!(quote.status_label(), "Unknown");
    }

    #[test]
    fn test_quote_identifier_falls_back_to_item_number() {
        let quote: Quote = serde_json::from_value(serde_json::json!({
            "Customer": "Acme Glass",
            "ItemNumber": "SH-2"
        }))
        .unwrap();
        assert_eq!(quote.identifier(), "SH-2");
    }

    #[test]
    fn test_quote_activity() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut quote: Quote = serde_json::from_value(serde_json::json!({
            "Customer": "Acme Glass"
        }))
        .unwrap();

        assert!(quote.is_active_at(now));

        quote.expiration_date = "2024-07-01".into();
        assert!(quote.is_active_at(now));

        quote.expiration_date = "2024-05-31T23:59:59".into();
        assert!(!quote.is_active_at(now));

        quote.expiration_date = "not a date".into();
        assert!(!quote.is_active_at(now));
    }

    #[test]
    fn test_shipper_order_accepts_both_date_shipped_spellings() {
        let padded: ShipperOrder =
            serde_json::from_value(serde_json::json!({ "DateShipped ": "2024-01-02" })).unwrap();
        let plain: ShipperOrder =
            serde_json::from_value(serde_json::json!({ "DateShipped": "2024-01-03" })).unwrap();

        assert_eq!(padded.date_shipped, "2024-01-02");
        assert_eq!(plain.date_shipped, "2024-01-03");
    }

    #[test]
    fn test_resource_kind_fields() {
        assert_eq!(ResourceKind::Quotes.list_field(), "CustomerQuotes");
        assert_eq!(ResourceKind::Customers.default_path(), "customers");
        assert_eq!(ResourceKind::Products.to_string(), "products");
    }
}
