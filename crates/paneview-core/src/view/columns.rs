//! Column sets and filter controls of the three list views.
//!
//! | List      | `search` over               | Equality filters              |
//! |-----------|-----------------------------|-------------------------------|
//! | Customers | BillingName, ContactName    | `branch` (DefaultBranch)      |
//! | Products  | Description, ItemNumber     | `metal_finish`, `product_type`|
//! | Quotes    | Customer                    | `status`                      |
//!
//! Blank text reads as [`FieldValue::Missing`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::filter::FilterDef;
use super::record::{FieldValue, Tabular};
use crate::types::{Customer, Product, Quote};

fn text(value: &str) -> FieldValue<'_> {
    if value.trim().is_empty() {
        FieldValue::Missing
    } else {
        FieldValue::Text(value)
    }
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CustomerColumn {
    CustomerId,
    BillingName,
    ContactName,
    DefaultBranch,
    IsActive,
    PriceMultiplier,
}

const CUSTOMER_FILTERS: &[FilterDef<CustomerColumn>] = &[
    FilterDef::contains("search", &[CustomerColumn::BillingName, CustomerColumn::ContactName]),
    FilterDef::equals("branch", CustomerColumn::DefaultBranch),
];

impl Tabular for Customer {
    type Column = CustomerColumn;

    fn value(&self, column: CustomerColumn) -> FieldValue<'_> {
        match column {
            CustomerColumn::CustomerId => text(&self.customer_id),
            CustomerColumn::BillingName => text(&self.billing_name),
            CustomerColumn::ContactName => text(&self.contact_name),
            CustomerColumn::DefaultBranch => text(&self.default_branch),
            CustomerColumn::IsActive => FieldValue::Flag(self.is_active),
            CustomerColumn::PriceMultiplier => FieldValue::Number(self.price_multiplier),
        }
    }

    fn filters() -> &'static [FilterDef<CustomerColumn>] {
        CUSTOMER_FILTERS
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ProductColumn {
    ItemNumber,
    Description,
    GlassType,
    MetalFinish,
    ProductType,
    ListPrice,
    /// Stock summed over all branches.
    TotalQuantity,
    WidthBegin,
    WidthEnd,
    HeightBegin,
    HeightEnd,
}

const PRODUCT_FILTERS: &[FilterDef<ProductColumn>] = &[
    FilterDef::contains("search", &[ProductColumn::Description, ProductColumn::ItemNumber]),
    FilterDef::equals("metal_finish", ProductColumn::MetalFinish),
    FilterDef::equals("product_type", ProductColumn::ProductType),
];

impl Tabular for Product {
    type Column = ProductColumn;

    fn value(&self, column: ProductColumn) -> FieldValue<'_> {
        match column {
            ProductColumn::ItemNumber => text(&self.item_number),
            ProductColumn::Description => text(&self.description),
            ProductColumn::GlassType => text(&self.glass_type),
            ProductColumn::MetalFinish => text(&self.metal_finish),
            ProductColumn::ProductType => text(&self.product_type),
            ProductColumn::ListPrice => FieldValue::Number(self.list_price),
            ProductColumn::TotalQuantity => FieldValue::Number(self.total_quantity()),
            ProductColumn::WidthBegin => FieldValue::Number(self.width_begin),
            ProductColumn::WidthEnd => FieldValue::Number(self.width_end),
            ProductColumn::HeightBegin => FieldValue::Number(self.height_begin),
            ProductColumn::HeightEnd => FieldValue::Number(self.height_end),
        }
    }

    fn filters() -> &'static [FilterDef<ProductColumn>] {
        PRODUCT_FILTERS
    }
}

// =============================================================================
// Quotes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum QuoteColumn {
    Customer,
    D365Customer,
    ItemNumber,
    ItemPrice,
    ExpirationDate,
    Status,
}

const QUOTE_FILTERS: &[FilterDef<QuoteColumn>] = &[
    FilterDef::contains("search", &[QuoteColumn::Customer]),
    FilterDef::equals("status", QuoteColumn::Status),
];

impl Tabular for Quote {
    type Column = QuoteColumn;

    fn value(&self, column: QuoteColumn) -> FieldValue<'_> {
        match column {
            QuoteColumn::Customer => text(&self.customer),
            QuoteColumn::D365Customer => text(&self.d365_customer),
            QuoteColumn::ItemNumber => text(&self.item_number),
            QuoteColumn::ItemPrice => FieldValue::Number(self.item_price),
            QuoteColumn::ExpirationDate => text(&self.expiration_date),
            QuoteColumn::Status => self.status.as_deref().map_or(FieldValue::Missing, text),
        }
    }

    fn filters() -> &'static [FilterDef<QuoteColumn>] {
        QUOTE_FILTERS
    }
}
