//! # Resource Envelopes
//!
//! Every resource endpoint answers with the same wrapper:
//!
//! ```text
//! {
//!   "Customers" | "Products" | "CustomerQuotes": [ ...records... ],
//!   "RequestStatus": "Success",
//!   "RequestStatusvalue": 0,
//!   "Transaction": 1234,
//!   "Log": "..."
//! }
//! ```
//!
//! A missing or null list means an empty collection. A body that is not an
//! object, a list that is not an array, or a record with the wrong shape is
//! an [`EnvelopeError`] and fails the whole resource. Records are decoded
//! one at a time so the error names the offending index.
//!
//! A record that decodes but fails [`Resource::validate`] (a blank
//! identifying field) is dropped and reported in
//! [`ResourceEnvelope::rejected`]; the rest of the list is kept.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::EnvelopeError;
use crate::types::{Customer, Product, Quote, ResourceKind};

// =============================================================================
// Resource Trait
// =============================================================================

/// A record type served by one resource endpoint.
pub trait Resource: DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    /// Checks the fields serde cannot enforce. Returns the reason on failure.
    fn validate(&self) -> Result<(), String>;
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} is empty"))
    } else {
        Ok(())
    }
}

impl Resource for Customer {
    const KIND: ResourceKind = ResourceKind::Customers;

    fn validate(&self) -> Result<(), String> {
        require("CustomerId", &self.customer_id)
    }
}

impl Resource for Product {
    const KIND: ResourceKind = ResourceKind::Products;

    fn validate(&self) -> Result<(), String> {
        require("ItemNumber", &self.item_number)
    }
}

impl Resource for Quote {
    const KIND: ResourceKind = ResourceKind::Quotes;

    fn validate(&self) -> Result<(), String> {
        require("Customer", &self.customer)
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Bookkeeping fields that ride along with every list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvelopeMeta {
    pub request_status: Option<String>,
    pub request_status_value: Option<i64>,
    pub transaction: Option<i64>,
    pub log: Option<String>,
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEnvelope<T> {
    pub records: Vec<T>,
    pub meta: EnvelopeMeta,
    /// False when the list field was absent or null.
    pub list_present: bool,
    /// Records dropped by [`Resource::validate`], in list order.
    pub rejected: Vec<EnvelopeError>,
}

/// Decodes a response body for resource `T`.
pub fn decode_envelope<T: Resource>(body: &[u8]) -> Result<ResourceEnvelope<T>, EnvelopeError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| EnvelopeError::InvalidJson(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(EnvelopeError::NotAnObject);
    };

    let field = T::KIND.list_field();
    let meta = read_meta(&object);

    let items = match object.get(field) {
        None | Some(Value::Null) => {
            return Ok(ResourceEnvelope {
                records: Vec::new(),
                meta,
                list_present: false,
                rejected: Vec::new(),
            })
        }
        Some(Value::Array(items)) => items,
        Some(_) => return Err(EnvelopeError::ListNotArray { field }),
    };

    let mut records = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let record = T::deserialize(item).map_err(|e| EnvelopeError::InvalidRecord {
            field,
            index,
            reason: e.to_string(),
        })?;
        match record.validate() {
            Ok(()) => records.push(record),
            Err(reason) => rejected.push(EnvelopeError::InvalidRecord { field, index, reason }),
        }
    }

    Ok(ResourceEnvelope {
        records,
        meta,
        list_present: true,
        rejected,
    })
}

fn read_meta(object: &Map<String, Value>) -> EnvelopeMeta {
    let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_owned);
    let number = |key: &str| {
        object.get(key).and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    };

    EnvelopeMeta {
        request_status: text("RequestStatus"),
        request_status_value: number("RequestStatusvalue"),
        transaction: number("Transaction"),
        log: text("Log"),
    }
}

// =============================================================================
// Tests
// =============================================================================
