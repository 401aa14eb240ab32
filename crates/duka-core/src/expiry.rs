//! # Expiry Write-off
//!
//! Selection and loss math for expired stock. The batch itself (log rows,
//! stock updates, transaction) lives in duka-db.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Product;

/// A product that will be (or was) written off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WriteOffEntry {
    pub product_id: String,
    pub product_name: String,
    pub batch_number: Option<String>,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    /// Units removed from stock.
    pub quantity: i64,
    pub unit_cost_cents: i64,
    /// quantity × unit_cost.
    pub loss_cents: i64,
}

impl WriteOffEntry {
    /// Builds the entry for `product` if it is expired on `as_of` with stock left.
    pub fn for_product(product: &Product, as_of: NaiveDate) -> Option<Self> {
        let expiry_date = product.expiry_date?;
        if !product.is_expired_on(as_of) || product.stock_quantity <= 0 {
            return None;
        }

        Some(WriteOffEntry {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            batch_number: product.batch_number.clone(),
            expiry_date,
            quantity: product.stock_quantity,
            unit_cost_cents: product.unit_cost_cents,
            loss_cents: product.unit_cost().multiply_quantity(product.stock_quantity).cents(),
        })
    }

    #[inline]
    pub fn loss(&self) -> Money {
        Money::from_cents(self.loss_cents)
    }
}

/// Result of a write-off run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WriteOffSummary {
    pub products_written_off: i64,
    pub total_loss_cents: i64,
    pub entries: Vec<WriteOffEntry>,
}

impl WriteOffSummary {
    pub fn from_entries(entries: Vec<WriteOffEntry>) -> Self {
        WriteOffSummary {
            products_written_off: entries.len() as i64,
            total_loss_cents: entries.iter().map(WriteOffEntry::loss).sum::<Money>().cents(),
            entries,
        }
    }

    #[inline]
    pub fn total_loss(&self) -> Money {
        Money::from_cents(self.total_loss_cents)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
