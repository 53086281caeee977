//! # Sale Pricing
//!
//! Turns requested lines plus product snapshots into priced lines and an
//! exact total. No rounding happens anywhere: a line total is an exact
//! product and the sale total an exact sum, both overflow-checked.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, SaleLineRequest};

/// A line with its price settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total: Money,
}

/// The priced form of a whole sale, lines in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleQuote {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

impl SaleQuote {
    /// Appends a line, keeping `total` equal to the sum of line totals.
    pub fn push(&mut self, line: PricedLine) -> CoreResult<()> {
        self.total = self
            .total
            .checked_add(line.total)
            .ok_or_else(|| CoreError::invalid_amount("sale total overflows"))?;
        self.lines.push(line);
        Ok(())
    }

    /// Units requested per product, summed across lines, first-seen order.
    ///
    /// A sale may list the same product twice; stock has to cover the sum.
    pub fn quantities_by_product(&self) -> Vec<(&str, i64)> {
        let mut out: Vec<(&str, i64)> = Vec::new();
        for line in &self.lines {
            match out.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, qty)) => *qty += line.quantity,
                None => out.push((line.product_id.as_str(), line.quantity)),
            }
        }
        out
    }
}

/// Prices one requested line against the product's current snapshot.
///
/// An explicit unit price overrides the catalog price and must be positive.
pub fn price_line(product: &Product, request: &SaleLineRequest) -> CoreResult<PricedLine> {
    if request.quantity <= 0 {
        return Err(CoreError::InvalidQuantity(request.quantity));
    }

    let unit_price = match request.unit_price_cents {
        Some(cents) if cents <= 0 => {
            return Err(CoreError::invalid_amount("unit price must be positive"))
        }
        Some(cents) => Money::from_cents(cents),
        None => product.unit_price(),
    };

    let total = unit_price
        .checked_mul_quantity(request.quantity)
        .ok_or_else(|| CoreError::invalid_amount("line total overflows"))?;

    Ok(PricedLine {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity: request.quantity,
        unit_price,
        total,
    })
}
