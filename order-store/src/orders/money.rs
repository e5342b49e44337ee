//! Breakdown calculation using rust_decimal for precision
//!
//! Amounts are integer minor units. The subtotal is summed with checked
//! integer arithmetic; only the tax step goes through `Decimal`, so the
//! 20% rate is applied exactly and rounded once, half away from zero.

use rust_decimal::prelude::*;
use shared::order::{Breakdown, Money, OrderItem};

use super::error::{OrderError, OrderResult};

/// Tax rate applied to every order (20%)
pub const TAX_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Sum of `quantity * unit price` over all items
pub fn subtotal(items: &[OrderItem]) -> OrderResult<i64> {
    items.iter().try_fold(0i64, |acc, item| {
        i64::from(item.quantity)
            .checked_mul(item.price_per_unit.amount)
            .and_then(|line| acc.checked_add(line))
            .ok_or_else(|| {
                OrderError::InvalidArgument(format!(
                    "order amount overflows at product {}",
                    item.product_id
                ))
            })
    })
}

/// Tax on a subtotal: `round(subtotal * 0.20)`, half away from zero
pub fn tax_for(subtotal: i64) -> OrderResult<i64> {
    (Decimal::from(subtotal) * TAX_RATE)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| OrderError::InvalidArgument("tax amount overflows".to_string()))
}

/// Compute the breakdown of an order.
///
/// The currency is taken from the first item; other items' currencies are
/// not checked. An order needs at least one item, each with a positive
/// quantity.
pub fn compute_breakdown(items: &[OrderItem]) -> OrderResult<Breakdown> {
    let first = items.first().ok_or_else(|| {
        OrderError::InvalidArgument("order must contain at least one item".to_string())
    })?;
    if let Some(item) = items.iter().find(|item| item.quantity == 0) {
        return Err(OrderError::InvalidArgument(format!(
            "quantity of product {} must be positive",
            item.product_id
        )));
    }
    let currency = &first.price_per_unit.currency_code;

    let subtotal = subtotal(items)?;
    let tax = tax_for(subtotal)?;
    let total = subtotal
        .checked_add(tax)
        .ok_or_else(|| OrderError::InvalidArgument("order total overflows".to_string()))?;

    Ok(Breakdown {
        subtotal: Money::new(subtotal, currency.as_str()),
        tax: Money::new(tax, currency.as_str()),
        total: Money::new(total, currency.as_str()),
    })
}
