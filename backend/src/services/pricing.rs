//! Price allocation for purchase batches
//!
//! Distributes a single lump payment across heterogeneous line items in
//! proportion to their listed prices, then derives the batch economics:
//! expected cash profit on the resale lines and the imputed value of the
//! retained ones. Pure computation; validation of the inputs is the
//! caller's concern.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Disposition, PricingLineItem};

/// Round to the smallest currency unit. Whole units in this domain, no
/// sub-unit currency; midpoints round away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Economics of one priced line item
#[derive(Debug, Clone, Serialize)]
pub struct LinePricing {
    pub line_id: Uuid,
    /// Listed price scaled by the allocation factor (unrounded)
    pub adjusted_unit_cost: Decimal,
    /// (sale − adjusted) / adjusted × 100; zero for kept lines and
    /// zero-cost lines
    pub margin_percent: Decimal,
}

/// Economics of a priced batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchPricing {
    /// Ratio of actual payment to nominal listed value; 1 when the
    /// listed subtotal is zero
    pub allocation_factor: Decimal,
    pub listed_subtotal: Decimal,
    pub total_sell_revenue: Decimal,
    pub sell_cost_adjusted: Decimal,
    /// total_sell_revenue − sell_cost_adjusted
    pub expected_profit: Decimal,
    /// The keeper's imputed share of the payment
    pub retained_value: Decimal,
    /// Cash the sell lines alone must recover: max(paid − retained, 0)
    pub effective_cost_to_recover: Decimal,
    /// expected_profit + retained_value
    pub total_economic_value: Decimal,
    pub lines: Vec<LinePricing>,
}

/// Allocate `total_paid` across the line items and compute the batch
/// economics. Negative or zero `total_paid` passes through
/// arithmetically.
pub fn price_batch(total_paid: Decimal, line_items: &[PricingLineItem]) -> BatchPricing {
    let listed_subtotal: Decimal = line_items
        .iter()
        .map(|l| l.listed_unit_price * Decimal::from(l.quantity))
        .sum();

    let allocation_factor = if listed_subtotal > Decimal::ZERO {
        total_paid / listed_subtotal
    } else {
        Decimal::ONE
    };

    let mut total_sell_revenue = Decimal::ZERO;
    let mut sell_cost_adjusted = Decimal::ZERO;
    let mut retained_value = Decimal::ZERO;
    let mut lines = Vec::with_capacity(line_items.len());

    for line in line_items {
        let quantity = Decimal::from(line.quantity);
        let adjusted_unit_cost = line.listed_unit_price * allocation_factor;

        match line.disposition {
            Disposition::Sell => {
                total_sell_revenue += line.unit_sale_price * quantity;
                sell_cost_adjusted += adjusted_unit_cost * quantity;
            }
            Disposition::Keep => {
                retained_value += adjusted_unit_cost * quantity;
            }
        }

        lines.push(LinePricing {
            line_id: line.id,
            adjusted_unit_cost,
            margin_percent: margin_percent(line, adjusted_unit_cost),
        });
    }

    let expected_profit = total_sell_revenue - sell_cost_adjusted;
    let effective_cost_to_recover = (total_paid - retained_value).max(Decimal::ZERO);

    BatchPricing {
        allocation_factor,
        listed_subtotal,
        total_sell_revenue,
        sell_cost_adjusted,
        expected_profit,
        retained_value,
        effective_cost_to_recover,
        total_economic_value: expected_profit + retained_value,
        lines,
    }
}

fn margin_percent(line: &PricingLineItem, adjusted_unit_cost: Decimal) -> Decimal {
    if line.disposition == Disposition::Keep || adjusted_unit_cost <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (line.unit_sale_price - adjusted_unit_cost) / adjusted_unit_cost * Decimal::from(100)
}
