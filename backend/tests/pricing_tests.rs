//! Price allocation tests
//!
//! Covers the batch economics:
//! - allocation conserves the total payment (modulo rounding)
//! - the profit identity holds exactly
//! - retained value is excluded from the cost to recover

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use restock_backend::models::{Disposition, ItemCondition, PricingLineItem};
use restock_backend::services::pricing::{price_batch, round_currency};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn line(
    name: &str,
    quantity: i32,
    listed: &str,
    sale: &str,
    disposition: Disposition,
) -> PricingLineItem {
    PricingLineItem {
        id: Uuid::new_v4(),
        product_name: name.to_string(),
        quantity,
        listed_unit_price: dec(listed),
        unit_sale_price: dec(sale),
        condition: ItemCondition::New,
        disposition,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Payment equal to the listed subtotal leaves prices undistorted
    #[test]
    fn factor_is_one_when_paid_equals_subtotal() {
        let lines = vec![
            line("Keyboard", 1, "60000", "75000", Disposition::Sell),
            line("Mouse", 1, "40000", "50000", Disposition::Sell),
        ];
        let pricing = price_batch(dec("100000"), &lines);

        assert_eq!(pricing.allocation_factor, Decimal::ONE);
        assert_eq!(pricing.lines[0].adjusted_unit_cost, dec("60000"));
        assert_eq!(pricing.lines[1].adjusted_unit_cost, dec("40000"));
    }

    /// Paying 80% of the listed subtotal scales every unit cost by 0.8
    #[test]
    fn factor_scales_adjusted_costs() {
        let lines = vec![
            line("Console", 1, "50000", "70000", Disposition::Sell),
            line("Controller", 1, "50000", "30000", Disposition::Sell),
        ];
        let pricing = price_batch(dec("80000"), &lines);

        assert_eq!(pricing.allocation_factor, dec("0.8"));
        assert_eq!(pricing.lines[0].adjusted_unit_cost, dec("40000"));
    }

    /// A kept line's imputed share is excluded from the cost to recover
    #[test]
    fn retained_value_reduces_cost_to_recover() {
        let lines = vec![
            line("Charger", 2, "10000", "0", Disposition::Keep),
            line("Console", 1, "80000", "120000", Disposition::Sell),
        ];
        // Subtotal 100000, paid 80000 -> factor 0.8
        let pricing = price_batch(dec("80000"), &lines);

        assert_eq!(pricing.retained_value, dec("16000"));
        assert_eq!(pricing.effective_cost_to_recover, dec("64000"));
        // Profit: 120000 - 64000 = 56000
        assert_eq!(pricing.expected_profit, dec("56000"));
        assert_eq!(pricing.total_economic_value, dec("72000"));
    }

    /// Degenerate input: all listed prices zero
    #[test]
    fn zero_subtotal_defaults_factor_to_one() {
        let lines = vec![line("Freebie", 3, "0", "5000", Disposition::Sell)];
        let pricing = price_batch(dec("10000"), &lines);

        assert_eq!(pricing.allocation_factor, Decimal::ONE);
        assert_eq!(pricing.lines[0].adjusted_unit_cost, Decimal::ZERO);
        // Zero-cost lines report zero margin
        assert_eq!(pricing.lines[0].margin_percent, Decimal::ZERO);
    }

    /// Negative payment is passed through arithmetically
    #[test]
    fn negative_paid_passes_through() {
        let lines = vec![line("Console", 1, "50000", "70000", Disposition::Sell)];
        let pricing = price_batch(dec("-50000"), &lines);

        assert_eq!(pricing.allocation_factor, dec("-1"));
        assert_eq!(pricing.lines[0].adjusted_unit_cost, dec("-50000"));
        assert_eq!(pricing.effective_cost_to_recover, Decimal::ZERO);
    }

    #[test]
    fn margin_percent_for_sell_lines() {
        let lines = vec![line("Lamp", 1, "100", "150", Disposition::Sell)];
        let pricing = price_batch(dec("100"), &lines);

        assert_eq!(pricing.lines[0].margin_percent, dec("50"));
    }

    #[test]
    fn kept_lines_have_zero_margin() {
        let lines = vec![line("Lamp", 1, "100", "0", Disposition::Keep)];
        let pricing = price_batch(dec("100"), &lines);

        assert_eq!(pricing.lines[0].margin_percent, Decimal::ZERO);
    }

    #[test]
    fn round_currency_half_away_from_zero() {
        assert_eq!(round_currency(dec("2.5")), dec("3"));
        assert_eq!(round_currency(dec("-2.5")), dec("-3"));
        assert_eq!(round_currency(dec("2.4")), dec("2"));
        assert_eq!(round_currency(dec("39999.6")), dec("40000"));
    }

    /// Sell and keep totals partition by disposition
    #[test]
    fn disposition_partitions_totals() {
        let lines = vec![
            line("A", 1, "30000", "45000", Disposition::Sell),
            line("B", 2, "20000", "0", Disposition::Keep),
            line("C", 1, "30000", "35000", Disposition::Sell),
        ];
        let pricing = price_batch(dec("100000"), &lines);

        assert_eq!(pricing.total_sell_revenue, dec("80000"));
        assert_eq!(pricing.sell_cost_adjusted, dec("60000"));
        assert_eq!(pricing.retained_value, dec("40000"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for a whole-currency price
    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=200_000).prop_map(Decimal::from)
    }

    fn quantity_strategy() -> impl Strategy<Value = i32> {
        1i32..=50
    }

    fn disposition_strategy() -> impl Strategy<Value = Disposition> {
        prop_oneof![Just(Disposition::Sell), Just(Disposition::Keep)]
    }

    fn line_strategy() -> impl Strategy<Value = PricingLineItem> {
        (
            price_strategy(),
            price_strategy(),
            quantity_strategy(),
            disposition_strategy(),
        )
            .prop_map(|(listed, sale, quantity, disposition)| PricingLineItem {
                id: Uuid::new_v4(),
                product_name: "Item".to_string(),
                quantity,
                listed_unit_price: listed,
                unit_sale_price: sale,
                condition: ItemCondition::New,
                disposition,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Allocation conserves the payment: the adjusted costs of all
        /// lines (sell and keep) sum back to total_paid, modulo the
        /// division's decimal precision
        #[test]
        fn prop_allocation_conserves_payment(
            total_paid in (0i64..=1_000_000).prop_map(Decimal::from),
            lines in prop::collection::vec(line_strategy(), 1..8)
        ) {
            let listed_subtotal: Decimal = lines
                .iter()
                .map(|l| l.listed_unit_price * Decimal::from(l.quantity))
                .sum();
            prop_assume!(listed_subtotal > Decimal::ZERO);

            let pricing = price_batch(total_paid, &lines);
            let allocated: Decimal = pricing.sell_cost_adjusted + pricing.retained_value;

            let drift = (allocated - total_paid).abs();
            prop_assert!(drift < dec("0.000001"), "drift {} too large", drift);
        }

        /// expected_profit + sell_cost_adjusted == total_sell_revenue,
        /// exactly, for every allocation factor
        #[test]
        fn prop_profit_identity_exact(
            total_paid in (-100_000i64..=1_000_000).prop_map(Decimal::from),
            lines in prop::collection::vec(line_strategy(), 1..8)
        ) {
            let pricing = price_batch(total_paid, &lines);
            prop_assert_eq!(
                pricing.expected_profit + pricing.sell_cost_adjusted,
                pricing.total_sell_revenue
            );
        }

        /// The cost to recover is never negative and never exceeds the
        /// payment for non-negative payments
        #[test]
        fn prop_cost_to_recover_bounds(
            total_paid in (0i64..=1_000_000).prop_map(Decimal::from),
            lines in prop::collection::vec(line_strategy(), 1..8)
        ) {
            let pricing = price_batch(total_paid, &lines);
            prop_assert!(pricing.effective_cost_to_recover >= Decimal::ZERO);
            prop_assert!(pricing.effective_cost_to_recover <= total_paid.max(Decimal::ZERO));
        }

        /// total_economic_value always decomposes into its two parts
        #[test]
        fn prop_economic_value_decomposition(
            total_paid in (0i64..=1_000_000).prop_map(Decimal::from),
            lines in prop::collection::vec(line_strategy(), 1..8)
        ) {
            let pricing = price_batch(total_paid, &lines);
            prop_assert_eq!(
                pricing.total_economic_value,
                pricing.expected_profit + pricing.retained_value
            );
        }

        /// Kept lines never contribute margin
        #[test]
        fn prop_kept_lines_zero_margin(
            total_paid in (0i64..=1_000_000).prop_map(Decimal::from),
            lines in prop::collection::vec(line_strategy(), 1..8)
        ) {
            let pricing = price_batch(total_paid, &lines);
            for (line, priced) in lines.iter().zip(pricing.lines.iter()) {
                if line.disposition == Disposition::Keep {
                    prop_assert_eq!(priced.margin_percent, Decimal::ZERO);
                }
            }
        }
    }
}
