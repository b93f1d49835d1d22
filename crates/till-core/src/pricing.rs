//! # Pricing & Profit
//!
//! Money arithmetic for a line item whose requested quantity may be in a
//! different unit than the product's native unit.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product: Rice, 2.50 per kg, cost 1.80 per kg                           │
//! │  Requested: 500 g                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  calculate_price ── 500 g → 0.5 kg ── × 2.50 ── − discount ──► 1.25    │
//! │                                                                         │
//! │  calculate_profit ── everything in the family's BASE unit ──► 0.35     │
//! │                                                                         │
//! │  check_stock_availability ── stock and request in base unit            │
//! │       └── short? answer in the REQUESTED unit (3 decimals)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Never Fails
//! These functions feed form fields that recompute on every keystroke. A
//! non-finite intermediate value is logged and the result falls back to
//! zero (or "not available") instead of reaching the caller as an error.

use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::money::Money;
use crate::types::Product;
use crate::units::{convert_from_base_unit, convert_to_base_unit, convert_unit, Unit};

// =============================================================================
// Types
// =============================================================================

/// A product sold in a given quantity and unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product: Product,
    pub quantity: f64,
    pub unit: Unit,
}

impl SaleLine {
    pub fn new(product: Product, quantity: f64, unit: Unit) -> Self {
        SaleLine {
            product,
            quantity,
            unit,
        }
    }

    /// Quantity expressed in the product's native unit.
    pub fn native_quantity(&self) -> f64 {
        convert_unit(self.quantity, self.unit, self.product.unit)
    }

    #[inline]
    pub fn price(&self) -> Money {
        calculate_price(&self.product, self.quantity, self.unit)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        calculate_profit(&self.product, self.quantity, self.unit)
    }
}

/// Answer to "can I sell this much?".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockAvailability {
    pub available: bool,
    /// The requested quantity when available, otherwise the most that can
    /// be sold, in `available_unit`.
    pub available_quantity: f64,
    pub available_unit: Unit,
}

// =============================================================================
// Price
// =============================================================================

/// Price of `quantity` `unit`s of `product`, discount applied, in cents.
///
/// ## Example
/// ```rust,ignore
/// // price 100.00/unit, discount 10%, 2 units
/// assert_eq!(calculate_price(&product, 2.0, Unit::Unit).cents(), 18000);
/// ```
pub fn calculate_price(product: &Product, quantity: f64, unit: Unit) -> Money {
    let native_quantity = convert_unit(quantity, unit, product.unit);
    let gross = product.price().to_decimal() * native_quantity;
    let net = gross - gross * product.discount() / 100.0;

    if !net.is_finite() {
        warn!(
            product_id = %product.id,
            quantity,
            %unit,
            "Price calculation produced a non-finite value, using 0"
        );
        return Money::zero();
    }

    Money::from_decimal(net)
}

// =============================================================================
// Profit
// =============================================================================

/// Unrounded profit, `None` when the arithmetic breaks down.
///
/// Works in the base unit of the family so that a quantity is converted
/// once, not once for the price and again for the cost.
fn raw_profit(product: &Product, quantity: f64, unit: Unit) -> Option<f64> {
    // Through the native unit so a cross-family request stays consistent
    // with calculate_price
    let native_quantity = convert_unit(quantity, unit, product.unit);
    let base_quantity = convert_to_base_unit(native_quantity, product.unit);
    let price_per_base = product.price().to_decimal() / product.unit.factor();
    let cost_per_base = product.cost().to_decimal() / product.unit.factor();

    let margin = (price_per_base - cost_per_base) * base_quantity;

    // Discount is taken on what the customer would have paid undiscounted
    let discount_amount = product.price().to_decimal() * native_quantity * product.discount() / 100.0;

    let profit = margin - discount_amount;
    profit.is_finite().then_some(profit)
}

/// Profit of selling `quantity` `unit`s of `product`, in cents.
pub fn calculate_profit(product: &Product, quantity: f64, unit: Unit) -> Money {
    match raw_profit(product, quantity, unit) {
        Some(profit) => Money::from_decimal(profit),
        None => {
            warn!(
                product_id = %product.id,
                quantity,
                %unit,
                "Profit calculation produced a non-finite value, using 0"
            );
            Money::zero()
        }
    }
}

/// Profit of a whole sale: every catalog line plus an optional manually
/// priced line whose profit is `manual_profit_pct` percent of its amount.
///
/// Lines are summed unrounded and the total is rounded once.
pub fn calculate_total_profit(
    lines: &[SaleLine],
    manual_amount: Money,
    manual_profit_pct: f64,
) -> Money {
    let mut total = 0.0;

    for line in lines {
        match raw_profit(&line.product, line.quantity, line.unit) {
            Some(profit) => total += profit,
            None => warn!(
                product_id = %line.product.id,
                "Skipping line with non-finite profit"
            ),
        }
    }

    let manual_profit = manual_amount.to_decimal() * manual_profit_pct / 100.0;
    if manual_profit.is_finite() {
        total += manual_profit;
    } else {
        warn!(manual_profit_pct, "Ignoring non-finite manual profit");
    }

    Money::from_decimal(total)
}

/// Sum of the line prices. Each line is rounded first, as printed.
///
/// `None` when the sum does not fit in [`Money`].
pub fn sale_subtotal(lines: &[SaleLine]) -> Option<Money> {
    lines
        .iter()
        .try_fold(Money::zero(), |total, line| total.checked_add(line.price()))
}

// =============================================================================
// Stock
// =============================================================================

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Checks whether `requested_quantity` `requested_unit`s can be sold.
///
/// Products that do not track stock are always available.
pub fn check_stock_availability(
    product: &Product,
    requested_quantity: f64,
    requested_unit: Unit,
) -> StockAvailability {
    let Some(stock) = product.current_stock else {
        return StockAvailability {
            available: true,
            available_quantity: requested_quantity,
            available_unit: requested_unit,
        };
    };

    let stock_base = convert_to_base_unit(stock, product.unit);
    let requested_base = convert_to_base_unit(requested_quantity, requested_unit);

    if !stock_base.is_finite() || !requested_base.is_finite() {
        warn!(
            product_id = %product.id,
            stock,
            requested_quantity,
            "Stock check produced a non-finite value, reporting unavailable"
        );
        return StockAvailability {
            available: false,
            available_quantity: 0.0,
            available_unit: requested_unit,
        };
    }

    if stock_base >= requested_base {
        return StockAvailability {
            available: true,
            available_quantity: requested_quantity,
            available_unit: requested_unit,
        };
    }

    let max_quantity = convert_from_base_unit(stock_base.max(0.0), requested_unit);

    StockAvailability {
        available: false,
        available_quantity: round3(max_quantity),
        available_unit: requested_unit,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(unit: Unit, price_cents: i64, cost_cents: i64, discount: Option<f64>) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            sku: "RICE-1".to_string(),
            name: "Rice".to_string(),
            unit,
            price_cents,
            cost_cents,
            discount_pct: discount,
            current_stock: Some(10.0),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_price_same_unit_with_discount() {
        let p = product(Unit::Unit, 10_000, 6_000, Some(10.0));
        assert_eq!(calculate_price(&p, 2.0, Unit::Unit).cents(), 18_000);
    }

    #[test]
    fn test_price_without_discount_is_price_times_quantity() {
        let p = product(Unit::Kilogram, 250, 180, None);
        assert_eq!(calculate_price(&p, 500.0, Unit::Gram).cents(), 125);
        assert_eq!(calculate_price(&p, 3.0, Unit::Kilogram).cents(), 750);
    }

    #[test]
    fn test_price_full_discount_is_zero() {
        let p = product(Unit::Unit, 10_000, 6_000, Some(100.0));
        assert!(calculate_price(&p, 7.0, Unit::Unit).is_zero());
    }

    #[test]
    fn test_price_across_families_uses_quantity_as_is() {
        let p = product(Unit::Kilogram, 250, 180, None);
        // Liters are not convertible to kilograms: 2 is taken as 2 kg
        assert_eq!(calculate_price(&p, 2.0, Unit::Liter).cents(), 500);
    }

    #[test]
    fn test_price_non_finite_quantity_is_zero() {
        let p = product(Unit::Unit, 10_000, 6_000, None);
        assert!(calculate_price(&p, f64::NAN, Unit::Unit).is_zero());
        assert!(calculate_price(&p, f64::INFINITY, Unit::Unit).is_zero());
    }

    #[test]
    fn test_profit_discount_taken_on_undiscounted_amount() {
        // margin (100 - 60) × 2 = 80, discount 10% of 200 = 20
        let p = product(Unit::Unit, 10_000, 6_000, Some(10.0));
        assert_eq!(calculate_profit(&p, 2.0, Unit::Unit).cents(), 6_000);
    }

    #[test]
    fn test_profit_in_other_unit_of_family() {
        // 500 g of a 2.50/kg product costing 1.80/kg
        let p = product(Unit::Kilogram, 250, 180, None);
        assert_eq!(calculate_profit(&p, 500.0, Unit::Gram).cents(), 35);

        // a dozen of a per-unit product
        let p = product(Unit::Unit, 150, 100, None);
        assert_eq!(calculate_profit(&p, 1.0, Unit::Dozen).cents(), 600);
    }

    #[test]
    fn test_profit_equals_net_revenue_minus_cost() {
        let p = product(Unit::Liter, 480, 310, Some(5.0));
        let revenue = calculate_price(&p, 2500.0, Unit::Milliliter);
        let cost = Money::from_decimal(3.10 * 2.5);
        let profit = calculate_profit(&p, 2500.0, Unit::Milliliter);
        assert!((profit - (revenue - cost)).abs().cents() <= 1);
    }

    #[test]
    fn test_total_profit_with_manual_line() {
        let lines = vec![
            SaleLine::new(product(Unit::Unit, 10_000, 6_000, Some(10.0)), 2.0, Unit::Unit),
            SaleLine::new(product(Unit::Kilogram, 250, 180, None), 500.0, Unit::Gram),
        ];
        // 60.00 + 0.35 + 30% of 50.00
        let total = calculate_total_profit(&lines, Money::from_cents(5_000), 30.0);
        assert_eq!(total.cents(), 6_000 + 35 + 1_500);
    }

    #[test]
    fn test_total_profit_no_lines() {
        assert!(calculate_total_profit(&[], Money::zero(), 0.0).is_zero());
        assert_eq!(
            calculate_total_profit(&[], Money::from_cents(1_000), 25.0).cents(),
            250
        );
    }

    #[test]
    fn test_sale_subtotal() {
        let lines = vec![
            SaleLine::new(product(Unit::Unit, 10_000, 6_000, Some(10.0)), 2.0, Unit::Unit),
            SaleLine::new(product(Unit::Kilogram, 250, 180, None), 500.0, Unit::Gram),
        ];
        assert_eq!(sale_subtotal(&lines).map(|m| m.cents()), Some(18_000 + 125));
        assert_eq!(sale_subtotal(&[]), Some(Money::zero()));
    }

    #[test]
    fn test_sale_subtotal_overflow_is_none() {
        let lines = vec![
            SaleLine::new(product(Unit::Unit, 250, 180, None), 1e18, Unit::Unit),
            SaleLine::new(product(Unit::Unit, 250, 180, None), 1e18, Unit::Unit),
        ];
        assert_eq!(sale_subtotal(&lines), None);
    }

    #[test]
    fn test_stock_available() {
        let p = product(Unit::Kilogram, 250, 180, None); // 10 kg in stock
        let result = check_stock_availability(&p, 2500.0, Unit::Gram);
        assert!(result.available);
        assert_eq!(result.available_quantity, 2500.0);
        assert_eq!(result.available_unit, Unit::Gram);
    }

    #[test]
    fn test_stock_short_answers_in_requested_unit() {
        let mut p = product(Unit::Kilogram, 250, 180, None);
        p.current_stock = Some(1.2345);
        let result = check_stock_availability(&p, 2000.0, Unit::Gram);
        assert!(!result.available);
        assert_eq!(result.available_quantity, 1234.5);
        assert_eq!(result.available_unit, Unit::Gram);
    }

    #[test]
    fn test_stock_short_rounds_to_three_decimals() {
        let mut p = product(Unit::Unit, 100, 50, None);
        p.current_stock = Some(5.0);
        let result = check_stock_availability(&p, 1.0, Unit::Dozen);
        assert!(!result.available);
        assert_eq!(result.available_quantity, 0.417);
    }

    #[test]
    fn test_stock_negative_is_zero_available() {
        let mut p = product(Unit::Unit, 100, 50, None);
        p.current_stock = Some(-3.0);
        let result = check_stock_availability(&p, 1.0, Unit::Unit);
        assert!(!result.available);
        assert_eq!(result.available_quantity, 0.0);
    }

    #[test]
    fn test_stock_untracked_is_available() {
        let mut p = product(Unit::Unit, 100, 50, None);
        p.current_stock = None;
        assert!(check_stock_availability(&p, 1_000.0, Unit::Unit).available);
    }

    #[test]
    fn test_stock_non_finite_is_unavailable() {
        let p = product(Unit::Unit, 100, 50, None);
        let result = check_stock_availability(&p, f64::NAN, Unit::Unit);
        assert!(!result.available);
        assert_eq!(result.available_quantity, 0.0);
    }
}
