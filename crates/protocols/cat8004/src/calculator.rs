//! Cat8004 Quote Calculator
//!
//! Pure math functions for pricing a purchase.
//! No I/O, no async - just deterministic calculations.
//!
//! # Units
//!
//! - Native amounts: wei (u128), 1 ETH = 10^18 wei
//! - Fiat amounts: cents (u64)
//! - Quantities: whole token units, clamped to the sale bounds before pricing

use minter_core::{format_eth, SaleParams, Wei};
use serde::{Deserialize, Serialize};

use crate::constants::{params, PRICE_BREAKDOWN_UNITS};

/// Priced purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Quantity actually priced (after clamping)
    pub requested_units: u64,
    /// Exact native cost in wei
    pub native_cost_wei: Wei,
    /// Native cost in ETH
    pub native_cost: f64,
    /// Exact fiat cost in cents
    pub fiat_cost_cents: u64,
    /// Fiat cost in dollars
    pub fiat_cost: f64,
    /// Collectibles earned by this quantity
    pub derived_item_count: u64,
}

impl Quote {
    /// Native cost formatted for display, e.g. "0.0025000"
    pub fn native_cost_display(&self) -> String {
        format_eth(self.native_cost_wei, params::NATIVE_DISPLAY_DECIMALS)
    }

    /// Fiat cost formatted for display, e.g. "$10.00"
    pub fn fiat_cost_display(&self) -> String {
        format_usd_cents(self.fiat_cost_cents)
    }
}

/// One row of the reference price table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub units: u64,
    pub native_cost_wei: Wei,
    pub native_cost_display: String,
    pub fiat_cost_display: String,
}

/// Clamp a raw quantity into `[min_units, max_units]`
pub fn clamp_units(sale: &SaleParams, raw: i64) -> u64 {
    if raw < sale.min_units as i64 {
        sale.min_units
    } else {
        (raw as u64).min(sale.max_units)
    }
}

/// Clamp a free-form numeric entry. Fractions are floored, non-numbers fall to the minimum.
pub fn clamp_input(sale: &SaleParams, input: &str) -> u64 {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => clamp_units(sale, value.floor() as i64),
        _ => sale.min_units,
    }
}

/// Move the quantity by a stepper press (positive or negative).
///
/// Increments stop at `min(max_units, available)`; a press at or past that
/// ceiling leaves the quantity unchanged.
pub fn step_units(sale: &SaleParams, current: u64, delta: i64, available: u64) -> u64 {
    let ceiling = sale.max_units.min(available).max(sale.min_units);
    if delta > 0 && current >= ceiling {
        return current;
    }
    let stepped = clamp_units(sale, (current as i64).saturating_add(delta));
    if delta > 0 {
        stepped.min(ceiling)
    } else {
        stepped
    }
}

/// Apply a quick-select amount, capped at what is still available
pub fn quick_select_units(amount: u64, available: u64) -> u64 {
    amount.min(available)
}

/// Native cost of a quantity in wei
pub fn native_cost_wei(sale: &SaleParams, units: u64) -> Wei {
    units as u128 * sale.rate_wei_per_thousand as u128 / 1000
}

/// Fiat cost of a quantity in cents
pub fn fiat_cost_cents(sale: &SaleParams, units: u64) -> u64 {
    (units as u128 * sale.fiat_cents_per_thousand as u128 / 1000) as u64
}

/// Collectibles earned by a quantity
pub fn derived_item_count(sale: &SaleParams, units: u64) -> u64 {
    units / sale.items_per_bundle.max(1)
}

/// Price a requested quantity.
///
/// The quantity is clamped first, so every input yields a quote.
pub fn compute_quote(sale: &SaleParams, requested_units: i64) -> Quote {
    let units = clamp_units(sale, requested_units);
    let wei = native_cost_wei(sale, units);
    let thousands = units as f64 / 1000.0;

    Quote {
        requested_units: units,
        native_cost_wei: wei,
        native_cost: thousands * sale.rate_wei_per_thousand as f64 / 1e18,
        fiat_cost_cents: fiat_cost_cents(sale, units),
        fiat_cost: thousands * sale.fiat_cents_per_thousand as f64 / 100.0,
        derived_item_count: derived_item_count(sale, units),
    }
}

/// Reference price table
pub fn price_breakdown(sale: &SaleParams) -> Vec<PriceRow> {
    PRICE_BREAKDOWN_UNITS
        .iter()
        .map(|&units| {
            let wei = native_cost_wei(sale, units);
            PriceRow {
                units,
                native_cost_wei: wei,
                native_cost_display: format_eth(wei, params::NATIVE_DISPLAY_DECIMALS),
                fiat_cost_display: format_usd_cents(fiat_cost_cents(sale, units)),
            }
        })
        .collect()
}

/// Format cents as dollars, e.g. 1000 -> "$10.00"
pub fn format_usd_cents(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale() -> SaleParams {
        SaleParams::default()
    }

    #[test]
    fn test_quote_linear_over_domain() {
        let sale = sale();
        for units in 1..=5000i64 {
            let quote = compute_quote(&sale, units);
            let expected_native = units as f64 / 1000.0 * 0.0025;
            let expected_fiat = units as f64 / 1000.0 * 10.0;
            assert!((quote.native_cost - expected_native).abs() < 1e-12);
            assert!((quote.fiat_cost - expected_fiat).abs() < 1e-9);
            assert_eq!(quote.native_cost_wei, units as u128 * 2_500_000_000_000);
        }
    }

    #[test]
    fn test_clamp_law() {
        let sale = sale();
        assert_eq!(clamp_units(&sale, 0), 1);
        assert_eq!(clamp_units(&sale, -40), 1);
        assert_eq!(clamp_units(&sale, 6000), 5000);
        assert_eq!(clamp_units(&sale, i64::MAX), 5000);
        assert_eq!(clamp_units(&sale, 2500), 2500);
    }

    #[test]
    fn test_clamp_input() {
        let sale = sale();
        assert_eq!(clamp_input(&sale, "12.9"), 12);
        assert_eq!(clamp_input(&sale, "abc"), 1);
        assert_eq!(clamp_input(&sale, ""), 1);
        assert_eq!(clamp_input(&sale, "9999"), 5000);
    }

    #[test]
    fn test_step_and_quick_select() {
        let sale = sale();
        assert_eq!(step_units(&sale, 5, -10, 500_000), 1);
        assert_eq!(step_units(&sale, 100, 10, 500_000), 110);
        assert_eq!(step_units(&sale, 4995, 10, 500_000), 5000);
        assert_eq!(quick_select_units(5000, 1200), 1200);
        assert_eq!(quick_select_units(10, 1200), 10);
    }

    #[test]
    fn test_step_stops_at_remaining_supply() {
        let sale = sale();
        assert_eq!(step_units(&sale, 295, 10, 300), 300);
        assert_eq!(step_units(&sale, 300, 10, 300), 300);
        assert_eq!(step_units(&sale, 300, -10, 300), 290);
        // Already above what is left: "+" does nothing, "-" still works
        assert_eq!(step_units(&sale, 400, 10, 300), 400);
        assert_eq!(step_units(&sale, 400, -10, 300), 390);
        // Sold out keeps the minimum bound
        assert_eq!(step_units(&sale, 1, 10, 0), 1);
    }

    #[test]
    fn test_derived_item_count() {
        let sale = sale();
        assert_eq!(compute_quote(&sale, 2500).derived_item_count, 2);
        assert_eq!(compute_quote(&sale, 999).derived_item_count, 0);
        assert_eq!(compute_quote(&sale, 5000).derived_item_count, 5);
    }

    #[test]
    fn test_thousand_units() {
        let quote = compute_quote(&sale(), 1000);
        assert_eq!(quote.native_cost_wei, 2_500_000_000_000_000);
        assert!((quote.native_cost - 0.0025).abs() < 1e-12);
        assert_eq!(quote.fiat_cost_display(), "$10.00");
        assert_eq!(quote.native_cost_display(), "0.0025000");
        assert_eq!(quote.derived_item_count, 1);
    }

    #[test]
    fn test_above_max_is_clamped() {
        let sale = sale();
        assert_eq!(compute_quote(&sale, 6000), compute_quote(&sale, 5000));
        assert_eq!(compute_quote(&sale, 6000).requested_units, 5000);
    }

    #[test]
    fn test_quote_is_pure() {
        let sale = sale();
        assert_eq!(compute_quote(&sale, 777), compute_quote(&sale, 777));
    }

    #[test]
    fn test_price_breakdown() {
        let rows = price_breakdown(&sale());
        let shown: Vec<(u64, &str, &str)> = rows
            .iter()
            .map(|r| {
                (
                    r.units,
                    r.native_cost_display.as_str(),
                    r.fiat_cost_display.as_str(),
                )
            })
            .collect();
        assert_eq!(
            shown,
            vec![
                (1, "0.0000025", "$0.01"),
                (100, "0.0002500", "$1.00"),
                (500, "0.0012500", "$5.00"),
                (1000, "0.0025000", "$10.00"),
                (2500, "0.0062500", "$25.00"),
                (5000, "0.0125000", "$50.00"),
            ]
        );
    }
}
