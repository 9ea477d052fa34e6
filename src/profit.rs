//! Trade profit calculation
//! Investment, return and profit/loss for a hypothetical buy/sell pair

use crate::error::{EngineError, Ratio, Result};
use serde::{Deserialize, Serialize};

/// Sensitivity table spans -20%..+20% of the buy price in 4% steps
const SENSITIVITY_START: f64 = 0.80;
const SENSITIVITY_STEP: f64 = 0.04;
const SENSITIVITY_POINTS: usize = 11;

/// Validated inputs for a profit calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeScenario {
    pub buy_price: f64,
    pub sell_price: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitResult {
    pub investment: f64,
    pub return_value: f64,
    pub profit: f64,
    pub profit_percent: f64,
}

impl ProfitResult {
    pub fn is_gain(&self) -> bool {
        self.profit > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.profit < 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub price_factor: f64,
    pub sell_price: f64,
    pub profit: f64,
    pub profit_percent: f64,
}

impl SensitivityPoint {
    /// Label as shown on the chart axis, e.g. "-12%"
    pub fn label(&self) -> String {
        let pct = (self.price_factor * 100.0 - 100.0).round() as i64;
        format!("{}%", pct)
    }
}

pub(crate) fn check_price(field: &'static str, price: f64) -> Result<f64> {
    if !price.is_finite() {
        return Err(EngineError::invalid(field, "must be a finite number"));
    }
    if price < 0.0 {
        return Err(EngineError::invalid(field, format!("must not be negative, got {}", price)));
    }
    Ok(price)
}

pub(crate) fn check_quantity(quantity: u32) -> Result<u32> {
    if quantity == 0 {
        return Err(EngineError::invalid("quantity", "must be greater than zero"));
    }
    Ok(quantity)
}

impl TradeScenario {
    pub fn new(buy_price: f64, sell_price: f64, quantity: u32) -> Result<Self> {
        Ok(Self {
            buy_price: check_price("buy_price", buy_price)?,
            sell_price: check_price("sell_price", sell_price)?,
            quantity: check_quantity(quantity)?,
        })
    }

    /// Build a scenario from raw form fields
    pub fn parse(buy_price: &str, sell_price: &str, quantity: &str) -> Result<Self> {
        let buy = parse_price("buy_price", buy_price)?;
        let sell = parse_price("sell_price", sell_price)?;
        let qty = parse_quantity(quantity)?;
        Self::new(buy, sell, qty)
    }

    pub fn evaluate(&self) -> ProfitResult {
        let qty = self.quantity as f64;
        let investment = self.buy_price * qty;
        let return_value = self.sell_price * qty;
        let profit = return_value - investment;

        ProfitResult {
            investment,
            return_value,
            profit,
            profit_percent: Ratio::percent(profit, investment).value_or(0.0),
        }
    }
}

pub(crate) fn parse_price(field: &'static str, raw: &str) -> Result<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| EngineError::invalid(field, format!("'{}' is not a number ({})", raw, e)))?;
    check_price(field, value)
}

pub(crate) fn parse_quantity(raw: &str) -> Result<u32> {
    let value = raw
        .trim()
        .parse::<u32>()
        .map_err(|e| EngineError::invalid("quantity", format!("'{}' is not a whole number ({})", raw, e)))?;
    check_quantity(value)
}

/// Compute investment, return value, profit and profit percentage.
///
/// `profit_percent` falls back to 0 when the investment is zero.
pub fn calculate_profit(buy_price: f64, sell_price: f64, quantity: u32) -> Result<ProfitResult> {
    Ok(TradeScenario::new(buy_price, sell_price, quantity)?.evaluate())
}

/// Profit at fixed sell-price offsets around the buy price
pub fn sensitivity(buy_price: f64, quantity: u32) -> Result<Vec<SensitivityPoint>> {
    let buy_price = check_price("buy_price", buy_price)?;
    let qty = check_quantity(quantity)? as f64;

    Ok((0..SENSITIVITY_POINTS)
        .map(|i| {
            let price_factor = SENSITIVITY_START + i as f64 * SENSITIVITY_STEP;
            let sell_price = buy_price * price_factor;
            SensitivityPoint {
                price_factor,
                sell_price,
                profit: (sell_price - buy_price) * qty,
                profit_percent: (price_factor - 1.0) * 100.0,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_profit_gain() {
        let r = calculate_profit(100.0, 120.0, 10).unwrap();
        assert_eq!(r.investment, 1000.0);
        assert_eq!(r.return_value, 1200.0);
        assert_eq!(r.profit, 200.0);
        assert!((r.profit_percent - 20.0).abs() < 1e-9);
        assert!(r.is_gain());
    }

    #[test]
    fn test_calculate_profit_break_even() {
        let r = calculate_profit(100.0, 100.0, 5).unwrap();
        assert_eq!(r.profit, 0.0);
        assert_eq!(r.profit_percent, 0.0);
        assert!(!r.is_gain() && !r.is_loss());
    }

    #[test]
    fn test_zero_buy_price_falls_back_to_zero_percent() {
        let r = calculate_profit(0.0, 50.0, 10).unwrap();
        assert_eq!(r.investment, 0.0);
        assert_eq!(r.profit, 500.0);
        assert_eq!(r.profit_percent, 0.0);
        assert!(r.profit_percent.is_finite());
    }

    #[test]
    fn test_loss() {
        let r = calculate_profit(200.0, 150.0, 4).unwrap();
        assert_eq!(r.profit, -200.0);
        assert!((r.profit_percent + 25.0).abs() < 1e-9);
        assert!(r.is_loss());
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(matches!(
            calculate_profit(100.0, 120.0, 0),
            Err(EngineError::InvalidInput { field: "quantity", .. })
        ));
        assert!(matches!(
            calculate_profit(-1.0, 120.0, 1),
            Err(EngineError::InvalidInput { field: "buy_price", .. })
        ));
        assert!(calculate_profit(1.0, f64::NAN, 1).is_err());
        assert!(calculate_profit(1.0, f64::INFINITY, 1).is_err());
    }

    #[test]
    fn test_parse_form_fields() {
        let s = TradeScenario::parse(" 200 ", "220.5", "10").unwrap();
        assert_eq!(s.buy_price, 200.0);
        assert_eq!(s.sell_price, 220.5);
        assert_eq!(s.quantity, 10);

        assert!(TradeScenario::parse("abc", "1", "1").is_err());
        assert!(TradeScenario::parse("1", "1", "1.5").is_err());
        assert!(TradeScenario::parse("1", "1", "-3").is_err());
        assert!(TradeScenario::parse("1", "", "3").is_err());
    }

    #[test]
    fn test_calculate_profit_is_idempotent() {
        let a = calculate_profit(151.23, 158.79, 37).unwrap();
        let b = calculate_profit(151.23, 158.79, 37).unwrap();
        assert_eq!(a.profit.to_bits(), b.profit.to_bits());
        assert_eq!(a.profit_percent.to_bits(), b.profit_percent.to_bits());
    }

    #[test]
    fn test_sensitivity_table() {
        let table = sensitivity(200.0, 10).unwrap();
        assert_eq!(table.len(), 11);

        let first = table[0];
        assert!((first.sell_price - 160.0).abs() < 1e-9);
        assert!((first.profit + 400.0).abs() < 1e-9);
        assert!((first.profit_percent + 20.0).abs() < 1e-9);
        assert_eq!(first.label(), "-20%");

        let mid = table[5];
        assert!(mid.profit.abs() < 1e-9);
        assert_eq!(mid.label(), "0%");

        let last = table[10];
        assert!((last.sell_price - 240.0).abs() < 1e-9);
        assert!((last.profit_percent - 20.0).abs() < 1e-9);
        assert_eq!(last.label(), "20%");
    }
}
