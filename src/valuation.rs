//! Portfolio Valuation Module
//!
//! Aggregates holdings into market value, day change and exposure figures.
//! Market value is signed: short positions (negative quantity) subtract from
//! the total. Exposure figures use absolute magnitudes instead.

use crate::error::Ratio;
use crate::types::Position;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_market_value: f64,
    pub day_change: f64,
    pub day_change_percent: Ratio,
    pub long_count: usize,
    pub short_count: usize,
}

impl PortfolioSummary {
    pub fn zero() -> Self {
        Self {
            total_market_value: 0.0,
            day_change: 0.0,
            day_change_percent: Ratio::Defined(0.0),
            long_count: 0,
            short_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureSplit {
    pub long_value: f64,
    pub short_value: f64,
    pub gross_value: f64,
}

/// A position's share of gross exposure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub symbol: String,
    pub value: f64,
    pub weight_percent: f64,
    pub is_long: bool,
}

/// Value a set of positions.
///
/// `day_change_percent` is measured against the prior-close value
/// (`total - day_change`) and is `Undefined` when that is zero.
pub fn value_portfolio(positions: &[Position]) -> PortfolioSummary {
    if positions.is_empty() {
        return PortfolioSummary::zero();
    }

    let mut total_market_value = 0.0;
    let mut day_change = 0.0;
    let mut long_count = 0;
    let mut short_count = 0;

    for pos in positions {
        if pos.quantity == 0 {
            continue;
        }
        let qty = pos.quantity as f64;
        total_market_value += pos.current_price * qty;
        day_change += qty * pos.change_amount;
        if pos.is_long() {
            long_count += 1;
        } else {
            short_count += 1;
        }
    }

    PortfolioSummary {
        total_market_value,
        day_change,
        day_change_percent: Ratio::percent(day_change, total_market_value - day_change),
        long_count,
        short_count,
    }
}

/// Market value of a single position at absolute size
pub fn gross_value(pos: &Position) -> f64 {
    pos.current_price * pos.quantity.unsigned_abs() as f64
}

pub fn exposure(positions: &[Position]) -> ExposureSplit {
    let long_value: f64 = positions
        .iter()
        .filter(|p| p.is_long())
        .map(gross_value)
        .sum();
    let short_value: f64 = positions
        .iter()
        .filter(|p| p.is_short())
        .map(gross_value)
        .sum();

    ExposureSplit {
        long_value,
        short_value,
        gross_value: long_value + short_value,
    }
}

/// Per-position share of gross exposure. Flat positions are dropped.
pub fn allocations(positions: &[Position]) -> Vec<Allocation> {
    let gross = exposure(positions).gross_value;

    positions
        .iter()
        .filter(|p| p.quantity != 0)
        .map(|p| {
            let value = gross_value(p);
            Allocation {
                symbol: p.symbol.clone(),
                value,
                weight_percent: Ratio::percent(value, gross).value_or(0.0),
                is_long: p.is_long(),
            }
        })
        .collect()
}
