//! Synthetic daily price history.
//!
//! Bounded random walk used as mock data for charts and tests. Output must
//! never be treated as real market data.

use crate::error::{EngineError, Result};
use crate::types::{PricePoint, PriceSeries};
use chrono::{Days, Local, NaiveDate};
use rand::Rng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Max relative move per day (+/-2%)
const MAX_DAILY_MOVE: f64 = 0.02;
/// Recorded prices never fall below one cent
pub const MIN_PRICE: f64 = 0.01;

/// Round to cents, half away from zero
pub fn round_cents(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Generate `days` daily points ending at `end` (inclusive).
///
/// Starting from `base_price`, each day moves the running price by a factor
/// drawn uniformly from [-2%, +2%). Pass a seeded RNG for reproducible output.
pub fn generate_series<R: Rng>(
    base_price: f64,
    days: u32,
    end: NaiveDate,
    rng: &mut R,
) -> Result<PriceSeries> {
    if !base_price.is_finite() || base_price <= 0.0 {
        return Err(EngineError::invalid("base_price", format!("must be positive, got {}", base_price)));
    }
    if days == 0 {
        return Err(EngineError::invalid("days", "must be at least 1"));
    }

    let mut series = Vec::with_capacity(days as usize);
    let mut current = base_price;

    for offset in (0..days).rev() {
        let date = end
            .checked_sub_days(Days::new(offset as u64))
            .ok_or_else(|| EngineError::invalid("days", format!("{} days before {} is out of range", offset, end)))?;

        let change = current * rng.gen_range(-MAX_DAILY_MOVE..MAX_DAILY_MOVE);
        current = (current + change).max(MIN_PRICE);

        series.push(PricePoint::new(date, round_cents(current).max(MIN_PRICE)));
    }

    Ok(series)
}

/// Series ending today, driven by the thread-local RNG
pub fn generate_series_today(base_price: f64, days: u32) -> Result<PriceSeries> {
    let today = Local::now().date_naive();
    generate_series(base_price, days, today, &mut rand::thread_rng())
}
