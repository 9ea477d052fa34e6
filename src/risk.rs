//! Trade risk figures
//!
//! Downside losses and suggested trade levels derived from a buy price and
//! quantity. Fixed rule-of-thumb offsets, not fitted to price history.

use crate::error::Result;
use crate::profit::{check_price, check_quantity};
use serde::{Deserialize, Serialize};

/// Price drops shown in the downside ladder
const DOWNSIDE_DROPS: [f64; 4] = [0.05, 0.10, 0.15, 0.20];

const ENTRY_FACTOR: f64 = 0.95;      // -5%
const TARGET_FACTOR: f64 = 1.15;     // +15%
const STOP_LOSS_FACTOR: f64 = 0.93;  // -7%
const SIZE_FACTOR: f64 = 1.20;       // +20% position size

/// Loss on the full investment if the price falls by `drop_percent`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownsideLoss {
    pub drop_percent: f64,
    pub loss: f64,
}

/// Suggested entry, exit, size and stop for a trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeLevels {
    pub entry_price: f64,
    pub target_price: f64,
    pub suggested_quantity: u32,
    pub stop_loss: f64,
}

/// Losses at -5%, -10%, -15% and -20%. Losses are reported as positive amounts.
pub fn downside_losses(buy_price: f64, quantity: u32) -> Result<Vec<DownsideLoss>> {
    let buy_price = check_price("buy_price", buy_price)?;
    let qty = check_quantity(quantity)? as f64;

    Ok(DOWNSIDE_DROPS
        .iter()
        .map(|&drop| DownsideLoss {
            drop_percent: drop * 100.0,
            loss: buy_price * drop * qty,
        })
        .collect())
}

pub fn trade_levels(buy_price: f64, quantity: u32) -> Result<TradeLevels> {
    let buy_price = check_price("buy_price", buy_price)?;
    let quantity = check_quantity(quantity)?;

    Ok(TradeLevels {
        entry_price: buy_price * ENTRY_FACTOR,
        target_price: buy_price * TARGET_FACTOR,
        suggested_quantity: (quantity as f64 * SIZE_FACTOR).round() as u32,
        stop_loss: buy_price * STOP_LOSS_FACTOR,
    })
}
