// Shared types for the portfolio engine

use crate::error::Ratio;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A held quantity of a ticker at its current market price.
/// Positive quantity is long, negative is short, zero is flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: i64,
    pub current_price: f64,
    pub change_amount: f64,  // absolute change since prior close
    pub change_percent: f64,
}

impl Position {
    pub fn new(symbol: &str, quantity: i64, current_price: f64, change_amount: f64) -> Self {
        let prior_close = current_price - change_amount;
        let change_percent = Ratio::percent(change_amount, prior_close).value_or(0.0);
        Self {
            symbol: symbol.to_string(),
            quantity,
            current_price,
            change_amount,
            change_percent,
        }
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0
    }
}

/// Stock record as served by the market data service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub id: String,
    pub symbol: String,
    pub company: String,
    pub quantity: i64,
    pub current_price: f64,
    pub ltp: f64,
    pub change_amount: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub is_breakout: bool,
}

impl Stock {
    pub fn position(&self) -> Position {
        Position {
            symbol: self.symbol.clone(),
            quantity: self.quantity,
            current_price: self.current_price,
            change_amount: self.change_amount,
            change_percent: self.change_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub high: f64,
    pub low: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRanges {
    pub day: PriceRange,
    pub week: PriceRange,
    pub month: PriceRange,
}

/// S1..S3 / T1..T3. Supplied externally, never computed here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Levels(pub [f64; 3]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fluctuations {
    pub daily: String,
    pub weekly: String,
    pub monthly: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDetails {
    pub stock: Stock,
    pub historical: HistoricalRanges,
    pub support_levels: Levels,
    pub target_levels: Levels,
    pub fluctuations: Fluctuations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "buy",
            TradeType::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Completed,
    Pending,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub date: NaiveDate,
    pub instrument: String,
    pub quantity: i64,  // negative for sells entered on the trade form
    pub trade_type: TradeType,
    pub price: f64,
    pub total: f64,
    pub status: TradeStatus,
}

/// Trade request as entered on the trade form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    pub date: NaiveDate,
    pub instrument: String,
    pub trade_type: TradeType,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub status: String,
    pub message: String,
}

/// One dated price in an ascending series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

pub type PriceSeries = Vec<PricePoint>;
