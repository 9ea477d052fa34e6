//! Position and trade repositories.
//!
//! The market data service is handed these as trait objects so the backing
//! can be swapped without touching the service.

use crate::error::{EngineError, Result};
use crate::types::{NewTrade, Position, Stock, Trade, TradeStatus, TradeType};
use std::sync::RwLock;

pub trait PositionStore: Send + Sync {
    fn all(&self) -> Result<Vec<Stock>>;

    fn get(&self, symbol: &str) -> Result<Option<Stock>>;

    /// Wholesale replacement on refetch
    fn replace_all(&self, stocks: Vec<Stock>) -> Result<()>;

    fn positions(&self) -> Result<Vec<Position>> {
        Ok(self.all()?.iter().map(Stock::position).collect())
    }
}

pub trait TradeStore: Send + Sync {
    fn all(&self) -> Result<Vec<Trade>>;

    fn append(&self, trade: NewTrade) -> Result<Trade>;

    /// Sum of trade totals
    fn total_volume(&self) -> Result<f64> {
        Ok(self.all()?.iter().map(|t| t.total).sum())
    }
}

fn poisoned<T>(_: T) -> EngineError {
    EngineError::Store("lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct InMemoryPositionStore {
    stocks: RwLock<Vec<Stock>>,
}

impl InMemoryPositionStore {
    pub fn new(stocks: Vec<Stock>) -> Self {
        Self {
            stocks: RwLock::new(stocks),
        }
    }
}

impl PositionStore for InMemoryPositionStore {
    fn all(&self) -> Result<Vec<Stock>> {
        Ok(self.stocks.read().map_err(poisoned)?.clone())
    }

    fn get(&self, symbol: &str) -> Result<Option<Stock>> {
        let stocks = self.stocks.read().map_err(poisoned)?;
        Ok(stocks.iter().find(|s| s.symbol.eq_ignore_ascii_case(symbol)).cloned())
    }

    fn replace_all(&self, stocks: Vec<Stock>) -> Result<()> {
        *self.stocks.write().map_err(poisoned)? = stocks;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    trades: RwLock<Vec<Trade>>,
}

impl InMemoryTradeStore {
    pub fn new(trades: Vec<Trade>) -> Self {
        Self {
            trades: RwLock::new(trades),
        }
    }
}

/// Check a trade request the way the trade form does before submitting
pub fn validate_new_trade(trade: &NewTrade) -> Result<()> {
    if trade.instrument.trim().is_empty() {
        return Err(EngineError::invalid("instrument", "must not be empty"));
    }
    if trade.quantity == 0 {
        return Err(EngineError::invalid("quantity", "must be greater than zero"));
    }
    if !trade.price.is_finite() || trade.price <= 0.0 {
        return Err(EngineError::invalid("price", format!("must be positive, got {}", trade.price)));
    }
    Ok(())
}

impl TradeStore for InMemoryTradeStore {
    fn all(&self) -> Result<Vec<Trade>> {
        Ok(self.trades.read().map_err(poisoned)?.clone())
    }

    fn append(&self, trade: NewTrade) -> Result<Trade> {
        validate_new_trade(&trade)?;

        let mut trades = self.trades.write().map_err(poisoned)?;
        let quantity = match trade.trade_type {
            TradeType::Buy => trade.quantity as i64,
            TradeType::Sell => -(trade.quantity as i64),
        };
        let recorded = Trade {
            id: (trades.len() + 1).to_string(),
            date: trade.date,
            instrument: trade.instrument.trim().to_ascii_uppercase(),
            quantity,
            trade_type: trade.trade_type,
            price: trade.price,
            total: trade.price * trade.quantity as f64,
            status: TradeStatus::Completed,
        };
        trades.push(recorded.clone());
        Ok(recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_trade(instrument: &str, trade_type: TradeType, quantity: u32, price: f64) -> NewTrade {
        NewTrade {
            date: NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
            instrument: instrument.to_string(),
            trade_type,
            quantity,
            price,
        }
    }

    #[test]
    fn test_append_assigns_id_total_and_sign() {
        let store = InMemoryTradeStore::default();
        let buy = store.append(new_trade("aapl", TradeType::Buy, 20, 147.5)).unwrap();
        assert_eq!(buy.id, "1");
        assert_eq!(buy.instrument, "AAPL");
        assert_eq!(buy.quantity, 20);
        assert_eq!(buy.total, 2950.0);
        assert_eq!(buy.status, TradeStatus::Completed);

        let sell = store.append(new_trade("TSLA", TradeType::Sell, 15, 675.5)).unwrap();
        assert_eq!(sell.id, "2");
        assert_eq!(sell.quantity, -15);
        assert_eq!(sell.total, 10132.5);

        assert_eq!(store.all().unwrap().len(), 2);
        assert_eq!(store.total_volume().unwrap(), 2950.0 + 10132.5);
    }

    #[test]
    fn test_append_rejects_invalid_trades() {
        let store = InMemoryTradeStore::default();
        assert!(store.append(new_trade("  ", TradeType::Buy, 1, 1.0)).is_err());
        assert!(store.append(new_trade("AAPL", TradeType::Buy, 0, 1.0)).is_err());
        assert!(store.append(new_trade("AAPL", TradeType::Buy, 1, 0.0)).is_err());
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn test_position_store_lookup_and_replace() {
        let store = InMemoryPositionStore::default();
        assert!(store.get("AAPL").unwrap().is_none());

        let stock = Stock {
            id: "1".to_string(),
            symbol: "AAPL".to_string(),
            company: "Apple Inc.".to_string(),
            quantity: 100,
            current_price: 151.23,
            ltp: 151.23,
            change_amount: 1.23,
            change_percent: 0.82,
            volume: 65482300,
            is_breakout: false,
        };
        store.replace_all(vec![stock.clone()]).unwrap();
        assert_eq!(store.get("aapl").unwrap(), Some(stock));

        let positions = store.positions().unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].quantity, 100);
    }
}
