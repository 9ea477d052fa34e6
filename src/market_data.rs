//! Mock market data service
//! Serves canned stocks, details and trades after an artificial delay

use crate::error::{EngineError, Ratio, Result};
use crate::history::{self, round_cents, MIN_PRICE};
use crate::store::{InMemoryPositionStore, InMemoryTradeStore, PositionStore, TradeStore};
use crate::types::{
    Fluctuations, HistoricalRanges, Levels, NewTrade, OrderAck, Position, PriceRange, PriceSeries, Stock, StockDetails, Trade,
    TradeStatus, TradeType,
};
use chrono::NaiveDate;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Max relative quote move per fetch when jitter is on (+/-2%)
const QUOTE_JITTER_MOVE: f64 = 0.02;

pub struct MockStockService {
    positions: Arc<dyn PositionStore>,
    trades: Arc<dyn TradeStore>,
    details: HashMap<String, StockDetails>,
    /// Previous close per symbol, used to re-derive change figures under jitter
    prior_close: HashMap<String, f64>,
    latency: Duration,
    quote_jitter: bool,
}

impl MockStockService {
    pub fn new(
        positions: Arc<dyn PositionStore>,
        trades: Arc<dyn TradeStore>,
        details: Vec<StockDetails>,
        latency: Duration,
        quote_jitter: bool,
    ) -> Result<Self> {
        let prior_close = positions
            .all()?
            .iter()
            .map(|s| (s.symbol.clone(), s.current_price - s.change_amount))
            .collect();
        let details = details.into_iter().map(|d| (d.stock.symbol.clone(), d)).collect();

        Ok(Self {
            positions,
            trades,
            details,
            prior_close,
            latency,
            quote_jitter,
        })
    }

    /// Service backed by in-memory stores holding the demo data set
    pub fn with_mock_data(latency: Duration, quote_jitter: bool) -> Result<Self> {
        Self::new(
            Arc::new(InMemoryPositionStore::new(mock_stocks())),
            Arc::new(InMemoryTradeStore::new(mock_trades())),
            mock_stock_details(),
            latency,
            quote_jitter,
        )
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub async fn get_all_stocks(&self) -> Result<Vec<Stock>> {
        self.delay().await;
        if self.quote_jitter {
            self.jitter_quotes()?;
        }
        self.positions.all()
    }

    /// Current holdings as valuation inputs, refreshed like `get_all_stocks`
    pub async fn get_positions(&self) -> Result<Vec<Position>> {
        self.delay().await;
        if self.quote_jitter {
            self.jitter_quotes()?;
        }
        self.positions.positions()
    }

    pub async fn get_stock_by_symbol(&self, symbol: &str) -> Result<Option<StockDetails>> {
        self.delay().await;
        let Some(stock) = self.positions.get(symbol)? else {
            return Ok(None);
        };
        Ok(self.details.get(&stock.symbol).map(|d| StockDetails {
            stock,
            ..d.clone()
        }))
    }

    /// Generated daily history ending today. Unknown symbols yield an empty series.
    pub async fn get_historical_prices(&self, symbol: &str, days: u32) -> Result<PriceSeries> {
        self.delay().await;
        match self.positions.get(symbol)? {
            Some(stock) => history::generate_series_today(stock.current_price, days),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_all_trades(&self) -> Result<Vec<Trade>> {
        self.delay().await;
        self.trades.all()
    }

    pub async fn get_trade_volume(&self) -> Result<f64> {
        self.delay().await;
        self.trades.total_volume()
    }

    pub async fn add_trade(&self, trade: NewTrade) -> Result<Trade> {
        self.delay().await;
        let recorded = self.trades.append(trade)?;
        debug!(id = %recorded.id, instrument = %recorded.instrument, total = recorded.total, "[SERVICE] trade recorded");
        Ok(recorded)
    }

    pub async fn execute_buy_order(&self, symbol: &str, quantity: u32) -> Result<OrderAck> {
        self.place_order(TradeType::Buy, symbol, quantity).await
    }

    pub async fn execute_sell_order(&self, symbol: &str, quantity: u32) -> Result<OrderAck> {
        self.place_order(TradeType::Sell, symbol, quantity).await
    }

    /// Acknowledges only. Nothing is routed or filled.
    async fn place_order(&self, side: TradeType, symbol: &str, quantity: u32) -> Result<OrderAck> {
        if quantity == 0 {
            return Err(EngineError::invalid("quantity", "must be greater than zero"));
        }
        if self.positions.get(symbol)?.is_none() {
            return Err(EngineError::UnknownSymbol(symbol.to_string()));
        }
        self.delay().await;

        let verb = match side {
            TradeType::Buy => "Buy",
            TradeType::Sell => "Sell",
        };
        Ok(OrderAck {
            status: "success".to_string(),
            message: format!("{} order placed for {} shares of {}", verb, quantity, symbol),
        })
    }

    fn jitter_quotes(&self) -> Result<()> {
        let mut rng = rand::thread_rng();
        let stocks = self
            .positions
            .all()?
            .into_iter()
            .map(|mut stock| {
                let step = rng.gen_range(-QUOTE_JITTER_MOVE..QUOTE_JITTER_MOVE);
                let price = round_cents(stock.current_price * (1.0 + step)).max(MIN_PRICE);
                let prior = self.prior_close.get(&stock.symbol).copied().unwrap_or(stock.current_price);
                stock.current_price = price;
                stock.ltp = price;
                stock.change_amount = round_cents(price - prior);
                stock.change_percent = round_cents(Ratio::percent(price - prior, prior).value_or(0.0));
                stock
            })
            .collect();
        self.positions.replace_all(stocks)
    }
}

#[allow(clippy::too_many_arguments)]
fn stock(
    id: &str,
    symbol: &str,
    company: &str,
    quantity: i64,
    price: f64,
    change_amount: f64,
    change_percent: f64,
    volume: u64,
    is_breakout: bool,
) -> Stock {
    Stock {
        id: id.to_string(),
        symbol: symbol.to_string(),
        company: company.to_string(),
        quantity,
        current_price: price,
        ltp: price,
        change_amount,
        change_percent,
        volume,
        is_breakout,
    }
}

pub fn mock_stocks() -> Vec<Stock> {
    vec![
        stock("1", "AAPL", "Apple Inc.", 100, 151.23, 1.23, 0.82, 65482300, false),
        stock("2", "GOOGL", "Alphabet Inc.", 50, 132.45, 2.31, 1.78, 24536700, true),
        stock("3", "MSFT", "Microsoft Corporation", 75, 290.73, 3.45, 1.2, 32568900, false),
        stock("4", "AMZN", "Amazon.com Inc.", 30, 127.86, -0.93, -0.72, 45328900, false),
        stock("5", "TSLA", "Tesla Inc.", -50, 680.12, -12.34, -1.78, 36589200, false),
        stock("6", "META", "Meta Platforms Inc.", 60, 318.42, 4.62, 1.47, 29685400, true),
        stock("7", "NFLX", "Netflix Inc.", 25, 419.87, -3.21, -0.76, 15874200, false),
        stock("8", "DIS", "The Walt Disney Company", 45, 102.64, 1.54, 1.52, 19874500, false),
    ]
}

fn details(
    stock: Stock,
    ranges: [(f64, f64); 3],
    support: [f64; 3],
    target: [f64; 3],
    fluctuations: [&str; 3],
) -> StockDetails {
    let range = |(high, low): (f64, f64)| PriceRange { high, low };
    StockDetails {
        stock,
        historical: HistoricalRanges {
            day: range(ranges[0]),
            week: range(ranges[1]),
            month: range(ranges[2]),
        },
        support_levels: Levels(support),
        target_levels: Levels(target),
        fluctuations: Fluctuations {
            daily: fluctuations[0].to_string(),
            weekly: fluctuations[1].to_string(),
            monthly: fluctuations[2].to_string(),
        },
    }
}

pub fn mock_stock_details() -> Vec<StockDetails> {
    let stocks = mock_stocks();
    vec![
        details(
            stocks[0].clone(),
            [(152.00, 149.00), (153.50, 147.50), (156.00, 145.00)],
            [150.00, 148.50, 147.00],
            [155.00, 157.50, 160.00],
            ["+1.2%", "-2.3%", "+5.0%"],
        ),
        details(
            stocks[1].clone(),
            [(133.50, 130.75), (135.20, 129.80), (138.10, 127.25)],
            [131.00, 129.50, 127.00],
            [135.00, 138.00, 140.00],
            ["+1.8%", "+3.2%", "+2.7%"],
        ),
        details(
            stocks[2].clone(),
            [(292.00, 288.50), (295.75, 287.20), (298.00, 285.00)],
            [288.00, 285.50, 283.00],
            [295.00, 298.00, 300.00],
            ["+1.2%", "+2.1%", "+4.3%"],
        ),
    ]
}

fn trade(id: &str, date: (i32, u32, u32), instrument: &str, quantity: i64, trade_type: TradeType, price: f64, status: TradeStatus) -> Trade {
    Trade {
        id: id.to_string(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap_or_default(),
        instrument: instrument.to_string(),
        quantity,
        trade_type,
        price,
        total: round_cents(price * quantity.unsigned_abs() as f64),
        status,
    }
}

pub fn mock_trades() -> Vec<Trade> {
    vec![
        trade("1", (2023, 3, 15), "AAPL", 20, TradeType::Buy, 147.50, TradeStatus::Completed),
        trade("2", (2023, 3, 20), "GOOGL", 10, TradeType::Buy, 128.75, TradeStatus::Completed),
        trade("3", (2023, 3, 27), "TSLA", 15, TradeType::Sell, 675.50, TradeStatus::Completed),
        trade("4", (2023, 4, 2), "MSFT", 5, TradeType::Buy, 287.30, TradeStatus::Pending),
        trade("5", (2023, 4, 5), "AAPL", 10, TradeType::Sell, 151.20, TradeStatus::Completed),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::value_portfolio;

    fn service(jitter: bool) -> MockStockService {
        MockStockService::with_mock_data(Duration::ZERO, jitter).unwrap()
    }

    #[tokio::test]
    async fn test_get_all_stocks_returns_seed_data() {
        let svc = service(false);
        let stocks = svc.get_all_stocks().await.unwrap();
        assert_eq!(stocks.len(), 8);
        assert_eq!(stocks[4].symbol, "TSLA");
        assert_eq!(stocks[4].quantity, -50);

        let positions: Vec<_> = stocks.iter().map(Stock::position).collect();
        let summary = value_portfolio(&positions);
        assert_eq!(summary.long_count, 7);
        assert_eq!(summary.short_count, 1);
    }

    #[tokio::test]
    async fn test_seeded_trades_keep_blotter_quantities() {
        let svc = service(false);
        let trades = svc.get_all_trades().await.unwrap();
        let tsla = trades.iter().find(|t| t.id == "3").unwrap();
        assert_eq!(tsla.trade_type, TradeType::Sell);
        assert_eq!(tsla.quantity, 15);
        assert_eq!(tsla.total, 10132.5);
        let aapl = trades.iter().find(|t| t.id == "5").unwrap();
        assert_eq!(aapl.quantity, 10);
        assert_eq!(aapl.total, 1512.0);
    }

    #[tokio::test]
    async fn test_get_positions_matches_stocks() {
        let svc = service(false);
        let positions = svc.get_positions().await.unwrap();
        assert_eq!(positions.len(), 8);
        assert_eq!(positions[4].symbol, "TSLA");
        assert!(positions[4].is_short());
        assert_eq!(positions[0].change_percent, 0.82);
    }

    #[tokio::test]
    async fn test_jitter_with_zero_prior_close_reports_flat_percent() {
        let mut listing = mock_stocks().remove(0);
        listing.change_amount = listing.current_price;
        let svc = MockStockService::new(
            Arc::new(InMemoryPositionStore::new(vec![listing])),
            Arc::new(InMemoryTradeStore::default()),
            Vec::new(),
            Duration::ZERO,
            true,
        )
        .unwrap();

        let stocks = svc.get_all_stocks().await.unwrap();
        assert_eq!(stocks[0].change_percent, 0.0);
        assert!(stocks[0].change_amount > 0.0);
    }

    #[tokio::test]
    async fn test_stock_details_only_for_known_symbols() {
        let svc = service(false);
        let aapl = svc.get_stock_by_symbol("AAPL").await.unwrap().unwrap();
        assert_eq!(aapl.support_levels, Levels([150.00, 148.50, 147.00]));
        assert_eq!(aapl.stock.current_price, 151.23);
        assert!(svc.get_stock_by_symbol("NFLX").await.unwrap().is_none());
        assert!(svc.get_stock_by_symbol("ZZZZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_historical_prices() {
        let svc = service(false);
        let series = svc.get_historical_prices("MSFT", 30).await.unwrap();
        assert_eq!(series.len(), 30);
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        assert!(svc.get_historical_prices("ZZZZ", 30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_trade_appends() {
        let svc = service(false);
        let trade = svc
            .add_trade(NewTrade {
                date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                instrument: "NFLX".to_string(),
                trade_type: TradeType::Sell,
                quantity: 4,
                price: 420.0,
            })
            .await
            .unwrap();
        assert_eq!(trade.id, "6");
        assert_eq!(trade.quantity, -4);
        assert_eq!(trade.total, 1680.0);
        assert_eq!(svc.get_all_trades().await.unwrap().len(), 6);

        let volume = svc.get_trade_volume().await.unwrap();
        assert!((volume - (2950.0 + 1287.5 + 10132.5 + 1436.5 + 1512.0 + 1680.0)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_orders_are_acknowledged() {
        let svc = service(false);
        let ack = svc.execute_buy_order("AAPL", 10).await.unwrap();
        assert_eq!(ack.status, "success");
        assert_eq!(ack.message, "Buy order placed for 10 shares of AAPL");

        let ack = svc.execute_sell_order("TSLA", 3).await.unwrap();
        assert_eq!(ack.message, "Sell order placed for 3 shares of TSLA");

        assert!(matches!(svc.execute_buy_order("ZZZZ", 1).await, Err(EngineError::UnknownSymbol(_))));
        assert!(svc.execute_sell_order("AAPL", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_jitter_keeps_quotes_bounded_and_consistent() {
        let svc = service(true);
        let seed = mock_stocks();
        for _ in 0..5 {
            svc.get_all_stocks().await.unwrap();
        }
        let stocks = svc.get_all_stocks().await.unwrap();

        for (before, after) in seed.iter().zip(&stocks) {
            assert_eq!(before.symbol, after.symbol);
            assert_eq!(before.quantity, after.quantity);
            assert!(after.current_price > 0.0);
            assert_eq!(after.current_price, after.ltp);
            let prior = before.current_price - before.change_amount;
            assert!((after.change_amount - (after.current_price - prior)).abs() < 0.011);
        }
    }
}
