//! Profit simulator session
//!
//! Holds the simulator form state and keeps the profit figures in sync with
//! every input change.

use crate::error::Result;
use crate::profit::{self, ProfitResult, SensitivityPoint, TradeScenario};
use crate::risk::{self, DownsideLoss, TradeLevels};
use crate::scenario::ScenarioKind;
use crate::types::Stock;

const DEFAULT_QUANTITY: u32 = 10;
/// Selecting a stock proposes a sell price 5% above the current price
const DEFAULT_SELL_MARKUP: f64 = 1.05;
/// Sell-price slider spans 50%..150% of the buy price
const SLIDER_LOW: f64 = 0.5;
const SLIDER_HIGH: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct ProfitSimulator {
    symbol: Option<String>,
    scenario: TradeScenario,
    result: ProfitResult,
}

impl Default for ProfitSimulator {
    fn default() -> Self {
        let scenario = TradeScenario {
            buy_price: 0.0,
            sell_price: 0.0,
            quantity: DEFAULT_QUANTITY,
        };
        Self {
            symbol: None,
            result: scenario.evaluate(),
            scenario,
        }
    }
}

impl ProfitSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn scenario(&self) -> TradeScenario {
        self.scenario
    }

    pub fn result(&self) -> ProfitResult {
        self.result
    }

    /// Seed buy/sell prices from the stock's current price
    pub fn select(&mut self, stock: &Stock) -> Result<()> {
        let buy = stock.current_price;
        self.apply(TradeScenario::new(buy, buy * DEFAULT_SELL_MARKUP, self.scenario.quantity)?);
        self.symbol = Some(stock.symbol.clone());
        Ok(())
    }

    pub fn set_buy_price(&mut self, price: f64) -> Result<()> {
        let s = self.scenario;
        self.apply(TradeScenario::new(price, s.sell_price, s.quantity)?);
        Ok(())
    }

    pub fn set_sell_price(&mut self, price: f64) -> Result<()> {
        let s = self.scenario;
        self.apply(TradeScenario::new(s.buy_price, price, s.quantity)?);
        Ok(())
    }

    pub fn set_quantity(&mut self, quantity: u32) -> Result<()> {
        let s = self.scenario;
        self.apply(TradeScenario::new(s.buy_price, s.sell_price, quantity)?);
        Ok(())
    }

    /// Raw text field input. On a parse error the previous value is kept.
    pub fn apply_buy_input(&mut self, raw: &str) -> Result<()> {
        self.set_buy_price(profit::parse_price("buy_price", raw)?)
    }

    pub fn apply_sell_input(&mut self, raw: &str) -> Result<()> {
        self.set_sell_price(profit::parse_price("sell_price", raw)?)
    }

    pub fn apply_quantity_input(&mut self, raw: &str) -> Result<()> {
        self.set_quantity(profit::parse_quantity(raw)?)
    }

    pub fn sell_price_range(&self) -> (f64, f64) {
        (self.scenario.buy_price * SLIDER_LOW, self.scenario.buy_price * SLIDER_HIGH)
    }

    pub fn sensitivity(&self) -> Result<Vec<SensitivityPoint>> {
        profit::sensitivity(self.scenario.buy_price, self.scenario.quantity)
    }

    pub fn expected_return(&self, outlook: ScenarioKind) -> f64 {
        outlook.expected_return(self.scenario.buy_price, self.scenario.quantity)
    }

    pub fn downside(&self) -> Result<Vec<DownsideLoss>> {
        risk::downside_losses(self.scenario.buy_price, self.scenario.quantity)
    }

    pub fn levels(&self) -> Result<TradeLevels> {
        risk::trade_levels(self.scenario.buy_price, self.scenario.quantity)
    }

    fn apply(&mut self, scenario: TradeScenario) {
        self.scenario = scenario;
        self.result = scenario.evaluate();
    }
}
