mod config;
mod database;
mod engine;
mod error;
mod feed;
mod history;
mod market_data;
mod profit;
mod risk;
mod scenario;
mod simulator;
mod store;
mod types;
mod valuation;

use anyhow::{Context, Result};
use chrono::{Days, Local};
use config::Config;
use database::DbLogger;
use market_data::MockStockService;
use rtrb::RingBuffer;
use scenario::{project_scenario, ScenarioKind};
use profit::TradeScenario;
use simulator::ProfitSimulator;
use std::sync::Arc;
use std::thread;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use types::{NewTrade, Trade, TradeType};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Portfolio Valuation Engine...");
    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        "Refresh every {:?}, service latency {:?}, {} days of history, jitter {}",
        config.refresh_interval, config.service_latency, config.history_days, config.quote_jitter
    );

    let service = Arc::new(
        MockStockService::with_mock_data(config.service_latency, config.quote_jitter)
            .context("failed to seed market data service")?,
    );

    let db_logger = connect_db(&config).await;

    startup_report(&service, &config, db_logger.as_deref()).await?;

    // Feed -> Valuation ring buffer
    let (producer, consumer) = RingBuffer::<feed::PositionSnapshot>::new(config.ring_capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let feed_handle = tokio::spawn(feed::run_feed(
        producer,
        Arc::clone(&service),
        config.refresh_interval,
        shutdown_rx,
    ));

    let valuation_logger = db_logger.clone();
    let pin_core = config.valuation_core;
    let valuation_handle = thread::spawn(move || engine::run_valuation(consumer, valuation_logger, pin_core));

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(true);

    let pushed = feed_handle.await.context("feed task panicked")?;
    let last = tokio::task::spawn_blocking(move || valuation_handle.join())
        .await
        .context("valuation join task failed")?
        .map_err(|_| anyhow::anyhow!("valuation thread panicked"))?;

    if let Some(report) = last {
        info!(
            "Final valuation after {} refreshes: ${:.2} ({})",
            pushed, report.summary.total_market_value, report.summary.day_change_percent
        );
    }
    Ok(())
}

/// Connect the optional snapshot sink. Any failure means running without it.
async fn connect_db(config: &Config) -> Option<Arc<DbLogger>> {
    let url = match &config.database_url {
        Some(url) => url,
        None => {
            info!("No DATABASE_URL set, running without database logging");
            return None;
        }
    };

    let pool = match database::init_pool(url).await {
        Ok(pool) => pool,
        Err(e) => {
            warn!("Failed to connect to database: {:?}", e);
            warn!("Continuing without database logging...");
            return None;
        }
    };
    if let Err(e) = database::ensure_schema(&pool).await {
        warn!("Failed to prepare database schema: {:?}", e);
        return None;
    }
    Some(Arc::new(DbLogger::new(pool)))
}

/// One-off simulation report: trade blotter, per-symbol scenario projections,
/// a profit simulation for the first holding and a paper buy of it.
/// Returns the trade recorded during this run, which is the only one sent to
/// the database.
async fn startup_report(
    service: &MockStockService,
    config: &Config,
    db_logger: Option<&DbLogger>,
) -> Result<Option<Trade>> {
    let trades = service.get_all_trades().await?;
    let volume = service.get_trade_volume().await?;
    info!("[REPORT] {} trades on record, total volume ${:.2}", trades.len(), volume);

    let stocks = service.get_all_stocks().await?;
    for stock in &stocks {
        let series = service.get_historical_prices(&stock.symbol, config.history_days).await?;
        let Some(last) = series.last() else {
            continue;
        };
        let cutoff = last
            .date
            .checked_sub_days(Days::new(config.scenario_cutoff_days as u64))
            .unwrap_or(last.date);

        let projections: Vec<String> = ScenarioKind::ALL
            .iter()
            .map(|&kind| {
                let projected = project_scenario(&series, kind, cutoff);
                match projected.last().and_then(|p| p.projected) {
                    Some(price) => format!("{}=${:.2}", kind, price),
                    None => format!("{}=n/a", kind),
                }
            })
            .collect();

        info!(
            "[REPORT] {} {} days, last=${:.2} | {}",
            stock.symbol,
            series.len(),
            last.price,
            projections.join(" ")
        );
    }

    let Some(first) = stocks.first() else {
        return Ok(None);
    };

    if let Some(details) = service.get_stock_by_symbol(&first.symbol).await? {
        let [s1, s2, s3] = details.support_levels.0;
        let [t1, t2, t3] = details.target_levels.0;
        info!(
            "[REPORT] {} support {:.2}/{:.2}/{:.2} target {:.2}/{:.2}/{:.2} (monthly {})",
            first.symbol, s1, s2, s3, t1, t2, t3, details.fluctuations.monthly
        );
    }

    let mut sim = ProfitSimulator::new();
    sim.select(first)?;
    let buy_field = format!("{:.2}", first.current_price);
    sim.apply_buy_input(&buy_field)?;
    let levels = sim.levels()?;
    sim.apply_sell_input(&format!("{:.2}", levels.target_price))?;

    let quantity = sim.scenario().quantity;
    let result = sim.result();
    info!(
        "[REPORT] Simulating {} x{}: invest=${:.2} return=${:.2} profit=${:+.2} ({:+.2}%)",
        sim.symbol().unwrap_or(&first.symbol),
        quantity,
        result.investment,
        result.return_value,
        result.profit,
        result.profit_percent
    );

    let outlooks: Vec<String> = ScenarioKind::ALL
        .iter()
        .map(|&kind| format!("{}={:+.2}", kind, sim.expected_return(kind)))
        .collect();
    info!("[REPORT] Expected return {}", outlooks.join(" "));

    let ladder: Vec<String> = sim
        .downside()?
        .iter()
        .map(|d| format!("-{:.0}%:-${:.2}", d.drop_percent, d.loss))
        .collect();
    info!("[REPORT] Downside {}", ladder.join(" "));

    let at_stop = profit::calculate_profit(sim.scenario().buy_price, levels.stop_loss, quantity)?;
    info!(
        "[REPORT] Levels entry=${:.2} target=${:.2} stop=${:.2} size={} | stop-out {} ${:.2}",
        levels.entry_price,
        levels.target_price,
        levels.stop_loss,
        levels.suggested_quantity,
        if at_stop.is_loss() { "loses" } else { "keeps" },
        at_stop.profit.abs()
    );

    let (low, high) = sim.sell_price_range();
    let best = TradeScenario::parse(&buy_field, &format!("{:.2}", high), &quantity.to_string())?.evaluate();
    info!(
        "[REPORT] Sell range ${:.2}..${:.2}, top of range {} ${:.2}",
        low,
        high,
        if best.is_gain() { "gains" } else { "does not gain" },
        best.profit
    );

    let table = sim.sensitivity()?;
    let row: Vec<String> = table.iter().map(|p| format!("{}:{:+.0}", p.label(), p.profit)).collect();
    info!("[REPORT] Sensitivity {}", row.join(" "));

    // Paper buy of the simulated position: acknowledge, then record
    let ack = service.execute_buy_order(&first.symbol, quantity).await?;
    info!("[REPORT] Order {}: {}", ack.status, ack.message);
    let recorded = service
        .add_trade(NewTrade {
            date: Local::now().date_naive(),
            instrument: first.symbol.clone(),
            trade_type: TradeType::Buy,
            quantity,
            price: sim.scenario().buy_price,
        })
        .await?;
    info!(
        "[REPORT] Recorded trade #{} {} {} x{} @ ${:.2} = ${:.2}",
        recorded.id,
        recorded.trade_type.as_str(),
        recorded.instrument,
        recorded.quantity,
        recorded.price,
        recorded.total
    );
    if let Some(logger) = db_logger {
        logger.log_trade(recorded.clone());
    }

    let ack = service.execute_sell_order(&first.symbol, levels.suggested_quantity).await?;
    info!("[REPORT] Order {}: {}", ack.status, ack.message);

    Ok(Some(recorded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_startup_report_records_only_its_own_trade() {
        let service = MockStockService::with_mock_data(Duration::ZERO, false).unwrap();
        let config = Config {
            history_days: 10,
            ..Config::default()
        };

        let recorded = startup_report(&service, &config, None).await.unwrap().unwrap();
        assert_eq!(recorded.id, "6");
        assert_eq!(recorded.instrument, "AAPL");
        assert_eq!(recorded.trade_type, TradeType::Buy);
        assert_eq!(recorded.quantity, 10);
        assert!((recorded.total - 1512.3).abs() < 1e-6);

        let trades = service.get_all_trades().await.unwrap();
        assert_eq!(trades.len(), 6);
        assert_eq!(trades[..5], market_data::mock_trades()[..]);
    }
}
