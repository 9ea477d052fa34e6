//! Database module for recording valuation snapshots to PostgreSQL.
//!
//! Optional sink: the engine runs without it when no `DATABASE_URL` is set or
//! the connection fails. Writes from the valuation thread go through
//! `DbLogger`, which forwards them to async writer tasks.

use crate::types::Trade;
use crate::valuation::{ExposureSplit, PortfolioSummary};
use bigdecimal::BigDecimal;
use sqlx::{postgres::PgPoolOptions, Error, PgPool};
use std::str::FromStr;
use tracing::{error, info};

/// Initialize the database connection pool.
pub async fn init_pool(database_url: &str) -> Result<PgPool, Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    info!("[DB] Connection pool initialized");
    Ok(pool)
}

/// Create the tables this module writes to, if missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS portfolio_snapshots (
            id BIGSERIAL PRIMARY KEY,
            total_value NUMERIC NOT NULL,
            day_change NUMERIC NOT NULL,
            day_change_percent NUMERIC,
            long_value NUMERIC NOT NULL,
            short_value NUMERIC NOT NULL,
            open_positions INTEGER NOT NULL,
            details JSONB,
            recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trade_logs (
            id BIGSERIAL PRIMARY KEY,
            ticker TEXT NOT NULL,
            side TEXT NOT NULL,
            price NUMERIC NOT NULL,
            size NUMERIC NOT NULL,
            value NUMERIC NOT NULL,
            executed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Fixed-point conversion for NUMERIC binds
pub fn to_decimal(value: f64, places: usize) -> BigDecimal {
    BigDecimal::from_str(&format!("{:.*}", places, value)).unwrap_or_default()
}

/// Insert a portfolio valuation snapshot.
pub async fn insert_portfolio_snapshot(pool: &PgPool, msg: &SnapshotLogMsg) -> Result<(), Error> {
    let pct_bd = msg.summary.day_change_percent.value().map(|p| to_decimal(p, 6));

    sqlx::query(
        r#"
        INSERT INTO portfolio_snapshots
            (total_value, day_change, day_change_percent, long_value, short_value, open_positions, details)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(to_decimal(msg.summary.total_market_value, 8))
    .bind(to_decimal(msg.summary.day_change, 8))
    .bind(pct_bd)
    .bind(to_decimal(msg.exposure.long_value, 8))
    .bind(to_decimal(msg.exposure.short_value, 8))
    .bind((msg.summary.long_count + msg.summary.short_count) as i32)
    .bind(&msg.details)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a trade log entry.
pub async fn insert_trade_log(pool: &PgPool, trade: &Trade) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO trade_logs (ticker, side, price, size, value)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&trade.instrument)
    .bind(trade.trade_type.as_str())
    .bind(to_decimal(trade.price, 8))
    .bind(to_decimal(trade.quantity.unsigned_abs() as f64, 8))
    .bind(to_decimal(trade.total, 8))
    .execute(pool)
    .await?;

    Ok(())
}

pub struct SnapshotLogMsg {
    pub summary: PortfolioSummary,
    pub exposure: ExposureSplit,
    pub details: Option<serde_json::Value>,
}

/// Database log sender that can be used from sync code.
///
/// Holds channel senders that forward log requests to async tasks writing
/// to the database.
#[derive(Clone)]
pub struct DbLogger {
    snapshot_tx: tokio::sync::mpsc::UnboundedSender<SnapshotLogMsg>,
    trade_tx: tokio::sync::mpsc::UnboundedSender<Trade>,
}

impl DbLogger {
    /// Create a new DbLogger and spawn background writer tasks.
    pub fn new(pool: PgPool) -> Self {
        let (snapshot_tx, mut snapshot_rx) = tokio::sync::mpsc::unbounded_channel::<SnapshotLogMsg>();
        let (trade_tx, mut trade_rx) = tokio::sync::mpsc::unbounded_channel::<Trade>();

        let pool_clone = pool.clone();
        tokio::spawn(async move {
            while let Some(msg) = snapshot_rx.recv().await {
                if let Err(e) = insert_portfolio_snapshot(&pool_clone, &msg).await {
                    error!("[DB] Snapshot log error: {:?}", e);
                }
            }
        });

        tokio::spawn(async move {
            while let Some(trade) = trade_rx.recv().await {
                if let Err(e) = insert_trade_log(&pool, &trade).await {
                    error!("[DB] Trade log error: {:?}", e);
                }
            }
        });

        Self { snapshot_tx, trade_tx }
    }

    /// Log a valuation snapshot (non-blocking, fire-and-forget).
    pub fn log_snapshot(&self, msg: SnapshotLogMsg) {
        let _ = self.snapshot_tx.send(msg);
    }

    /// Log a recorded trade (non-blocking, fire-and-forget).
    pub fn log_trade(&self, trade: Trade) {
        let _ = self.trade_tx.send(trade);
    }
}
