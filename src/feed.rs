use crate::market_data::MockStockService;
use crate::types::Position;
use chrono::{DateTime, Utc};
use rtrb::Producer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Positions as fetched in one refresh
#[derive(Debug, Clone)]
pub struct PositionSnapshot {
    pub seq: u64,
    pub fetched_at: DateTime<Utc>,
    pub positions: Vec<Position>,
}

/// Poll the market data service every `interval` and hand each snapshot to
/// the valuation thread. Returns the number of snapshots pushed once
/// `shutdown` flips to true (or its sender is dropped).
pub async fn run_feed(
    mut producer: Producer<PositionSnapshot>,
    service: Arc<MockStockService>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    info!("[FEED] Starting refresh feed (every {:?})", interval);

    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut seq: u64 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                let positions = match service.get_positions().await {
                    Ok(positions) => positions,
                    Err(e) => {
                        warn!("[FEED] Fetch failed: {}", e);
                        continue;
                    }
                };

                seq += 1;
                let snapshot = PositionSnapshot {
                    seq,
                    fetched_at: Utc::now(),
                    positions,
                };
                debug!("[FEED] Snapshot #{} with {} positions", seq, snapshot.positions.len());

                if let Err(e) = producer.push(snapshot) {
                    warn!("[FEED] Ring buffer full, dropping snapshot: {:?}", e);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!("[FEED] Stopped after {} snapshots", seq);
    seq
}
