use crate::database::{DbLogger, SnapshotLogMsg};
use crate::feed::PositionSnapshot;
use crate::valuation::{allocations, exposure, value_portfolio, ExposureSplit, PortfolioSummary};
use rtrb::Consumer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Sleep between polls when the ring buffer is empty
const IDLE_BACKOFF: Duration = Duration::from_millis(5);

/// Valuation of one snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotReport {
    pub seq: u64,
    pub summary: PortfolioSummary,
    pub exposure: ExposureSplit,
}

pub fn value_snapshot(snapshot: &PositionSnapshot) -> SnapshotReport {
    SnapshotReport {
        seq: snapshot.seq,
        summary: value_portfolio(&snapshot.positions),
        exposure: exposure(&snapshot.positions),
    }
}

/// Value every snapshot coming off the ring buffer until the feed side is
/// dropped and the buffer drained. Returns the last report, if any.
pub fn run_valuation(
    mut consumer: Consumer<PositionSnapshot>,
    db_logger: Option<Arc<DbLogger>>,
    pin_core: Option<usize>,
) -> Option<SnapshotReport> {
    info!(
        "[VALUATION] Starting valuation engine (db logging: {})",
        if db_logger.is_some() { "on" } else { "off" }
    );

    if let Some(core) = pin_core {
        match core_affinity::get_core_ids() {
            Some(core_ids) if core < core_ids.len() => {
                core_affinity::set_for_current(core_ids[core]);
                info!("[VALUATION] Pinned to core {}", core);
            }
            _ => info!("[VALUATION] Core {} not available, running unpinned", core),
        }
    }

    let mut last_report = None;
    let mut processed: u64 = 0;

    loop {
        let snapshot = match consumer.pop() {
            Ok(snapshot) => snapshot,
            Err(_) => {
                if consumer.is_abandoned() && consumer.is_empty() {
                    break;
                }
                std::thread::sleep(IDLE_BACKOFF);
                continue;
            }
        };

        let started = Instant::now();
        let report = value_snapshot(&snapshot);
        processed += 1;

        let summary = &report.summary;
        info!(
            "[VALUATION] #{} value=${:.2} day={:+.2} ({}) | {} long · {} short | long=${:.2} short=${:.2}",
            report.seq,
            summary.total_market_value,
            summary.day_change,
            summary.day_change_percent,
            summary.long_count,
            summary.short_count,
            report.exposure.long_value,
            report.exposure.short_value,
        );
        debug!("[VALUATION] #{} valued in {:?}", report.seq, started.elapsed());

        if let Some(logger) = &db_logger {
            let details = serde_json::json!({
                "seq": snapshot.seq,
                "fetched_at": snapshot.fetched_at,
                "allocations": allocations(&snapshot.positions),
            });
            logger.log_snapshot(SnapshotLogMsg {
                summary: report.summary,
                exposure: report.exposure,
                details: Some(details),
            });
        }

        last_report = Some(report);
    }

    info!("[VALUATION] Stopped after {} snapshots", processed);
    last_report
}
