//! Scenario projection
//!
//! Applies a flat outlook multiplier to every point after a cutoff date.
//! Not a statistical model: no volatility, compounding or time decay, and the
//! multiplier does not depend on how long the position is held.

use crate::error::{EngineError, Result};
use crate::types::PricePoint;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Bullish,
    Neutral,
    Bearish,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [ScenarioKind::Bullish, ScenarioKind::Neutral, ScenarioKind::Bearish];

    pub fn multiplier(&self) -> f64 {
        match self {
            ScenarioKind::Bullish => 1.20,
            ScenarioKind::Neutral => 1.05,
            ScenarioKind::Bearish => 0.85,
        }
    }

    /// Gain (or loss, when negative) on `quantity` shares bought at
    /// `buy_price` if the outlook plays out
    pub fn expected_return(&self, buy_price: f64, quantity: u32) -> f64 {
        buy_price * (self.multiplier() - 1.0) * quantity as f64
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Bullish => "bullish",
            ScenarioKind::Neutral => "neutral",
            ScenarioKind::Bearish => "bearish",
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => Ok(ScenarioKind::Bullish),
            "neutral" => Ok(ScenarioKind::Neutral),
            "bearish" => Ok(ScenarioKind::Bearish),
            other => Err(EngineError::invalid("scenario", format!("unknown scenario '{}'", other))),
        }
    }
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Historical point paired with its projection, if any
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub projected: Option<f64>,
}

/// Project `series` under `scenario`. Points strictly after `cutoff` get
/// `price * multiplier`; points on or before it have no projection.
/// Output is parallel to the input.
pub fn project_scenario(series: &[PricePoint], scenario: ScenarioKind, cutoff: NaiveDate) -> Vec<ProjectedPoint> {
    let multiplier = scenario.multiplier();
    series
        .iter()
        .map(|point| ProjectedPoint {
            date: point.date,
            price: point.price,
            projected: (point.date > cutoff).then(|| point.price * multiplier),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monthly_series() -> Vec<PricePoint> {
        [150.00, 155.50, 148.75, 160.25, 165.30, 172.45]
            .iter()
            .enumerate()
            .map(|(i, &price)| {
                let date = NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap();
                PricePoint::new(date, price)
            })
            .collect()
    }

    #[test]
    fn test_bullish_projection_after_cutoff() {
        let series = monthly_series();
        let cutoff = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let projected = project_scenario(&series, ScenarioKind::Bullish, cutoff);

        assert_eq!(projected.len(), series.len());
        for (point, proj) in series.iter().zip(&projected) {
            assert_eq!(point.date, proj.date);
            assert_eq!(point.price, proj.price);
            if point.date > cutoff {
                let expected = point.price * 1.20;
                assert!((proj.projected.unwrap() - expected).abs() < 1e-9);
            } else {
                assert!(proj.projected.is_none());
            }
        }
        // cutoff itself is not projected
        assert!(projected[2].projected.is_none());
        assert!(projected[3].projected.is_some());
    }

    #[test]
    fn test_multipliers() {
        assert_eq!(ScenarioKind::Bullish.multiplier(), 1.20);
        assert_eq!(ScenarioKind::Neutral.multiplier(), 1.05);
        assert_eq!(ScenarioKind::Bearish.multiplier(), 0.85);

        let series = monthly_series();
        let cutoff = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let bearish = project_scenario(&series, ScenarioKind::Bearish, cutoff);
        assert!((bearish[5].projected.unwrap() - 172.45 * 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_cutoff_past_series_projects_nothing() {
        let series = monthly_series();
        let cutoff = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let projected = project_scenario(&series, ScenarioKind::Neutral, cutoff);
        assert!(projected.iter().all(|p| p.projected.is_none()));
        assert!(project_scenario(&[], ScenarioKind::Neutral, cutoff).is_empty());
    }

    #[test]
    fn test_expected_return_per_outlook() {
        assert!((ScenarioKind::Bullish.expected_return(200.0, 10) - 400.0).abs() < 1e-9);
        assert!((ScenarioKind::Neutral.expected_return(200.0, 10) - 100.0).abs() < 1e-9);
        assert!((ScenarioKind::Bearish.expected_return(200.0, 10) + 300.0).abs() < 1e-9);
        assert_eq!(ScenarioKind::Bullish.expected_return(0.0, 10), 0.0);
    }

    #[test]
    fn test_parse_scenario() {
        assert_eq!("Bullish".parse::<ScenarioKind>().unwrap(), ScenarioKind::Bullish);
        assert_eq!(" neutral ".parse::<ScenarioKind>().unwrap(), ScenarioKind::Neutral);
        assert_eq!("BEARISH".parse::<ScenarioKind>().unwrap(), ScenarioKind::Bearish);
        assert!("sideways".parse::<ScenarioKind>().is_err());
        for kind in ScenarioKind::ALL {
            assert_eq!(kind.to_string().parse::<ScenarioKind>().unwrap(), kind);
        }
    }
}
