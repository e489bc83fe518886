//! Trade journal rows, risk validation and journal statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::DeskError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

impl FromStr for Side {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" => Ok(Side::Long),
            "short" => Ok(Side::Short),
            other => Err(DeskError::validation(format!(
                "side must be long or short, got '{other}'"
            ))),
        }
    }
}

/// A trade as entered by the user, before defaults and derived fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTrade {
    pub id: Option<String>,
    pub date: Option<NaiveDate>,
    pub ticker: String,
    pub side: Option<Side>,
    pub entry: Option<f64>,
    pub stop: Option<f64>,
    pub exit: Option<f64>,
    pub qty: Option<f64>,
    /// Dollar risk override; derived from entry/stop/qty when absent or ≤ 0.
    pub risk: Option<f64>,
    /// Dollar reward override; derived from entry/exit/qty when absent or ≤ 0.
    pub reward: Option<f64>,
    pub thesis: String,
    pub notes: String,
    pub tags: Vec<String>,
}

/// A stored journal row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub date: NaiveDate,
    pub ticker: String,
    pub side: Side,
    pub entry: Option<f64>,
    pub stop: Option<f64>,
    pub exit: Option<f64>,
    pub qty: f64,
    pub risk: f64,
    pub reward: f64,
    /// reward / risk; `None` when risk is not positive.
    pub rr: Option<f64>,
    pub thesis: String,
    pub notes: String,
    pub tags: String,
}

impl Trade {
    /// Fill defaults and derive risk, reward and reward:risk.
    ///
    /// Fails on a blank ticker or on any non-finite numeric field.
    pub fn from_new(new: NewTrade, today: NaiveDate) -> Result<Self, DeskError> {
        let ticker = new.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(DeskError::validation("ticker is required"));
        }

        for (name, value) in [
            ("entry", new.entry),
            ("stop", new.stop),
            ("exit", new.exit),
            ("qty", new.qty),
            ("risk", new.risk),
            ("reward", new.reward),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(DeskError::validation(format!("{name} must be numeric")));
                }
            }
        }

        for (name, value) in [("risk", new.risk), ("reward", new.reward)] {
            if value.is_some_and(|v| v < 0.0) {
                return Err(DeskError::validation(format!("{name} must not be negative")));
            }
        }

        let qty = new.qty.unwrap_or(0.0);
        let mut risk = new.risk.unwrap_or(0.0);
        let mut reward = new.reward.unwrap_or(0.0);

        if risk <= 0.0 && qty != 0.0 {
            if let (Some(entry), Some(stop)) = (new.entry, new.stop) {
                risk = (entry - stop).abs() * qty.abs();
            }
        }
        if reward <= 0.0 && qty != 0.0 {
            if let (Some(entry), Some(exit)) = (new.entry, new.exit) {
                reward = (exit - entry).abs() * qty.abs();
            }
        }

        let rr = if risk <= 0.0 {
            None
        } else if reward != 0.0 {
            Some(reward / risk)
        } else {
            Some(0.0)
        };

        let tags = new
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",");

        Ok(Trade {
            id: new
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            date: new.date.unwrap_or(today),
            ticker,
            side: new.side.unwrap_or_default(),
            entry: new.entry,
            stop: new.stop,
            exit: new.exit.filter(|&x| x > 0.0),
            qty,
            risk,
            reward,
            rr,
            thesis: new.thesis,
            notes: new.notes,
            tags,
        })
    }

    /// `Some(true)` for a winning closed trade, `None` while still open.
    pub fn is_win(&self) -> Option<bool> {
        let (entry, exit) = (self.entry?, self.exit?);
        Some(match self.side {
            Side::Long => exit > entry,
            Side::Short => exit < entry,
        })
    }
}

/// Check a planned trade against the dollar risk limit.
///
/// Returns the dollar exposure `|entry - stop| * qty` on success.
pub fn validate_trade(entry: f64, stop: f64, qty: f64, max_risk_dollars: f64) -> Result<f64, DeskError> {
    if !(entry.is_finite() && stop.is_finite() && qty.is_finite() && max_risk_dollars.is_finite()) {
        return Err(DeskError::validation(
            "Entry, stop, quantity, and risk limit must be numeric.",
        ));
    }

    let per_share = (entry - stop).abs();
    if per_share <= 0.0 {
        return Err(DeskError::validation(
            "Entry and stop must differ to compute risk.",
        ));
    }

    let exposure = per_share * qty.max(0.0);
    if exposure <= 0.0 {
        return Err(DeskError::validation("Quantity must be positive."));
    }

    if exposure > max_risk_dollars {
        return Err(DeskError::validation(format!(
            "Risk ${exposure:.2} exceeds limit ${max_risk_dollars:.2}."
        )));
    }

    Ok(exposure)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalStats {
    pub total: usize,
    pub closed: usize,
    pub wins: usize,
    pub win_rate: f64,
    /// Mean reward:risk over trades that have one.
    pub avg_rr: f64,
}

impl JournalStats {
    pub fn compute(trades: &[Trade]) -> Self {
        let mut closed = 0usize;
        let mut wins = 0usize;
        for outcome in trades.iter().filter_map(Trade::is_win) {
            closed += 1;
            if outcome {
                wins += 1;
            }
        }

        let rrs: Vec<f64> = trades.iter().filter_map(|t| t.rr).collect();
        let avg_rr = if rrs.is_empty() {
            0.0
        } else {
            rrs.iter().sum::<f64>() / rrs.len() as f64
        };

        JournalStats {
            total: trades.len(),
            closed,
            wins,
            win_rate: if closed > 0 {
                wins as f64 / closed as f64
            } else {
                0.0
            },
            avg_rr,
        }
    }
}
