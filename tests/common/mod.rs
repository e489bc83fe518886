#![allow(dead_code)]

use chartdesk::domain::error::DeskError;
pub use chartdesk::domain::news::NewsItem;
pub use chartdesk::domain::price_bar::PriceBar;
use chartdesk::ports::news_port::NewsPort;
use chartdesk::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

pub struct MockPricePort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
    pub gate: Option<Arc<Gate>>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            gate: None,
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    /// Every fetch reports in and then blocks until the gate is opened.
    pub fn with_gate(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl PricePort for MockPricePort {
    fn fetch(&self, symbol: &str, _days: usize) -> Result<Vec<PriceBar>, DeskError> {
        if let Some(gate) = &self.gate {
            gate.arrive_and_wait();
        }
        if let Some(reason) = self.errors.get(symbol) {
            return Err(DeskError::data_unavailable(symbol, reason.clone()));
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Fixed headlines, or a failure when `error` is set.
#[derive(Default)]
pub struct MockNewsPort {
    pub items: Vec<NewsItem>,
    pub error: Option<String>,
}

impl MockNewsPort {
    pub fn with_headlines(count: usize) -> Self {
        Self {
            items: (0..count)
                .map(|i| NewsItem {
                    source: "Wire".to_string(),
                    title: format!("Headline {i}"),
                    link: format!("https://news.example.com/{i}"),
                })
                .collect(),
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            items: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl NewsPort for MockNewsPort {
    fn fetch(&self, limit: usize) -> Result<Vec<NewsItem>, DeskError> {
        if let Some(reason) = &self.error {
            return Err(DeskError::data_unavailable("news", reason.clone()));
        }
        Ok(self.items.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Holds fetches until released, and lets tests wait for a fetch to start.
#[derive(Default)]
pub struct Gate {
    state: Mutex<(usize, bool)>,
    cond: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn arrive_and_wait(&self) {
        let mut state = self.state.lock().unwrap();
        state.0 += 1;
        self.cond.notify_all();
        while !state.1 {
            state = self.cond.wait(state).unwrap();
        }
    }

    pub fn wait_for_arrivals(&self, n: usize) {
        let mut state = self.state.lock().unwrap();
        while state.0 < n {
            state = self.cond.wait(state).unwrap();
        }
    }

    pub fn open(&self) {
        self.state.lock().unwrap().1 = true;
        self.cond.notify_all();
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn bars_from_closes(symbol: &str, start_date: &str, closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            symbol: symbol.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: Some(1000.0),
        })
        .collect()
}

/// `count` bars rising in a straight line from `from` to `to`.
pub fn linear_bars(symbol: &str, count: usize, from: f64, to: f64) -> Vec<PriceBar> {
    let step = if count > 1 {
        (to - from) / (count - 1) as f64
    } else {
        0.0
    };
    let closes: Vec<f64> = (0..count).map(|i| from + step * i as f64).collect();
    bars_from_closes(symbol, "2023-01-02", &closes)
}

/// Closes that alternate up and down so a short SMA keeps crossing the long one.
pub fn zigzag_bars(symbol: &str, count: usize) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| 100.0 + (i as f64 * 0.7).sin() * 10.0)
        .collect();
    bars_from_closes(symbol, "2023-01-02", &closes)
}
