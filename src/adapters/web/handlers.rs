//! HTTP request handlers for the JSON API.

use axum::{
    extract::{ConnectInfo, Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::domain::backtest::{BacktestParams, SignalRule, SignalTiming};
use crate::domain::indicator::IndicatorKind;
use crate::domain::journal::{validate_trade, JournalStats, NewTrade, Trade};
use crate::domain::news::NewsItem;
use crate::domain::price_bar::{closes, normalize_symbol, volumes, PriceBar};
use crate::domain::screener::{cached_screen, ScreenerRow};
use crate::jobs::JobStatus;

use super::{AppState, WebError};

async fn blocking<T, F>(f: F) -> Result<T, WebError>
where
    F: FnOnce() -> Result<T, crate::domain::error::DeskError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// Rate-limit key: the first `X-Forwarded-For` hop when the proxy is
/// trusted, otherwise the peer address.
fn client_key(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(forwarded) = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return forwarded.to_string();
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "anonymous".to_string())
}

pub async fn health(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let key = client_key(&request, state.settings.trust_forwarded_for);
    if !state.health_limiter.allow(&key) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "ok": false, "error": "rate_limited" })),
        )
            .into_response();
    }
    Json(json!({ "ok": true })).into_response()
}

#[derive(Debug, Deserialize)]
pub struct BacktestRequest {
    pub symbol: String,
    pub short_window: Option<usize>,
    pub long_window: Option<usize>,
    pub fee_bps: Option<f64>,
    pub rule: Option<SignalRule>,
    pub timing: Option<SignalTiming>,
}

impl BacktestRequest {
    fn params(&self, defaults: &BacktestParams) -> BacktestParams {
        BacktestParams {
            short_window: self.short_window.unwrap_or(defaults.short_window),
            long_window: self.long_window.unwrap_or(defaults.long_window),
            fee_bps: self.fee_bps.unwrap_or(defaults.fee_bps),
            rule: self.rule.unwrap_or(defaults.rule),
            timing: self.timing.unwrap_or(defaults.timing),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: JobStatus,
}

pub async fn submit_backtest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BacktestRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), WebError> {
    let params = request.params(&state.settings.backtest);
    let runner = Arc::clone(&state.runner);
    let job_id = blocking(move || runner.submit(&request.symbol, params)).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id,
            status: JobStatus::Running,
        }),
    ))
}

pub async fn poll_backtest(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Response, WebError> {
    let runner = Arc::clone(&state.runner);
    let view = blocking(move || runner.poll(&job_id)).await?;
    let status = if view.status == JobStatus::NotFound {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    Ok((status, Json(view)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub days: Option<usize>,
    pub sma: Option<usize>,
    pub ema: Option<usize>,
    pub rsi: Option<usize>,
    #[serde(default)]
    pub vwap: bool,
}

#[derive(Debug, Serialize)]
pub struct Overlay {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub symbol: String,
    pub source: &'static str,
    pub bars: Vec<PriceBar>,
    pub overlays: Vec<Overlay>,
}

pub async fn prices(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceResponse>, WebError> {
    let symbol = normalize_symbol(&symbol);
    if symbol.is_empty() {
        return Err(WebError::bad_request("symbol is required"));
    }
    let days = query
        .days
        .unwrap_or(state.settings.days)
        .clamp(1, state.settings.max_days);

    let source = Arc::clone(&state.services.prices);
    let fetch_symbol = symbol.clone();
    let bars = blocking(move || source.fetch(&fetch_symbol, days)).await?;

    let kinds = query
        .sma
        .map(IndicatorKind::Sma)
        .into_iter()
        .chain(query.ema.map(IndicatorKind::Ema))
        .chain(query.rsi.map(IndicatorKind::Rsi))
        .chain(query.vwap.then_some(IndicatorKind::Vwap));
    let close = closes(&bars);
    let vol = volumes(&bars);
    let overlays = kinds
        .map(|kind| Overlay {
            name: kind.to_string(),
            values: kind.compute(&close, vol.as_deref()),
        })
        .collect();

    Ok(Json(PriceResponse {
        symbol,
        source: state.services.prices.name(),
        bars,
        overlays,
    }))
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub items: Vec<NewsItem>,
}

pub async fn news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<NewsResponse>, WebError> {
    let limit = query
        .limit
        .unwrap_or(state.settings.news_limit)
        .clamp(1, state.settings.news_limit);
    let source = Arc::clone(&state.services.news);
    let items = blocking(move || source.fetch(limit)).await?;
    Ok(Json(NewsResponse { items }))
}

#[derive(Debug, Deserialize)]
pub struct ScreenerQuery {
    pub days: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ScreenerResponse {
    pub rows: Vec<ScreenerRow>,
}

pub async fn screener(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScreenerQuery>,
) -> Result<Json<ScreenerResponse>, WebError> {
    let days = query
        .days
        .unwrap_or(state.settings.days)
        .clamp(1, state.settings.max_days);
    let cache = Arc::clone(&state.services.cache);
    let prices = Arc::clone(&state.services.prices);
    let symbols = state.settings.watchlist.clone();
    let ttl = state.settings.lookup_ttl;
    let rows =
        blocking(move || cached_screen(cache.as_ref(), prices.as_ref(), &symbols, days, ttl)).await?;
    Ok(Json(ScreenerResponse { rows }))
}

#[derive(Debug, Deserialize)]
pub struct JournalQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct JournalResponse {
    pub trades: Vec<Trade>,
    pub stats: JournalStats,
}

pub async fn list_journal(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JournalQuery>,
) -> Result<Json<JournalResponse>, WebError> {
    let journal = Arc::clone(&state.services.journal);
    let trades = blocking(move || journal.list(query.limit)).await?;
    let stats = JournalStats::compute(&trades);
    Ok(Json(JournalResponse { trades, stats }))
}

#[derive(Debug, Deserialize)]
pub struct AddTradeRequest {
    #[serde(flatten)]
    pub trade: NewTrade,
    /// Overrides `[risk] max_risk_dollars` for this trade.
    pub max_risk: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AddTradeResponse {
    pub trade: Trade,
    /// Dollar risk `|entry - stop| * qty` that passed the limit check.
    pub exposure: f64,
}

pub async fn add_trade(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddTradeRequest>,
) -> Result<(StatusCode, Json<AddTradeResponse>), WebError> {
    let new = request.trade;
    let limit = request.max_risk.unwrap_or(state.settings.max_risk_dollars);
    let exposure = validate_trade(
        new.entry.unwrap_or(f64::NAN),
        new.stop.unwrap_or(f64::NAN),
        new.qty.unwrap_or(f64::NAN),
        limit,
    )?;
    let trade = Trade::from_new(new, Utc::now().date_naive())?;

    let journal = Arc::clone(&state.services.journal);
    let stored = trade.clone();
    blocking(move || journal.insert(&stored)).await?;
    log::info!("journal: logged {} {} ({})", trade.side, trade.ticker, trade.id);

    Ok((
        StatusCode::CREATED,
        Json(AddTradeResponse { trade, exposure }),
    ))
}

pub async fn not_found() -> WebError {
    WebError::not_found("no such route")
}
