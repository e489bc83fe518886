//! CLI definition and dispatch.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::build_services;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::backtest::{BacktestParams, SignalRule, SignalTiming};
use crate::domain::config_validation::Settings;
use crate::domain::error::DeskError;
use crate::domain::journal::{validate_trade, NewTrade, Side, Trade};
use crate::domain::metrics::PerformanceStats;
use crate::domain::news::NewsItem;
use crate::domain::screener::{cached_screen, ScreenerRow};
use crate::jobs::{execute_backtest, JobPayload};

#[derive(Parser, Debug)]
#[command(name = "chartdesk", about = "Trading research desk: backtests, price overlays and a trade journal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the JSON API server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run a backtest in the foreground and print its statistics
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        short: Option<usize>,
        #[arg(long)]
        long: Option<usize>,
        #[arg(long)]
        fee_bps: Option<f64>,
        #[arg(long)]
        days: Option<usize>,
        /// Apply each bar's position to the following bar's return
        #[arg(long)]
        next_bar: bool,
        /// Long while close > VWAP instead of the SMA crossover
        #[arg(long)]
        vwap: bool,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print last-bar Close, RSI, EMA(20) and ATR for the watchlist
    Screener {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        days: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Print the latest market headlines
    News {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Create the SQLite schema
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a trade against the risk limit and add it to the journal
    TradeAdd {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long, default_value = "long")]
        side: Side,
        #[arg(long)]
        entry: f64,
        #[arg(long)]
        stop: f64,
        #[arg(long)]
        exit: Option<f64>,
        #[arg(long, default_value_t = 1.0)]
        qty: f64,
        #[arg(long)]
        risk: Option<f64>,
        #[arg(long)]
        reward: Option<f64>,
        /// Overrides [risk] max_risk_dollars
        #[arg(long)]
        max_risk: Option<f64>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        thesis: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Comma separated
        #[arg(long, default_value = "")]
        tags: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::Backtest {
            config,
            symbol,
            short,
            long,
            fee_bps,
            days,
            next_bar,
            vwap,
            json,
        } => load_settings(&config).and_then(|settings| {
            let params = BacktestParams {
                short_window: short.unwrap_or(settings.backtest.short_window),
                long_window: long.unwrap_or(settings.backtest.long_window),
                fee_bps: fee_bps.unwrap_or(settings.backtest.fee_bps),
                rule: if vwap {
                    SignalRule::VwapCross
                } else {
                    SignalRule::SmaCross
                },
                timing: if next_bar {
                    SignalTiming::NextBar
                } else {
                    SignalTiming::SameBar
                },
            };
            run_backtest(&settings, &symbol, days, params, json)
        }),
        Command::Screener { config, days, json } => {
            load_settings(&config).and_then(|settings| run_screener(&settings, days, json))
        }
        Command::News {
            config,
            limit,
            json,
        } => load_settings(&config).and_then(|settings| run_news(&settings, limit, json)),
        Command::InitDb { config } => run_init_db(&config),
        Command::TradeAdd {
            config,
            ticker,
            side,
            entry,
            stop,
            exit,
            qty,
            risk,
            reward,
            max_risk,
            date,
            thesis,
            notes,
            tags,
        } => load_settings(&config).and_then(|settings| {
            let new = NewTrade {
                id: None,
                date,
                ticker,
                side: Some(side),
                entry: Some(entry),
                stop: Some(stop),
                exit,
                qty: Some(qty),
                risk,
                reward,
                thesis,
                notes,
                tags: tags.split(',').map(str::to_string).collect(),
            };
            run_trade_add(&settings, new, max_risk.unwrap_or(settings.max_risk_dollars))
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

pub fn load_settings(path: &PathBuf) -> Result<Settings, DeskError> {
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    Settings::from_config(&adapter)
}

fn run_init_db(config_path: &PathBuf) -> Result<(), DeskError> {
    let settings = load_settings(config_path)?;
    let db = SqliteAdapter::open(&settings.db_path, settings.db_pool_size)?;
    db.initialize_schema()?;
    println!("Initialised database at {}", settings.db_path);
    Ok(())
}

pub fn format_stats(label: &str, stats: &PerformanceStats) -> String {
    format!(
        "{label:<10} CAGR {:>8.2}%  Vol {:>7.2}%  MaxDD {:>8.2}%  Sharpe {:>6.2}",
        stats.cagr * 100.0,
        stats.volatility * 100.0,
        stats.max_drawdown * 100.0,
        stats.sharpe
    )
}

pub fn summarize(payload: &JobPayload) -> String {
    if payload.is_empty() {
        return format!("{}: no price data", payload.symbol);
    }
    let result = &payload.result;
    let first = payload.bars.first().map(|b| b.date.to_string()).unwrap_or_default();
    let last = payload.bars.last().map(|b| b.date.to_string()).unwrap_or_default();
    [
        format!(
            "{} {} bars {first} .. {last}  SMA({}/{}) fee {} bps",
            payload.symbol,
            payload.bars.len(),
            payload.params.short_window,
            payload.params.long_window,
            payload.params.fee_bps
        ),
        format_stats("Buy&Hold", &result.stats_buy_hold),
        format_stats("Strategy", &result.stats_strategy),
        format!(
            "Final equity: buy&hold {:.4}, strategy {:.4}, toggles {}",
            result.final_buy_hold(),
            result.final_strategy(),
            result.toggles
        ),
    ]
    .join("\n")
}

fn run_backtest(
    settings: &Settings,
    symbol: &str,
    days: Option<usize>,
    params: BacktestParams,
    json: bool,
) -> Result<(), DeskError> {
    params.validate()?;
    let services = build_services(settings)?;
    let payload = execute_backtest(
        services.prices.as_ref(),
        &crate::domain::price_bar::normalize_symbol(symbol),
        days.unwrap_or(settings.days).clamp(1, settings.max_days),
        &params,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{}", summarize(&payload));
    }
    Ok(())
}

pub fn format_screener(rows: &[ScreenerRow]) -> String {
    let mut lines = vec![format!(
        "{:<8} {:>10} {:>7} {:>10} {:>8}",
        "Symbol", "Close", "RSI14", "EMA20", "ATR14"
    )];
    lines.extend(rows.iter().map(|r| {
        format!(
            "{:<8} {:>10.2} {:>7.2} {:>10.2} {:>8.2}",
            r.symbol, r.close, r.rsi, r.ema20, r.atr
        )
    }));
    lines.join("\n")
}

fn run_screener(settings: &Settings, days: Option<usize>, json: bool) -> Result<(), DeskError> {
    let services = build_services(settings)?;
    let days = days.unwrap_or(settings.days).clamp(1, settings.max_days);
    let rows = cached_screen(
        services.cache.as_ref(),
        services.prices.as_ref(),
        &settings.watchlist,
        days,
        settings.lookup_ttl,
    )?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", format_screener(&rows));
    }
    Ok(())
}

fn run_news(settings: &Settings, limit: Option<usize>, json: bool) -> Result<(), DeskError> {
    let services = build_services(settings)?;
    let limit = limit.unwrap_or(settings.news_limit).clamp(1, settings.news_limit);
    let items: Vec<NewsItem> = services.news.fetch(limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        println!("No headlines.");
    } else {
        for item in &items {
            println!("[{}] {}\n    {}", item.source, item.title, item.link);
        }
    }
    Ok(())
}

fn run_trade_add(settings: &Settings, new: NewTrade, max_risk: f64) -> Result<(), DeskError> {
    let exposure = validate_trade(
        new.entry.unwrap_or(f64::NAN),
        new.stop.unwrap_or(f64::NAN),
        new.qty.unwrap_or(f64::NAN),
        max_risk,
    )?;
    let trade = Trade::from_new(new, Utc::now().date_naive())?;
    let services = build_services(settings)?;
    services.journal.insert(&trade)?;
    info!("journal: logged {} {} ({})", trade.side, trade.ticker, trade.id);
    println!(
        "Logged {} {} x{} (risk ${exposure:.2}) as {}",
        trade.side, trade.ticker, trade.qty, trade.id
    );
    Ok(())
}

fn run_serve(config_path: &PathBuf) -> Result<(), DeskError> {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{build_router, AppState};
        use crate::jobs::JobRunner;
        use std::net::SocketAddr;
        use std::sync::Arc;
        use std::time::Duration;

        let settings = load_settings(config_path)?;
        let services = build_services(&settings)?;
        let runner = Arc::new(JobRunner::new(
            Arc::clone(&services.cache),
            Arc::clone(&services.prices),
            settings.max_concurrent,
            settings.job_ttl,
            settings.days,
        ));

        let addr: SocketAddr = settings.listen.parse().map_err(|e| DeskError::ConfigInvalid {
            section: "web".into(),
            key: "listen".into(),
            reason: format!("{e}"),
        })?;

        let cache = Arc::clone(&services.cache);
        let router = build_router(AppState::new(settings, services, Arc::clone(&runner)));

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(async move {
            let purge = tokio::spawn(async move {
                let mut tick = tokio::time::interval(Duration::from_secs(600));
                loop {
                    tick.tick().await;
                    let cache = Arc::clone(&cache);
                    match tokio::task::spawn_blocking(move || cache.purge_expired()).await {
                        Ok(Ok(n)) if n > 0 => info!("purged {n} expired cache entries"),
                        Ok(Err(e)) => log::warn!("cache purge failed: {e}"),
                        _ => {}
                    }
                }
            });

            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("listening on {addr}");
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutdown requested");
            })
            .await?;

            runner.shutdown();
            purge.abort();
            Ok::<(), DeskError>(())
        })
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        Err(DeskError::ConfigInvalid {
            section: "web".into(),
            key: "listen".into(),
            reason: "built without the web feature".into(),
        })
    }
}
