//! Runs CLI commands end to end against a temporary config and database.

use chartdesk::adapters::sqlite_adapter::SqliteAdapter;
use chartdesk::cli::{load_settings, run, Cli};
use chartdesk::domain::config_validation::DataSourceKind;
use chartdesk::domain::journal::Side;
use chartdesk::ports::journal_port::JournalPort;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

struct Desk {
    dir: TempDir,
    config: PathBuf,
}

impl Desk {
    fn new(extra: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("db").join("desk.db");
        let config = dir.path().join("desk.ini");
        std::fs::write(
            &config,
            format!(
                "[database]\npath = {}\n\n[risk]\nmax_risk_dollars = 500\n\n{extra}",
                db.display()
            ),
        )
        .unwrap();
        Desk { dir, config }
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join("db").join("desk.db")
    }

    fn run(&self, args: &[&str]) -> ExitCode {
        let config = self.config.to_str().unwrap();
        let mut argv = vec!["chartdesk", args[0], "--config", config];
        argv.extend_from_slice(&args[1..]);
        run(Cli::try_parse_from(argv).unwrap())
    }

    fn journal(&self) -> SqliteAdapter {
        SqliteAdapter::open(self.db_path().to_str().unwrap(), 1).unwrap()
    }
}

#[test]
fn settings_come_from_the_ini_file() {
    let desk = Desk::new("[data]\nsource = csv\ncsv_dir = prices\ndays = 60\n");
    let settings = load_settings(&desk.config).unwrap();
    assert_eq!(
        settings.source,
        DataSourceKind::Csv {
            dir: PathBuf::from("prices")
        }
    );
    assert_eq!(settings.days, 60);
    assert_eq!(settings.max_risk_dollars, 500.0);
}

#[test]
fn init_db_creates_the_database_file() {
    let desk = Desk::new("");
    assert_eq!(desk.run(&["init-db"]), ExitCode::SUCCESS);
    assert!(desk.db_path().exists());
    assert!(desk.journal().list(None).unwrap().is_empty());
}

#[test]
fn trade_add_writes_a_journal_row() {
    let desk = Desk::new("");
    let code = desk.run(&[
        "trade-add", "--ticker", "nvda", "--side", "short", "--entry", "100", "--stop", "104",
        "--exit", "92", "--qty", "10", "--date", "2024-06-03", "--tags", "earnings,fade",
    ]);
    assert_eq!(code, ExitCode::SUCCESS);

    let trades = desk.journal().list(None).unwrap();
    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert_eq!(trade.ticker, "NVDA");
    assert_eq!(trade.side, Side::Short);
    assert_eq!(trade.risk, 40.0);
    assert_eq!(trade.reward, 80.0);
    assert_eq!(trade.rr, Some(2.0));
    assert_eq!(trade.tags, "earnings,fade");
    assert_eq!(trade.is_win(), Some(true));
}

#[test]
fn trade_over_risk_limit_is_rejected() {
    let desk = Desk::new("");
    let code = desk.run(&["trade-add", "--ticker", "NVDA", "--entry", "100", "--stop", "90", "--qty", "100"]);
    assert_eq!(code, ExitCode::from(4));
    assert!(!desk.db_path().exists() || desk.journal().list(None).unwrap().is_empty());

    let code = desk.run(&[
        "trade-add", "--ticker", "NVDA", "--entry", "100", "--stop", "90", "--qty", "100",
        "--max-risk", "1000",
    ]);
    assert_eq!(code, ExitCode::SUCCESS);
}

#[test]
fn backtest_runs_on_synthetic_data() {
    let desk = Desk::new("[data]\nsource = synthetic\ndays = 120\n");
    assert_eq!(desk.run(&["backtest", "--symbol", "spy"]), ExitCode::SUCCESS);
    assert_eq!(
        desk.run(&["backtest", "--symbol", "spy", "--short", "3", "--long", "12", "--next-bar", "--json"]),
        ExitCode::SUCCESS
    );
}

#[test]
fn oversized_days_are_clamped_to_max_days() {
    let desk = Desk::new("[data]\nsource = synthetic\ndays = 100\nmax_days = 300\n");
    assert_eq!(
        desk.run(&["backtest", "--symbol", "SPY", "--days", "1099511627776"]),
        ExitCode::SUCCESS
    );
    assert_eq!(
        desk.run(&["screener", "--days", "18446744073709551615"]),
        ExitCode::SUCCESS
    );
}

#[test]
fn screener_runs_over_the_watchlist() {
    let desk = Desk::new("[data]\nsource = synthetic\n\n[screener]\nwatchlist = spy, qqq\n");
    assert_eq!(desk.run(&["screener", "--json"]), ExitCode::SUCCESS);
}

#[test]
fn news_with_feeds_disabled_prints_nothing() {
    let desk = Desk::new("[news]\nenabled = false\n");
    assert_eq!(desk.run(&["news", "--limit", "5"]), ExitCode::SUCCESS);
}

#[test]
fn backtest_with_bad_windows_is_a_validation_error() {
    let desk = Desk::new("");
    let code = desk.run(&["backtest", "--symbol", "SPY", "--short", "50", "--long", "20"]);
    assert_eq!(code, ExitCode::from(4));
}

#[test]
fn missing_config_is_a_config_error() {
    let cli = Cli::try_parse_from(["chartdesk", "init-db", "--config", "/nonexistent/desk.ini"]).unwrap();
    assert_eq!(run(cli), ExitCode::from(2));
}

#[test]
fn csv_source_without_dir_is_a_config_error() {
    let desk = Desk::new("[data]\nsource = csv\n");
    assert_eq!(desk.run(&["init-db"]), ExitCode::from(2));
    assert!(!Path::new(&desk.db_path()).exists());
}
