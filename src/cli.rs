//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{export_trades, CsvHistorySource, TIME_FORMAT};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestResult};
use crate::domain::config_validation::{
    build_backtest_config, build_feed_config, build_history_query, build_live_config,
    FeedConfig, HistoryQuery,
};
use crate::domain::error::SignalError;
use crate::domain::metrics::TradeStats;
use crate::domain::position::{ClosedTrade, Position};
use crate::domain::price::PricePoint;
use crate::ports::data_port::HistorySource;

#[derive(Parser, Debug)]
#[command(name = "crosstrader", about = "Moving-average crossover signals for BTC")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay historical prices through the crossover strategy
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Read `timestamp,close` history from a CSV file instead of the feed
        #[arg(long)]
        prices: Option<PathBuf>,
        /// Export closed trades to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Value a trailing open position at the last price
        #[arg(long)]
        mark_to_market: bool,
    },
    /// Poll the live price and evaluate signals until Ctrl-C
    Live {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop after N cycles
        #[arg(long)]
        cycles: Option<usize>,
        /// Export the trade log to this CSV file on exit
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Open positions automatically on BUY/SELL signals
        #[arg(long)]
        auto: bool,
    },
    /// Validate a configuration file and print the resolved settings
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            prices,
            output,
            mark_to_market,
        } => run_backtest(&config, prices.as_deref(), output.as_deref(), mark_to_market),
        Command::Live {
            config,
            cycles,
            output,
            auto,
        } => run_live(&config, cycles, output.as_deref(), auto),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| fail(&err))
}

fn fail(err: &SignalError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn current_thread_runtime() -> Result<tokio::runtime::Runtime, SignalError> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

fn run_backtest(
    config_path: &Path,
    prices_path: Option<&Path>,
    output_path: Option<&Path>,
    mark_to_market: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    bt_config.mark_to_market |= mark_to_market;

    let (feed, query) = match build_feed_config(&adapter)
        .and_then(|feed| Ok((feed, build_history_query(&adapter)?)))
    {
        Ok(pair) => pair,
        Err(e) => return fail(&e),
    };

    let points = match load_history(prices_path, &feed, &query) {
        Ok(points) => points,
        Err(e) => return fail(&e),
    };

    eprintln!(
        "Running backtest: {} bars, SMA({}) / SMA({}), SL {}%, TP {}%",
        points.len(),
        bt_config.short_window,
        bt_config.long_window,
        bt_config.stop_loss_pct,
        bt_config.take_profit_pct,
    );
    if points.len() < bt_config.long_window {
        eprintln!(
            "warning: {} bars is fewer than long_window {}; no trades possible",
            points.len(),
            bt_config.long_window
        );
    }

    let result = backtest_engine::run_backtest(&points, &bt_config);
    print_trades(result.trades.trades());
    print_backtest_summary(&result);

    match output_path {
        Some(path) => match export_trades(result.trades.trades(), path) {
            Ok(()) => {
                eprintln!("\nTrades written to: {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => fail(&e),
        },
        None => ExitCode::SUCCESS,
    }
}

fn load_history(
    prices_path: Option<&Path>,
    feed: &FeedConfig,
    query: &HistoryQuery,
) -> Result<Vec<PricePoint>, SignalError> {
    let runtime = current_thread_runtime()?;

    if let Some(path) = prices_path {
        eprintln!("Loading prices from {}", path.display());
        let source = CsvHistorySource::new(path);
        return runtime.block_on(source.fetch_history(&feed.symbol, query.interval, query.lookback));
    }

    #[cfg(feature = "live")]
    {
        use crate::adapters::cryptocompare::CryptoCompareClient;

        eprintln!(
            "Fetching {} {}/{} bars from CryptoCompare",
            query.lookback, feed.symbol, feed.currency
        );
        let client = CryptoCompareClient::new(feed)?;
        runtime.block_on(client.fetch_history(&feed.symbol, query.interval, query.lookback))
    }

    #[cfg(not(feature = "live"))]
    {
        let _ = runtime;
        Err(SignalError::unavailable(
            "live feature is required to fetch history; pass --prices",
        ))
    }
}

fn run_live(
    config_path: &Path,
    cycles: Option<usize>,
    output_path: Option<&Path>,
    auto: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let mut live_config = match build_live_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    live_config.auto_trade |= auto;

    let feed = match build_feed_config(&adapter) {
        Ok(f) => f,
        Err(e) => return fail(&e),
    };

    #[cfg(feature = "live")]
    {
        use crate::adapters::cryptocompare::CryptoCompareClient;
        use crate::domain::session::SessionState;
        use crate::live::{run_live as run_loop, LiveOptions};

        let client = match CryptoCompareClient::new(&feed) {
            Ok(c) => c,
            Err(e) => return fail(&e),
        };
        let runtime = match current_thread_runtime() {
            Ok(r) => r,
            Err(e) => return fail(&e),
        };

        eprintln!(
            "Polling {}/{} every {}s (auto-trade {}). Press Ctrl-C to stop.",
            feed.symbol,
            feed.currency,
            live_config.refresh_secs,
            if live_config.auto_trade { "on" } else { "off" },
        );

        let mut state = SessionState::new(live_config.flip_policy);
        let options = LiveOptions { max_cycles: cycles };
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };
        let summary =
            runtime.block_on(run_loop(&client, &live_config, &mut state, &options, shutdown));

        eprintln!(
            "\nStopped after {} cycles ({} evaluated, {} collecting, {} skipped)",
            summary.cycles, summary.evaluated, summary.collecting, summary.skipped
        );
        print_trades(state.log.trades());
        print_stats(&TradeStats::compute(state.log.trades()));
        if let (Some(position), Some(last)) = (state.tracker.position(), state.series.last()) {
            print_open_position(position, last.price);
        }

        match output_path {
            Some(path) => match export_trades(state.log.trades(), path) {
                Ok(()) => {
                    eprintln!("\nTrades written to: {}", path.display());
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e),
            },
            None => ExitCode::SUCCESS,
        }
    }

    #[cfg(not(feature = "live"))]
    {
        let _ = (cycles, output_path, &live_config, &feed);
        eprintln!("error: live feature is required for live mode");
        ExitCode::from(1)
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let live = match build_live_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let backtest = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let feed = match build_feed_config(&adapter) {
        Ok(f) => f,
        Err(e) => return fail(&e),
    };
    let query = match build_history_query(&adapter) {
        Ok(q) => q,
        Err(e) => return fail(&e),
    };

    println!("[signal]");
    println!("  short_window     = {}", live.short_window);
    println!("  long_window      = {}", live.long_window);
    println!("[risk]");
    println!("  stop_loss_pct    = {}", live.stop_loss_pct);
    println!("  take_profit_pct  = {}", live.take_profit_pct);
    println!("[indicators]");
    println!("  rsi_window       = {}", live.indicators.rsi_window);
    println!("  macd             = {}", live.indicators.macd_type());
    println!("[live]");
    println!("  refresh_rate     = {}s", live.refresh_secs);
    println!("  auto_trade       = {}", live.auto_trade);
    println!("  flip_policy      = {}", live.flip_policy);
    println!("[backtest]");
    println!("  interval         = {}", query.interval);
    println!("  lookback         = {}", query.lookback);
    println!("  mark_to_market   = {}", backtest.mark_to_market);
    println!("[feed]");
    println!("  symbol           = {}/{}", feed.symbol, feed.currency);
    println!(
        "  base_url         = {}",
        feed.base_url.as_deref().unwrap_or("(default)")
    );
    println!("  timeout          = {}s", feed.timeout_secs);

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn print_trades(trades: &[ClosedTrade]) {
    if trades.is_empty() {
        eprintln!("\nNo closed trades.");
        return;
    }
    println!(
        "\n{:<5} {:>12} {:>12} {:>9} {:<12} {}",
        "Side", "Entry", "Exit", "PnL (%)", "Reason", "Time"
    );
    for trade in trades {
        println!(
            "{:<5} {:>12.2} {:>12.2} {:>9.2} {:<12} {}",
            trade.side,
            trade.entry_price,
            trade.exit_price,
            trade.pnl_pct,
            trade.close_reason,
            trade.close_time.format(TIME_FORMAT),
        );
    }
}

fn print_backtest_summary(result: &BacktestResult) {
    print_stats(&result.stats);
    if let Some(mark) = &result.open_position {
        print_open_position(&mark.position, mark.last_price);
    }
}

fn print_stats(stats: &TradeStats) {
    eprintln!("\n=== Results ===");
    eprintln!("Total Trades:     {}", stats.total_trades);
    eprintln!(
        "Won/Lost/Even:    {}/{}/{}",
        stats.trades_won, stats.trades_lost, stats.trades_breakeven
    );
    eprintln!("Win Rate:         {:.1}%", stats.win_rate);
    eprintln!("Total PnL:        {:.2}%", stats.total_pnl_pct);
    eprintln!("Profit Factor:    {:.2}", stats.profit_factor);
    eprintln!("Avg Win:          {:.2}%", stats.avg_win_pct);
    eprintln!("Avg Loss:         {:.2}%", stats.avg_loss_pct);
    eprintln!("Largest Win:      {:.2}%", stats.largest_win_pct);
    eprintln!("Largest Loss:     {:.2}%", stats.largest_loss_pct);
    eprintln!("Avg Holding:      {:.0}s", stats.avg_holding_secs);
}

fn print_open_position(position: &Position, price: f64) {
    eprintln!(
        "\nOpen position:    {} @ {:.2}, last {:.2} ({:+.2}%)",
        position.side,
        position.entry_price,
        price,
        position.unrealized_pct(price)
    );
}
