//! fxpilot CLI: trade recommendations, batches and profile evaluation.
//!
//! Commands:
//! - `recommend`: one decision from a JSON snapshot, a CSV history, a long-form
//!   reference-rate file or a synthetic market, optionally cut off at `--as-of`
//! - `batch`: every pair × profile on synthetic markets, in parallel by default
//! - `evaluate`: simulate each trader profile over regime-scheduled periods
//! - `profiles`: print the risk parameters of each trader profile

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fxpilot_core::domain::{MarketSnapshot, Portfolio, TraderProfile};
use fxpilot_core::engine::DecisionEngine;
use fxpilot_runner::loader::{load_csv, load_rates, load_snapshot_json};
use fxpilot_runner::{
    generate_snapshot, run_single, BatchGrid, BatchRunner, DecisionReport, DecisionRequest,
    EvaluationReport, MarketRegime, ProfileEvaluator, RunnerConfig, SyntheticSpec, KNOWN_PAIRS,
};

#[derive(Parser)]
#[command(
    name = "fxpilot",
    about = "fxpilot: forex trade decisions under trader risk profiles"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a trade for one market snapshot.
    Recommend {
        /// JSON snapshot file.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// OHLCV CSV file (date,open,high,low,close,volume). Requires --pair.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Long-form daily rate CSV (currency,base_currency,exchange_rate,date).
        /// Requires --pair; cross pairs are derived from the base currency.
        #[arg(long)]
        rates: Option<PathBuf>,

        /// Pair for --csv, --rates or --synthetic.
        #[arg(long)]
        pair: Option<String>,

        /// Only use candles dated on or before this day (YYYY-MM-DD).
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Generate a synthetic market instead of reading a file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Synthetic market regime: bullish, bearish, sideways, mixed.
        #[arg(long, default_value = "mixed")]
        regime: MarketRegime,

        /// Synthetic market seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Trader profile: conservative, balanced, aggressive.
        #[arg(long, default_value = "balanced")]
        profile: TraderProfile,

        #[command(flatten)]
        account: AccountArgs,

        /// Print the full report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run every pair × profile combination on synthetic markets.
    Batch {
        /// Pairs to run (comma separated). Defaults to the seven majors.
        #[arg(long, value_delimiter = ',')]
        pairs: Vec<String>,

        /// Profiles to run (comma separated). Defaults to all three.
        #[arg(long, value_delimiter = ',')]
        profiles: Vec<TraderProfile>,

        #[arg(long, default_value = "mixed")]
        regime: MarketRegime,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[command(flatten)]
        account: AccountArgs,

        /// Run requests one at a time instead of on the thread pool.
        #[arg(long, default_value_t = false)]
        serial: bool,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Simulate every trader profile and rank them by total return.
    Evaluate {
        #[arg(long)]
        pair: Option<String>,

        /// Number of simulated periods.
        #[arg(long)]
        periods: Option<usize>,

        /// Starting capital.
        #[arg(long)]
        capital: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the risk parameters of each trader profile.
    Profiles,
}

#[derive(clap::Args)]
struct AccountArgs {
    /// Account capital.
    #[arg(long, default_value_t = 10_000.0)]
    capital: f64,

    /// Number of currently open positions.
    #[arg(long, default_value_t = 0)]
    open_positions: u32,

    /// Cumulative realized profit/loss.
    #[arg(long, default_value_t = 0.0)]
    pnl: f64,

    /// Worst drawdown so far, as a fraction in [0, 1].
    #[arg(long, default_value_t = 0.0)]
    drawdown: f64,
}

impl AccountArgs {
    fn portfolio(&self) -> Result<Portfolio> {
        Ok(Portfolio::new(
            self.capital,
            self.open_positions,
            self.pnl,
            self.drawdown,
        )?)
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = RunnerConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Recommend {
            snapshot,
            csv,
            rates,
            pair,
            as_of,
            synthetic,
            regime,
            seed,
            profile,
            account,
            json,
        } => {
            let snapshot = resolve_snapshot(
                snapshot.as_deref(),
                csv.as_deref(),
                rates.as_deref(),
                pair,
                synthetic,
                regime,
                seed,
            )?;
            run_recommend(&config, snapshot, as_of, profile, &account, json)
        }
        Commands::Batch {
            pairs,
            profiles,
            regime,
            seed,
            account,
            serial,
            json,
        } => run_batch(&config, pairs, profiles, regime, seed, &account, serial, json),
        Commands::Evaluate {
            pair,
            periods,
            capital,
            seed,
            json,
        } => {
            let mut config = config;
            if let Some(pair) = pair {
                config.evaluation.pair = pair;
            }
            if let Some(periods) = periods {
                config.evaluation.periods = periods;
            }
            if let Some(capital) = capital {
                config.evaluation.capital = capital;
            }
            if let Some(seed) = seed {
                config.evaluation.seed = seed;
            }
            config.validate()?;
            run_evaluate(&config, json)
        }
        Commands::Profiles => {
            print_profiles();
            Ok(())
        }
    }
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_logging() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn resolve_snapshot(
    snapshot: Option<&Path>,
    csv: Option<&Path>,
    rates: Option<&Path>,
    pair: Option<String>,
    synthetic: bool,
    regime: MarketRegime,
    seed: u64,
) -> Result<MarketSnapshot> {
    let sources = [snapshot.is_some(), csv.is_some(), rates.is_some(), synthetic]
        .iter()
        .filter(|&&s| s)
        .count();
    if sources > 1 {
        bail!("--snapshot, --csv, --rates and --synthetic are mutually exclusive");
    }
    if let Some(path) = snapshot {
        if pair.is_some() {
            bail!("--pair cannot override the pair inside a JSON snapshot");
        }
        return Ok(load_snapshot_json(path)?);
    }
    if let Some(path) = csv {
        let Some(pair) = pair else {
            bail!("--csv requires --pair");
        };
        return Ok(load_csv(path, &pair)?);
    }
    if let Some(path) = rates {
        let Some(pair) = pair else {
            bail!("--rates requires --pair");
        };
        return Ok(load_rates(path)?.snapshot(&pair)?);
    }
    if !synthetic {
        bail!("one of --snapshot, --csv, --rates or --synthetic is required");
    }
    let pair = pair.unwrap_or_else(|| "EURUSD".to_string());
    Ok(generate_snapshot(&SyntheticSpec::new(pair, regime, seed))?)
}

fn run_recommend(
    config: &RunnerConfig,
    snapshot: MarketSnapshot,
    as_of: Option<NaiveDate>,
    profile: TraderProfile,
    account: &AccountArgs,
    json: bool,
) -> Result<()> {
    let engine = DecisionEngine::new(config.engine)?;
    let mut request = DecisionRequest::new(snapshot, profile, account.portfolio()?);
    if let Some(as_of) = as_of {
        request = request.as_of(as_of)?;
    }
    let outcome = run_single(&engine, &request)?;
    if json {
        println!("{}", outcome.report.to_json_pretty()?);
    } else {
        print_report(&outcome.report);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_batch(
    config: &RunnerConfig,
    pairs: Vec<String>,
    profiles: Vec<TraderProfile>,
    regime: MarketRegime,
    seed: u64,
    account: &AccountArgs,
    serial: bool,
    json: bool,
) -> Result<()> {
    let grid = BatchGrid {
        pairs: if pairs.is_empty() {
            KNOWN_PAIRS.iter().map(|(p, _)| p.to_string()).collect()
        } else {
            pairs
        },
        profiles: if profiles.is_empty() {
            TraderProfile::ALL.to_vec()
        } else {
            profiles
        },
        regime,
        seed,
    };
    let requests = grid.requests(&account.portfolio()?)?;
    let parallel = config.batch.parallel && !serial;
    let runner = BatchRunner::from_config(config)?.with_parallelism(parallel);
    let outcomes = runner.run_all(&requests)?;

    if json {
        let reports: Vec<&DecisionReport> = outcomes.iter().map(|o| &o.report).collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!(
        "{:<8} {:<13} {:<6} {:>10} {:>11} {:>11} {:>7} {:>12}",
        "Pair", "Profile", "Action", "Size", "Stop", "Target", "Score", "Request"
    );
    for o in &outcomes {
        let s = &o.report.strategy;
        println!(
            "{:<8} {:<13} {:<6} {:>10.0} {:>11.5} {:>11.5} {:>7.3} {:>12}",
            o.report.market_data.pair,
            o.decision.profile.as_str(),
            s.action.as_str().to_uppercase(),
            s.position_size,
            s.stop_loss,
            s.take_profit,
            s.confidence_score,
            o.request_id().short(),
        );
    }
    Ok(())
}

fn run_evaluate(config: &RunnerConfig, json: bool) -> Result<()> {
    let engine = DecisionEngine::new(config.engine)?;
    let report = ProfileEvaluator::new(engine, config.evaluation.clone()).evaluate_all()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_evaluation(&report);
    }
    Ok(())
}

fn print_report(report: &DecisionReport) {
    println!();
    println!("=== Recommendation ===");
    println!("Pair:           {}", report.market_data.pair);
    println!("Price:          {:.5}", report.market_data.current_price);
    println!("Profile:        {}", report.final_recommendation.trader_profile);
    println!(
        "Action:         {}",
        report.strategy.action.as_str().to_uppercase()
    );
    println!("Request:        {}", report.request_id);
    println!();
    println!("{}", report.explanation);
}

fn print_evaluation(report: &EvaluationReport) {
    println!();
    println!(
        "=== Profile Evaluation: {} over {} periods (seed {}) ===",
        report.pair, report.periods, report.seed
    );
    println!("Initial capital: {:.2}", report.initial_capital);
    for (rank, run) in report.runs.iter().enumerate() {
        let m = &run.metrics;
        println!();
        println!("#{} {}", rank + 1, m.profile);
        println!("  Final Capital:   {:.2}", m.final_capital);
        println!("  Total Return:    {:.2}%", m.total_return * 100.0);
        println!("  Max Drawdown:    {:.2}%", m.max_drawdown * 100.0);
        println!("  Sharpe:          {:.3}", m.sharpe_ratio);
        println!(
            "  Trades:          {} ({} won, {} lost)",
            m.total_trades, m.winning_trades, m.losing_trades
        );
        println!("  Win Rate:        {:.1}%", m.win_rate * 100.0);
        println!("  Avg P&L/Trade:   {:.2}", m.avg_pnl_per_trade);
        println!("  Max Consec Loss: {}", m.max_consecutive_losses);
        println!("  Violations:      {}", m.constraint_violations);
        println!("  Avg Volatility:  {:.5}", m.avg_volatility);
    }
}

fn print_profiles() {
    println!(
        "{:<13} {:>10} {:>9} {:>11} {:>14} {:>13}",
        "Profile", "Risk/Trade", "Leverage", "Volatility", "Target Mult.", "Max Drawdown"
    );
    for profile in TraderProfile::ALL {
        let p = profile.params();
        println!(
            "{:<13} {:>9.1}% {:>8.0}x {:>11} {:>13.1}x {:>12.0}%",
            profile.as_str(),
            p.max_risk_per_trade * 100.0,
            p.max_leverage,
            p.volatility_tolerance.to_string(),
            p.profit_target_multiplier,
            p.max_drawdown * 100.0,
        );
    }
}
