use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use paperbot::config::AppConfig;
use paperbot::feed::{
    backdated_start, interleave, load_bars_csv, FeedEvent, MarketScenario, SyntheticFeed,
};
use paperbot::{BotState, BotStatus, LedgerSnapshot, PriceObservation, Session, SharedBot, SharedLedger};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const FEED_BUFFER: usize = 1024;

#[derive(Parser, Debug)]
#[command(name = "paperbot", about = "Paper-trading RSI bot over a streaming indicator pipeline")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay historical OHLCV bars through the bot
    Replay {
        #[arg(long)]
        csv: PathBuf,
        /// Instrument the bars belong to (defaults to the bot instrument)
        #[arg(long)]
        instrument: Option<String>,
        /// Leading bars used as subscribe history instead of live ticks
        #[arg(long, default_value_t = 0)]
        warmup: usize,
    },
    /// Run the bot against a seeded synthetic random walk
    Simulate {
        #[arg(long, default_value = "sideways")]
        scenario: MarketScenario,
        #[arg(long, default_value_t = 2000)]
        ticks: usize,
        /// Spacing between synthetic ticks
        #[arg(long, default_value_t = 1000)]
        interval_ms: i64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 100.0)]
        base_price: f64,
    },
}

#[derive(Debug, Serialize)]
struct Report {
    ledger: LedgerSnapshot,
    bot: BotStatus,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let app = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    setup_logging(&app.log.filter);

    tracing::info!("🚀 paperbot starting");

    let tracked = app.tracked_instruments();

    let (bot_instrument, subscriptions, live) = match cli.command {
        Command::Replay {
            csv,
            instrument,
            warmup,
        } => {
            let instrument = instrument.unwrap_or_else(|| app.bot.instrument.clone());
            let mut bars = load_bars_csv(&csv, &instrument)
                .with_context(|| format!("Failed to load bars from {}", csv.display()))?;
            if bars.is_empty() {
                bail!("{} contains no bars", csv.display());
            }
            let live = bars.split_off(warmup.min(bars.len()));

            // Only the replayed instrument has bars; the rest subscribe cold
            let mut subscriptions = vec![(instrument.clone(), bars)];
            subscriptions.extend(
                tracked
                    .into_iter()
                    .filter(|other| *other != instrument)
                    .map(|other| (other, Vec::new())),
            );
            (instrument, subscriptions, live)
        }
        Command::Simulate {
            scenario,
            ticks,
            interval_ms,
            seed,
            base_price,
        } => {
            let start = backdated_start(Utc::now(), ticks, interval_ms)?;
            let interval = Duration::try_milliseconds(interval_ms)
                .context("--interval-ms is out of range")?;

            let feeds: Vec<_> = tracked
                .iter()
                .zip(0u64..)
                .map(|(instrument, offset)| {
                    SyntheticFeed::new(instrument.clone(), base_price, seed.wrapping_add(offset))
                        .generate(scenario, ticks, start, interval)
                })
                .collect();
            tracing::info!(
                "Simulating {} {:?} ticks for {} instrument(s) (seed {})",
                ticks,
                scenario,
                tracked.len(),
                seed
            );

            let subscriptions = tracked
                .into_iter()
                .map(|instrument| (instrument, Vec::new()))
                .collect();
            (app.bot.instrument.clone(), subscriptions, interleave(feeds))
        }
    };

    let report = run_session(&app, bot_instrument, subscriptions, live).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn setup_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Drive one session to completion: subscribe, stream, stop the bot
async fn run_session(
    app: &AppConfig,
    bot_instrument: String,
    subscriptions: Vec<(String, Vec<PriceObservation>)>,
    live: Vec<PriceObservation>,
) -> Result<Report> {
    let ledger = SharedLedger::new(app.session.initial_balance);
    let bot = SharedBot::default();

    let mut draft = app.bot_config();
    draft.instrument = bot_instrument;
    bot.configure(draft)?;
    bot.confirm().context("Bot configuration rejected")?;
    bot.start()?;

    let mut session = Session::new(app.session_config(), ledger.clone(), bot.clone());
    let (tx, rx) = mpsc::channel(FEED_BUFFER);

    let producer = tokio::spawn(async move {
        let events = subscriptions
            .into_iter()
            .map(|(instrument, history)| FeedEvent::Subscribe {
                instrument,
                history,
            })
            .chain(live.into_iter().map(FeedEvent::Observation));

        for event in events {
            if tx.send(event).await.is_err() {
                tracing::warn!("Session closed before the feed finished");
                break;
            }
        }
    });

    session.run(rx).await?;
    producer.await.context("Feed task failed")?;

    if bot.state()? == BotState::Running {
        bot.stop()?;
    }

    Ok(Report {
        ledger: ledger.snapshot()?,
        bot: bot.status()?,
    })
}

fn print_summary(report: &Report) {
    let ledger = &report.ledger;
    let stats = &report.bot.stats;

    println!("\n📊 Portfolio Summary:");
    println!("  Balance: ${:.2}", ledger.balance);
    println!(
        "  P&L: ${:.2} ({:.2}%)",
        ledger.total_pnl,
        ledger.total_pnl / ledger.initial_balance * 100.0
    );
    println!(
        "  Realized: ${:.2} | Unrealized: ${:.2}",
        ledger.realized_pnl, ledger.unrealized_pnl
    );
    println!("  Open Positions: {}", ledger.positions.len());
    for position in &ledger.positions {
        println!(
            "    {} | Amount: {:.8} | Avg: ${:.4}",
            position.instrument,
            position.amount,
            position.average_price()
        );
    }

    println!("\n🤖 Bot:");
    println!("  State: {:?}", report.bot.state);
    println!(
        "  Trades: {} ({} won, {} lost, {} rejected)",
        stats.total_trades, stats.winning_trades, stats.losing_trades, stats.rejected_orders
    );
    println!("  Evaluations: {}", stats.evaluations);
    println!("  Total profit: ${:.2}", stats.total_profit);
    if let Some(last) = stats.last_trade_result {
        println!("  Last trade: ${:.2}", last);
    }
    if let Some(rsi) = report.bot.indicators.as_ref().and_then(|s| s.rsi) {
        println!("  Last RSI: {:.2}", rsi);
    }
}
