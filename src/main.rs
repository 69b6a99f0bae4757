use anyhow::Result;
use backtester::config::{default_candidate_pairs, parse_pairs, EngineConfig, RunnerConfig};
use backtester::models::{BacktestResult, EmaPair};
use backtester::runner::{run_single_pair, run_sweep};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "backtester")]
#[command(about = "EMA crossover backtesting and grid optimization tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest every instrument in the data directory and export artifacts
    Sweep {
        /// Directory containing one {TICKER}.csv bar file per instrument
        #[arg(long = "data-dir", value_name = "PATH", default_value = "data")]
        data_dir: PathBuf,
        /// Destination directory for the result artifacts
        #[arg(long = "output-dir", value_name = "PATH", default_value = "results")]
        output_dir: PathBuf,
        /// Override the built-in candidate pairs, e.g. "12:26,9:21"
        #[arg(long)]
        pairs: Option<String>,
        /// Also write a JSON sibling next to each text artifact
        #[arg(long)]
        json: bool,
        /// Abort the whole sweep on the first instrument failure
        #[arg(long = "halt-on-error")]
        halt_on_error: bool,
    },
    /// Run one instrument against a single EMA pair and print both modes
    Backtest {
        /// Ticker to backtest; expects {TICKER}.csv in the data directory
        ticker: String,
        /// Short EMA period
        #[arg(long, default_value_t = 12)]
        short: usize,
        /// Long EMA period
        #[arg(long, default_value_t = 26)]
        long: usize,
        /// Directory containing one {TICKER}.csv bar file per instrument
        #[arg(long = "data-dir", value_name = "PATH", default_value = "data")]
        data_dir: PathBuf,
    },
}

fn print_result(result: &BacktestResult) {
    println!("\n=== {} mode ===", result.mode.as_str());
    println!("  Pair: {}", result.pair);
    println!("  ROI: {:.2}%", result.run.roi);
    println!("  Final capital: ${:.2}", result.run.final_capital);
    println!("  Trades: {}", result.run.trades.len());
    for trade in &result.run.trades {
        println!(
            "    {} at {} with price {:.2}",
            trade.side.as_str(),
            trade.date,
            trade.price
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep {
            data_dir,
            output_dir,
            pairs,
            json,
            halt_on_error,
        } => {
            let pairs = match pairs {
                Some(raw) => parse_pairs(&raw)?,
                None => default_candidate_pairs(),
            };
            let config = RunnerConfig {
                data_dir,
                output_dir,
                pairs,
                write_json: json,
                halt_on_error,
            };
            let summary = run_sweep(&config, &EngineConfig::default())?;
            info!(
                "Exported artifacts for {} instrument(s); {} failed",
                summary.succeeded.len(),
                summary.failures.len()
            );
            for (ticker, error) in &summary.failures {
                info!("  {} failed: {}", ticker, error);
            }
        }
        Commands::Backtest {
            ticker,
            short,
            long,
            data_dir,
        } => {
            let pair = EmaPair::new(short, long)?;
            let config = RunnerConfig {
                output_dir: PathBuf::new(),
                data_dir,
                pairs: vec![pair],
                write_json: false,
                halt_on_error: true,
            };
            let (confirmed, unconfirmed) =
                run_single_pair(&config, &EngineConfig::default(), &ticker, pair)?;
            print_result(&confirmed);
            print_result(&unconfirmed);
        }
    }

    Ok(())
}
