//! Command-line front end: analyse one monthly series from a table file.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use seasonal_forecast::analysis::{run_analysis, AnalysisConfig};
use seasonal_forecast::core::TimeSeries;
use seasonal_forecast::data::synthetic::{trend_seasonal, SyntheticConfig};
use seasonal_forecast::data::{load_monthly_series, TableSource};
use seasonal_forecast::models::arima::rank_candidates;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "seasonal-forecast")]
#[command(about = "Seasonal ARIMA, regression and DLM forecasts of a monthly series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis: stationarity, selection, fits, forecasts, backtest
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Forecast horizon
        #[arg(long, default_value = "6")]
        horizon: usize,

        /// Observations withheld by the backtest
        #[arg(long, default_value = "12")]
        holdout: usize,
    },

    /// Rank the SARIMA candidate orders only
    Select {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Whitespace-delimited table with one row per month
    path: Option<PathBuf>,

    /// Zero-based column holding the series
    #[arg(short, long, default_value = "2")]
    column: usize,

    /// Year of the first row (January)
    #[arg(long, default_value = "2000")]
    start_year: i32,

    /// Use a seeded synthetic series of this length instead of a file
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed of the synthetic series
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Reject a table that does not have exactly this many rows
    #[arg(long)]
    rows: Option<usize>,
}

impl InputArgs {
    fn load(&self) -> Result<TimeSeries> {
        match (&self.path, self.synthetic) {
            (Some(path), Some(_)) => bail!(
                "give either {} or --synthetic, not both",
                path.display()
            ),
            (None, Some(n)) => {
                let config = SyntheticConfig {
                    start_year: self.start_year,
                    ..SyntheticConfig::default()
                }
                .with_seed(self.seed);
                Ok(trend_seasonal(n, &config)?)
            }
            (Some(path), None) => {
                let mut source = TableSource::default()
                    .with_column(self.column)
                    .starting(self.start_year, 1);
                if let Some(rows) = self.rows {
                    source = source.with_expected_rows(rows);
                }
                load_monthly_series(path, &source)
                    .with_context(|| format!("failed to load {}", path.display()))
            }
            (None, None) => bail!("give a table path or --synthetic <N>"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Analyze {
            input,
            horizon,
            holdout,
        } => {
            let series = input.load()?;
            info!(len = series.len(), "series loaded");
            let config = AnalysisConfig::default()
                .with_horizon(horizon)
                .with_holdout(holdout);
            let report = run_analysis(&series, &config)?;
            print!("{}", report);
        }
        Commands::Select { input } => {
            let series = input.load()?;
            let config = AnalysisConfig::default();
            let ranking = rank_candidates(&series, &config.candidates, &config.selection)?;
            println!("{:<22} {:>10} {:>10} {:>6}", "order", "loglik", "AIC", "white");
            for report in &ranking {
                let spec = report.spec;
                match report.fit() {
                    Some(fit) => println!(
                        "{:<22} {:>10.2} {:>10.2} {:>6}",
                        spec.to_string(),
                        fit.log_likelihood,
                        fit.aic,
                        if fit.white { "yes" } else { "no" }
                    ),
                    None => println!("{:<22} failed", spec.to_string()),
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(args: &[&str]) -> InputArgs {
        let mut argv = vec!["seasonal-forecast", "select"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Select { input } => input,
            Commands::Analyze { .. } => unreachable!(),
        }
    }

    #[test]
    fn path_and_synthetic_are_exclusive() {
        let args = input(&["data.txt", "--synthetic", "120"]);
        let err = args.load().unwrap_err();
        assert!(err.to_string().contains("not both"));

        assert!(input(&[]).load().is_err());
        assert_eq!(input(&["--synthetic", "48"]).load().unwrap().len(), 48);
    }

    #[test]
    fn rows_flag_checks_table_length() {
        let name = format!("seasonal-forecast-rows-{}.txt", std::process::id());
        let path = std::env::temp_dir().join(name);
        let text: String = (0..24)
            .map(|i| format!("{} {} {}\n", 2000 + i / 12, i % 12 + 1, 100 + i))
            .collect();
        std::fs::write(&path, text).unwrap();
        let file = path.to_string_lossy().into_owned();

        assert_eq!(input(&[file.as_str()]).load().unwrap().len(), 24);
        assert_eq!(input(&[file.as_str(), "--rows", "24"]).load().unwrap().len(), 24);
        assert!(input(&[file.as_str(), "--rows", "120"]).load().is_err());

        std::fs::remove_file(&path).unwrap();
    }
}
