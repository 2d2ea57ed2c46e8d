use clap::{Parser, Subcommand};
use stackprobe_core::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "stackprobe")]
#[command(about = "Compose stack smoke-test, monitoring, and summary CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and smoke-test compose stacks, one directory per target
    Test {
        /// Application directories to test
        dirs: Vec<String>,

        /// Directory receiving the log and result lists
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Hard limit on one build, in seconds
        #[arg(long)]
        build_timeout: Option<u64>,

        /// Maximum wait for a running service after the build, in seconds
        #[arg(long)]
        max_wait: Option<u64>,
    },

    /// Sample container memory/CPU for a compose project into a CSV
    Monitor {
        /// Compose project name (e.g. "myapp")
        #[arg(short, long)]
        project: String,

        /// Polling interval in seconds
        #[arg(short, long, default_value = "60")]
        interval: u64,

        /// Total duration in seconds; omit to run until interrupted
        #[arg(short, long)]
        duration: Option<u64>,

        /// Output CSV file
        #[arg(long)]
        csv: PathBuf,
    },

    /// Reduce monitor + JMeter outputs to one summary row per application
    Summarize {
        /// Directory containing <APP>/Output/{monitor_results.csv,jmeter_results.jtl}
        #[arg(long)]
        test_root: PathBuf,

        /// Output summary CSV
        #[arg(long, default_value = "summary.csv")]
        out: PathBuf,

        /// Warm-up to exclude, in hours
        #[arg(long, default_value = "0.5")]
        warmup_hours: f64,

        /// Early window start, in hours
        #[arg(long, default_value = "1.0")]
        early_start_hours: f64,

        /// Early window end, in hours
        #[arg(long, default_value = "2.0")]
        early_end_hours: f64,

        /// Late window duration, in hours
        #[arg(long, default_value = "2.0")]
        late_duration_hours: f64,

        /// Bin size in minutes for the p95 latency series
        #[arg(long, default_value = "1")]
        bin_minutes: u32,

        /// Requests feeding the p95 trend: "http<400", "success", or "all"
        #[arg(long, default_value = "http<400")]
        latency_filter: String,

        /// Minimum samples per bin for the p95 series
        #[arg(long, default_value = "5")]
        min_samples_per_bin: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG wins; otherwise the persisted log level, defaulting to info so
    // the harness transcript reaches the console.
    let default_level = Config::load().map(|c| c.log_level).unwrap_or_else(|_| "info".to_string());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Test { dirs, output_dir, build_timeout, max_wait } => {
            commands::test::run(dirs, output_dir, build_timeout, max_wait).await
        }

        Commands::Monitor { project, interval, duration, csv } => {
            commands::monitor::run(project, interval, duration, csv).await.map(|()| 0)
        }

        Commands::Summarize {
            test_root,
            out,
            warmup_hours,
            early_start_hours,
            early_end_hours,
            late_duration_hours,
            bin_minutes,
            latency_filter,
            min_samples_per_bin,
        } => {
            commands::summarize::run(commands::summarize::Args {
                test_root,
                out,
                warmup_hours,
                early_start_hours,
                early_end_hours,
                late_duration_hours,
                bin_minutes,
                latency_filter,
                min_samples_per_bin,
            })
            .map(|()| 0)
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
