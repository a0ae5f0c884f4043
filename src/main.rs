use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use eduscan::auth::{Credential, Role};
use eduscan::batch::{self, format_probability};
use eduscan::config::AppConfig;
use eduscan::{api, RiskModelAdapter};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eduscan")]
#[command(about = "Learning-risk assessment service for early-grade students", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    config: AppConfig,

    /// Set log level (ignored when RUST_LOG is set)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Score a CSV of students without starting the server
    Batch {
        /// Input CSV with the six model columns
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the scored CSV (defaults to a dated file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a credentials entry for users.json; the password is read from stdin
    HashPassword {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, default_value = "teacher")]
        role: Role,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.to_lowercase();
        EnvFilter::new(format!("eduscan={level},actix_web={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// First line of `input` with the line ending stripped. Other whitespace is
/// part of the password.
fn read_password<R: BufRead>(mut input: R) -> anyhow::Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("reading password from stdin")?;
    let password = line.trim_end_matches(&['\r', '\n'][..]);
    if password.is_empty() {
        bail!("password must not be empty");
    }
    Ok(password.to_string())
}

fn run_batch(config: &AppConfig, input: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let model = RiskModelAdapter::load_or_sample(&config.model_path);
    let file = File::open(&input).with_context(|| format!("opening {}", input.display()))?;
    let outcome = batch::process(BufReader::new(file), &model)
        .with_context(|| format!("scoring {}", input.display()))?;

    for error in &outcome.errors {
        warn!("Row {}: {}", error.row, error.message);
    }

    let output = output
        .unwrap_or_else(|| PathBuf::from(batch::output_file_name(chrono::Local::now().date_naive())));
    let out = File::create(&output).with_context(|| format!("creating {}", output.display()))?;
    outcome
        .write_csv(out)
        .with_context(|| format!("writing {}", output.display()))?;

    let summary = outcome.summary();
    info!(
        "Scored {} of {} rows ({} low, {} medium, {} high, average {})",
        summary.processed,
        summary.total_rows,
        summary.low_risk,
        summary.medium_risk,
        summary.high_risk,
        format_probability(summary.average_probability)
    );
    println!("{}", output.display());
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    debug!("EduScan v{} starting...", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => api::start_api(cli.config)
            .await
            .context("HTTP server failed")?,
        Commands::Batch { input, output } => run_batch(&cli.config, input, output)?,
        Commands::HashPassword { username, role } => {
            eprintln!("Password for '{username}':");
            let password = read_password(std::io::stdin().lock())?;
            let credential = Credential::new(&username, &password, role);
            println!("{}", serde_json::to_string_pretty(&credential)?);
        }
    }

    Ok(())
}
