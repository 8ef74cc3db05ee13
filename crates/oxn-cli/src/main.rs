//! oxn CLI: terminal dashboard for OXN observability experiments.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use oxn_core::{DashboardConfig, DataFormat, OutputFormat};
use oxn_cli::logging;
use oxn_cli::views::{self, ListArgs, UploadArgs};
use oxn_cli::{TableArgs, ViewContext};

#[derive(Parser)]
#[command(
    name = "oxn",
    about = "🔭 oxn: configure, launch and review observability experiments",
    version,
    author
)]
struct Cli {
    /// Backend base URL (overrides OXN_BACKEND_URL)
    #[arg(long, global = true)]
    backend_url: Option<String>,
    /// Display timezone: local, utc or an offset like +02:00 (overrides OXN_TIMEZONE)
    #[arg(long, global = true)]
    timezone: Option<String>,
    /// Log progress at info level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Times to retry a view after an unexpected error
    #[arg(long, global = true, default_value_t = 0)]
    retries: u32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct TableOpts {
    /// Only rows whose filter column contains this text
    #[arg(long, short)]
    filter: Option<String>,
    /// Column key to sort by
    #[arg(long, short)]
    sort: Option<String>,
    /// Sort descending
    #[arg(long)]
    desc: bool,
}

impl From<TableOpts> for TableArgs {
    fn from(opts: TableOpts) -> Self {
        TableArgs {
            filter: opts.filter,
            sort: opts.sort,
            desc: opts.desc,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the dashboard home: metric cards and menu
    Dashboard {
        /// Result snapshot (JSON or YAML); defaults to the bundled sample
        #[arg(long)]
        results: Option<PathBuf>,
    },
    /// List experiments known to the backend
    Experiments {
        /// Only experiments with this status (e.g. RUNNING)
        #[arg(long)]
        status: Option<String>,
        /// Maximum number of experiments (1-100)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: Option<u32>,
        #[command(flatten)]
        table: TableOpts,
    },
    /// Refresh the status of one experiment
    Status {
        /// Experiment ID
        id: String,
    },
    /// Summarize all experiment results
    Results {
        /// Result snapshot (JSON or YAML); defaults to the bundled sample
        #[arg(long)]
        results: Option<PathBuf>,
        #[command(flatten)]
        table: TableOpts,
    },
    /// Show per-interaction details of one experiment result
    Result {
        /// Experiment ID
        id: String,
        /// Result snapshot (JSON or YAML); defaults to the bundled sample
        #[arg(long)]
        results: Option<PathBuf>,
        /// Only rows of this run ID
        #[arg(long)]
        run: Option<String>,
        /// Column key to sort by
        #[arg(long, short)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// Upload a YAML experiment configuration, optionally starting it
    Upload {
        /// Configuration file
        file: PathBuf,
        /// Experiment name
        #[arg(long, short)]
        name: String,
        /// Start the experiment once saved
        #[arg(long)]
        start: bool,
        /// Number of runs
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        runs: u32,
        /// Output format of the run data
        #[arg(long, default_value = "json", value_parser = ["json", "csv"])]
        output_format: String,
        /// Parse and preview only; nothing is sent
        #[arg(long)]
        dry_run: bool,
    },
    /// Download the benchmark file of an experiment
    Benchmark {
        /// Experiment ID
        id: String,
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Download the run data of an experiment
    Data {
        /// Experiment ID
        id: String,
        /// Data format
        #[arg(long, default_value = "hdf", value_parser = ["hdf", "json"])]
        format: String,
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Check that the backend is up
    Health,
}

impl Commands {
    /// Retries allowed after an unexpected error. An upload may already have
    /// saved an experiment, so it never runs twice.
    fn retry_budget(&self, retries: u32) -> u32 {
        match self {
            Commands::Upload { .. } => 0,
            _ => retries,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let retries = cli.command.retry_budget(cli.retries);
    let mut attempt = 0;
    loop {
        let err = match run(&cli).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        if views::is_notice(&err) {
            eprintln!("{}", views::notice_line(&err));
            std::process::exit(1);
        }
        eprintln!("{}", views::error_view(&err));
        if attempt >= retries {
            std::process::exit(1);
        }
        attempt += 1;
        eprintln!("\nTrying again ({}/{})...\n", attempt, retries);
    }
}

fn context(cli: &Cli) -> Result<ViewContext> {
    let mut config = DashboardConfig::from_env()?;
    if let Some(url) = &cli.backend_url {
        config = config.with_backend_url(url.as_str());
    }
    if let Some(zone) = &cli.timezone {
        config = config.with_display_zone(zone.parse()?);
    }
    Ok(ViewContext::new(config))
}

async fn run(cli: &Cli) -> Result<()> {
    let ctx = context(cli)?;
    let mut stdout = io::stdout();
    let out: &mut dyn Write = &mut stdout;

    match &cli.command {
        Commands::Dashboard { results } => {
            views::dashboard(&ctx, out, results.as_deref())?;
        }
        Commands::Experiments {
            status,
            limit,
            table,
        } => {
            let args = ListArgs {
                status: status.clone(),
                limit: *limit,
                table: table.clone().into(),
            };
            views::experiments(&ctx, out, &args).await?;
        }
        Commands::Status { id } => {
            views::status(&ctx, out, id).await?;
        }
        Commands::Results { results, table } => {
            views::results(&ctx, out, results.as_deref(), &table.clone().into())?;
        }
        Commands::Result {
            id,
            results,
            run,
            sort,
            desc,
        } => {
            let table = TableArgs {
                filter: run.clone(),
                sort: sort.clone(),
                desc: *desc,
            };
            views::result(&ctx, out, id, results.as_deref(), &table)?;
        }
        Commands::Upload {
            file,
            name,
            start,
            runs,
            output_format,
            dry_run,
        } => {
            let args = UploadArgs {
                file: file.clone(),
                name: name.clone(),
                start: *start,
                runs: *runs,
                output_format: match output_format.as_str() {
                    "csv" => OutputFormat::Csv,
                    _ => OutputFormat::Json,
                },
                dry_run: *dry_run,
            };
            views::upload(&ctx, out, &args).await?;
        }
        Commands::Benchmark { id, output } => {
            views::benchmark(&ctx, out, id, output.as_deref()).await?;
        }
        Commands::Data { id, format, output } => {
            let format = match format.as_str() {
                "json" => DataFormat::Json,
                _ => DataFormat::Hdf,
            };
            views::data(&ctx, out, id, format, output.as_deref()).await?;
        }
        Commands::Health => {
            views::health(&ctx, out).await?;
        }
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_is_never_retried() {
        let cli = Cli::parse_from(["oxn", "--retries", "3", "upload", "x.yaml", "--name", "a"]);
        assert_eq!(cli.command.retry_budget(cli.retries), 0);

        let cli = Cli::parse_from(["oxn", "--retries", "3", "results"]);
        assert_eq!(cli.command.retry_budget(cli.retries), 3);
    }

    #[test]
    fn test_data_format_flag() {
        let cli = Cli::parse_from(["oxn", "data", "42", "--format", "json"]);
        assert!(matches!(cli.command, Commands::Data { ref format, .. } if format == "json"));
        assert!(Cli::try_parse_from(["oxn", "data", "42", "--format", "xml"]).is_err());
    }
}
