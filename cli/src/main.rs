mod config;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cohort_core::{CohortConfig, SourceSnapshot};
use cohort_csv::{load_snapshot, write_cohort, write_cohort_file};
use cohort_engine::derive_cohort;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cohort-cli",
    about = "Derive a cardiogenic shock cohort from an ICU CSV extract."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dựng bảng cohort và in các bước sàng lọc.
    Derive {
        #[command(flatten)]
        source: SourceArgs,
        /// File đích. Bỏ trống thì ghi ra stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
    },
    /// Chỉ in số lượng còn lại qua từng bước.
    Attrition {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Thư mục chứa các file CSV trích xuất.
    #[arg(short, long)]
    data_dir: PathBuf,
    /// File JSON ghi đè cấu hình mặc định.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Đơn vị điều trị được chọn, ghi đè cấu hình.
    #[arg(long)]
    care_unit: Option<String>,
    /// Ghi log mức debug trừ khi đã đặt RUST_LOG.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Csv,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Derive {
            source,
            output,
            format,
        } => run_derive(source, output, format),
        Command::Attrition { source, json } => run_attrition(source, json),
    }
}

fn prepare(source: SourceArgs) -> anyhow::Result<(SourceSnapshot, CohortConfig)> {
    init_logging(source.verbose);
    let config = config::resolve(source.config.as_deref(), source.care_unit)?;
    let snapshot = load_snapshot(&source.data_dir)
        .with_context(|| format!("could not load extract from {}", source.data_dir.display()))?;
    Ok((snapshot, config))
}

fn run_derive(source: SourceArgs, output: Option<PathBuf>, format: Format) -> anyhow::Result<()> {
    let (snapshot, config) = prepare(source)?;
    let run = derive_cohort(&snapshot, &config)?;

    match (format, output) {
        (Format::Csv, Some(path)) => {
            write_cohort_file(&path, &run.cohort)
                .with_context(|| format!("could not write {}", path.display()))?;
        }
        (Format::Csv, None) => write_cohort(io::stdout().lock(), &run.cohort)?,
        (Format::Json, Some(path)) => {
            let data = serde_json::to_string_pretty(&run)?;
            std::fs::write(&path, data)
                .with_context(|| format!("could not write {}", path.display()))?;
        }
        (Format::Json, None) => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &run)?;
            writeln!(stdout)?;
        }
    }

    eprintln!("{}\n{}", run.attrition, run.summary);
    Ok(())
}

fn run_attrition(source: SourceArgs, json: bool) -> anyhow::Result<()> {
    let (snapshot, config) = prepare(source)?;
    let run = derive_cohort(&snapshot, &config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&run.attrition)?);
    } else {
        print!("{}", run.attrition);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
