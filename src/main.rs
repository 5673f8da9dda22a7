use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use weir::generate::{generate_file, generated_path, label_for_rows};
use weir::report::{ResultRow, append_result};
use weir::rusage::time_command;
use weir::{RunSummary, run_file};

const DEFAULT_SIZES: &str = "100000,1000000,5000000";

#[derive(Parser, Debug)]
#[command(
    name = "weir",
    version,
    about = "Streaming CSV ingestion gate and benchmark harness"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Generate benchmark inputs by cycling a seed CSV")]
    Generate {
        #[arg(long, help = "Seed CSV whose rows are cycled")]
        seed: PathBuf,
        #[arg(long, default_value = "bench/generated", help = "Output directory")]
        out_dir: PathBuf,
        #[arg(long, default_value = DEFAULT_SIZES, help = "Comma-separated row counts")]
        sizes: String,
        #[arg(
            long,
            default_value_t = 10_000,
            help = "Blank pickup_datetime on every Nth row (0 disables)"
        )]
        invalid_every: u64,
        #[arg(long, default_value = "uber", help = "Dataset name used in file names")]
        dataset: String,
    },
    #[command(about = "Run the ingestion gate over one input file")]
    Run {
        #[arg(short, long, help = "Input CSV (row_id,pickup_datetime,lat,lon,base)")]
        input: PathBuf,
        #[arg(long, help = "Accepted partition path")]
        accepted: PathBuf,
        #[arg(long, help = "Rejected partition path")]
        rejected: PathBuf,
        #[arg(long, help = "Also append a result row to this CSV")]
        results_file: Option<PathBuf>,
        #[arg(long, default_value = "weir")]
        tool: String,
        #[arg(long, default_value = "uber")]
        dataset: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    #[command(about = "Generate missing inputs, run each size, record results")]
    Bench {
        #[arg(long, help = "Seed CSV whose rows are cycled")]
        seed: PathBuf,
        #[arg(long, default_value = "bench/generated", help = "Generated-input directory")]
        gen_dir: PathBuf,
        #[arg(long, default_value = "bench/out", help = "Partition output directory")]
        out_dir: PathBuf,
        #[arg(long, default_value = "bench/results/results.csv")]
        results_file: PathBuf,
        #[arg(long, default_value = DEFAULT_SIZES, help = "Comma-separated row counts")]
        sizes: String,
        #[arg(long, default_value_t = 10_000)]
        invalid_every: u64,
        #[arg(long, default_value = "weir")]
        tool: String,
        #[arg(long, default_value = "uber")]
        dataset: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    #[command(about = "Append one result row to a results CSV")]
    Record {
        #[arg(long)]
        results_file: PathBuf,
        #[arg(long)]
        tool: String,
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        rows: u64,
        #[arg(long)]
        wall_time: f64,
        #[arg(long)]
        peak_rss: Option<f64>,
        #[arg(long)]
        accepted: u64,
        #[arg(long)]
        rejected: u64,
        #[arg(long, default_value = "")]
        notes: String,
    },
    #[command(about = "Time a command: wall time, children peak RSS, exit code as JSON")]
    Time {
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            required = true,
            help = "Command and arguments"
        )]
        command: Vec<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match dispatch(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Generate {
            seed,
            out_dir,
            sizes,
            invalid_every,
            dataset,
        } => {
            for rows in parse_sizes(&sizes)? {
                let out = generated_path(&out_dir, &dataset, rows);
                generate_file(&seed, &out, rows, invalid_every)?;
                println!("generated {} ({rows} rows)", out.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            input,
            accepted,
            rejected,
            results_file,
            tool,
            dataset,
            notes,
        } => {
            let summary = run_file(&input, &accepted, &rejected)?;
            if let Some(results_file) = results_file {
                record_summary(&results_file, &tool, &dataset, &notes, &summary)?;
            }
            println!("{}", summary_line(&summary));
            Ok(ExitCode::SUCCESS)
        }
        Command::Bench {
            seed,
            gen_dir,
            out_dir,
            results_file,
            sizes,
            invalid_every,
            tool,
            dataset,
            notes,
        } => {
            for rows in parse_sizes(&sizes)? {
                let label = label_for_rows(rows);
                let input = generated_path(&gen_dir, &dataset, rows);
                if !input.exists() {
                    info!(path = %input.display(), rows, "generating missing input");
                    generate_file(&seed, &input, rows, invalid_every)?;
                }
                let accepted = out_dir.join(format!("{dataset}_{label}.accepted.csv"));
                let rejected = out_dir.join(format!("{dataset}_{label}.rejected.csv"));
                let summary = run_file(&input, &accepted, &rejected)?;
                record_summary(&results_file, &tool, &dataset, &notes, &summary)?;
                println!("{tool} {label} done: {}", summary_line(&summary));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Record {
            results_file,
            tool,
            dataset,
            rows,
            wall_time,
            peak_rss,
            accepted,
            rejected,
            notes,
        } => {
            append_result(
                &results_file,
                &ResultRow {
                    tool,
                    dataset,
                    rows,
                    wall_time_s: wall_time,
                    peak_rss_mb: peak_rss,
                    accepted_rows: accepted,
                    rejected_rows: rejected,
                    notes,
                },
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Time { command } => {
            let timing = time_command(&command)?;
            println!("{}", serde_json::to_string(&timing)?);
            // The wrapper's only failure signal is the exit code.
            Ok(ExitCode::from(timing.exit_code.clamp(0, 255) as u8))
        }
    }
}

fn record_summary(
    results_file: &Path,
    tool: &str,
    dataset: &str,
    notes: &str,
    summary: &RunSummary,
) -> Result<()> {
    append_result(
        results_file,
        &ResultRow {
            tool: tool.to_string(),
            dataset: dataset.to_string(),
            rows: summary.total_rows,
            wall_time_s: summary.wall_time_s,
            peak_rss_mb: summary.peak_rss_mb,
            accepted_rows: summary.accepted_rows,
            rejected_rows: summary.rejected_rows,
            notes: notes.to_string(),
        },
    )
}

fn summary_line(summary: &RunSummary) -> String {
    format!(
        "total={} accepted={} rejected={} (invalid={}, duplicates={}) wall_time_s={:.4}",
        summary.total_rows,
        summary.accepted_rows,
        summary.rejected_rows,
        summary.invalid_rows,
        summary.duplicate_rows,
        summary.wall_time_s
    )
}

fn parse_sizes(text: &str) -> Result<Vec<u64>> {
    let mut sizes = Vec::new();
    for part in text.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let rows: u64 = part
            .parse()
            .with_context(|| format!("invalid row count {part:?}"))?;
        sizes.push(rows);
    }
    if sizes.is_empty() {
        bail!("no row counts given");
    }
    Ok(sizes)
}
