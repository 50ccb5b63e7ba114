//! # tablesync-cli
//!
//! Command-line interface for writing tabular payloads to spreadsheets and
//! merging keyed record files.

mod job;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use job::JobConfig;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tablesync_core::{
    parse_identifier_list, HeaderMismatchStrategy, InputFormat, OnUnmatched, WriteMode,
};
use tablesync_merge::{merge_files, DataKind, DataSpec, MergeRequest};
use tracing_subscriber::EnvFilter;

/// tablesync - reconcile CSV and JSON data into spreadsheet tables
#[derive(Parser)]
#[command(name = "tablesync")]
#[command(author, version, about = "Reconcile tabular data into spreadsheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Write a CSV or JSON payload to a table
    Post(PostArgs),
    /// Merge a patch data set into an input data set by id
    Merge(MergeArgs),
}

#[derive(Args)]
struct PostArgs {
    /// YAML job file naming the backend and write settings
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Payload file; stdin when omitted or `-`
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Payload format (csv, json)
    #[arg(short, long)]
    format: Option<InputFormat>,

    /// Write mode (replace, append, update, upsert)
    #[arg(short, long)]
    mode: Option<WriteMode>,

    /// Sheet or worksheet name
    #[arg(long)]
    sheet: Option<String>,

    /// Top-left cell for REPLACE, e.g. B3
    #[arg(long, value_name = "CELL")]
    start_cell: Option<String>,

    /// Comma-separated identifier columns
    #[arg(long, value_name = "A,B")]
    identifier_fields: Option<String>,

    /// What to do with unknown incoming columns (fail, ignore_fields, add_columns)
    #[arg(long)]
    header_mismatch: Option<HeaderMismatchStrategy>,

    /// What UPDATE does with unmatched rows (drop, append)
    #[arg(long)]
    on_unmatched: Option<OnUnmatched>,

    /// Do not write a header row
    #[arg(long)]
    no_header: bool,

    /// Style the written block as a table
    #[arg(long)]
    format_as_table: bool,

    /// Environment variable holding the access token
    #[arg(long, value_name = "VAR")]
    token_env: Option<String>,
}

#[derive(Args)]
struct MergeArgs {
    /// Data ID key
    id_key: String,

    /// Input data type (csv, json)
    input_type: DataKind,

    /// Input data path
    input_path: PathBuf,

    /// Patch data type (csv, json)
    patch_type: DataKind,

    /// Patch data path
    patch_path: PathBuf,

    /// Output data path, written in the input's format
    output_path: PathBuf,

    /// Path to the entry list in the input JSON structure
    #[arg(short = 'i', long, value_name = "PATH")]
    input_sub_path: Option<String>,

    /// Path to the entry list in the patch JSON structure
    #[arg(short = 'p', long, value_name = "PATH")]
    patch_sub_path: Option<String>,

    /// Input CSV parser arguments: arg=value,arg2=value2
    #[arg(short = 'a', long, value_name = "ARGS", default_value = "")]
    input_csv_args: String,

    /// Patch CSV parser arguments: arg=value,arg2=value2
    #[arg(short = 'b', long, value_name = "ARGS", default_value = "")]
    patch_csv_args: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Post(args) => run_post(args).await,
        Command::Merge(args) => run_merge(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout carries only command output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run_post(args: PostArgs) -> Result<()> {
    let mut job = JobConfig::load(&args.config)?;
    apply_overrides(&mut job, &args);

    let content = read_payload(args.input.as_deref())?;
    let mut source = job.open_backend()?;
    let target = source.describe();

    let outcome = tablesync_sheet::post(source.as_mut(), &content, job.format, job.write)
        .await
        .with_context(|| format!("Failed to write to {target}"))?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Command-line flags win over the job file.
fn apply_overrides(job: &mut JobConfig, args: &PostArgs) {
    let write = &mut job.write;
    if let Some(format) = args.format {
        job.format = format;
    }
    if let Some(mode) = args.mode {
        write.mode = mode;
    }
    if let Some(sheet) = &args.sheet {
        write.sheet_name.clone_from(sheet);
    }
    if let Some(cell) = &args.start_cell {
        write.start_cell.clone_from(cell);
    }
    if let Some(fields) = &args.identifier_fields {
        write.identifier_fields = parse_identifier_list(fields);
    }
    if let Some(strategy) = args.header_mismatch {
        write.header_mismatch_strategy = strategy;
    }
    if let Some(policy) = args.on_unmatched {
        write.on_unmatched = policy;
    }
    if args.no_header {
        write.include_header_row = false;
    }
    if args.format_as_table {
        write.format_as_table = true;
    }
    if let Some(var) = &args.token_env {
        job.token_env = Some(var.clone());
    }
}

fn read_payload(input: Option<&Path>) -> Result<Vec<u8>> {
    match input {
        Some(path) if path != Path::new("-") => std::fs::read(path)
            .with_context(|| format!("Failed to read input: {}", path.display())),
        _ => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read input from stdin")?;
            Ok(buffer)
        }
    }
}

fn run_merge(args: &MergeArgs) -> Result<()> {
    let request = merge_request(args);
    merge_files(&request)?;
    Ok(())
}

fn merge_request(args: &MergeArgs) -> MergeRequest {
    let mut input = DataSpec::new(&args.input_path, args.input_type)
        .with_csv_args(args.input_csv_args.as_str());
    input.sub_path.clone_from(&args.input_sub_path);

    let mut patch = DataSpec::new(&args.patch_path, args.patch_type)
        .with_csv_args(args.patch_csv_args.as_str());
    patch.sub_path.clone_from(&args.patch_sub_path);

    MergeRequest::new(args.id_key.as_str(), input, patch, &args.output_path)
}
