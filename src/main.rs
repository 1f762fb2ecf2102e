use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;

use inventory_explorer::config::EngineConfig;
use inventory_explorer::data::export::{export_file_name, to_display_batch, write_csv};
use inventory_explorer::data::loader::load_files;
use inventory_explorer::data::selections::{load_selections, resolve};
use inventory_explorer::engine::spec::build_specs;
use inventory_explorer::engine::recompute;
use inventory_explorer::engine::summary::KeyColumns;

#[derive(Parser)]
#[command(
    name = "inventory-explorer",
    about = "Infer filters for a table, apply a selection and summarize key columns"
)]
struct Cli {
    /// Input files (CSV, JSON, Parquet). Several files are stacked into one table.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON file with per-column selections.
    #[arg(short, long)]
    selections: Option<PathBuf>,

    /// JSON list of key columns `[{"name": .., "kind": "categorical|numeric|date"}]`.
    /// Defaults to the inventory key columns.
    #[arg(short, long)]
    keys: Option<PathBuf>,

    /// JSON engine configuration (thresholds, date formats).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the inferred filter specs instead of the report.
    #[arg(long)]
    specs: bool,

    /// Print the first N filtered rows as a table.
    #[arg(long, value_name = "N")]
    preview: Option<usize>,

    /// Write the filtered table as CSV. A directory gets the default file name.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let keys = match &cli.keys {
        Some(path) => KeyColumns::from_json_file(path)
            .with_context(|| format!("loading key columns {}", path.display()))?,
        None => KeyColumns::inventory(),
    };

    let paths: Vec<&Path> = cli.files.iter().map(PathBuf::as_path).collect();
    let table = load_files(&paths).context("loading input table")?;

    if cli.specs {
        let specs = build_specs(&table, &config);
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    let selections = match &cli.selections {
        Some(path) => {
            let raw = load_selections(path)
                .with_context(|| format!("loading selections {}", path.display()))?;
            resolve(&build_specs(&table, &config), &raw)
        }
        None => Default::default(),
    };

    let out = recompute(&table, &keys, &selections, &config);
    println!("{}", serde_json::to_string_pretty(&out)?);

    if let Some(n) = cli.preview {
        let batch = to_display_batch(&out.filtered, n)?;
        println!("{}", pretty_format_batches(&[batch])?);
    }

    if let Some(output) = &cli.output {
        let path = if output.is_dir() {
            output.join(export_file_name(chrono::Local::now().date_naive()))
        } else {
            output.clone()
        };
        let file = std::fs::File::create(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        write_csv(&out.filtered, file)?;
        log::info!("Wrote {} filtered rows to {}", out.filtered.len(), path.display());
    }

    Ok(())
}
