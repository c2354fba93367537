/*
cargo run --bin preview_dataset

cargo run --bin preview_dataset -- \
    --dataset-dir data/teacher_data/cmmlu_all_subjects \
    --top-n 10
*/

use anyhow::{Context, Result};
use clap::Parser;
use cmmlu_prep::report::summarize;
use cmmlu_prep::store::load_merged;
use std::path::PathBuf;

// Print the preview of a merged dataset saved by download_cmmlu
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, value_name = "DIR", default_value = "data/teacher_data/cmmlu_all_subjects")]
    dataset_dir: PathBuf,

    // Subjects listed per split
    #[arg(long, default_value_t = 5)]
    top_n: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let dataset = load_merged(&args.dataset_dir)
        .with_context(|| format!("loading {}", args.dataset_dir.display()))?;
    let summary = summarize(&dataset, args.top_n);

    println!("🔍 Dataset at {}", args.dataset_dir.display());
    print!("{summary}");
    println!("\nTotal questions: {}", summary.total_rows());
    Ok(())
}
