/*
cargo run --bin download_cmmlu

cargo run --bin download_cmmlu -- \
    --data-root data/teacher_data \
    --concurrency 8

offline, reusing an archive already at <data-root>/<archive-name>
cargo run --bin download_cmmlu -- --skip-download
*/

use anyhow::Result;
use clap::Parser;
use cmmlu_prep::config::{
    CMMLU_URL, DEFAULT_ARCHIVE_NAME, DEFAULT_DATA_ROOT, DEFAULT_EXTRACT_DIR, DEFAULT_MERGED_DIR,
    DEFAULT_SUBJECTS_DIR,
};
use cmmlu_prep::events::ConsoleRecorder;
use cmmlu_prep::logging::init_file_logger;
use cmmlu_prep::pipeline::{self, Outcome, RunReport};
use cmmlu_prep::report::summarize;
use cmmlu_prep::{PipelineConfig, PipelineError, Split};
use log::{error, info};
use std::path::PathBuf;

// CLI parameters
#[derive(Parser, Debug)]
#[command(version, about = "Download CMMLU and merge all subjects into dev/test")]
struct Cli {
    // Archive to download
    #[arg(long, default_value = CMMLU_URL)]
    url: String,

    // Root for the archive, extracted tables and outputs
    #[arg(long, value_name = "DIR", default_value = DEFAULT_DATA_ROOT)]
    data_root: PathBuf,

    #[arg(long, default_value = DEFAULT_ARCHIVE_NAME)]
    archive_name: String,

    #[arg(long, default_value = DEFAULT_EXTRACT_DIR)]
    extract_dir: String,

    #[arg(long, default_value = DEFAULT_MERGED_DIR)]
    merged_dir: String,

    // Used only when merging fails
    #[arg(long, default_value = DEFAULT_SUBJECTS_DIR)]
    subjects_dir: String,

    // Subjects loaded in parallel (1 = sequential)
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    // Subjects listed per split in the preview
    #[arg(long, default_value_t = 5)]
    top_n: usize,

    // Reuse the archive on disk instead of downloading
    #[arg(long, default_value_t = false)]
    skip_download: bool,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // logging setup
    let log_path = init_file_logger(&cli.log_dir, "download_cmmlu")?;
    info!("Starting CMMLU download");

    let cfg = PipelineConfig {
        url: cli.url.clone(),
        data_root: cli.data_root.clone(),
        archive_name: cli.archive_name.clone(),
        extract_dir: cli.extract_dir.clone(),
        merged_dir: cli.merged_dir.clone(),
        subjects_dir: cli.subjects_dir.clone(),
        concurrency: cli.concurrency,
    };

    println!("=== CMMLU Dataset Direct Download ===\n");
    let recorder = ConsoleRecorder::new();
    let result = if cli.skip_download {
        println!("📦 Using local archive {:?}", cfg.archive_path());
        pipeline::prepare(&cfg, &recorder)
    } else {
        println!("📥 Downloading {} ...", cfg.url);
        let client = reqwest::Client::builder().build()?;
        pipeline::run(&cfg, &client, &recorder).await
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!("Run aborted: {e}");
            println!("\n❌ Dataset download failed: {e}");
            print_hints(&e);
            println!("Log file           : {:?}", log_path);
            return Err(e.into());
        }
    };

    print_report(&cfg, &report, cli.top_n);
    println!("Log file           : {:?}", log_path);
    Ok(())
}

fn print_report(cfg: &PipelineConfig, report: &RunReport, top_n: usize) {
    let agg = &report.aggregation;

    println!("\n📋 Found {} subjects", report.subjects.len());
    for (i, subject) in report.subjects.iter().take(10).enumerate() {
        println!("{:2}. {subject}", i + 1);
    }
    if report.subjects.len() > 10 {
        println!("    ... and {} more", report.subjects.len() - 10);
    }

    println!("\n📊 Final Summary: {}/{} subjects loaded successfully", agg.succeeded(), agg.attempted);
    for (subject, e) in &agg.failures {
        println!("   ❌ {subject}: {e}");
    }
    if agg.dropped.dropped() > 0 {
        println!(
            "   ⚠️  dropped rows: {} empty question, {} invalid answer",
            agg.dropped.empty_question, agg.dropped.invalid_answer
        );
    }

    match &report.outcome {
        Outcome::Merged { dataset, path } => {
            println!("\n✅ All subjects merged and saved");
            println!("\n🔍 Complete CMMLU Dataset Preview:");
            println!("Total subjects loaded: {}", agg.succeeded());
            print!("{}", summarize(dataset, top_n));

            println!("\n=== Run summary ===");
            println!("Merged dataset     : {:?}", path);
            println!("Raw CSV files      : {:?}", cfg.extract_path());
            println!("Subjects loaded    : {}", agg.succeeded());
            let dev = dataset.split(Split::Dev).map_or(0, |s| s.len());
            let test = dataset.split(Split::Test).map_or(0, |s| s.len());
            println!("Dev questions      : {dev}");
            println!("Test questions     : {test}");
            println!("Total questions    : {}", dev + test);
        }
        Outcome::Fallback { reason, summary } => {
            println!("\n⚠️  Merge failed ({reason})");
            println!(
                "✅ Saved {} subjects individually under {:?}",
                summary.persisted.len(),
                cfg.subjects_path()
            );
            for (subject, e) in &summary.failed {
                println!("   ⚠️  Failed to save {subject}: {e}");
            }
        }
        Outcome::NoData => {
            println!("\n❌ No subject could be loaded from {:?}", cfg.extract_path());
        }
    }
}

fn print_hints(e: &PipelineError) {
    println!("💡 Fallback options:");
    if matches!(e, PipelineError::Network(_)) {
        println!("1. Check internet connection");
    } else {
        println!("1. Delete the archive and download it again");
    }
    println!("2. Try manual download from: https://github.com/haonan-li/CMMLU");
}
