/*
cargo run --bin student_download

cargo run --bin student_download -- \
    --repo google/gemma-2b \
    --dst models/student_initial \
    --token xxx
*/

use anyhow::{Context, Result};
use clap::Parser;
use hf_hub::{api::sync::ApiBuilder, Repo, RepoType};
use std::path::PathBuf;

// Pull a small pretrained student model (weights + tokenizer) into a local dir
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    // Hub repository ID, e.g. microsoft/phi-1_5, google/gemma-2b, mistralai/Mistral-7B-v0.1
    #[arg(long, default_value = "microsoft/phi-1_5")]
    repo: String,

    #[arg(long, default_value = "main")]
    revision: String,

    // Destination directory
    #[arg(long, value_name = "DIR", default_value = "models/student_initial")]
    dst: PathBuf,

    // HF access token (falls back to cached creds)
    #[arg(long, env = "HF_TOKEN")]
    token: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    std::fs::create_dir_all(&args.dst)
        .with_context(|| format!("creating {}", args.dst.display()))?;

    let api = ApiBuilder::new().with_token(args.token.clone()).build()?;
    let repo = Repo::with_revision(args.repo.clone(), RepoType::Model, args.revision.clone());
    let handle = api.repo(repo);

    println!("⇣  Pulling {} → {:?}", args.repo, args.dst);

    let files = handle
        .info()
        .with_context(|| format!("fetching file list of {}", args.repo))?
        .siblings;
    let mut has_tokenizer = false;
    for sib in files {
        let remote = sib.rfilename;
        has_tokenizer |= remote.starts_with("tokenizer");

        // lands in the HF cache first, reused on later runs
        let cached = handle
            .get(&remote)
            .with_context(|| format!("downloading {remote}"))?;

        let local = args.dst.join(&remote);
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if std::fs::hard_link(&cached, &local).is_err() {
            std::fs::copy(&cached, &local)
                .with_context(|| format!("copying {remote} into {}", args.dst.display()))?;
        }
        println!("   {remote}");
    }

    if !has_tokenizer {
        println!("⚠️  {} ships no tokenizer files", args.repo);
    }
    println!("✔  Done - model and tokenizer are at {:?}", args.dst);
    Ok(())
}
