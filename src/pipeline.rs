//! Fetch, extract, load and merge, with per-subject fallback.

use std::path::PathBuf;

use log::{info, warn};
use reqwest::Client;

use crate::aggregate::{load_all_subjects, Aggregation};
use crate::config::PipelineConfig;
use crate::dataset::MergedDataset;
use crate::error::PipelineError;
use crate::events::{Event, Recorder};
use crate::extract::extract_archive;
use crate::fallback::{persist_subjects, FallbackSummary};
use crate::fetch::download_archive;
use crate::loader::discover_subjects;
use crate::merge::merge_subjects;
use crate::store::{discard_merged, save_merged};

pub const LISTED_SUBJECTS: usize = 10;

/// Where a run ended up.
#[derive(Debug)]
pub enum Outcome {
    /// The merged dataset was written to `path`.
    Merged { dataset: MergedDataset, path: PathBuf },
    /// No merged dataset exists; subjects were saved one by one.
    Fallback {
        reason: String,
        summary: FallbackSummary,
    },
    /// Nothing loaded, nothing written.
    NoData,
}

#[derive(Debug)]
pub struct RunReport {
    /// Subjects discovered after extraction, in load order.
    pub subjects: Vec<String>,
    pub aggregation: Aggregation,
    pub outcome: Outcome,
}

/// Downloads the archive, then runs [`prepare`].
///
/// A download failure ends the run before anything is extracted.
pub async fn run(
    cfg: &PipelineConfig,
    client: &Client,
    recorder: &dyn Recorder,
) -> Result<RunReport, PipelineError> {
    let archive = cfg.archive_path();
    recorder.record(
        Event::DownloadStarted,
        &[("url", cfg.url.clone()), ("path", archive.display().to_string())],
    );
    let bytes = download_archive(client, &cfg.url, &archive).await?;
    recorder.record(
        Event::ArchiveDownloaded,
        &[("bytes", bytes.to_string()), ("path", archive.display().to_string())],
    );
    prepare(cfg, recorder)
}

/// Extracts the archive already at `cfg.archive_path()`, loads and merges
/// every subject and persists the result.
///
/// Only archive and directory-listing failures are errors. Subject, merge
/// and persistence failures shrink the result and are reported instead.
pub fn prepare(cfg: &PipelineConfig, recorder: &dyn Recorder) -> Result<RunReport, PipelineError> {
    let archive = cfg.archive_path();
    let root = cfg.extract_path();

    let files = extract_archive(&archive, &root)?;
    recorder.record(
        Event::ArchiveExtracted,
        &[("files", files.to_string()), ("path", root.display().to_string())],
    );

    let subjects = discover_subjects(&root).map_err(|source| PipelineError::Discover {
        path: root.clone(),
        source,
    })?;
    let mut listed = subjects
        .iter()
        .take(LISTED_SUBJECTS)
        .cloned()
        .collect::<Vec<_>>()
        .join(",");
    if subjects.len() > LISTED_SUBJECTS {
        listed.push_str(&format!(" ... and {} more", subjects.len() - LISTED_SUBJECTS));
    }
    recorder.record(
        Event::SubjectsDiscovered,
        &[("count", subjects.len().to_string()), ("subjects", listed)],
    );

    let aggregation = load_all_subjects(&root, &subjects, cfg.concurrency.max(1), recorder);
    info!(
        "{}/{} subjects loaded successfully",
        aggregation.succeeded(),
        aggregation.attempted
    );

    if aggregation.datasets.is_empty() {
        warn!("No subject could be loaded from {:?}", root);
        return Ok(RunReport {
            subjects,
            aggregation,
            outcome: Outcome::NoData,
        });
    }

    let outcome = merge_or_fallback(cfg, &aggregation, recorder);
    Ok(RunReport {
        subjects,
        aggregation,
        outcome,
    })
}

fn merge_or_fallback(
    cfg: &PipelineConfig,
    aggregation: &Aggregation,
    recorder: &dyn Recorder,
) -> Outcome {
    let reason = match merge_subjects(&aggregation.datasets, recorder) {
        Ok(dataset) => {
            let path = cfg.merged_path();
            match save_merged(&dataset, &path) {
                Ok(()) => {
                    recorder.record(
                        Event::MergedPersisted,
                        &[
                            ("path", path.display().to_string()),
                            ("rows", dataset.total_rows().to_string()),
                        ],
                    );
                    return Outcome::Merged { dataset, path };
                }
                Err(e) => format!("saving merged dataset failed: {e}"),
            }
        }
        Err(e) => e.to_string(),
    };

    recorder.record(Event::MergeFailed, &[("reason", reason.clone())]);
    // an older merged dataset must not pass for this run's output
    let merged = cfg.merged_path();
    if let Err(e) = discard_merged(&merged) {
        warn!("Stale merged dataset left at {:?}: {e}", merged);
    }
    let summary = persist_subjects(&aggregation.datasets, &cfg.subjects_path(), recorder);
    Outcome::Fallback { reason, summary }
}
