//! Drives the subject loader over every discovered subject.

use std::path::Path;

use rayon::prelude::*;

use crate::dataset::{Split, SubjectDataset};
use crate::error::SubjectLoadError;
use crate::events::{Event, Recorder};
use crate::loader::{load_subject, LoadedSubject};
use crate::row::ValidationReport;

#[derive(Debug)]
pub struct Aggregation {
    /// Successfully loaded subjects, in discovery order.
    pub datasets: Vec<SubjectDataset>,
    /// Subjects that failed to load, in discovery order.
    pub failures: Vec<(String, SubjectLoadError)>,
    pub dropped: ValidationReport,
    pub attempted: usize,
}

impl Aggregation {
    pub fn succeeded(&self) -> usize {
        self.datasets.len()
    }

    pub fn subject_names(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(|d| d.subject.as_str())
    }
}

/// Loads every subject under `root`.
///
/// With `concurrency > 1` subjects load on a bounded rayon pool; results are
/// collected back into discovery order either way. A failing subject is
/// reported and left out, it never stops the others.
pub fn load_all_subjects(
    root: &Path,
    subjects: &[String],
    concurrency: usize,
    recorder: &dyn Recorder,
) -> Aggregation {
    let total = subjects.len();
    let load_one = |(i, subject): (usize, &String)| {
        recorder.record(
            Event::SubjectLoading,
            &[
                ("subject", subject.clone()),
                ("position", format!("{}/{}", i + 1, total)),
            ],
        );
        (subject.clone(), load_subject(root, subject, recorder))
    };

    let results: Vec<(String, Result<LoadedSubject, SubjectLoadError>)> = if concurrency > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(concurrency).build() {
            Ok(pool) => pool.install(|| subjects.par_iter().enumerate().map(load_one).collect()),
            Err(e) => {
                log::warn!("Cannot start {concurrency} workers ({e}), loading sequentially");
                subjects.iter().enumerate().map(load_one).collect()
            }
        }
    } else {
        subjects.iter().enumerate().map(load_one).collect()
    };

    let mut aggregation = Aggregation {
        datasets: Vec::with_capacity(total),
        failures: Vec::new(),
        dropped: ValidationReport::default(),
        attempted: total,
    };

    for (subject, result) in results {
        match result {
            Ok(loaded) => {
                recorder.record(
                    Event::SubjectLoaded,
                    &[
                        ("subject", subject),
                        ("dev_rows", loaded.dataset.len(Split::Dev).to_string()),
                        ("test_rows", loaded.dataset.len(Split::Test).to_string()),
                    ],
                );
                for (_, report) in &loaded.dropped {
                    aggregation.dropped.absorb(*report);
                }
                aggregation.datasets.push(loaded.dataset);
            }
            Err(e) => {
                recorder.record(
                    Event::SubjectFailed,
                    &[("subject", subject.clone()), ("error", e.to_string())],
                );
                aggregation.failures.push((subject, e));
            }
        }
    }

    recorder.record(
        Event::AggregationFinished,
        &[
            ("succeeded", aggregation.succeeded().to_string()),
            ("attempted", total.to_string()),
        ],
    );
    aggregation
}
