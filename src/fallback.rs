use std::path::Path;

use crate::dataset::SubjectDataset;
use crate::error::PersistError;
use crate::events::{Event, Recorder};
use crate::store::save_subject;

#[derive(Debug, Default)]
pub struct FallbackSummary {
    pub persisted: Vec<String>,
    pub failed: Vec<(String, PersistError)>,
}

/// Saves every subject under `<subjects_dir>/<subject>/`.
///
/// Used when no merged dataset can be produced. A subject that fails to save
/// is reported and skipped; the rest are still written.
pub fn persist_subjects(
    datasets: &[SubjectDataset],
    subjects_dir: &Path,
    recorder: &dyn Recorder,
) -> FallbackSummary {
    let mut summary = FallbackSummary::default();

    for dataset in datasets {
        let dir = subjects_dir.join(&dataset.subject);
        match save_subject(dataset, &dir) {
            Ok(()) => {
                recorder.record(
                    Event::SubjectPersisted,
                    &[
                        ("subject", dataset.subject.clone()),
                        ("path", dir.display().to_string()),
                    ],
                );
                summary.persisted.push(dataset.subject.clone());
            }
            Err(e) => {
                recorder.record(
                    Event::PersistFailed,
                    &[("subject", dataset.subject.clone()), ("error", e.to_string())],
                );
                summary.failed.push((dataset.subject.clone(), e));
            }
        }
    }

    recorder.record(
        Event::FallbackFinished,
        &[
            ("persisted", summary.persisted.len().to_string()),
            ("failed", summary.failed.len().to_string()),
        ],
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Split;
    use crate::events::MemoryRecorder;
    use crate::row::Row;
    use std::fs;
    use tempfile::TempDir;

    fn dataset(name: &str) -> SubjectDataset {
        let mut ds = SubjectDataset::new(name);
        ds.set_split(
            Split::Test,
            vec![Row {
                question: format!("{name}?"),
                answer: "C".into(),
                ..Row::default()
            }],
        );
        ds
    }

    #[test]
    fn every_subject_gets_its_own_directory() {
        let tmp = TempDir::new().unwrap();
        let input = vec![dataset("art"), dataset("law")];
        let rec = MemoryRecorder::new();

        let summary = persist_subjects(&input, tmp.path(), &rec);

        assert_eq!(summary.persisted, vec!["art", "law"]);
        assert!(summary.failed.is_empty());
        assert!(tmp.path().join("law").join("test.json").is_file());
        assert_eq!(rec.count(Event::SubjectPersisted), 2);
    }

    #[test]
    fn one_failed_save_does_not_stop_the_others() {
        let tmp = TempDir::new().unwrap();
        // a plain file where the subject directory should go
        fs::write(tmp.path().join("blocked"), "not a dir").unwrap();
        let input = vec![dataset("art"), dataset("blocked"), dataset("law")];
        let rec = MemoryRecorder::new();

        let summary = persist_subjects(&input, tmp.path(), &rec);

        assert_eq!(summary.persisted, vec!["art", "law"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "blocked");
        assert_eq!(rec.count(Event::PersistFailed), 1);
    }
}
