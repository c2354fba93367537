//! Per-subject CSV loading, cleaning and validation.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::dataset::{Split, SubjectDataset};
use crate::error::SubjectLoadError;
use crate::events::{Event, Recorder};
use crate::row::{validate_rows, Row, ValidationReport};

pub const TABLE_EXT: &str = "csv";

pub fn table_path(root: &Path, split: Split, subject: &str) -> PathBuf {
    root.join(split.as_str())
        .join(format!("{subject}.{TABLE_EXT}"))
}

/// Subjects are the table files in `<root>/dev`, sorted by name.
/// A missing dev directory yields no subjects.
pub fn discover_subjects(root: &Path) -> std::io::Result<Vec<String>> {
    let dev_dir = root.join(Split::Dev.as_str());
    if !dev_dir.is_dir() {
        warn!("No dev directory at {:?}", dev_dir);
        return Ok(Vec::new());
    }

    let mut subjects = Vec::new();
    for entry in fs::read_dir(&dev_dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(TABLE_EXT) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            subjects.push(stem.to_string());
        }
    }
    subjects.sort();
    Ok(subjects)
}

#[derive(Debug, Clone)]
pub struct LoadedSubject {
    pub dataset: SubjectDataset,
    pub dropped: Vec<(Split, ValidationReport)>,
}

/// Loads `dev/<subject>.csv` and `test/<subject>.csv` under `root`.
///
/// Absent files leave the split empty. Validation drops are reported as
/// [`Event::RowsDropped`] warnings; only structural problems are errors.
pub fn load_subject(
    root: &Path,
    subject: &str,
    recorder: &dyn Recorder,
) -> Result<LoadedSubject, SubjectLoadError> {
    let mut dataset = SubjectDataset::new(subject);
    let mut dropped = Vec::new();

    for split in Split::ALL {
        let path = table_path(root, split, subject);
        if !path.is_file() {
            debug!("{subject}: no {split} table at {:?}", path);
            continue;
        }

        let raw = read_table(&path)?;
        let total = raw.len();
        let (rows, report) = validate_rows(raw);
        if report.dropped() > 0 {
            recorder.record(
                Event::RowsDropped,
                &[
                    ("subject", subject.to_string()),
                    ("split", split.to_string()),
                    ("empty_question", report.empty_question.to_string()),
                    ("invalid_answer", report.invalid_answer.to_string()),
                ],
            );
        }
        debug!("{subject} {split}: kept {} of {total} rows", rows.len());
        dropped.push((split, report));
        dataset.set_split(split, rows);
    }

    Ok(LoadedSubject { dataset, dropped })
}

// header position → where its cells go
enum Column {
    Recognized(String),
    Extra(String),
    Skip,
}

/// Parses one table into cleaned rows: missing cells become empty text.
pub fn read_table(path: &Path) -> Result<Vec<Row>, SubjectLoadError> {
    let csv_err = |source: csv::Error| SubjectLoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let columns = map_columns(path, &headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if record.len() > columns.len() {
            return Err(SubjectLoadError::RaggedRow {
                path: path.to_path_buf(),
                line: record.position().map_or(0, |p| p.line()),
                expected: columns.len(),
                found: record.len(),
            });
        }

        let mut row = Row::default();
        for (idx, column) in columns.iter().enumerate() {
            let cell = record.get(idx).unwrap_or_default().to_string();
            match column {
                Column::Recognized(name) => {
                    if let Some(slot) = row.recognized_mut(name) {
                        *slot = cell;
                    }
                }
                Column::Extra(name) => {
                    row.extra.insert(name.clone(), cell);
                }
                Column::Skip => {}
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

fn map_columns(path: &Path, headers: &csv::StringRecord) -> Result<Vec<Column>, SubjectLoadError> {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(headers.len());

    for header in headers.iter() {
        let name = header.trim_start_matches('\u{feff}').trim();
        if name.is_empty() {
            // unnamed row-index column
            columns.push(Column::Skip);
            continue;
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(SubjectLoadError::DuplicateColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            });
        }
        if Row::default().recognized_mut(name).is_some() {
            columns.push(Column::Recognized(name.to_string()));
        } else {
            columns.push(Column::Extra(name.to_string()));
        }
    }

    if !seen.contains("question") {
        return Err(SubjectLoadError::MissingColumn {
            path: path.to_path_buf(),
            column: "question",
        });
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{field, MemoryRecorder};
    use tempfile::TempDir;

    const HEADER: &str = ",Question,A,B,C,D,Answer\n";

    fn write_table(root: &Path, split: Split, subject: &str, body: &str) {
        let path = table_path(root, split, subject);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn invalid_answers_are_dropped_and_reported() {
        let tmp = TempDir::new().unwrap();
        write_table(
            tmp.path(),
            Split::Dev,
            "math",
            &format!("{HEADER}0,1+1?,1,2,3,4,B\n1,2+2?,2,4,6,8,B\n2,3+3?,3,6,9,12,B\n3,bad?,1,1,1,1,E\n"),
        );
        let rec = MemoryRecorder::new();

        let loaded = load_subject(tmp.path(), "math", &rec).unwrap();

        assert_eq!(loaded.dataset.dev.as_ref().unwrap().len(), 3);
        assert!(loaded.dataset.test.is_none());
        let drops = rec.fields_of(Event::RowsDropped);
        assert_eq!(drops.len(), 1);
        assert_eq!(field(&drops[0], "invalid_answer"), Some("1"));
        assert_eq!(
            loaded.dropped,
            vec![(Split::Dev, ValidationReport { empty_question: 0, invalid_answer: 1 })]
        );
    }

    #[test]
    fn missing_cells_become_empty_text() {
        let tmp = TempDir::new().unwrap();
        write_table(
            tmp.path(),
            Split::Test,
            "law",
            "Question,A,B,C,D,Answer,Source\nwho?,x,,z\nwhat?,x,y,z,w,A,\n   ,x,y,z,w,A,book\n",
        );

        let loaded = load_subject(tmp.path(), "law", &MemoryRecorder::new()).unwrap();
        let test = loaded.dataset.test.unwrap();

        // first row has an empty answer, third a blank question
        assert_eq!(test.len(), 1);
        assert_eq!(test[0].question, "what?");
        assert_eq!(test[0].d, "w");
        assert_eq!(test[0].extra.get("Source").map(String::as_str), Some(""));
        assert_eq!(
            loaded.dropped,
            vec![(Split::Test, ValidationReport { empty_question: 1, invalid_answer: 1 })]
        );
    }

    #[test]
    fn absent_files_give_an_empty_dataset() {
        let tmp = TempDir::new().unwrap();
        let loaded = load_subject(tmp.path(), "ghost", &MemoryRecorder::new()).unwrap();
        assert_eq!(loaded.dataset.splits().count(), 0);
    }

    #[test]
    fn structural_problems_are_errors() {
        let tmp = TempDir::new().unwrap();
        write_table(tmp.path(), Split::Dev, "dup", "Question,question,Answer\nq,q,A\n");
        write_table(tmp.path(), Split::Dev, "noq", "A,B,Answer\n1,2,A\n");
        write_table(tmp.path(), Split::Dev, "wide", "Question,Answer\nq,A,extra\n");
        let rec = MemoryRecorder::new();

        assert!(matches!(
            load_subject(tmp.path(), "dup", &rec),
            Err(SubjectLoadError::DuplicateColumn { .. })
        ));
        assert!(matches!(
            load_subject(tmp.path(), "noq", &rec),
            Err(SubjectLoadError::MissingColumn { column: "question", .. })
        ));
        assert!(matches!(
            load_subject(tmp.path(), "wide", &rec),
            Err(SubjectLoadError::RaggedRow { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn non_utf8_table_is_a_load_error() {
        let tmp = TempDir::new().unwrap();
        let path = table_path(tmp.path(), Split::Dev, "bin");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"Question,Answer\n\xff\xfe,A\n").unwrap();

        let err = load_subject(tmp.path(), "bin", &MemoryRecorder::new()).unwrap_err();
        assert!(matches!(err, SubjectLoadError::Csv { .. }));
    }

    #[test]
    fn subjects_come_from_dev_tables_only() {
        let tmp = TempDir::new().unwrap();
        write_table(tmp.path(), Split::Dev, "physics", HEADER);
        write_table(tmp.path(), Split::Dev, "arts", HEADER);
        write_table(tmp.path(), Split::Test, "only_test", HEADER);
        fs::write(tmp.path().join("dev").join("README.md"), "x").unwrap();

        assert_eq!(discover_subjects(tmp.path()).unwrap(), vec!["arts", "physics"]);
        assert!(discover_subjects(&tmp.path().join("nowhere")).unwrap().is_empty());
    }
}
