//! Unifies every subject's splits into one dev and one test collection.

use std::collections::HashSet;

use crate::dataset::{MergedDataset, MergedRow, MergedSplit, Split, SubjectDataset};
use crate::error::MergeError;
use crate::events::{Event, Recorder};
use crate::row::{validate_rows, RECOGNIZED_COLUMNS};

/// Columns added by the merge itself.
pub const TAG_COLUMNS: [&str; 2] = ["subject", "split"];

/// Merges dev then test across `datasets`, in the order given.
///
/// The input is only borrowed; the merged rows are independent copies.
pub fn merge_subjects(
    datasets: &[SubjectDataset],
    recorder: &dyn Recorder,
) -> Result<MergedDataset, MergeError> {
    let mut merged = MergedDataset::default();
    for split in Split::ALL {
        let unified = merge_split(datasets, split, recorder)?;
        match split {
            Split::Dev => merged.dev = unified,
            Split::Test => merged.test = unified,
        }
    }
    Ok(merged)
}

fn merge_split(
    datasets: &[SubjectDataset],
    split: Split,
    recorder: &dyn Recorder,
) -> Result<Option<MergedSplit>, MergeError> {
    let mut rows: Vec<MergedRow> = Vec::new();
    let mut contributors = 0usize;

    for dataset in datasets {
        let Some(source) = dataset.split(split) else {
            continue;
        };
        contributors += 1;

        let tagged: Vec<MergedRow> = source
            .iter()
            .map(|row| MergedRow {
                row: row.clone(),
                subject: dataset.subject.clone(),
                split,
            })
            .collect();

        // rows reaching here normally passed the loader already
        let (kept, report) = validate_rows(tagged);
        if report.dropped() > 0 {
            recorder.record(
                Event::RowsDropped,
                &[
                    ("subject", dataset.subject.clone()),
                    ("split", split.to_string()),
                    ("stage", "merge".to_string()),
                    ("empty_question", report.empty_question.to_string()),
                    ("invalid_answer", report.invalid_answer.to_string()),
                ],
            );
        }
        rows.extend(kept);
    }

    if contributors == 0 {
        return Ok(None);
    }

    let columns = unify_columns(&mut rows)?;
    recorder.record(
        Event::SplitMerged,
        &[
            ("split", split.to_string()),
            ("rows", rows.len().to_string()),
            ("subjects", contributors.to_string()),
            ("columns", columns.len().to_string()),
        ],
    );
    Ok(Some(MergedSplit {
        split,
        columns,
        rows,
    }))
}

/// Gives every row the same extra columns, filling gaps with empty text, and
/// returns the resulting schema in output order.
fn unify_columns(rows: &mut [MergedRow]) -> Result<Vec<String>, MergeError> {
    for r in rows.iter() {
        if let Some(column) = r.row.extra.keys().find(|c| is_reserved(c)) {
            return Err(MergeError::ColumnConflict {
                subject: r.subject.clone(),
                column: column.clone(),
            });
        }
    }

    let extras = extra_columns(rows);
    for r in rows.iter_mut() {
        for column in &extras {
            r.row.extra.entry(column.clone()).or_default();
        }
    }

    Ok(schema(extras))
}

/// Extra column names in order of first appearance across `rows`.
pub fn extra_columns(rows: &[MergedRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut extras = Vec::new();
    for r in rows {
        for column in r.row.extra.keys() {
            if seen.insert(column.as_str()) {
                extras.push(column.clone());
            }
        }
    }
    extras
}

/// Recognized columns, then `extras`, then the tag columns.
pub fn schema(extras: impl IntoIterator<Item = String>) -> Vec<String> {
    RECOGNIZED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(extras)
        .chain(TAG_COLUMNS.iter().map(|c| c.to_string()))
        .collect()
}

fn is_reserved(column: &str) -> bool {
    let column = column.trim();
    RECOGNIZED_COLUMNS
        .iter()
        .chain(TAG_COLUMNS.iter())
        .any(|r| r.eq_ignore_ascii_case(column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemoryRecorder;
    use crate::row::Row;

    fn row(q: &str, answer: &str) -> Row {
        Row {
            question: q.into(),
            answer: answer.into(),
            ..Row::default()
        }
    }

    fn subject(name: &str, dev: Option<Vec<Row>>, test: Option<Vec<Row>>) -> SubjectDataset {
        SubjectDataset {
            subject: name.into(),
            dev,
            test,
        }
    }

    #[test]
    fn rows_keep_subject_then_row_order() {
        let input = vec![
            subject("a", Some(vec![row("a1", "A"), row("a2", "B")]), Some(vec![row("at", "C")])),
            subject("b", Some(vec![row("b1", "D")]), None),
            subject("c", None, Some(vec![row("ct1", "A"), row("ct2", "A")])),
        ];
        let rec = MemoryRecorder::new();

        let merged = merge_subjects(&input, &rec).unwrap();

        let dev = merged.dev.as_ref().unwrap();
        let order: Vec<_> = dev.rows.iter().map(|r| r.row.question.as_str()).collect();
        assert_eq!(order, vec!["a1", "a2", "b1"]);
        assert!(dev.rows.iter().all(|r| r.split == Split::Dev));

        let test = merged.test.as_ref().unwrap();
        let tags: Vec<_> = test.rows.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(tags, vec!["a", "c", "c"]);
        assert_eq!(rec.count(Event::SplitMerged), 2);
    }

    #[test]
    fn missing_split_is_absent_from_the_result() {
        let input = vec![subject("a", Some(vec![row("q", "A")]), None)];
        let merged = merge_subjects(&input, &MemoryRecorder::new()).unwrap();
        assert!(merged.test.is_none());
        assert_eq!(merged.split_names(), vec!["dev"]);
    }

    #[test]
    fn extra_columns_are_unioned_with_empty_text() {
        let mut with_source = row("q1", "A");
        with_source.extra.insert("source".into(), "exam".into());
        let input = vec![
            subject("a", Some(vec![with_source]), None),
            subject("b", Some(vec![row("q2", "B")]), None),
        ];

        let merged = merge_subjects(&input, &MemoryRecorder::new()).unwrap();
        let dev = merged.dev.unwrap();

        assert_eq!(
            dev.columns,
            vec!["question", "A", "B", "C", "D", "answer", "source", "subject", "split"]
        );
        assert_eq!(dev.rows[1].row.extra.get("source").map(String::as_str), Some(""));
    }

    #[test]
    fn extra_columns_keep_first_appearance_order() {
        let mut first = row("q1", "A");
        first.extra.insert("zeta".into(), "z".into());
        let mut second = row("q2", "B");
        second.extra.insert("alpha".into(), "a".into());
        second.extra.insert("zeta".into(), "z2".into());
        let input = vec![
            subject("a", None, Some(vec![first])),
            subject("b", None, Some(vec![second])),
        ];

        let merged = merge_subjects(&input, &MemoryRecorder::new()).unwrap();
        let test = merged.test.unwrap();

        assert_eq!(&test.columns[6..8], ["zeta", "alpha"]);
        assert_eq!(test.rows[0].row.extra.get("alpha").map(String::as_str), Some(""));
    }

    #[test]
    fn revalidation_drops_rows_that_bypassed_the_loader() {
        let input = vec![subject(
            "raw",
            None,
            Some(vec![row("ok", "B"), row("", "A"), row("bad", "Z")]),
        )];
        let rec = MemoryRecorder::new();

        let merged = merge_subjects(&input, &rec).unwrap();

        assert_eq!(merged.test.unwrap().len(), 1);
        assert_eq!(rec.count(Event::RowsDropped), 1);
        // the input is untouched
        assert_eq!(input[0].len(Split::Test), 3);
    }

    #[test]
    fn reserved_column_is_a_merge_error() {
        let mut clash = row("q", "A");
        clash.extra.insert("Subject".into(), "history".into());
        let input = vec![
            subject("ok", Some(vec![row("q", "A")]), None),
            subject("clash", Some(vec![clash]), None),
        ];

        let err = merge_subjects(&input, &MemoryRecorder::new()).unwrap_err();
        match err {
            MergeError::ColumnConflict { subject, column } => {
                assert_eq!(subject, "clash");
                assert_eq!(column, "Subject");
            }
        }
    }
}
