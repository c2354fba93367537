//! Read-only summary of a merged dataset.

use std::fmt;

use crate::dataset::{MergedDataset, MergedSplit, Split};

/// Longest sample value printed before truncation, in characters.
pub const SAMPLE_WIDTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSummary {
    pub split: Split,
    pub rows: usize,
    pub subjects: usize,
    /// Largest subjects first; ties keep first-appearance order.
    pub top_subjects: Vec<(String, usize)>,
    // first row's recognized fields plus its subject
    pub sample: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub splits: Vec<SplitSummary>,
}

impl DatasetSummary {
    pub fn total_rows(&self) -> usize {
        self.splits.iter().map(|s| s.rows).sum()
    }
}

pub fn summarize(dataset: &MergedDataset, top_n: usize) -> DatasetSummary {
    DatasetSummary {
        splits: dataset
            .splits()
            .map(|s| summarize_split(s, top_n))
            .collect(),
    }
}

fn summarize_split(split: &MergedSplit, top_n: usize) -> SplitSummary {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in &split.rows {
        match counts.iter_mut().find(|(s, _)| *s == row.subject) {
            Some((_, n)) => *n += 1,
            None => counts.push((row.subject.clone(), 1)),
        }
    }
    let subjects = counts.len();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(top_n);

    let sample = split
        .rows
        .first()
        .map(|first| {
            first
                .row
                .recognized_fields()
                .into_iter()
                .chain(std::iter::once(("subject", first.subject.as_str())))
                .map(|(k, v)| (k, truncate(v, SAMPLE_WIDTH)))
                .collect()
        })
        .unwrap_or_default();

    SplitSummary {
        split: split.split,
        rows: split.len(),
        subjects,
        top_subjects: counts,
        sample,
    }
}

/// Cuts `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.splits.iter().map(|s| s.split.as_str()).collect();
        writeln!(f, "Dataset splits: {names:?}")?;
        for s in &self.splits {
            writeln!(f)?;
            writeln!(f, "{} split: {} samples", s.split, s.rows)?;
            writeln!(f, "Subjects in {}: {}", s.split, s.subjects)?;
            for (subject, count) in &s.top_subjects {
                writeln!(f, "  - {subject}: {count} samples")?;
            }
            if !s.sample.is_empty() {
                writeln!(f, "Sample from {}:", s.split)?;
                for (key, value) in &s.sample {
                    writeln!(f, "  {key}: {value}")?;
                }
            }
        }
        Ok(())
    }
}
