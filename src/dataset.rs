use std::fmt;

use serde::{Deserialize, Serialize};

use crate::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Dev,
    Test,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Dev, Split::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Dev => "dev",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated rows of one subject. A split is `None` when its file was absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectDataset {
    pub subject: String,
    pub dev: Option<Vec<Row>>,
    pub test: Option<Vec<Row>>,
}

impl SubjectDataset {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            dev: None,
            test: None,
        }
    }

    pub fn split(&self, split: Split) -> Option<&[Row]> {
        match split {
            Split::Dev => self.dev.as_deref(),
            Split::Test => self.test.as_deref(),
        }
    }

    pub fn set_split(&mut self, split: Split, rows: Vec<Row>) {
        match split {
            Split::Dev => self.dev = Some(rows),
            Split::Test => self.test = Some(rows),
        }
    }

    /// Splits that are present, in dev/test order.
    pub fn splits(&self) -> impl Iterator<Item = (Split, &[Row])> {
        Split::ALL
            .into_iter()
            .filter_map(move |s| self.split(s).map(|rows| (s, rows)))
    }

    pub fn len(&self, split: Split) -> usize {
        self.split(split).map_or(0, <[Row]>::len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRow {
    #[serde(flatten)]
    pub row: Row,
    pub subject: String,
    pub split: Split,
}

impl AsRef<Row> for MergedRow {
    fn as_ref(&self) -> &Row {
        &self.row
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedSplit {
    pub split: Split,
    /// Union of every row's columns, in output order.
    pub columns: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedSplit {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The unified dev/test collections. A split is `None` when no subject contributed to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedDataset {
    pub dev: Option<MergedSplit>,
    pub test: Option<MergedSplit>,
}

impl MergedDataset {
    pub fn split(&self, split: Split) -> Option<&MergedSplit> {
        match split {
            Split::Dev => self.dev.as_ref(),
            Split::Test => self.test.as_ref(),
        }
    }

    pub fn splits(&self) -> impl Iterator<Item = &MergedSplit> {
        self.dev.iter().chain(self.test.iter())
    }

    pub fn split_names(&self) -> Vec<&'static str> {
        self.splits().map(|s| s.split.as_str()).collect()
    }

    pub fn total_rows(&self) -> usize {
        self.splits().map(MergedSplit::len).sum()
    }
}
