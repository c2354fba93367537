//! Question rows and the row-level validation shared by loader and merge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const ANSWER_CHOICES: [&str; 4] = ["A", "B", "C", "D"];

/// Column names of the recognized fields, in output order.
pub const RECOGNIZED_COLUMNS: [&str; 6] = ["question", "A", "B", "C", "D", "answer"];

/// One multiple-choice question. Every cell is text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub question: String,
    #[serde(rename = "A", default)]
    pub a: String,
    #[serde(rename = "B", default)]
    pub b: String,
    #[serde(rename = "C", default)]
    pub c: String,
    #[serde(rename = "D", default)]
    pub d: String,
    #[serde(default)]
    pub answer: String,
    // columns outside the recognized set, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Row {
    pub fn has_question(&self) -> bool {
        !self.question.trim().is_empty()
    }

    pub fn has_valid_answer(&self) -> bool {
        ANSWER_CHOICES.contains(&self.answer.trim())
    }

    pub fn recognized_fields(&self) -> [(&'static str, &str); 6] {
        [
            ("question", &self.question),
            ("A", &self.a),
            ("B", &self.b),
            ("C", &self.c),
            ("D", &self.d),
            ("answer", &self.answer),
        ]
    }

    /// Mutable slot for a recognized column, matched case-insensitively.
    pub fn recognized_mut(&mut self, column: &str) -> Option<&mut String> {
        match column.trim().to_ascii_lowercase().as_str() {
            "question" => Some(&mut self.question),
            "a" => Some(&mut self.a),
            "b" => Some(&mut self.b),
            "c" => Some(&mut self.c),
            "d" => Some(&mut self.d),
            "answer" => Some(&mut self.answer),
            _ => None,
        }
    }
}

impl AsRef<Row> for Row {
    fn as_ref(&self) -> &Row {
        self
    }
}

// rows dropped by one validation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ValidationReport {
    pub empty_question: usize,
    pub invalid_answer: usize,
}

impl ValidationReport {
    pub fn dropped(&self) -> usize {
        self.empty_question + self.invalid_answer
    }

    pub fn absorb(&mut self, other: ValidationReport) {
        self.empty_question += other.empty_question;
        self.invalid_answer += other.invalid_answer;
    }
}

/// Drops rows with a blank question, then rows whose trimmed answer is not A-D.
/// Surviving rows keep their relative order and their original cell text.
pub fn validate_rows<T: AsRef<Row>>(rows: Vec<T>) -> (Vec<T>, ValidationReport) {
    let mut report = ValidationReport::default();
    let kept = rows
        .into_iter()
        .filter(|r| {
            let row: &Row = r.as_ref();
            if !row.has_question() {
                report.empty_question += 1;
                false
            } else if !row.has_valid_answer() {
                report.invalid_answer += 1;
                false
            } else {
                true
            }
        })
        .collect();
    (kept, report)
}
