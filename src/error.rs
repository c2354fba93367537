use std::path::PathBuf;

use thiserror::Error;

/// Failure while fetching the archive. Fatal to the run.
///
/// `Request` and `Status` come from the remote side; `Write` is local disk I/O
/// while saving the body.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("local I/O error while saving download to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Corrupt or unsupported archive. Fatal to the run.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid or corrupt ZIP {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("failed to extract {entry} into {dest}: {source}")]
    Write {
        entry: String,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One subject's table could not be parsed. The subject is skipped.
#[derive(Debug, Error)]
pub enum SubjectLoadError {
    #[error("cannot read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} has no `{column}` column")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("{path} declares column `{column}` more than once")]
    DuplicateColumn { path: PathBuf, column: String },
    #[error("{path} line {line}: {found} cells for {expected} columns")]
    RaggedRow {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },
}

/// Structural failure while unifying splits. Recovered by per-subject persistence.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("subject `{subject}` has column `{column}` which collides with a merged column")]
    ColumnConflict { subject: String, column: String },
}

/// A dataset could not be written to (or read back from) disk.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bad dataset JSON at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("cannot list subjects in {path}: {source}")]
    Discover {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
