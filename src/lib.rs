//! Download, validate and merge the CMMLU benchmark into unified dev/test splits.

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod events;
pub mod extract;
pub mod fallback;
pub mod fetch;
pub mod loader;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod row;
pub mod store;

pub use config::PipelineConfig;
pub use dataset::{MergedDataset, MergedRow, MergedSplit, Split, SubjectDataset};
pub use error::{ArchiveError, MergeError, NetworkError, PersistError, PipelineError, SubjectLoadError};
pub use events::{Event, Recorder};
pub use row::{Row, ValidationReport};
