//! Structured run events.
//!
//! The pipeline never prints. Every stage reports what it did through a
//! [`Recorder`], so the same code drives the log file, the console progress
//! bar and the event capture used by tests.

use std::fmt::Write as _;
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use log::Level;

/// Everything the pipeline reports about a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    DownloadStarted,
    ArchiveDownloaded,
    ArchiveExtracted,
    SubjectsDiscovered,
    SubjectLoading,
    SubjectLoaded,
    SubjectFailed,
    RowsDropped,
    AggregationFinished,
    SplitMerged,
    MergeFailed,
    MergedPersisted,
    SubjectPersisted,
    PersistFailed,
    FallbackFinished,
}

impl Event {
    pub fn name(self) -> &'static str {
        match self {
            Event::DownloadStarted => "download_started",
            Event::ArchiveDownloaded => "archive_downloaded",
            Event::ArchiveExtracted => "archive_extracted",
            Event::SubjectsDiscovered => "subjects_discovered",
            Event::SubjectLoading => "subject_loading",
            Event::SubjectLoaded => "subject_loaded",
            Event::SubjectFailed => "subject_failed",
            Event::RowsDropped => "rows_dropped",
            Event::AggregationFinished => "aggregation_finished",
            Event::SplitMerged => "split_merged",
            Event::MergeFailed => "merge_failed",
            Event::MergedPersisted => "merged_persisted",
            Event::SubjectPersisted => "subject_persisted",
            Event::PersistFailed => "persist_failed",
            Event::FallbackFinished => "fallback_finished",
        }
    }

    pub fn level(self) -> Level {
        match self {
            Event::SubjectFailed | Event::MergeFailed | Event::PersistFailed => Level::Error,
            Event::RowsDropped => Level::Warn,
            Event::SubjectLoading => Level::Debug,
            _ => Level::Info,
        }
    }
}

pub type Fields<'a> = &'a [(&'static str, String)];

/// Sink for pipeline events. Shared across aggregation workers.
pub trait Recorder: Send + Sync {
    fn record(&self, event: Event, fields: Fields<'_>);
}

pub fn format_event(event: Event, fields: Fields<'_>) -> String {
    let mut line = event.name().to_string();
    for (key, value) in fields {
        let _ = write!(line, " {key}={value}");
    }
    line
}

/// Forwards every event to the `log` facade at the event's level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRecorder;

impl Recorder for LogRecorder {
    fn record(&self, event: Event, fields: Fields<'_>) {
        log::log!(event.level(), "{}", format_event(event, fields));
    }
}

/// Logs like [`LogRecorder`] and drives a progress bar over the subject loop.
pub struct ConsoleRecorder {
    bar: ProgressBar,
}

impl ConsoleRecorder {
    pub fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }
}

impl Default for ConsoleRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for ConsoleRecorder {
    fn record(&self, event: Event, fields: Fields<'_>) {
        LogRecorder.record(event, fields);
        match event {
            Event::SubjectsDiscovered => {
                let total = field(fields, "count")
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(0);
                self.bar.set_length(total);
                self.bar.set_position(0);
                self.bar
                    .set_draw_target(indicatif::ProgressDrawTarget::stderr());
            }
            Event::SubjectLoading => {
                if let Some(subject) = field(fields, "subject") {
                    self.bar.set_message(subject.to_string());
                }
            }
            Event::SubjectLoaded | Event::SubjectFailed => self.bar.inc(1),
            Event::RowsDropped => self.bar.println(format!("⚠️  {}", format_event(event, fields))),
            Event::AggregationFinished => self.bar.finish_and_clear(),
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<(Event, Vec<(&'static str, String)>)>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Event, Vec<(&'static str, String)>)> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn count(&self, event: Event) -> usize {
        self.events().iter().filter(|(e, _)| *e == event).count()
    }

    /// Payloads of every occurrence of `event`.
    pub fn fields_of(&self, event: Event) -> Vec<Vec<(&'static str, String)>> {
        self.events()
            .into_iter()
            .filter(|(e, _)| *e == event)
            .map(|(_, f)| f)
            .collect()
    }
}

impl Recorder for MemoryRecorder {
    fn record(&self, event: Event, fields: Fields<'_>) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((event, fields.to_vec()));
    }
}

pub fn field<'a>(fields: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_event_renders_fields_in_order() {
        let line = format_event(
            Event::RowsDropped,
            &[("subject", "math".into()), ("invalid_answer", "1".into())],
        );
        assert_eq!(line, "rows_dropped subject=math invalid_answer=1");
    }

    #[test]
    fn memory_recorder_keeps_emission_order() {
        let rec = MemoryRecorder::new();
        rec.record(Event::SubjectLoaded, &[("subject", "a".into())]);
        rec.record(Event::SubjectFailed, &[("subject", "b".into())]);
        rec.record(Event::SubjectLoaded, &[("subject", "c".into())]);

        assert_eq!(rec.count(Event::SubjectLoaded), 2);
        let loaded: Vec<_> = rec
            .fields_of(Event::SubjectLoaded)
            .iter()
            .filter_map(|f| field(f, "subject").map(str::to_string))
            .collect();
        assert_eq!(loaded, vec!["a", "c"]);
    }

    #[test]
    fn failures_log_above_info() {
        assert_eq!(Event::SubjectFailed.level(), Level::Error);
        assert_eq!(Event::RowsDropped.level(), Level::Warn);
        assert_eq!(Event::SplitMerged.level(), Level::Info);
    }
}
