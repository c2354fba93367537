//! On-disk layout of persisted datasets.
//!
//! A dataset directory holds `dataset_dict.json` (split names and column
//! order) and one `<split>.json` per split, a pretty-printed array of row
//! objects. A merged dataset is written whole into a sibling staging
//! directory and swapped in only once every file is there.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::dataset::{MergedDataset, MergedRow, MergedSplit, Split, SubjectDataset};
use crate::error::PersistError;
use crate::merge::{extra_columns, schema};

pub const DATASET_DICT: &str = "dataset_dict.json";

#[derive(Debug, Serialize, Deserialize)]
struct DatasetDict {
    splits: Vec<Split>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    columns: Vec<SplitColumns>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SplitColumns {
    split: Split,
    columns: Vec<String>,
}

fn split_file(dir: &Path, split: Split) -> PathBuf {
    dir.join(format!("{}.json", split.as_str()))
}

/// Sibling directory a merged dataset is assembled in before it replaces `dir`.
pub fn staging_dir(dir: &Path) -> PathBuf {
    let mut name = dir.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    dir.with_file_name(name)
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PersistError + '_ {
    move |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    let tmp = path.with_extension("json.tmp");
    let file = File::create(&tmp).map_err(io_err(&tmp))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| PersistError::Json {
        path: tmp.clone(),
        source,
    })?;
    writer.flush().map_err(io_err(&tmp))?;
    drop(writer);
    fs::rename(&tmp, path).map_err(io_err(path))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, PersistError> {
    let file = File::open(path).map_err(io_err(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Replaces whatever is at `dir` with `dataset`.
///
/// On error the previous contents of `dir` are left untouched and no staging
/// directory remains.
pub fn save_merged(dataset: &MergedDataset, dir: &Path) -> Result<(), PersistError> {
    let staging = staging_dir(dir);
    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(io_err(&staging))?;
    }
    if let Err(e) = write_merged(dataset, &staging) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }
    discard_merged(dir)?;
    fs::rename(&staging, dir).map_err(io_err(dir))
}

fn write_merged(dataset: &MergedDataset, dir: &Path) -> Result<(), PersistError> {
    fs::create_dir_all(dir).map_err(io_err(dir))?;
    for split in dataset.splits() {
        write_json(&split_file(dir, split.split), &split.rows)?;
    }
    let dict = DatasetDict {
        splits: dataset.splits().map(|s| s.split).collect(),
        columns: dataset
            .splits()
            .map(|s| SplitColumns {
                split: s.split,
                columns: s.columns.clone(),
            })
            .collect(),
    };
    write_json(&dir.join(DATASET_DICT), &dict)
}

/// Removes a merged dataset directory, if any.
pub fn discard_merged(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(io_err(dir))?;
        info!("Removed merged dataset at {:?}", dir);
    }
    Ok(())
}

/// Reads back a directory written by [`save_merged`].
pub fn load_merged(dir: &Path) -> Result<MergedDataset, PersistError> {
    let dict: DatasetDict = read_json(&dir.join(DATASET_DICT))?;
    let mut dataset = MergedDataset::default();
    for split in dict.splits {
        let rows: Vec<MergedRow> = read_json(&split_file(dir, split))?;
        let columns = dict
            .columns
            .iter()
            .find(|c| c.split == split)
            .map(|c| c.columns.clone())
            .unwrap_or_else(|| schema(extra_columns(&rows)));
        let merged = MergedSplit {
            split,
            columns,
            rows,
        };
        match split {
            Split::Dev => dataset.dev = Some(merged),
            Split::Test => dataset.test = Some(merged),
        }
    }
    Ok(dataset)
}

/// Writes one subject's splits under `dir` (rows without merge tags).
pub fn save_subject(dataset: &SubjectDataset, dir: &Path) -> Result<(), PersistError> {
    fs::create_dir_all(dir).map_err(io_err(dir))?;
    let mut splits = Vec::new();
    for (split, rows) in dataset.splits() {
        write_json(&split_file(dir, split), rows)?;
        splits.push(split);
    }
    write_json(
        &dir.join(DATASET_DICT),
        &DatasetDict {
            splits,
            columns: Vec::new(),
        },
    )
}

/// Reads back a directory written by [`save_subject`].
pub fn load_subject_dir(dir: &Path, subject: &str) -> Result<SubjectDataset, PersistError> {
    let dict: DatasetDict = read_json(&dir.join(DATASET_DICT))?;
    let mut dataset = SubjectDataset::new(subject);
    for split in dict.splits {
        dataset.set_split(split, read_json(&split_file(dir, split))?);
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemoryRecorder;
    use crate::merge::merge_subjects;
    use crate::row::Row;
    use tempfile::TempDir;

    fn sample() -> SubjectDataset {
        let mut ds = SubjectDataset::new("art");
        let mut r = Row {
            question: "哪一个是颜色？".into(),
            a: "红".into(),
            b: "一".into(),
            c: "二".into(),
            d: "三".into(),
            answer: "A".into(),
            ..Row::default()
        };
        r.extra.insert("source".into(), "quiz".into());
        ds.set_split(Split::Dev, vec![r]);
        ds
    }

    #[test]
    fn merged_dataset_survives_a_disk_round_trip() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("merged");
        let merged = merge_subjects(&[sample()], &MemoryRecorder::new()).unwrap();

        save_merged(&merged, &dir).unwrap();
        let back = load_merged(&dir).unwrap();

        assert_eq!(back, merged);
        assert!(!dir.join("test.json").exists());
        assert!(!dir.join("dev.json.tmp").exists());
    }

    #[test]
    fn resave_replaces_the_whole_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("merged");
        fs::create_dir_all(dir.join("test.json.tmp")).unwrap();
        fs::write(dir.join("test.json"), "[]").unwrap();
        let merged = merge_subjects(&[sample()], &MemoryRecorder::new()).unwrap();

        save_merged(&merged, &dir).unwrap();

        assert!(!dir.join("test.json").exists());
        assert!(!dir.join("test.json.tmp").exists());
        assert!(!staging_dir(&dir).exists());
        assert_eq!(load_merged(&dir).unwrap().split_names(), vec!["dev"]);
    }

    #[test]
    fn failed_save_keeps_the_previous_dataset_whole() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("merged");
        let first = merge_subjects(&[sample()], &MemoryRecorder::new()).unwrap();
        save_merged(&first, &dir).unwrap();

        // a plain file where the staging directory has to go
        fs::write(staging_dir(&dir), "busy").unwrap();
        let mut other = sample();
        other.subject = "music".into();
        let second = merge_subjects(&[other], &MemoryRecorder::new()).unwrap();

        assert!(save_merged(&second, &dir).is_err());
        assert_eq!(load_merged(&dir).unwrap(), first);
    }

    #[test]
    fn column_order_survives_a_reload() {
        let tmp = TempDir::new().unwrap();
        let mut zeta = sample();
        zeta.dev.as_mut().unwrap()[0].extra.insert("zeta".into(), "z".into());
        let mut alpha = SubjectDataset::new("bio");
        let mut row = zeta.dev.as_ref().unwrap()[0].clone();
        row.extra.clear();
        row.extra.insert("alpha".into(), "a".into());
        alpha.set_split(Split::Dev, vec![row]);
        let merged = merge_subjects(&[zeta, alpha], &MemoryRecorder::new()).unwrap();

        let dir = tmp.path().join("merged");
        save_merged(&merged, &dir).unwrap();
        let back = load_merged(&dir).unwrap();

        assert_eq!(
            back.dev.unwrap().columns,
            vec!["question", "A", "B", "C", "D", "answer", "source", "zeta", "alpha", "subject", "split"]
        );
    }

    #[test]
    fn discarding_a_missing_directory_is_fine() {
        let tmp = TempDir::new().unwrap();
        discard_merged(&tmp.path().join("never")).unwrap();
    }

    #[test]
    fn subject_directory_round_trips() {
        let tmp = TempDir::new().unwrap();
        let ds = sample();
        save_subject(&ds, &tmp.path().join("art")).unwrap();
        let back = load_subject_dir(&tmp.path().join("art"), "art").unwrap();
        assert_eq!(back, ds);
    }

    #[test]
    fn unreadable_directory_is_a_persist_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_merged(&tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, PersistError::Io { .. }));
    }
}
