//! ZIP extraction into the subject table layout.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use log::{debug, info};

use crate::error::ArchiveError;

/// Unpacks every entry of the ZIP at `archive_path` under `dest`, keeping the
/// archive's internal paths. Existing files are overwritten, so extracting
/// the same archive twice leaves identical files. Returns the number of
/// files written.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let file = File::open(archive_path).map_err(|source| ArchiveError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let invalid = |source: zip::result::ZipError| ArchiveError::Invalid {
        path: archive_path.to_path_buf(),
        source,
    };
    let mut archive = zip::ZipArchive::new(file).map_err(invalid)?;

    let mut count = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(invalid)?;
        let Some(entry_path) = entry.enclosed_name() else {
            // skip unsafe paths
            debug!("Skipping entry with unsafe path: {}", entry.name());
            continue;
        };
        let output_path = dest.join(entry_path);
        let write_err = |source: io::Error| ArchiveError::Write {
            entry: entry_path_display(&output_path, dest),
            dest: dest.to_path_buf(),
            source,
        };

        if entry.is_dir() {
            fs::create_dir_all(&output_path).map_err(write_err)?;
            continue;
        }
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut outfile = File::create(&output_path).map_err(write_err)?;
        io::copy(&mut entry, &mut outfile).map_err(write_err)?;
        count += 1;
    }

    info!("Extracted {count} files from {:?} into {:?}", archive_path, dest);
    Ok(count)
}

fn entry_path_display(output_path: &Path, dest: &Path) -> String {
    output_path
        .strip_prefix(dest)
        .unwrap_or(output_path)
        .display()
        .to_string()
}
