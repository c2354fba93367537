//! Streaming archive download.

use std::path::{Path, PathBuf};

use log::info;
use reqwest::Client;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::NetworkError;

/// Buffer size used when flushing response chunks to disk.
pub const CHUNK_SIZE: usize = 8192;

/// Downloads `url` to `dest` in one attempt, returning the byte count.
///
/// The body is streamed chunk by chunk into `<dest>.part` and renamed into
/// place once complete, so `dest` only ever holds a full download. A
/// non-success status fails before anything is written.
pub async fn download_archive(
    client: &Client,
    url: &str,
    dest: &Path,
) -> Result<u64, NetworkError> {
    let request_err = |source: reqwest::Error| NetworkError::Request {
        url: url.to_string(),
        source,
    };

    let mut response = client.get(url).send().await.map_err(request_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(NetworkError::Status {
            url: url.to_string(),
            status,
        });
    }
    if let Some(len) = response.content_length() {
        info!("Downloading {url} ({len} bytes) to {:?}", dest);
    }

    let part = part_path(dest);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await.map_err(write_err(parent))?;
    }

    let file = fs::File::create(&part).await.map_err(write_err(&part))?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut written = 0u64;

    let streamed: Result<(), NetworkError> = async {
        while let Some(chunk) = response.chunk().await.map_err(request_err)? {
            writer.write_all(&chunk).await.map_err(write_err(&part))?;
            written += chunk.len() as u64;
        }
        writer.flush().await.map_err(write_err(&part))?;
        Ok(())
    }
    .await;

    if let Err(e) = streamed {
        drop(writer);
        let _ = fs::remove_file(&part).await;
        return Err(e);
    }
    drop(writer);

    fs::rename(&part, dest).await.map_err(write_err(dest))?;
    info!("Saved {written} bytes to {:?}", dest);
    Ok(written)
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> NetworkError {
    let path = path.to_path_buf();
    move |source| NetworkError::Write { path, source }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
