use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::runtime::{Builder, Runtime};

use crate::fs_utils::{SkipList, exclude_file, list_archive_files, total_size};
use crate::packaging::zip::write_zip;
use crate::sink::Output;

pub mod zip;

/// A file to include in the archive.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    /// `/`-separated path relative to the build root.
    pub name_in_archive: String,
    pub size: u64,
}

/// What a finished build put into the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub entries: usize,
    pub uncompressed_bytes: u64,
}

/// Builds the single-threaded runtime every command runs on.
pub fn runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

/// Packages the tree under `root` into `output`.
///
/// The tree is listed before the output is opened, so a missing root leaves no file behind.
/// A file that turns unreadable afterwards fails the build and may leave a partial file.
pub async fn build_async(root: &Path, skip: &SkipList, output: Output<'_>) -> Result<BuildReport> {
    let mut files = list_archive_files(root, skip)?;
    if let Output::File(path) = &output {
        // An earlier archive at the output path would be read back while being truncated.
        exclude_file(&mut files, path);
    }
    let report = BuildReport {
        entries: files.len(),
        uncompressed_bytes: total_size(&files),
    };

    tracing::debug!(root = %root.display(), files = report.entries, "tree listed");

    match output {
        Output::File(path) => {
            let file = crate::sink::save_file::create_file_writer(&path).await?;
            let file = write_zip(&files, file).await?;
            crate::sink::save_file::close_file_writer(file).await?;
            tracing::info!(path = %path.display(), entries = report.entries, "archive written");
        }
        Output::Stream(stream) => {
            let stream = write_zip(&files, stream).await?;
            crate::sink::flush_stream(stream).await?;
            tracing::debug!(entries = report.entries, "archive streamed");
        }
    }

    Ok(report)
}

/// Blocking entry point around [`build_async`].
pub fn build(root: &Path, skip: &SkipList, output: Output<'_>) -> Result<BuildReport> {
    runtime()?.block_on(build_async(root, skip, output))
}

/// Builds the archive fully in memory.
pub async fn build_in_memory(root: &Path, skip: &SkipList) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    build_async(root, skip, Output::Stream(&mut buf)).await?;
    Ok(buf)
}
