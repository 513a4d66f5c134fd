use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Creates (or truncates) the archive file.
///
/// Parent directories are not created; a bad destination path is an error.
pub async fn create_file_writer<P: AsRef<Path>>(path: P) -> Result<File> {
    let path = path.as_ref();
    File::create(path)
        .await
        .with_context(|| format!("creating archive file {path:?}"))
}

/// Flushes and syncs a file the build opened, then drops it.
pub async fn close_file_writer(mut file: File) -> Result<()> {
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
