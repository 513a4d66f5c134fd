use anyhow::{Context, Result};
use async_zip::base::write::ZipFileWriter;
use async_zip::{Compression, ZipEntryBuilder};
use tokio::io::AsyncWrite;
use tokio_util::compat::TokioAsyncWriteCompatExt;

use crate::packaging::FileEntry;

/// Writes `files` as a ZIP archive into `writer` and hands the writer back.
///
/// Entries are DEFLATE-compressed. Only file entries are written; directories are implied by the `/` in entry names.
/// The writer is neither flushed nor shut down here.
pub async fn write_zip<W>(files: &[FileEntry], writer: W) -> Result<W>
where
    W: AsyncWrite + Unpin,
{
    let mut archive = ZipFileWriter::new(writer.compat_write());

    for fe in files {
        let data = tokio::fs::read(&fe.path)
            .await
            .with_context(|| format!("reading {:?}", fe.path))?;

        let entry = ZipEntryBuilder::new(fe.name_in_archive.clone().into(), Compression::Deflate);
        archive
            .write_entry_whole(entry, &data)
            .await
            .with_context(|| format!("adding {} to archive", fe.name_in_archive))?;

        tracing::debug!(entry = %fe.name_in_archive, bytes = data.len(), "added");
    }

    let inner = archive.close().await.context("finishing archive")?;
    Ok(inner.into_inner())
}
