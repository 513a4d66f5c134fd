use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub mod save_file;
pub mod send_net;

/// Where a build writes the archive.
pub enum Output<'a> {
    /// Created (or truncated), written and closed by the build.
    File(PathBuf),
    /// Borrowed from the caller. Written and flushed, never shut down.
    Stream(&'a mut (dyn AsyncWrite + Unpin + Send)),
}

/// Flushes a borrowed stream without closing it.
pub(crate) async fn flush_stream<W: AsyncWrite + Unpin>(mut stream: W) -> Result<()> {
    stream.flush().await?;
    Ok(())
}
