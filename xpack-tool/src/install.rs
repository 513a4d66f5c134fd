use std::path::Path;

use anyhow::Result;
use xpack_lib::Destination;

use crate::fs_utils::{SkipList, encode_size};
use crate::packaging::{build_in_memory, runtime};
use crate::sink::send_net::send_http_async;

/// Builds `path` in memory and POSTs the archive to the auto-installer at `destination`.
///
/// Nothing touches the disk. One connection attempt, no retry.
pub async fn autoinstall_async(path: &Path, skip: &SkipList, destination: &Destination) -> Result<()> {
    let archive = build_in_memory(path, skip).await?;
    tracing::info!(
        %destination,
        size = %encode_size(archive.len() as u64),
        "uploading archive"
    );
    send_http_async(&destination.url(), archive).await
}

/// Blocking entry point around [`autoinstall_async`].
pub fn autoinstall(path: &Path, skip: &SkipList, destination: &Destination) -> Result<()> {
    runtime()?.block_on(autoinstall_async(path, skip, destination))
}
