use std::path::{Path, PathBuf};

use anyhow::Result;
use xpack_lib::{Config, DEFAULT_OUTPUT, Destination, STDOUT_SENTINEL};

use crate::fs_utils::{SkipList, encode_size, list_archive_files, resolve_root, total_size};
use crate::install::autoinstall;
use crate::packaging::build;
use crate::sink::Output;

/// Where the `build` command puts the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutSink {
    SaveToFile(PathBuf),
    Stdout,
}

fn get_output_sink(output: Option<&str>) -> OutSink {
    match output.unwrap_or(DEFAULT_OUTPUT) {
        STDOUT_SENTINEL => OutSink::Stdout,
        path => OutSink::SaveToFile(PathBuf::from(path)),
    }
}

fn get_destination(config: &Config) -> Result<Destination> {
    match config.destination.as_deref() {
        Some(dest) => Ok(dest.parse()?),
        None => Ok(Destination::default()),
    }
}

fn get_skip_list(config: &Config) -> Result<SkipList> {
    SkipList::new(config.skip.as_deref().unwrap_or_default())
}

fn print_dry_run(root: &Path, skip: &SkipList, target: &str) -> Result<()> {
    let files = list_archive_files(root, skip)?;
    println!("--- DRY RUN ---");
    println!("Root: {}", root.display());
    println!("Target: {target}");
    println!("Total files: {}", files.len());
    println!("Total size: {}", encode_size(total_size(&files)));
    for f in files {
        println!("  {} -> {}", f.path.display(), f.name_in_archive);
    }
    Ok(())
}

/// Runs the `build` command against the merged configuration.
pub fn run_build(config: &Config) -> Result<()> {
    let root = resolve_root(config.dir.as_deref())?;
    let skip = get_skip_list(config)?;
    let sink = get_output_sink(config.output.as_deref());

    if config.dry == Some(true) {
        let target = match &sink {
            OutSink::SaveToFile(path) => path.display().to_string(),
            OutSink::Stdout => "<stdout>".to_string(),
        };
        return print_dry_run(&root, &skip, &target);
    }

    let report = match sink {
        OutSink::SaveToFile(path) => build(&root, &skip, Output::File(path))?,
        OutSink::Stdout => {
            let mut stdout = tokio::io::stdout();
            build(&root, &skip, Output::Stream(&mut stdout))?
        }
    };

    tracing::info!(
        entries = report.entries,
        size = %encode_size(report.uncompressed_bytes),
        "build finished"
    );
    Ok(())
}

/// Runs the `autoinstall` command against the merged configuration.
pub fn run_autoinstall(config: &Config) -> Result<()> {
    let root = resolve_root(config.dir.as_deref())?;
    let skip = get_skip_list(config)?;
    let destination = get_destination(config)?;

    if config.dry == Some(true) {
        return print_dry_run(&root, &skip, &destination.url());
    }

    autoinstall(&root, &skip, &destination)
}
