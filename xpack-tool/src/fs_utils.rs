use anyhow::{Context, Result};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use glob::Pattern;

use crate::packaging::FileEntry;

/// Marker that starts the name of a hidden file or directory.
const HIDDEN_MARKER: char = '.';

/// Relative path reserved for the license file.
const LICENSE_NAME: &str = "LICENSE";

/// Documentation sources, scripts, compiled scripts and earlier builds.
const IGNORED_EXTENSIONS: [&str; 4] = ["md", "py", "pyc", "xpi"];

/// Built-in ignore predicate, applied to a `/`-separated path relative to the build root.
///
/// The root itself (`""`) is never ignored.
pub fn is_ignored(rel: &str) -> bool {
    if rel.is_empty() {
        return false;
    }

    let name = rel.rsplit('/').next().unwrap_or(rel);
    if name.starts_with(HIDDEN_MARKER) || rel == LICENSE_NAME {
        return true;
    }

    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IGNORED_EXTENSIONS.contains(&ext))
}

/// User supplied glob patterns, matched against relative paths on top of [`is_ignored`].
#[derive(Debug, Clone, Default)]
pub struct SkipList {
    patterns: Vec<Pattern>,
}

impl SkipList {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("invalid skip pattern: {p}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_skipped(&self, rel: &str) -> bool {
        is_ignored(rel) || self.patterns.iter().any(|p| p.matches(rel))
    }
}

/// Recursively lists every file under `root` that survives the skip list.
///
/// Order follows `read_dir` at each level. Skipped directories are not entered.
pub fn list_archive_files(root: &Path, skip: &SkipList) -> Result<Vec<FileEntry>> {
    let meta = fs::metadata(root).with_context(|| format!("reading build root {root:?}"))?;
    if !meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("{} is not a directory", root.display()),
        ))
        .with_context(|| format!("reading build root {root:?}"));
    }

    fn walk_dir(dir: &Path, prefix: &str, skip: &SkipList, result: &mut Vec<FileEntry>) -> Result<()> {
        for entry in fs::read_dir(dir).with_context(|| format!("reading directory {dir:?}"))? {
            let entry = entry?;
            // Lossy conversion could give two files the same entry name.
            let name = entry.file_name().into_string().map_err(|raw| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("file name is not valid UTF-8: {:?}", dir.join(raw)),
                )
            })?;
            let rel = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };

            if skip.is_skipped(&rel) {
                tracing::trace!(path = %rel, "skipped");
                continue;
            }

            let path = entry.path();
            // Follows symlinks, like the archive reader will.
            let meta = match fs::metadata(&path) {
                Ok(meta) => Some(meta),
                Err(e) if e.kind() == io::ErrorKind::NotFound && is_symlink(&entry)? => None,
                Err(e) => return Err(e).with_context(|| format!("reading metadata of {path:?}")),
            };
            let Some(meta) = meta else {
                tracing::debug!(path = %rel, "dangling symlink, left out");
                continue;
            };
            if meta.is_dir() {
                walk_dir(&path, &rel, skip, result)?;
            } else if meta.is_file() {
                result.push(FileEntry {
                    path,
                    name_in_archive: rel,
                    size: meta.len(),
                });
            } else {
                tracing::debug!(path = %rel, "not a regular file, left out");
            }
        }
        Ok(())
    }

    let mut result = Vec::new();
    walk_dir(root, "", skip, &mut result)?;
    Ok(result)
}

fn is_symlink(entry: &fs::DirEntry) -> io::Result<bool> {
    Ok(entry.file_type()?.is_symlink())
}

/// Resolves the build root, defaulting to the current working directory.
pub fn resolve_root(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => std::env::current_dir().context("resolving current directory"),
    }
}

/// Drops the entry that resolves to the same file as `path`, if any.
///
/// A `path` that does not exist yet cannot be in the listing.
pub fn exclude_file(files: &mut Vec<FileEntry>, path: &Path) {
    let Ok(target) = fs::canonicalize(path) else {
        return;
    };
    files.retain(|f| {
        let same = fs::canonicalize(&f.path).is_ok_and(|p| p == target);
        if same {
            tracing::debug!(entry = %f.name_in_archive, "output file left out of its own archive");
        }
        !same
    });
}

/// Sum of the uncompressed sizes of `files`.
pub fn total_size(files: &[FileEntry]) -> u64 {
    files.iter().map(|f| f.size).sum()
}

/// Formats a byte count with binary units, e.g. `1.5 KiB`.
pub fn encode_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0} {unit}")
    } else {
        format!("{rounded:.1} {unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel.as_bytes()).unwrap();
    }

    fn names(files: &[FileEntry]) -> HashSet<String> {
        files.iter().map(|f| f.name_in_archive.clone()).collect()
    }

    #[test]
    fn ignore_predicate_matches_fixed_policy() {
        assert!(is_ignored(".git"));
        assert!(is_ignored("chrome/.DS_Store"));
        assert!(is_ignored("LICENSE"));
        assert!(is_ignored("README.md"));
        assert!(is_ignored("lib/build.py"));
        assert!(is_ignored("lib/build.pyc"));
        assert!(is_ignored("old.xpi"));

        assert!(!is_ignored(""));
        assert!(!is_ignored("bootstrap.js"));
        assert!(!is_ignored("chrome/LICENSE"));
        assert!(!is_ignored("notes.MD"));
        assert!(!is_ignored("a.b/install.rdf"));
        assert!(!is_ignored("pyc"));
    }

    #[test]
    fn lists_surviving_files_with_relative_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for rel in [
            "bootstrap.js",
            "lib/converter.js",
            "chrome/content/options.xul",
            "README.md",
            "LICENSE",
            "build.py",
            "build.pyc",
            "transliterator.xpi",
            ".gitignore",
            ".git/config",
            ".git/objects/ab/cdef",
            "lib/.hidden.js",
            "docs.md/inner.js",
        ] {
            touch(root, rel);
        }

        let files = list_archive_files(root, &SkipList::default()).unwrap();
        let expected: HashSet<String> = ["bootstrap.js", "lib/converter.js", "chrome/content/options.xul"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names(&files), expected);
        assert_eq!(files.len(), expected.len());
        assert!(files.iter().all(|f| f.path.starts_with(root)));
    }

    #[test]
    fn root_name_is_never_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(".hidden");
        touch(&root, "install.rdf");

        let files = list_archive_files(&root, &SkipList::default()).unwrap();
        assert_eq!(names(&files), HashSet::from(["install.rdf".to_string()]));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlinks_are_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "bootstrap.js");
        std::os::unix::fs::symlink(root.join("gone.js"), root.join("link.js")).unwrap();
        std::os::unix::fs::symlink(root.join("bootstrap.js"), root.join("alias.js")).unwrap();

        let files = list_archive_files(root, &SkipList::default()).unwrap();
        assert_eq!(
            names(&files),
            HashSet::from(["bootstrap.js".to_string(), "alias.js".to_string()])
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_rejected_not_merged() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(OsStr::from_bytes(b"a\xff.js")), "one").unwrap();
        fs::write(root.join(OsStr::from_bytes(b"a\xfe.js")), "two").unwrap();

        let err = list_archive_files(root, &SkipList::default()).unwrap_err();
        let io = err.downcast_ref::<io::Error>().expect("io error in chain");
        assert_eq!(io.kind(), io::ErrorKind::InvalidData);
        assert!(io.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn skip_patterns_prune_subtrees() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "keep.js");
        touch(root, "tests/unit.js");
        touch(root, "lib/data.json");

        let skip = SkipList::new(&["tests".to_string(), "*.json".to_string()]).unwrap();
        let files = list_archive_files(root, &skip).unwrap();
        assert_eq!(names(&files), HashSet::from(["keep.js".to_string()]));
    }

    #[test]
    fn invalid_skip_pattern_is_rejected() {
        assert!(SkipList::new(&["[".to_string()]).is_err());
    }

    #[test]
    fn missing_root_surfaces_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_archive_files(&dir.path().join("nope"), &SkipList::default()).unwrap_err();
        let io = err.downcast_ref::<io::Error>().expect("io error in chain");
        assert_eq!(io.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "file.js");
        let err = list_archive_files(&dir.path().join("file.js"), &SkipList::default()).unwrap_err();
        let io = err.downcast_ref::<io::Error>().expect("io error in chain");
        assert_eq!(io.kind(), io::ErrorKind::NotADirectory);
    }

    #[test]
    fn exclude_file_matches_through_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "bootstrap.js");
        touch(root, "lib/out.zip");

        let mut files = list_archive_files(root, &SkipList::default()).unwrap();
        exclude_file(&mut files, &root.join("lib/../lib/out.zip"));
        assert_eq!(names(&files), HashSet::from(["bootstrap.js".to_string()]));

        exclude_file(&mut files, &root.join("not-there.zip"));
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(encode_size(0), "0 B");
        assert_eq!(encode_size(512), "512 B");
        assert_eq!(encode_size(1024), "1 KiB");
        assert_eq!(encode_size(1536), "1.5 KiB");
        assert_eq!(encode_size(3 * 1024 * 1024), "3 MiB");
        assert_eq!(encode_size(5 * 1024 * 1024 * 1024 + 512 * 1024 * 1024), "5.5 GiB");
    }
}
