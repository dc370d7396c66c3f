//! Corpus discovery.

use crate::error::{Result, SweepError};
use std::fs;
use std::path::{Path, PathBuf};

/// One audio file of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFile {
    pub path: PathBuf,
    /// File name without extension; names the artifact directory.
    pub basename: String,
}

impl CorpusFile {
    fn from_path(path: PathBuf) -> Option<Self> {
        let basename = path.file_stem()?.to_string_lossy().into_owned();
        Some(Self { path, basename })
    }
}

/// Finds every file with `extension` (case-insensitive) under `root`,
/// recursively, sorted by path. A file given as `root` is a corpus of one.
pub fn discover(root: &Path, extension: &str) -> Result<Vec<CorpusFile>> {
    let metadata = fs::metadata(root).map_err(|e| SweepError::ConfigInvalidValue {
        key: "corpus".to_string(),
        message: format!("{}: {}", root.display(), e),
    })?;

    if metadata.is_file() {
        return Ok(CorpusFile::from_path(root.to_path_buf()).into_iter().collect());
    }

    let mut paths = Vec::new();
    collect(root, extension, &mut paths)?;
    paths.sort();
    Ok(paths.into_iter().filter_map(CorpusFile::from_path).collect())
}

/// Walks `dir` without following symlinked directories, so links back into
/// the tree cannot loop. Symlinks to files are kept.
fn collect(dir: &Path, extension: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            collect(&path, extension, out)?;
            continue;
        }
        if !path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        {
            continue;
        }
        if file_type.is_symlink() && !path.is_file() {
            tracing::debug!(path = %path.display(), "Skipping symlink that is not a file");
            continue;
        }
        out.push(path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_discover_is_recursive_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.wav"));
        touch(&dir.path().join("a.WAV"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("sub/c.wav"));

        let files = discover(dir.path(), "wav").unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.basename.as_str()).collect();

        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(files[2].path, dir.path().join("sub/c.wav"));
    }

    #[test]
    fn test_single_file_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("only.wav");
        touch(&path);

        let files = discover(&path, "wav").unwrap();
        assert_eq!(
            files,
            vec![CorpusFile {
                path,
                basename: "only".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path(), "wav").unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_not_followed() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.wav"));
        touch(&dir.path().join("sub/b.wav"));
        symlink(dir.path(), dir.path().join("sub/loop")).unwrap();
        symlink(dir.path().join("a.wav"), dir.path().join("sub/alias.wav")).unwrap();

        let files = discover(dir.path(), "wav").unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.basename.as_str()).collect();

        assert_eq!(names, vec!["a", "alias", "b"]);
    }

    #[test]
    fn test_missing_corpus_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&dir.path().join("missing"), "wav").unwrap_err();
        assert!(err.is_config_error());
    }
}
