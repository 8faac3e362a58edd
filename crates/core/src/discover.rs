//! Document discovery and output directory handling.

use crate::config::DocumentJob;
use crate::error::{ConvertError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Find all PDF files under `root`, recursively, matching the extension
/// case-insensitively.
///
/// Returns jobs in sorted path order so document ordinals are
/// deterministic across runs. A missing or non-directory root is the
/// only raised error; unreadable subdirectories are logged and skipped.
pub fn find_documents(root: &Path) -> Result<Vec<DocumentJob>> {
    if !root.is_dir() {
        return Err(ConvertError::InputDirNotFound(root.to_path_buf()));
    }

    let mut paths = Vec::new();
    collect_pdfs(root, &mut paths);
    paths.sort();

    info!("Found {} PDF files in {:?}", paths.len(), root);

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| DocumentJob::new(path, index))
        .collect())
}

fn collect_pdfs(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Skipping unreadable directory {:?}: {}", dir, e);
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            collect_pdfs(&path, out);
        } else if path.is_file() && has_pdf_extension(&path) {
            out.push(path);
        }
    }
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| crate::is_supported_extension(e))
        .unwrap_or(false)
}

/// Ensure a directory exists, creating parents as needed.
///
/// Failures are surfaced as `false` (and logged), not raised.
pub fn ensure_directory(path: &Path) -> bool {
    if path.is_dir() {
        return true;
    }
    match fs::create_dir_all(path) {
        Ok(()) => {
            info!("Created output directory {:?}", path);
            true
        }
        Err(e) => {
            warn!("Failed to create output directory {:?}: {}", path, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"%PDF-1.4 stub").unwrap();
    }

    #[test]
    fn test_find_documents_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();

        touch(&dir.path().join("b.pdf"));
        touch(&dir.path().join("a.pdf"));
        touch(&nested.join("c.pdf"));

        let jobs = find_documents(dir.path()).unwrap();
        assert_eq!(jobs.len(), 3);

        // Sorted path order, ordinals assigned in sequence.
        let names: Vec<String> = jobs.iter().map(|j| j.display_name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let indices: Vec<usize> = jobs.iter().map(|j| j.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_find_documents_extension_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("upper.PDF"));
        touch(&dir.path().join("mixed.Pdf"));

        let jobs = find_documents(dir.path()).unwrap();
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn test_find_documents_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("doc.pdf"));
        fs::write(dir.path().join("notes.txt"), b"text").unwrap();
        fs::write(dir.path().join("noext"), b"data").unwrap();

        let jobs = find_documents(dir.path()).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].display_name(), "doc");
    }

    #[test]
    fn test_find_documents_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = find_documents(dir.path()).unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_find_documents_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let result = find_documents(&missing);
        assert!(matches!(result, Err(ConvertError::InputDirNotFound(_))));
    }

    #[test]
    fn test_ensure_directory_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/c");

        assert!(ensure_directory(&target));
        assert!(target.is_dir());

        // Idempotent on an existing directory.
        assert!(ensure_directory(&target));
    }

    #[test]
    fn test_ensure_directory_fails_on_file_in_the_way() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, b"x").unwrap();

        assert!(!ensure_directory(&file));
    }
}
