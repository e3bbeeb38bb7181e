//! File index over a codebase snapshot
//!
//! Built once per session by walking the snapshot root; read-only afterwards.
//! Each record carries just enough metadata (line count, extension, a short
//! preview) for the reasoning engine to pick candidate files without the
//! index ever holding full file contents.

use crate::error::{CodeQueryError, Result};
use crate::reader::FileReader;
use std::collections::HashMap;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Directories never indexed
const EXCLUDE_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".cache",
    "vendor",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "target",
];

/// Extensions treated as binary and skipped
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "pdf", "zip", "gz", "tar", "so", "dll", "exe", "bin",
    "o", "a", "class", "pyc", "woff", "woff2", "ttf",
];

/// Metadata for one indexed file
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Path relative to the snapshot root; unique within a session
    pub path: String,
    /// Line count, estimated past the preview window for large files
    pub line_count: usize,
    /// File extension without the dot, empty if none
    pub extension: String,
    /// Bounded prefix of the file content
    pub preview: String,
}

/// Immutable catalogue of the snapshot's files
#[derive(Debug)]
pub struct FileIndex {
    records: Vec<FileRecord>,
    by_path: HashMap<String, usize>,
}

impl FileIndex {
    /// Walk `root` and build the index.
    ///
    /// Previews are read through `reader` with a bounded prefix, so the cost
    /// is linear in file count rather than file size. Fails when the root
    /// does not exist or contains zero eligible files; individual unreadable
    /// files are logged and skipped.
    pub fn build(root: &Path, reader: &dyn FileReader, preview_chars: usize) -> Result<Self> {
        if !root.is_dir() {
            return Err(CodeQueryError::IndexBuild(format!(
                "snapshot root not found: {}",
                root.display()
            )));
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !should_skip(e));

        let mut paths = Vec::new();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if BINARY_EXTENSIONS.contains(&extension.as_str()) {
                continue;
            }

            let relative = path
                .strip_prefix(root)
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_else(|_| path.to_string_lossy().to_string());
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

            paths.push((relative, extension, size));
        }

        paths.sort_by(|a, b| a.0.cmp(&b.0));

        let mut records = Vec::with_capacity(paths.len());
        let mut by_path = HashMap::with_capacity(paths.len());

        for (path, extension, size) in paths {
            let preview = match reader.read_prefix(&path, preview_chars) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "failed to preview file, skipping");
                    continue;
                }
            };

            let line_count = estimate_line_count(&preview, size, preview_chars);

            by_path.insert(path.clone(), records.len());
            records.push(FileRecord {
                path,
                line_count,
                extension,
                preview,
            });
        }

        if records.is_empty() {
            return Err(CodeQueryError::IndexBuild(format!(
                "no eligible files under {}",
                root.display()
            )));
        }

        tracing::info!(files = records.len(), "file index built");
        Ok(Self { records, by_path })
    }

    /// Look up a record by its exact path
    pub fn lookup(&self, path: &str) -> Option<&FileRecord> {
        self.by_path.get(path).map(|&i| &self.records[i])
    }

    /// Records whose path starts with `prefix`, in path order
    pub fn list_dir(&self, prefix: &str) -> Vec<&FileRecord> {
        self.records
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }

    /// All records in path order
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Numbered path overview for selection prompts, elided past `limit`
    pub fn overview(&self, limit: usize) -> String {
        let mut lines: Vec<String> = self
            .records
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, r)| {
                format!(
                    "{}. {} ({} lines, {})",
                    i + 1,
                    r.path,
                    r.line_count,
                    if r.extension.is_empty() {
                        "no ext"
                    } else {
                        r.extension.as_str()
                    }
                )
            })
            .collect();

        if self.records.len() > limit {
            lines.push(format!("... and {} more files", self.records.len() - limit));
        }

        lines.join("\n")
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn should_skip(entry: &DirEntry) -> bool {
    // The walk root itself is never filtered, whatever its name
    if entry.depth() == 0 {
        return false;
    }

    let name = entry.file_name().to_string_lossy();

    if name.starts_with('.') && name.len() > 1 {
        return true;
    }

    entry.file_type().is_dir() && EXCLUDE_DIRS.iter().any(|d| name == *d)
}

/// Exact line count when the whole file fits in the preview window,
/// otherwise extrapolated from the window's line density.
fn estimate_line_count(preview: &str, size: u64, preview_chars: usize) -> usize {
    let preview_lines = preview.lines().count();
    if (size as usize) <= preview_chars || preview.is_empty() {
        return preview_lines;
    }
    preview_lines * size as usize / preview.len().max(1)
}
