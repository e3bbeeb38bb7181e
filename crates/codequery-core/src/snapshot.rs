//! Codebase snapshot acquisition
//!
//! A snapshot is a plain directory tree the session indexes and reads from.
//! It comes either from a local folder (copied, so later edits don't shift
//! the session underfoot) or from a GitHub archive zip.

use crate::error::{CodeQueryError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

lazy_static! {
    static ref GITHUB_URL_RE: Regex = Regex::new(
        r"github\.com[:/](?P<owner>[^/]+)/(?P<repo>[^/]+)(?:/tree/(?P<branch>[^/]+)(?P<path>/[^?#]+)?)?"
    )
    .expect("static regex");
}

/// Where a snapshot comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// An existing local directory, copied into the snapshot dir
    LocalDir(PathBuf),
    /// A GitHub repository archive
    GitHub {
        owner: String,
        repo: String,
        branch: String,
        /// Use only this subdirectory of the archive as the snapshot root
        subdir: Option<String>,
    },
}

impl SnapshotSource {
    /// Parse a user-supplied source: a GitHub URL or a local directory path
    pub fn parse(input: &str) -> Result<Self> {
        if input.contains("github.com") {
            let normalized = input.trim_end_matches('/');
            let caps = GITHUB_URL_RE.captures(normalized).ok_or_else(|| {
                CodeQueryError::InvalidInput(format!("unsupported GitHub URL: {}", input))
            })?;
            let repo_raw = &caps["repo"];
            return Ok(Self::GitHub {
                owner: caps["owner"].to_string(),
                repo: repo_raw.strip_suffix(".git").unwrap_or(repo_raw).to_string(),
                branch: caps
                    .name("branch")
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| "main".to_string()),
                subdir: caps
                    .name("path")
                    .map(|m| m.as_str().trim_start_matches('/').to_string()),
            });
        }

        let path = PathBuf::from(input);
        if path.is_dir() {
            Ok(Self::LocalDir(path))
        } else {
            Err(CodeQueryError::InvalidInput(format!(
                "not a directory or GitHub URL: {}",
                input
            )))
        }
    }

    /// Override the archive subdirectory (from a CLI flag)
    pub fn with_subdir(mut self, sub: Option<String>) -> Self {
        if let (Self::GitHub { subdir, .. }, Some(s)) = (&mut self, sub) {
            *subdir = Some(s);
        }
        self
    }
}

/// Materializes snapshot sources into a local directory
pub struct SnapshotFetcher {
    client: reqwest::Client,
}

impl SnapshotFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("codequery/0.1")
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }

    /// Materialize `source` into `dest`, replacing any previous snapshot.
    /// Returns the number of files written.
    pub async fn fetch(&self, source: &SnapshotSource, dest: &Path) -> Result<usize> {
        match source {
            SnapshotSource::LocalDir(src) => copy_tree(src, dest),
            SnapshotSource::GitHub {
                owner,
                repo,
                branch,
                subdir,
            } => {
                let bytes = self.download_archive(owner, repo, branch).await?;
                extract_zip(&bytes, dest, subdir.as_deref())
            }
        }
    }

    /// Download the archive zip, trying `master` when `main` does not exist
    async fn download_archive(&self, owner: &str, repo: &str, branch: &str) -> Result<Vec<u8>> {
        let mut urls = vec![format!(
            "https://github.com/{}/{}/archive/refs/heads/{}.zip",
            owner, repo, branch
        )];
        if branch == "main" {
            urls.push(format!(
                "https://github.com/{}/{}/archive/refs/heads/master.zip",
                owner, repo
            ));
        }

        for url in &urls {
            tracing::info!(url = %url, "downloading repository archive");
            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    let bytes = response.bytes().await?;
                    return Ok(bytes.to_vec());
                }
                Ok(response) => {
                    tracing::warn!(url = %url, status = %response.status(), "archive download failed");
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "archive download failed");
                }
            }
        }

        Err(CodeQueryError::Snapshot(format!(
            "failed to download archive for {}/{} (branch {})",
            owner, repo, branch
        )))
    }
}

impl Default for SnapshotFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy a directory tree into `dest`, replacing it
fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    if !src.is_dir() {
        return Err(CodeQueryError::Snapshot(format!(
            "source directory not found: {}",
            src.display()
        )));
    }
    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }

    let mut count = 0;
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| CodeQueryError::Snapshot(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            count += 1;
        }
    }

    tracing::info!(files = count, dest = %dest.display(), "snapshot copied");
    Ok(count)
}

/// Extract a GitHub archive into `dest`.
///
/// Archives wrap everything in a single `repo-branch/` root directory, which
/// is stripped. With `subdir` set, only that subtree is extracted and it
/// becomes the snapshot root.
fn extract_zip(bytes: &[u8], dest: &Path, subdir: Option<&str>) -> Result<usize> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| CodeQueryError::Snapshot(e.to_string()))?;

    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    std::fs::create_dir_all(dest)?;

    let mut count = 0;
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| CodeQueryError::Snapshot(e.to_string()))?;
        if file.is_dir() {
            continue;
        }

        // enclosed_name rejects paths escaping the extraction root
        let Some(name) = file.enclosed_name() else {
            tracing::warn!(name = file.name(), "skipping unsafe archive entry");
            continue;
        };

        // Strip the `repo-branch/` wrapper
        let mut components = name.components();
        components.next();
        let relative: PathBuf = components.collect();
        if relative.as_os_str().is_empty() {
            continue;
        }

        let relative = match subdir {
            Some(sub) => match relative.strip_prefix(sub) {
                Ok(inner) if !inner.as_os_str().is_empty() => inner.to_path_buf(),
                _ => continue,
            },
            None => relative,
        };

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            continue;
        }

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        std::fs::write(&target, content)?;
        count += 1;
    }

    if count == 0 {
        return Err(CodeQueryError::Snapshot(match subdir {
            Some(sub) => format!("subfolder '{}' not found in archive", sub),
            None => "archive contained no files".to_string(),
        }));
    }

    tracing::info!(files = count, dest = %dest.display(), "archive extracted");
    Ok(count)
}
