//! Project-wide search.

use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// Directories never descended into.
pub const EXCLUDED_DIRS: &[&str] = &[".git", "__pycache__", "node_modules", "venv", ".env"];

/// Extensions searched by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["py", "js", "html", "css", "json", "txt", "md"];

/// Longest preview shown after the location.
const PREVIEW_CHARS: usize = 80;

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectHit {
    pub path: PathBuf,
    /// Path relative to the search root
    pub relative: String,
    /// 1-based line number
    pub line: usize,
    /// Trimmed line text, cut to 80 chars
    pub preview: String,
}

impl ProjectHit {
    pub fn label(&self) -> String {
        format!("{}:{} -> {}", self.relative, self.line, self.preview)
    }
}

#[derive(Debug, Clone)]
pub struct ProjectSearch {
    extensions: Vec<String>,
}

impl Default for ProjectSearch {
    fn default() -> Self {
        Self::with_extensions(DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
    }
}

impl ProjectSearch {
    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    fn wants(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Case-insensitive substring search under `root`.
    ///
    /// Hidden files are included, `.gitignore` rules are honored and
    /// unreadable files are skipped.
    pub fn search(&self, root: &Path, query: &str) -> Vec<ProjectHit> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut walker = WalkBuilder::new(root);
        walker.hidden(false);
        walker.git_ignore(true);
        walker.require_git(false);
        walker.sort_by_file_name(|a, b| a.cmp(b));
        walker.filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            let name = entry.file_name().to_str().unwrap_or("");
            !(is_dir && EXCLUDED_DIRS.contains(&name))
        });

        let mut hits = Vec::new();
        for entry in walker.build().filter_map(std::result::Result::ok) {
            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) || !self.wants(path) {
                continue;
            }
            let Ok(bytes) = fs::read(path) else {
                log::debug!("Skipping unreadable file {}", path.display());
                continue;
            };
            let content = String::from_utf8_lossy(&bytes);
            let relative = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned();

            for (idx, line) in content.lines().enumerate() {
                if line.to_lowercase().contains(&needle) {
                    hits.push(ProjectHit {
                        path: path.to_path_buf(),
                        relative: relative.clone(),
                        line: idx + 1,
                        preview: line.trim().chars().take(PREVIEW_CHARS).collect(),
                    });
                }
            }
        }
        log::info!("Project search for '{}': {} hits", query, hits.len());
        hits
    }
}

/// Labels for the results list, with the empty-state line.
pub fn result_labels(hits: &[ProjectHit]) -> Vec<String> {
    if hits.is_empty() {
        vec!["No results.".to_string()]
    } else {
        hits.iter().map(ProjectHit::label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("src/app.py"), "import os\nprint('Needle here')\n").unwrap();
        fs::write(root.join("notes.md"), "  a needle in the notes  \n").unwrap();
        fs::write(root.join("image.bin"), "needle").unwrap();
        fs::write(root.join("node_modules/lib/x.js"), "needle").unwrap();
        fs::write(root.join(".git/config.txt"), "needle").unwrap();
        dir
    }

    #[test]
    fn finds_lines_case_insensitively() {
        let dir = project();
        let hits = ProjectSearch::default().search(dir.path(), "NEEDLE");

        assert_eq!(hits.len(), 2);
        let relatives: Vec<&str> = hits.iter().map(|h| h.relative.as_str()).collect();
        assert!(relatives.contains(&"notes.md"));
        assert!(relatives.iter().any(|r| r.ends_with("app.py")));

        let py = hits.iter().find(|h| h.relative.ends_with("app.py")).unwrap();
        assert_eq!(py.line, 2);
        assert_eq!(py.preview, "print('Needle here')");
    }

    #[test]
    fn label_format_and_truncation() {
        let dir = TempDir::new().unwrap();
        let long = format!("needle {}", "x".repeat(200));
        fs::write(dir.path().join("long.txt"), &long).unwrap();

        let hits = ProjectSearch::default().search(dir.path(), "needle");
        assert_eq!(hits[0].preview.chars().count(), 80);
        assert!(hits[0].label().starts_with("long.txt:1 -> needle "));
    }

    #[test]
    fn honors_gitignore_and_custom_extensions() {
        let dir = project();
        fs::write(dir.path().join(".gitignore"), "notes.md\n").unwrap();
        let hits = ProjectSearch::default().search(dir.path(), "needle");
        assert_eq!(hits.len(), 1);

        let bins = ProjectSearch::with_extensions(vec!["bin".to_string()]);
        assert_eq!(bins.search(dir.path(), "needle").len(), 1);
    }

    #[test]
    fn empty_results_label() {
        assert_eq!(result_labels(&[]), vec!["No results.".to_string()]);
        let dir = project();
        assert!(ProjectSearch::default().search(dir.path(), "").is_empty());
    }
}
