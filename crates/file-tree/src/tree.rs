use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::icons::icon_for;

/// One visible row of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub depth: usize,
    pub expanded: bool,
}

impl TreeRow {
    pub fn icon(&self) -> &'static str {
        icon_for(&self.name, self.is_dir)
    }
}

/// What activating a row did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    OpenFile(PathBuf),
    Toggled,
    Nothing,
}

/// Expandable view of a project directory.
///
/// Only expanded directories are read; `refresh` re-reads them and keeps
/// the selection on the same path when it still exists.
#[derive(Debug, Default)]
pub struct FileTree {
    root: Option<PathBuf>,
    expanded: HashSet<PathBuf>,
    rows: Vec<TreeRow>,
    selected: usize,
    scroll_offset: usize,
}

fn read_children(dir: &Path) -> Result<Vec<(PathBuf, String, bool)>> {
    let mut children: Vec<(PathBuf, String, bool)> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                return None;
            }
            let path = entry.path();
            let is_dir = path.is_dir();
            Some((path, name, is_dir))
        })
        .collect();
    children.sort_by(|a, b| {
        b.2.cmp(&a.2)
            .then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase()))
    });
    Ok(children)
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Switch to a new project root (or none).
    pub fn set_root(&mut self, root: Option<PathBuf>) -> Result<()> {
        self.root = root;
        self.expanded.clear();
        self.selected = 0;
        self.scroll_offset = 0;
        self.refresh()
    }

    /// Button label: the root folder name, or `no_project` without a root.
    pub fn root_label(&self, no_project: &str) -> String {
        self.root
            .as_ref()
            .and_then(|r| r.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| no_project.to_string())
    }

    /// Re-read the visible part of the tree from disk.
    pub fn refresh(&mut self) -> Result<()> {
        let selected_path = self.selected_row().map(|r| r.path.clone());
        self.rows.clear();
        self.expanded.retain(|p| p.is_dir());

        if let Some(root) = self.root.clone() {
            self.push_children(&root, 0)?;
        }

        match selected_path.and_then(|p| self.rows.iter().position(|r| r.path == p)) {
            Some(idx) => self.selected = idx,
            None => self.selected = self.selected.min(self.rows.len().saturating_sub(1)),
        }
        Ok(())
    }

    fn push_children(&mut self, dir: &Path, depth: usize) -> Result<()> {
        for (path, name, is_dir) in read_children(dir)? {
            let expanded = is_dir && self.expanded.contains(&path);
            self.rows.push(TreeRow {
                path: path.clone(),
                name,
                is_dir,
                depth,
                expanded,
            });
            if expanded {
                if let Err(e) = self.push_children(&path, depth + 1) {
                    log::warn!("{:#}", e);
                }
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&TreeRow> {
        self.rows.get(self.selected)
    }

    pub fn select(&mut self, index: usize) {
        if !self.rows.is_empty() {
            self.selected = index.min(self.rows.len() - 1);
        }
    }

    /// Select the row for `path`, expanding its ancestors. False if the path
    /// is not under the root.
    pub fn select_path(&mut self, path: &Path) -> bool {
        if let Some(idx) = self.rows.iter().position(|r| r.path == path) {
            self.selected = idx;
            return true;
        }
        let Some(root) = self.root.clone() else {
            return false;
        };
        if !path.starts_with(&root) || path == root {
            return false;
        }
        let mut changed = false;
        for ancestor in path.ancestors().skip(1) {
            if ancestor == root {
                break;
            }
            changed |= self.expanded.insert(ancestor.to_path_buf());
        }
        if changed && self.refresh().is_err() {
            return false;
        }
        match self.rows.iter().position(|r| r.path == path) {
            Some(idx) => {
                self.selected = idx;
                true
            }
            None => false,
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    /// Enter on a row: files open, directories toggle.
    pub fn activate(&mut self) -> Result<Activation> {
        let Some(row) = self.selected_row().cloned() else {
            return Ok(Activation::Nothing);
        };
        if !row.is_dir {
            return Ok(Activation::OpenFile(row.path));
        }
        if !self.expanded.remove(&row.path) {
            self.expanded.insert(row.path);
        }
        self.refresh()?;
        Ok(Activation::Toggled)
    }

    /// Left arrow: collapse the directory, or jump to the parent row.
    pub fn collapse_or_parent(&mut self) -> Result<()> {
        let Some(row) = self.selected_row().cloned() else {
            return Ok(());
        };
        if row.is_dir && row.expanded {
            self.expanded.remove(&row.path);
            return self.refresh();
        }
        if let Some(parent) = row.path.parent() {
            if let Some(idx) = self.rows.iter().position(|r| r.path == parent) {
                self.selected = idx;
            }
        }
        Ok(())
    }

    /// Right arrow: expand a collapsed directory.
    pub fn expand(&mut self) -> Result<()> {
        match self.selected_row() {
            Some(row) if row.is_dir && !row.expanded => {
                let path = row.path.clone();
                self.expanded.insert(path);
                self.refresh()
            }
            _ => Ok(()),
        }
    }

    /// Where new entries go: the selected directory, else the selected
    /// file's directory, else the root.
    pub fn target_dir(&self) -> Option<PathBuf> {
        match self.selected_row() {
            Some(row) if row.is_dir => Some(row.path.clone()),
            Some(row) => row.path.parent().map(Path::to_path_buf),
            None => self.root.clone(),
        }
    }

    /// Keep the selection inside a window of `height` rows.
    pub fn scroll_offset(&mut self, height: usize) -> usize {
        if height == 0 {
            return self.scroll_offset;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
        self.scroll_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/utils")).unwrap();
        fs::create_dir(root.join("Docs")).unwrap();
        fs::write(root.join("src/main.py"), "").unwrap();
        fs::write(root.join("src/utils/helpers.py"), "").unwrap();
        fs::write(root.join("b.txt"), "").unwrap();
        fs::write(root.join("A.md"), "").unwrap();
        fs::write(root.join(".hidden"), "").unwrap();
        dir
    }

    fn names(tree: &FileTree) -> Vec<&str> {
        tree.rows().iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn directories_first_case_insensitive() {
        let dir = project();
        let mut tree = FileTree::new();
        tree.set_root(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(names(&tree), vec!["Docs", "src", "A.md", "b.txt"]);
    }

    #[test]
    fn expand_and_open() {
        let dir = project();
        let mut tree = FileTree::new();
        tree.set_root(Some(dir.path().to_path_buf())).unwrap();

        tree.select(1);
        assert_eq!(tree.activate().unwrap(), Activation::Toggled);
        assert_eq!(names(&tree), vec!["Docs", "src", "utils", "main.py", "A.md", "b.txt"]);
        assert_eq!(tree.rows()[2].depth, 1);

        tree.select(3);
        assert_eq!(
            tree.activate().unwrap(),
            Activation::OpenFile(dir.path().join("src/main.py"))
        );

        tree.collapse_or_parent().unwrap();
        assert_eq!(tree.selected_row().unwrap().name, "src");
        tree.collapse_or_parent().unwrap();
        assert_eq!(tree.rows().len(), 4);
    }

    #[test]
    fn select_path_expands_ancestors() {
        let dir = project();
        let mut tree = FileTree::new();
        tree.set_root(Some(dir.path().to_path_buf())).unwrap();

        let target = dir.path().join("src/utils/helpers.py");
        assert!(tree.select_path(&target));
        assert_eq!(tree.selected_row().unwrap().path, target);
        assert!(!tree.select_path(Path::new("/definitely/elsewhere")));
    }

    #[test]
    fn target_dir_rules() {
        let dir = project();
        let mut tree = FileTree::new();
        assert_eq!(tree.target_dir(), None);

        tree.set_root(Some(dir.path().to_path_buf())).unwrap();
        tree.select(1);
        assert_eq!(tree.target_dir(), Some(dir.path().join("src")));
        tree.select(2);
        assert_eq!(tree.target_dir(), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn refresh_picks_up_changes_and_keeps_selection() {
        let dir = project();
        let mut tree = FileTree::new();
        tree.set_root(Some(dir.path().to_path_buf())).unwrap();
        tree.select(3);
        fs::write(dir.path().join("0_first.txt"), "").unwrap();
        tree.refresh().unwrap();
        assert_eq!(tree.selected_row().unwrap().name, "b.txt");
        assert_eq!(tree.rows().len(), 5);
    }

    #[test]
    fn labels_and_scrolling() {
        let mut tree = FileTree::new();
        assert_eq!(tree.root_label("No project"), "No project");

        let dir = project();
        tree.set_root(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(
            tree.root_label("No project"),
            dir.path().file_name().unwrap().to_string_lossy()
        );

        tree.select(3);
        assert_eq!(tree.scroll_offset(2), 2);
        tree.select(0);
        assert_eq!(tree.scroll_offset(2), 0);
    }
}
