//! Copy/cut/paste of tree entries (separate from the text clipboard).

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::operations::{copy_path, delete, move_path, unique_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipMode {
    Copy,
    Cut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    /// Entry was pasted at this path
    Pasted(PathBuf),
    /// Destination exists; call again with `overwrite` once confirmed
    NeedsOverwrite(PathBuf),
    /// Nothing to paste
    Empty,
}

#[derive(Debug, Clone, Default)]
pub struct FileClipboard {
    entry: Option<(PathBuf, ClipMode)>,
}

impl FileClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(&mut self, path: &Path) {
        self.entry = Some((path.to_path_buf(), ClipMode::Copy));
    }

    pub fn cut(&mut self, path: &Path) {
        self.entry = Some((path.to_path_buf(), ClipMode::Cut));
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn entry(&self) -> Option<(&Path, ClipMode)> {
        self.entry.as_ref().map(|(p, m)| (p.as_path(), *m))
    }

    /// Paste into `target_dir`. An existing destination is only replaced
    /// when `overwrite` is set; a cut entry is cleared after it moved.
    ///
    /// A replacement is first written under a hidden staging name, so the
    /// old destination is only removed once the source is safely copied.
    /// The destination may contain the source.
    pub fn paste(&mut self, target_dir: &Path, overwrite: bool) -> Result<PasteOutcome> {
        let Some((source, mode)) = self.entry.clone() else {
            return Ok(PasteOutcome::Empty);
        };
        if !source.exists() {
            self.entry = None;
            return Ok(PasteOutcome::Empty);
        }
        let Some(name) = source.file_name() else {
            bail!("Cannot paste {}", source.display());
        };
        let destination = target_dir.join(name);

        if destination == source {
            if mode == ClipMode::Cut {
                self.entry = None;
                return Ok(PasteOutcome::Pasted(destination));
            }
            bail!("'{}' is already here", name.to_string_lossy());
        }
        if source.is_dir() && target_dir.starts_with(&source) {
            bail!("Cannot paste a folder into itself");
        }
        let replace = destination.exists();
        if replace && !overwrite {
            return Ok(PasteOutcome::NeedsOverwrite(destination));
        }

        let staging = if replace {
            let stem = format!(".{}.paste", name.to_string_lossy());
            target_dir.join(unique_name(target_dir, &stem, None))
        } else {
            destination.clone()
        };
        match mode {
            ClipMode::Copy => copy_path(&source, &staging)?,
            ClipMode::Cut => {
                move_path(&source, &staging)?;
                self.entry = None;
            }
        }
        if replace {
            delete(&destination)?;
            fs::rename(&staging, &destination).with_context(|| {
                format!(
                    "Pasted copy left at {}; could not rename it to {}",
                    staging.display(),
                    destination.display()
                )
            })?;
        }
        log::info!("Pasted {} to {}", source.display(), destination.display());
        Ok(PasteOutcome::Pasted(destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "one").unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        (dir, file, target)
    }

    #[test]
    fn copy_keeps_source_and_clipboard() {
        let (_dir, file, target) = setup();
        let mut clip = FileClipboard::new();
        clip.copy(&file);

        let outcome = clip.paste(&target, false).unwrap();
        assert_eq!(outcome, PasteOutcome::Pasted(target.join("a.txt")));
        assert!(file.exists());
        assert!(!clip.is_empty());
    }

    #[test]
    fn cut_moves_and_clears() {
        let (_dir, file, target) = setup();
        let mut clip = FileClipboard::new();
        clip.cut(&file);

        clip.paste(&target, false).unwrap();
        assert!(!file.exists());
        assert!(target.join("a.txt").exists());
        assert!(clip.is_empty());
    }

    #[test]
    fn existing_destination_needs_confirmation() {
        let (_dir, file, target) = setup();
        fs::write(target.join("a.txt"), "old").unwrap();
        let mut clip = FileClipboard::new();
        clip.copy(&file);

        let outcome = clip.paste(&target, false).unwrap();
        assert_eq!(outcome, PasteOutcome::NeedsOverwrite(target.join("a.txt")));
        assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "old");

        clip.paste(&target, true).unwrap();
        assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "one");
    }

    #[test]
    fn replacing_the_folder_that_holds_the_source() {
        let dir = TempDir::new().unwrap();
        let outer = dir.path().join("d");
        let inner = outer.join("d");
        fs::create_dir_all(&inner).unwrap();
        fs::write(inner.join("keep.txt"), "data").unwrap();
        fs::write(outer.join("old.txt"), "old").unwrap();

        let mut clip = FileClipboard::new();
        clip.copy(&inner);
        let outcome = clip.paste(dir.path(), false).unwrap();
        assert_eq!(outcome, PasteOutcome::NeedsOverwrite(outer.clone()));

        let outcome = clip.paste(dir.path(), true).unwrap();
        assert_eq!(outcome, PasteOutcome::Pasted(outer.clone()));
        assert_eq!(fs::read_to_string(outer.join("keep.txt")).unwrap(), "data");
        assert!(!outer.join("old.txt").exists());
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("d")]);
    }

    #[test]
    fn cut_into_the_folder_that_holds_it() {
        let dir = TempDir::new().unwrap();
        let outer = dir.path().join("d");
        let inner = outer.join("d");
        fs::create_dir_all(&inner).unwrap();
        fs::write(inner.join("keep.txt"), "data").unwrap();

        let mut clip = FileClipboard::new();
        clip.cut(&inner);
        clip.paste(dir.path(), true).unwrap();
        assert_eq!(fs::read_to_string(outer.join("keep.txt")).unwrap(), "data");
        assert!(!outer.join("d").exists());
        assert!(clip.is_empty());
    }

    #[test]
    fn folder_into_itself_is_rejected() {
        let (dir, _file, target) = setup();
        let mut clip = FileClipboard::new();
        clip.copy(&target);
        assert!(clip.paste(&target, false).is_err());
        assert!(clip.paste(dir.path(), false).is_err());
        assert_eq!(FileClipboard::new().paste(dir.path(), false).unwrap(), PasteOutcome::Empty);
    }
}
