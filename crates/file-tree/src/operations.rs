use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Deepest directory nesting a recursive copy will follow.
const MAX_COPY_DEPTH: usize = 64;

/// First free name in `dir`: `stem.ext`, `stem_1.ext`, `stem_2.ext`, ...
pub fn unique_name(dir: &Path, stem: &str, ext: Option<&str>) -> String {
    let compose = |suffix: Option<usize>| {
        let base = match suffix {
            Some(n) => format!("{}_{}", stem, n),
            None => stem.to_string(),
        };
        match ext {
            Some(ext) => format!("{}.{}", base, ext),
            None => base,
        }
    };

    let mut name = compose(None);
    let mut counter = 1;
    while dir.join(&name).exists() {
        name = compose(Some(counter));
        counter += 1;
    }
    name
}

/// Create an empty `new_file.txt` (or the next free variant) in `dir`.
pub fn create_file(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(unique_name(dir, "new_file", Some("txt")));
    fs::write(&path, "").with_context(|| format!("Could not create {}", path.display()))?;
    log::info!("Created file {}", path.display());
    Ok(path)
}

/// Create `new_folder` (or the next free variant) in `dir`.
pub fn create_folder(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(unique_name(dir, "new_folder", None));
    fs::create_dir(&path).with_context(|| format!("Could not create {}", path.display()))?;
    log::info!("Created folder {}", path.display());
    Ok(path)
}

/// Rename `path` within its directory. Returns the new path.
pub fn rename(path: &Path, new_name: &str) -> Result<PathBuf> {
    let new_name = new_name.trim();
    if new_name.is_empty() || new_name == "." || new_name == ".." {
        bail!("Invalid name");
    }
    if new_name.contains('/') || new_name.contains('\\') {
        bail!("Name cannot contain path separators");
    }
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("Cannot rename {}", path.display()))?;
    let target = parent.join(new_name);
    if target == path {
        return Ok(target);
    }
    if target.exists() {
        bail!("'{}' already exists", new_name);
    }
    fs::rename(path, &target)
        .with_context(|| format!("Could not rename {}", path.display()))?;
    Ok(target)
}

/// Delete a file or a directory tree.
pub fn delete(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)
        .with_context(|| format!("Could not delete {}", path.display()))?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
    .with_context(|| format!("Could not delete {}", path.display()))?;
    log::info!("Deleted {}", path.display());
    Ok(())
}

/// Copy a file, or a directory recursively (symlinks copied as links).
pub fn copy_path(source: &Path, destination: &Path) -> Result<()> {
    if source.is_dir() {
        copy_dir(source, destination, 0)
    } else {
        fs::copy(source, destination)
            .map(|_| ())
            .with_context(|| format!("Could not copy {}", source.display()))
    }
}

fn copy_dir(source: &Path, destination: &Path, depth: usize) -> Result<()> {
    if depth > MAX_COPY_DEPTH {
        bail!("Directory nesting too deep (> {})", MAX_COPY_DEPTH);
    }
    fs::create_dir_all(destination)?;

    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let source_path = entry.path();
        let dest_path = destination.join(entry.file_name());
        let metadata = fs::symlink_metadata(&source_path)?;

        if metadata.is_symlink() {
            #[cfg(unix)]
            std::os::unix::fs::symlink(fs::read_link(&source_path)?, &dest_path)?;
            #[cfg(not(unix))]
            fs::copy(&source_path, &dest_path)?;
        } else if metadata.is_dir() {
            copy_dir(&source_path, &dest_path, depth + 1)?;
        } else {
            fs::copy(&source_path, &dest_path)?;
        }
    }
    Ok(())
}

/// Move a file or directory, falling back to copy + delete across
/// filesystems.
pub fn move_path(source: &Path, destination: &Path) -> Result<()> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    copy_path(source, destination)?;
    delete(source)
}
