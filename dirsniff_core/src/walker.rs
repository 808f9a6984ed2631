use crate::ignore_rules::IgnoreRules;
use dirsniff_common::SniffError;
use jwalk::{Parallelism, WalkDir};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A file found by a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Path relative to the walked root, components joined with `/`
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

/// Recursive directory walker that prunes by [`IgnoreRules`] at every level
#[derive(Debug, Clone)]
pub struct TreeWalker {
    rules: Arc<IgnoreRules>,
}

impl TreeWalker {
    pub fn new(rules: Arc<IgnoreRules>) -> Self {
        Self { rules }
    }

    /// Start a fresh traversal of `root`.
    ///
    /// The root must exist and be a directory. Subdirectories that fail to
    /// read during the walk (for example because they vanished) are skipped
    /// with a warning. Entries come out sorted by name within each directory.
    pub fn walk(&self, root: &Path) -> Result<impl Iterator<Item = WalkedFile>, SniffError> {
        validate_root(root)?;
        debug!("Walking {:?}", root);

        let mut walker = WalkDir::new(root)
            .follow_links(false)
            .skip_hidden(false)
            .sort(true)
            .parallelism(Parallelism::Serial);

        if !self.rules.is_empty() {
            let rules = Arc::clone(&self.rules);
            walker = walker.process_read_dir(move |depth, _path, _state, children| {
                // The root itself arrives with no depth and is never pruned
                if depth.is_none() {
                    return;
                }
                children.retain(|child| match child {
                    Ok(entry) => {
                        let name = entry.file_name.to_string_lossy();
                        if entry.file_type.is_dir() {
                            let prune = rules.should_prune_dir(&name);
                            if prune {
                                debug!("Pruned directory {:?}", entry.path());
                            }
                            !prune
                        } else {
                            !rules.should_prune_file(&name)
                        }
                    }
                    Err(_) => true,
                });
            });
        }

        let root = root.to_path_buf();
        Ok(walker.into_iter().filter_map(move |entry| match entry {
            Ok(entry) => {
                if let Some(err) = &entry.read_children_error {
                    warn!("Skipping unreadable directory {:?}: {}", entry.path(), err);
                    return None;
                }
                if entry.depth == 0 || entry.file_type.is_dir() {
                    return None;
                }
                let absolute_path = entry.path();
                // Linked directories are listed but never descended into
                if entry.file_type.is_symlink() && absolute_path.is_dir() {
                    return None;
                }
                let relative_path = relative_slash_path(&root, &absolute_path)?;
                Some(WalkedFile {
                    relative_path,
                    absolute_path,
                })
            }
            Err(err) => {
                warn!("Skipping unreadable directory under {:?}: {}", root, err);
                None
            }
        }))
    }
}

/// Check that a comparison root exists and is a directory
pub fn validate_root(root: &Path) -> Result<(), SniffError> {
    if !root.exists() {
        return Err(SniffError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(SniffError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Express `path` relative to `root` with `/` separators on every platform
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
