use chrono::{DateTime, Local};
use dirsniff_common::{Classification, EntryRecord, SniffError};
use similar::TextDiff;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Kind of a rendered unified diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineKind {
    Header,
    HunkHeader,
    Added,
    Removed,
    Context,
}

/// Renders unified diffs of modified entries, from the older file to the newer
#[derive(Debug, Clone)]
pub struct TextDiffEngine {
    context_radius: usize,
}

impl Default for TextDiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDiffEngine {
    pub fn new() -> Self {
        Self { context_radius: 3 }
    }

    pub fn with_context_radius(mut self, lines: usize) -> Self {
        self.context_radius = lines;
        self
    }

    /// Unified diff of a modified entry
    pub fn unified_diff(&self, entry: &EntryRecord) -> Result<String, SniffError> {
        let (newer, mtimes) = match &entry.classification {
            Classification::Modified { newer, mtimes, .. } => (*newer, mtimes),
            _ => {
                return Err(SniffError::InvalidOperation(format!(
                    "{} is not modified; only modified files can be diffed",
                    entry.relative_path
                )))
            }
        };
        let older = newer.other();

        let old_path = entry.path_on(older);
        let new_path = entry.path_on(newer);
        let old_label = header_label(old_path, *mtimes.get(older));
        let new_label = header_label(new_path, *mtimes.get(newer));
        self.diff_files(old_path, new_path, &old_label, &new_label)
    }

    /// Unified diff between two UTF-8 text files
    pub fn diff_files(
        &self,
        old_path: &Path,
        new_path: &Path,
        old_label: &str,
        new_label: &str,
    ) -> Result<String, SniffError> {
        let old = read_text(old_path)?;
        let new = read_text(new_path)?;
        Ok(self.diff_text(&old, &new, old_label, new_label))
    }

    pub fn diff_text(&self, old: &str, new: &str, old_label: &str, new_label: &str) -> String {
        TextDiff::from_lines(old, new)
            .unified_diff()
            .context_radius(self.context_radius)
            .header(old_label, new_label)
            .to_string()
    }
}

/// Classify each line of a rendered unified diff for coloring.
///
/// Only the two leading `---`/`+++` lines are file headers; further down,
/// `--- x` is a removed line whose content starts with `--`.
pub fn classify_lines(diff: &str) -> impl Iterator<Item = (DiffLineKind, &str)> {
    diff.lines().enumerate().map(|(index, line)| {
        let is_header = match index {
            0 => line.starts_with("--- "),
            1 => line.starts_with("+++ "),
            _ => false,
        };
        let kind = if is_header {
            DiffLineKind::Header
        } else {
            classify_line(line)
        };
        (kind, line)
    })
}

/// Classify a diff body line (anything after the file headers)
pub fn classify_line(line: &str) -> DiffLineKind {
    if line.starts_with("@@") {
        DiffLineKind::HunkHeader
    } else if line.starts_with('+') {
        DiffLineKind::Added
    } else if line.starts_with('-') {
        DiffLineKind::Removed
    } else {
        DiffLineKind::Context
    }
}

/// Local `YYYY-MM-DD HH:MM:SS` rendering of a modification time
pub fn format_timestamp(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn header_label(path: &Path, modified: SystemTime) -> String {
    format!("{}\t{}", path.display(), format_timestamp(modified))
}

fn read_text(path: &Path) -> Result<String, SniffError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            Err(SniffError::NotText(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}
