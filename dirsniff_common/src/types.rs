use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One of the two comparison roots. `Left` is root A, `Right` is root B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// A value observed on both sides of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePair<T> {
    pub left: T,
    pub right: T,
}

impl<T> SidePair<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Exchange the two values, as when the roots are swapped
    pub fn swapped(self) -> Self {
        Self {
            left: self.right,
            right: self.left,
        }
    }
}

/// Outcome of comparing one relative path.
///
/// Each variant only carries the fields that make sense for it: a unique
/// entry has no second mtime to report, an equal entry needs nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Classification {
    /// Present on both sides with identical bytes
    Equal,
    /// Present only under the given root
    Unique { side: Side },
    /// Present on both sides with different bytes
    Modified {
        /// Side with the strictly greater mtime; equal mtimes resolve to `Right`
        newer: Side,
        mtimes: SidePair<SystemTime>,
        sizes: SidePair<u64>,
    },
    /// The pair could not be read for comparison
    Error { message: String },
}

/// Payload-free view of a [`Classification`], handy for counting and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Equal,
    Unique,
    Modified,
    Error,
}

impl Classification {
    pub fn state(&self) -> EntryState {
        match self {
            Classification::Equal => EntryState::Equal,
            Classification::Unique { .. } => EntryState::Unique,
            Classification::Modified { .. } => EntryState::Modified,
            Classification::Error { .. } => EntryState::Error,
        }
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, Classification::Equal)
    }

    pub fn unique_side(&self) -> Option<Side> {
        match self {
            Classification::Unique { side } => Some(*side),
            _ => None,
        }
    }

    pub fn newer_side(&self) -> Option<Side> {
        match self {
            Classification::Modified { newer, .. } => Some(*newer),
            _ => None,
        }
    }
}

/// A classified relative path together with where it lives on each side.
///
/// For a unique entry the path on the missing side is where a copy would land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Forward-slash separated path relative to the roots
    pub relative_path: String,
    pub left_path: PathBuf,
    pub right_path: PathBuf,
    pub classification: Classification,
}

impl EntryRecord {
    pub fn path_on(&self, side: Side) -> &Path {
        match side {
            Side::Left => &self.left_path,
            Side::Right => &self.right_path,
        }
    }
}

/// Per-state counts over a comparison result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub equal: usize,
    pub left_only: usize,
    pub right_only: usize,
    pub modified: usize,
    pub errors: usize,
}

impl ComparisonSummary {
    pub fn record(&mut self, classification: &Classification) {
        self.total += 1;
        match classification {
            Classification::Equal => self.equal += 1,
            Classification::Unique { side: Side::Left } => self.left_only += 1,
            Classification::Unique { side: Side::Right } => self.right_only += 1,
            Classification::Modified { .. } => self.modified += 1,
            Classification::Error { .. } => self.errors += 1,
        }
    }

    /// Number of entries a presentation layer would show a row for
    pub fn differences(&self) -> usize {
        self.total - self.equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_side_other() {
        assert_eq!(Side::Left.other(), Side::Right);
        assert_eq!(Side::Right.other(), Side::Left);
    }

    #[test]
    fn test_side_pair_swapped() {
        let pair = SidePair::new(1u64, 2u64);
        assert_eq!(*pair.get(Side::Left), 1);
        let swapped = pair.swapped();
        assert_eq!(*swapped.get(Side::Left), 2);
        assert_eq!(*swapped.get(Side::Right), 1);
    }

    #[test]
    fn test_classification_accessors() {
        let modified = Classification::Modified {
            newer: Side::Right,
            mtimes: SidePair::new(UNIX_EPOCH, UNIX_EPOCH + Duration::from_secs(5)),
            sizes: SidePair::new(2, 3),
        };
        assert_eq!(modified.state(), EntryState::Modified);
        assert_eq!(modified.newer_side(), Some(Side::Right));
        assert_eq!(modified.unique_side(), None);

        let unique = Classification::Unique { side: Side::Left };
        assert_eq!(unique.unique_side(), Some(Side::Left));
        assert_eq!(unique.newer_side(), None);
        assert!(!unique.is_equal());
        assert!(Classification::Equal.is_equal());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ComparisonSummary::default();
        summary.record(&Classification::Equal);
        summary.record(&Classification::Unique { side: Side::Left });
        summary.record(&Classification::Unique { side: Side::Right });
        summary.record(&Classification::Error {
            message: "denied".to_string(),
        });

        assert_eq!(summary.total, 4);
        assert_eq!(summary.equal, 1);
        assert_eq!(summary.left_only, 1);
        assert_eq!(summary.right_only, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.differences(), 3);
    }
}
