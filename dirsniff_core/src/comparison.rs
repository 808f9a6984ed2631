use crate::case_index::CaseInsensitiveIndex;
use crate::ignore_rules::IgnoreRules;
use crate::walker::{validate_root, TreeWalker, WalkedFile};
use dirsniff_common::{
    Classification, ComparisonSummary, EntryRecord, Side, SidePair, SniffError,
};
use rayon::prelude::*;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

const BUFFER_SIZE: usize = 64 * 1024;

/// Classifies every file under two roots as equal, unique or modified.
///
/// A run is two passes over one shared [`CaseInsensitiveIndex`]. The left
/// pass walks root A, looks each file up under root B and records the
/// outcome. The right pass walks root B and only records paths the left
/// pass never saw, which are the files unique to B. The right pass starts
/// after every left-pass record has been committed, so no logical path is
/// ever reported twice.
pub struct ComparisonEngine {
    left_rules: Arc<IgnoreRules>,
    right_rules: Arc<IgnoreRules>,
    parallel_content: bool,
}

impl ComparisonEngine {
    /// Engine applying the same ignore rules to both walks
    pub fn new(rules: IgnoreRules) -> Self {
        let rules = Arc::new(rules);
        Self {
            left_rules: Arc::clone(&rules),
            right_rules: rules,
            parallel_content: false,
        }
    }

    /// Engine with separate rules per walk. A file pruned only on the left
    /// shows up as unique to the right, and the other way round.
    pub fn with_side_rules(left: IgnoreRules, right: IgnoreRules) -> Self {
        Self {
            left_rules: Arc::new(left),
            right_rules: Arc::new(right),
            parallel_content: false,
        }
    }

    /// Run the byte comparisons of the left pass on the rayon pool.
    /// The result is the same as in sequential mode.
    pub fn with_parallel_content(mut self, enabled: bool) -> Self {
        self.parallel_content = enabled;
        self
    }

    pub fn compare(
        &self,
        left_root: &Path,
        right_root: &Path,
    ) -> Result<ComparisonResult, SniffError> {
        validate_root(left_root)?;
        validate_root(right_root)?;
        info!("Comparing {:?} with {:?}", left_root, right_root);

        let mut entries = CaseInsensitiveIndex::new();
        self.left_pass(left_root, right_root, &mut entries)?;
        debug!("Left pass recorded {} entries", entries.len());
        self.right_pass(left_root, right_root, &mut entries)?;

        let result = ComparisonResult {
            left_root: left_root.to_path_buf(),
            right_root: right_root.to_path_buf(),
            entries,
        };
        let summary = result.summary();
        info!(
            "Classified {} entries: {} equal, {} modified, {} left only, {} right only, {} errors",
            summary.total,
            summary.equal,
            summary.modified,
            summary.left_only,
            summary.right_only,
            summary.errors
        );
        Ok(result)
    }

    fn left_pass(
        &self,
        left_root: &Path,
        right_root: &Path,
        entries: &mut CaseInsensitiveIndex<EntryRecord>,
    ) -> Result<(), SniffError> {
        let files = TreeWalker::new(Arc::clone(&self.left_rules)).walk(left_root)?;
        let located = files.map(|file| {
            let counterpart = locate_counterpart(right_root, &file.relative_path);
            (file, counterpart)
        });

        if self.parallel_content {
            let located: Vec<(WalkedFile, Option<PathBuf>)> = located.collect();
            let classified: Vec<Classification> = located
                .par_iter()
                .map(|(file, counterpart)| {
                    classify_pair(&file.absolute_path, counterpart.as_deref())
                })
                .collect();
            for ((file, counterpart), classification) in located.into_iter().zip(classified) {
                record_left(entries, right_root, file, counterpart, classification);
            }
        } else {
            for (file, counterpart) in located {
                let classification = classify_pair(&file.absolute_path, counterpart.as_deref());
                record_left(entries, right_root, file, counterpart, classification);
            }
        }
        Ok(())
    }

    fn right_pass(
        &self,
        left_root: &Path,
        right_root: &Path,
        entries: &mut CaseInsensitiveIndex<EntryRecord>,
    ) -> Result<(), SniffError> {
        for file in TreeWalker::new(Arc::clone(&self.right_rules)).walk(right_root)? {
            if let Some(existing) = entries.get(&file.relative_path) {
                if existing.right_path != file.absolute_path {
                    warn!(
                        "Skipping {} on the right: differs only in case from {}",
                        file.relative_path, existing.relative_path
                    );
                }
                continue;
            }
            debug!("Only on the right: {}", file.relative_path);
            let record = EntryRecord {
                left_path: join_relative(left_root, &file.relative_path),
                right_path: file.absolute_path,
                relative_path: file.relative_path.clone(),
                classification: Classification::Unique { side: Side::Right },
            };
            entries.insert(file.relative_path, record);
        }
        Ok(())
    }
}

fn record_left(
    entries: &mut CaseInsensitiveIndex<EntryRecord>,
    right_root: &Path,
    file: WalkedFile,
    counterpart: Option<PathBuf>,
    classification: Classification,
) {
    if let Some(existing) = entries.get_original_case(&file.relative_path) {
        warn!(
            "Skipping {} on the left: differs only in case from {}",
            file.relative_path, existing
        );
        return;
    }

    debug!("{}: {:?}", file.relative_path, classification.state());
    let record = EntryRecord {
        right_path: counterpart.unwrap_or_else(|| join_relative(right_root, &file.relative_path)),
        left_path: file.absolute_path,
        relative_path: file.relative_path.clone(),
        classification,
    };
    entries.insert(file.relative_path, record);
}

/// Compare a left-side file with its counterpart under the right root
fn classify_pair(left: &Path, right: Option<&Path>) -> Classification {
    let right = match right {
        Some(path) if path.is_file() => path,
        _ => return Classification::Unique { side: Side::Left },
    };

    match fs::metadata(left) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            return Classification::Error {
                message: format!("{} is not a regular file", left.display()),
            }
        }
        Err(e) => return read_error(left, e),
    }

    match files_identical(left, right) {
        Ok(true) => Classification::Equal,
        Ok(false) => match modified_record(left, right) {
            Ok(classification) => classification,
            Err(e) => read_error(left, e),
        },
        Err(e) => read_error(left, e),
    }
}

fn modified_record(left: &Path, right: &Path) -> io::Result<Classification> {
    let left_meta = fs::metadata(left)?;
    let right_meta = fs::metadata(right)?;
    let mtimes = SidePair::new(
        left_meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        right_meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
    );
    Ok(Classification::Modified {
        newer: newer_side(&mtimes),
        mtimes,
        sizes: SidePair::new(left_meta.len(), right_meta.len()),
    })
}

/// The left side is newer only when its mtime is strictly greater; a tie
/// goes to the right.
pub fn newer_side(mtimes: &SidePair<SystemTime>) -> Side {
    if mtimes.left > mtimes.right {
        Side::Left
    } else {
        Side::Right
    }
}

fn read_error(path: &Path, err: io::Error) -> Classification {
    warn!("Failed to compare {}: {}", path.display(), err);
    Classification::Error {
        message: err.to_string(),
    }
}

/// Byte-for-byte comparison of two files
pub fn files_identical(left: &Path, right: &Path) -> io::Result<bool> {
    let mut left_file = fs::File::open(left)?;
    let mut right_file = fs::File::open(right)?;

    if left_file.metadata()?.len() != right_file.metadata()?.len() {
        return Ok(false);
    }

    let mut left_buf = vec![0u8; BUFFER_SIZE];
    let mut right_buf = vec![0u8; BUFFER_SIZE];
    loop {
        let left_read = read_chunk(&mut left_file, &mut left_buf)?;
        let right_read = read_chunk(&mut right_file, &mut right_buf)?;
        if left_buf[..left_read] != right_buf[..right_read] {
            return Ok(false);
        }
        if left_read == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the reader allows; short only at end of file
fn read_chunk(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Find the regular file `relative` names under `root`.
///
/// Each component tries the exact spelling first, then every name in the
/// directory that matches it case-insensitively, in sorted order. A
/// candidate that leads nowhere is abandoned for the next one, so
/// `Docs/` and `docs/` side by side are both searched. Linked directories
/// are not descended into.
pub fn locate_counterpart(root: &Path, relative: &str) -> Option<PathBuf> {
    let components: Vec<&str> = relative.split('/').collect();
    resolve_components(root, &components)
}

fn resolve_components(dir: &Path, components: &[&str]) -> Option<PathBuf> {
    let (name, rest) = components.split_first()?;
    if let Some(found) = resolve_candidate(dir.join(name), rest) {
        return Some(found);
    }
    case_variants(dir, name)
        .into_iter()
        .find_map(|candidate| resolve_candidate(candidate, rest))
}

fn resolve_candidate(candidate: PathBuf, rest: &[&str]) -> Option<PathBuf> {
    if rest.is_empty() {
        return candidate.is_file().then_some(candidate);
    }
    match fs::symlink_metadata(&candidate) {
        Ok(meta) if meta.is_dir() => resolve_components(&candidate, rest),
        _ => None,
    }
}

/// Names in `dir` other than `name` itself that equal it ignoring case
fn case_variants(dir: &Path, name: &str) -> Vec<PathBuf> {
    let wanted = name.to_lowercase();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut matches: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let found = entry.file_name();
            let found = found.to_string_lossy();
            found != name && found.to_lowercase() == wanted
        })
        .map(|entry| entry.path())
        .collect();
    matches.sort();
    if !matches.is_empty() {
        debug!("{} matches {:?} ignoring case", name, matches);
    }
    matches
}

fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(root.to_path_buf(), |path, component| path.join(component))
}

/// Compare two roots with one set of ignore rules
pub fn compare(
    left_root: &Path,
    right_root: &Path,
    rules: &IgnoreRules,
) -> Result<ComparisonResult, SniffError> {
    ComparisonEngine::new(rules.clone()).compare(left_root, right_root)
}

/// Every classified path of one comparison run, in discovery order
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    left_root: PathBuf,
    right_root: PathBuf,
    entries: CaseInsensitiveIndex<EntryRecord>,
}

impl ComparisonResult {
    pub fn left_root(&self) -> &Path {
        &self.left_root
    }

    pub fn right_root(&self) -> &Path {
        &self.right_root
    }

    /// Look up an entry; letter case of `relative_path` is ignored
    pub fn get(&self, relative_path: &str) -> Option<&EntryRecord> {
        self.entries.get(relative_path)
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.entries.contains(relative_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntryRecord> {
        self.entries.values()
    }

    /// Entries that are not byte-identical on both sides
    pub fn differences(&self) -> impl Iterator<Item = &EntryRecord> {
        self.iter().filter(|entry| !entry.classification.is_equal())
    }

    pub fn summary(&self) -> ComparisonSummary {
        let mut summary = ComparisonSummary::default();
        for entry in self.iter() {
            summary.record(&entry.classification);
        }
        summary
    }

    pub fn into_entries(self) -> Vec<EntryRecord> {
        self.entries.into_iter().map(|(_, entry)| entry).collect()
    }
}
