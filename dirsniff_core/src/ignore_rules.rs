use dirsniff_common::{Preset, SniffError};
use glob::{MatchOptions, Pattern};
use tracing::debug;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Shell-glob rules deciding which directory and file names a walk skips.
///
/// Patterns are matched against a single basename, never a full path, so
/// `build` prunes a `build` directory at any depth.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    dirs: Vec<Pattern>,
    files: Vec<Pattern>,
}

impl IgnoreRules {
    /// Rules that prune nothing
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new<D, F>(ignore_dirs: D, ignore_files: F) -> Result<Self, SniffError>
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        Ok(Self {
            dirs: compile(ignore_dirs)?,
            files: compile(ignore_files)?,
        })
    }

    pub fn from_preset(preset: &Preset) -> Result<Self, SniffError> {
        Self::new(&preset.ignore_dirs, &preset.ignore_files)
    }

    pub fn should_prune_dir(&self, name: &str) -> bool {
        matches_any(&self.dirs, name)
    }

    pub fn should_prune_file(&self, name: &str) -> bool {
        matches_any(&self.files, name)
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }
}

fn compile<I>(patterns: I) -> Result<Vec<Pattern>, SniffError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            debug!("Added ignore pattern: {}", pattern);
            Pattern::new(pattern).map_err(|e| SniffError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.msg.to_string(),
            })
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], name: &str) -> bool {
    patterns
        .iter()
        .any(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rules_prune_nothing() {
        let rules = IgnoreRules::none();
        assert!(rules.is_empty());
        assert!(!rules.should_prune_dir("build"));
        assert!(!rules.should_prune_file(".hidden"));
    }

    #[test]
    fn test_dir_and_file_rules_are_independent() {
        let rules = IgnoreRules::new(["build"], ["*.pyc"]).unwrap();
        assert!(rules.should_prune_dir("build"));
        assert!(!rules.should_prune_file("build"));
        assert!(rules.should_prune_file("module.pyc"));
        assert!(!rules.should_prune_dir("module.pyc"));
    }

    #[test]
    fn test_glob_syntax() {
        let rules = IgnoreRules::new(["__py*__", ".?it"], ["file[0-9].txt", "[!a]*.log"]).unwrap();
        assert!(rules.should_prune_dir("__pycache__"));
        assert!(rules.should_prune_dir(".git"));
        assert!(!rules.should_prune_dir(".gitx"));
        assert!(rules.should_prune_file("file7.txt"));
        assert!(!rules.should_prune_file("fileX.txt"));
        assert!(rules.should_prune_file("build.log"));
        assert!(!rules.should_prune_file("access.log"));
    }

    #[test]
    fn test_whole_name_match_only() {
        let rules = IgnoreRules::new(["build"], Vec::<String>::new()).unwrap();
        assert!(!rules.should_prune_dir("build2"));
        assert!(!rules.should_prune_dir("prebuild"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let rules = IgnoreRules::new(Vec::<String>::new(), ["*.TMP"]).unwrap();
        assert!(rules.should_prune_file("a.TMP"));
        assert!(!rules.should_prune_file("a.tmp"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = IgnoreRules::new(["[abc"], Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, SniffError::InvalidPattern { pattern, .. } if pattern == "[abc"));
    }

    #[test]
    fn test_from_preset() {
        let preset = Preset {
            name: "p".to_string(),
            left: "/a".into(),
            right: "/b".into(),
            ignore_dirs: vec!["target".to_string()],
            ignore_files: vec![],
        };
        let rules = IgnoreRules::from_preset(&preset).unwrap();
        assert!(rules.should_prune_dir("target"));
        assert!(!rules.should_prune_file("target"));
    }
}
