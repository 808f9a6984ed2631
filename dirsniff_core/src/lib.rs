pub mod case_index;
pub mod comparison;
pub mod file_operations;
pub mod ignore_rules;
pub mod text_diff;
pub mod walker;

pub use case_index::CaseInsensitiveIndex;
pub use comparison::{compare, ComparisonEngine, ComparisonResult};
pub use file_operations::{FileOperation, FileOperations, OperationResult};
pub use ignore_rules::IgnoreRules;
pub use text_diff::{classify_line, classify_lines, format_timestamp, DiffLineKind, TextDiffEngine};
pub use walker::{TreeWalker, WalkedFile};
