use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use dirsniff_common::{
    load_config, save_config, AppConfig, Classification, ComparisonSummary, EntryRecord,
    EntryState, LoadedConfig, Preset, Side, SniffError,
};
use dirsniff_core::{
    classify_lines, format_timestamp, ComparisonEngine, ComparisonResult, DiffLineKind,
    FileOperations, IgnoreRules, TextDiffEngine,
};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const EXIT_NO_DIFFERENCE: i32 = 0;
const EXIT_DIFFERENCES: i32 = 2;
const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "dirsniff")]
#[command(author = "DirSniff Contributors")]
#[command(version)]
#[command(about = "Find files that differ between two directory trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two directories and list the files that differ
    Compare {
        #[command(flatten)]
        roots: RootArgs,

        /// Also list identical files
        #[arg(short, long)]
        all: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Disable ANSI colors in output
        #[arg(long)]
        no_color: bool,

        /// Compare file contents on all cores
        #[arg(long)]
        parallel: bool,
    },
    /// Copy a file to the side that lacks it or holds the older version
    Copy {
        /// Path relative to the roots (letter case is ignored)
        path: String,

        #[command(flatten)]
        roots: RootArgs,

        /// Only report what would be copied
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Delete a file that exists on one side only
    Delete {
        /// Path relative to the roots (letter case is ignored)
        path: String,

        #[command(flatten)]
        roots: RootArgs,

        /// Only report what would be deleted
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Move the file to the trash instead of deleting it
        #[arg(long)]
        trash: bool,
    },
    /// Show a unified diff from the older to the newer version of a file
    Diff {
        /// Path relative to the roots (letter case is ignored)
        path: String,

        #[command(flatten)]
        roots: RootArgs,

        /// Disable ANSI colors in output
        #[arg(long)]
        no_color: bool,
    },
    /// Manage saved comparison presets
    Presets {
        #[command(subcommand)]
        action: PresetAction,
    },
}

#[derive(Args)]
struct RootArgs {
    /// Left directory (root A)
    left: Option<PathBuf>,

    /// Right directory (root B)
    right: Option<PathBuf>,

    /// Glob pattern for directory names to skip (repeatable)
    #[arg(short = 'D', long = "ignore-dir", value_name = "PATTERN")]
    ignore_dirs: Vec<String>,

    /// Glob pattern for file names to skip (repeatable)
    #[arg(short = 'F', long = "ignore-file", value_name = "PATTERN")]
    ignore_files: Vec<String>,

    /// Take roots and ignore patterns from a saved preset
    #[arg(short, long)]
    preset: Option<String>,

    /// Exchange the left and right roots
    #[arg(long)]
    swap: bool,
}

#[derive(Subcommand)]
enum PresetAction {
    /// List presets whose directories exist
    List {
        /// Include presets pointing at missing directories
        #[arg(short, long)]
        all: bool,
    },
    /// Print one preset
    Show { name: String },
    /// Save a preset, replacing one with the same name
    Add {
        name: String,
        left: PathBuf,
        right: PathBuf,

        #[arg(short = 'D', long = "ignore-dir", value_name = "PATTERN")]
        ignore_dirs: Vec<String>,

        #[arg(short = 'F', long = "ignore-file", value_name = "PATTERN")]
        ignore_files: Vec<String>,

        /// Use this preset when no roots are given
        #[arg(long)]
        default: bool,
    },
    /// Delete a preset
    Remove { name: String },
}

/// Roots and rules for one comparison run, after presets are applied
#[derive(Debug)]
struct ResolvedRoots {
    left: PathBuf,
    right: PathBuf,
    ignore_dirs: Vec<String>,
    ignore_files: Vec<String>,
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn run(command: Commands) -> anyhow::Result<i32> {
    match command {
        Commands::Compare {
            roots,
            all,
            json,
            no_color,
            parallel,
        } => run_compare(roots, all, json, no_color, parallel),
        Commands::Copy {
            path,
            roots,
            dry_run,
        } => {
            let entry = find_entry(roots, &path)?;
            let outcome = FileOperations::new(dry_run, false).copy_to_other_side(&entry)?;
            if let Some(dest) = &outcome.destination {
                println!(
                    "{} {} -> {}",
                    if outcome.dry_run { "Would copy" } else { "Copied" },
                    outcome.source.display(),
                    dest.display()
                );
            }
            Ok(EXIT_NO_DIFFERENCE)
        }
        Commands::Delete {
            path,
            roots,
            dry_run,
            trash,
        } => {
            let entry = find_entry(roots, &path)?;
            let outcome = FileOperations::new(dry_run, trash).delete(&entry)?;
            println!(
                "{} {}",
                if outcome.dry_run { "Would delete" } else { "Deleted" },
                outcome.source.display()
            );
            Ok(EXIT_NO_DIFFERENCE)
        }
        Commands::Diff {
            path,
            roots,
            no_color,
        } => {
            let entry = find_entry(roots, &path)?;
            let diff = TextDiffEngine::new().unified_diff(&entry)?;
            let use_color = !no_color && std::io::stdout().is_terminal();
            for (kind, line) in classify_lines(&diff) {
                println!("{}", colorize_diff_line(kind, line, use_color));
            }
            Ok(EXIT_NO_DIFFERENCE)
        }
        Commands::Presets { action } => run_presets(action),
    }
}

fn resolve_roots(args: RootArgs, config: &AppConfig) -> anyhow::Result<ResolvedRoots> {
    let preset_name = args
        .preset
        .clone()
        .or_else(|| match (&args.left, &args.right) {
            (None, None) => config.default_preset.clone(),
            _ => None,
        });
    let preset = match preset_name {
        Some(name) => Some(config.preset(&name)?),
        None => None,
    };

    let left = args.left.or_else(|| preset.map(|p| p.left.clone()));
    let right = args.right.or_else(|| preset.map(|p| p.right.clone()));
    let (mut left, mut right) = match (left, right) {
        (Some(left), Some(right)) => (left, right),
        _ => bail!("LEFT and RIGHT directories are required unless a preset is given"),
    };
    if args.swap {
        std::mem::swap(&mut left, &mut right);
    }

    let mut ignore_dirs = preset.map(|p| p.ignore_dirs.clone()).unwrap_or_default();
    ignore_dirs.extend(args.ignore_dirs);
    let mut ignore_files = preset.map(|p| p.ignore_files.clone()).unwrap_or_default();
    ignore_files.extend(args.ignore_files);

    Ok(ResolvedRoots {
        left,
        right,
        ignore_dirs,
        ignore_files,
    })
}

fn load_cli_config() -> anyhow::Result<LoadedConfig> {
    let loaded = load_config()?;
    debug!(
        "Using {} configuration {}{}",
        if loaded.portable { "portable" } else { "user" },
        loaded.path.display(),
        if loaded.exists { "" } else { " (not created yet)" }
    );
    Ok(loaded)
}

fn run_comparison(roots: &ResolvedRoots, parallel: bool) -> anyhow::Result<ComparisonResult> {
    info!("Comparing:");
    info!("  Left:  {}", roots.left.display());
    info!("  Right: {}", roots.right.display());

    let rules = IgnoreRules::new(&roots.ignore_dirs, &roots.ignore_files)?;
    let result = ComparisonEngine::new(rules)
        .with_parallel_content(parallel)
        .compare(&roots.left, &roots.right)?;
    Ok(result)
}

fn find_entry(args: RootArgs, path: &str) -> anyhow::Result<EntryRecord> {
    let loaded = load_cli_config()?;
    let roots = resolve_roots(args, &loaded.config)?;
    let result = run_comparison(&roots, false)?;
    result
        .get(&normalize_relative(path))
        .cloned()
        .ok_or_else(|| SniffError::UnknownEntry(path.to_string()).into())
}

/// Accept `\` separators and a leading `./` on the command line
fn normalize_relative(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    slashed.trim_start_matches("./").trim_matches('/').to_string()
}

fn run_compare(
    args: RootArgs,
    all: bool,
    json: bool,
    no_color: bool,
    parallel: bool,
) -> anyhow::Result<i32> {
    let loaded = load_cli_config()?;
    let roots = resolve_roots(args, &loaded.config)?;
    let result = run_comparison(&roots, parallel)?;
    let summary = result.summary();

    if json {
        let report = build_json_report(&result, !all);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let use_color = !no_color && std::io::stdout().is_terminal();
        print_results(&result, &summary, all, use_color);
    }

    Ok(if summary.differences() == 0 {
        EXIT_NO_DIFFERENCE
    } else {
        EXIT_DIFFERENCES
    })
}

fn status_symbol(classification: &Classification) -> &'static str {
    match classification {
        Classification::Equal => "==",
        Classification::Unique { side: Side::Left } => "<<",
        Classification::Unique { side: Side::Right } => ">>",
        Classification::Modified { newer: Side::Left, .. } => "->",
        Classification::Modified { newer: Side::Right, .. } => "<-",
        Classification::Error { .. } => "!!",
    }
}

fn status_color(classification: &Classification) -> &'static str {
    match classification {
        Classification::Equal => "\x1b[32m",                          // Green
        Classification::Unique { side: Side::Left } => "\x1b[33m",   // Yellow
        Classification::Unique { side: Side::Right } => "\x1b[34m",  // Blue
        Classification::Modified { .. } => "\x1b[31m",               // Red
        Classification::Error { .. } => "\x1b[35m",                  // Magenta
    }
}

/// `YYYY-MM-DD HH:MM:SS, N Bytes`
fn short_stats(modified: SystemTime, size: u64) -> String {
    format!("{}, {} Bytes", format_timestamp(modified), size)
}

fn describe(entry: &EntryRecord) -> String {
    match &entry.classification {
        Classification::Equal => String::new(),
        Classification::Unique { side: Side::Left } => "only left".to_string(),
        Classification::Unique { side: Side::Right } => "only right".to_string(),
        Classification::Modified { mtimes, sizes, .. } => format!(
            "left: {} | right: {}",
            short_stats(mtimes.left, sizes.left),
            short_stats(mtimes.right, sizes.right)
        ),
        Classification::Error { message } => format!("error: {}", message),
    }
}

fn print_results(
    result: &ComparisonResult,
    summary: &ComparisonSummary,
    all: bool,
    use_color: bool,
) {
    println!("\n{}", "=".repeat(80));
    println!("Comparison Results");
    println!("  Left:  {}", result.left_root().display());
    println!("  Right: {}", result.right_root().display());
    println!("{}", "=".repeat(80));

    if summary.differences() == 0 && !all {
        println!("No difference.");
    }

    for entry in result.iter() {
        if !all && entry.classification.is_equal() {
            continue;
        }

        let (color, reset) = if use_color {
            (status_color(&entry.classification), "\x1b[0m")
        } else {
            ("", "")
        };
        let details = describe(entry);
        if details.is_empty() {
            println!(
                "{}  {}  {}{}",
                color,
                status_symbol(&entry.classification),
                reset,
                entry.relative_path
            );
        } else {
            println!(
                "{}  {}  {}{}  ({})",
                color,
                status_symbol(&entry.classification),
                reset,
                entry.relative_path,
                details
            );
        }
    }

    println!("\n{}", "=".repeat(80));
    println!("Summary:");
    println!("  Total entries:   {}", summary.total);
    println!("  Identical:       {} (==)", summary.equal);
    println!("  Modified:        {} (-> / <-)", summary.modified);
    println!("  Left only:       {} (<<)", summary.left_only);
    println!("  Right only:      {} (>>)", summary.right_only);
    println!("  Errors:          {} (!!)", summary.errors);
    println!("{}", "=".repeat(80));
}

fn colorize_diff_line(kind: DiffLineKind, line: &str, use_color: bool) -> String {
    if !use_color {
        return line.to_string();
    }
    let color = match kind {
        DiffLineKind::Header => "\x1b[1m",
        DiffLineKind::HunkHeader => "\x1b[36m",
        DiffLineKind::Added => "\x1b[32m",
        DiffLineKind::Removed => "\x1b[31m",
        DiffLineKind::Context => return line.to_string(),
    };
    format!("{}{}\x1b[0m", color, line)
}

#[derive(Serialize)]
struct JsonReport {
    left: String,
    right: String,
    summary: ComparisonSummary,
    entries: Vec<JsonEntry>,
}

#[derive(Serialize)]
struct JsonEntry {
    path: String,
    state: EntryState,
    unique_side: Option<Side>,
    newer_side: Option<Side>,
    left: Option<JsonFileSide>,
    right: Option<JsonFileSide>,
    error: Option<String>,
}

#[derive(Serialize)]
struct JsonFileSide {
    size: u64,
    modified_unix: Option<u64>,
}

fn build_json_report(result: &ComparisonResult, diff_only: bool) -> JsonReport {
    let entries = result
        .iter()
        .filter(|entry| !(diff_only && entry.classification.is_equal()))
        .map(json_entry)
        .collect();

    JsonReport {
        left: result.left_root().to_string_lossy().to_string(),
        right: result.right_root().to_string_lossy().to_string(),
        summary: result.summary(),
        entries,
    }
}

fn json_entry(entry: &EntryRecord) -> JsonEntry {
    let (left, right) = match &entry.classification {
        Classification::Modified { mtimes, sizes, .. } => (
            Some(JsonFileSide {
                size: sizes.left,
                modified_unix: system_time_to_unix(mtimes.left),
            }),
            Some(JsonFileSide {
                size: sizes.right,
                modified_unix: system_time_to_unix(mtimes.right),
            }),
        ),
        _ => (None, None),
    };
    let error = match &entry.classification {
        Classification::Error { message } => Some(message.clone()),
        _ => None,
    };

    JsonEntry {
        path: entry.relative_path.clone(),
        state: entry.classification.state(),
        unique_side: entry.classification.unique_side(),
        newer_side: entry.classification.newer_side(),
        left,
        right,
        error,
    }
}

fn system_time_to_unix(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

fn run_presets(action: PresetAction) -> anyhow::Result<i32> {
    let loaded = load_cli_config()?;
    let mut config = loaded.config;

    match action {
        PresetAction::List { all } => {
            let presets: Vec<&Preset> = if all {
                let mut presets: Vec<&Preset> = config.presets.iter().collect();
                presets.sort_by(|a, b| a.name.cmp(&b.name));
                presets
            } else {
                config.available_presets()
            };
            if !loaded.exists {
                println!("No presets saved yet ({} does not exist).", loaded.path.display());
            } else if presets.is_empty() {
                println!("No presets.");
            }
            for preset in presets {
                let marker = if config.default_preset.as_deref() == Some(preset.name.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {}: {} <-> {}",
                    marker,
                    preset.name,
                    preset.left.display(),
                    preset.right.display()
                );
            }
        }
        PresetAction::Show { name } => {
            let preset = config.preset(&name)?;
            println!("name:         {}", preset.name);
            println!("left:         {}", preset.left.display());
            println!("right:        {}", preset.right.display());
            println!("ignore dirs:  {}", preset.ignore_dirs.join(", "));
            println!("ignore files: {}", preset.ignore_files.join(", "));
        }
        PresetAction::Add {
            name,
            left,
            right,
            ignore_dirs,
            ignore_files,
            default,
        } => {
            // Reject bad patterns before they are saved
            IgnoreRules::new(&ignore_dirs, &ignore_files)?;
            if default {
                config.default_preset = Some(name.clone());
            }
            config.upsert_preset(Preset {
                name: name.clone(),
                left,
                right,
                ignore_dirs,
                ignore_files,
            });
            save_config(&loaded.path, &config)?;
            info!("Saved preset {} to {}", name, loaded.path.display());
        }
        PresetAction::Remove { name } => {
            config.remove_preset(&name)?;
            save_config(&loaded.path, &config)?;
            info!("Removed preset {}", name);
        }
    }

    Ok(EXIT_NO_DIFFERENCE)
}
