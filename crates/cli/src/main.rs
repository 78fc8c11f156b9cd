//! indentfold CLI: print indentation fold regions from the terminal.
//!
//! Calls `indentfold-core` directly; every subcommand supports `--json`.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use indentfold_core::finder::IndentationBlockFinder;
use indentfold_core::markers::resolve_bounds;
use indentfold_core::scan::fold_project;
use indentfold_core::source::{CommentLines, TextSource};
use indentfold_core::types::*;
use indentfold_core::{file_is_activated, fold_content, load_indentfold_config, outline_for};

/// indentfold: indentation-based folding for method bodies.
#[derive(Parser, Debug)]
#[command(name = "indentfold", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,
}

/// Overrides for values normally read from `.indentfold.toml`.
#[derive(clap::Args, Debug, Default)]
struct FoldArgs {
    /// Spaces per indentation level
    #[arg(long)]
    tab_size: Option<usize>,

    /// Start regions after the opening line's indentation
    #[arg(long)]
    skip_indent: bool,

    /// Fold files even without the activation marker
    #[arg(long)]
    no_gate: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fold a single file
    Fold {
        /// Source file
        file: PathBuf,

        #[command(flatten)]
        args: FoldArgs,
    },
    /// Run the block finder on an explicit line range of any file
    Lines {
        /// Source file
        file: PathBuf,

        /// First line of the range (0-based)
        #[arg(long)]
        start: usize,

        /// Last line of the range (0-based, inclusive)
        #[arg(long)]
        end: usize,

        #[command(flatten)]
        args: FoldArgs,
    },
    /// Show activation state, discovered methods and their scan ranges
    Outline {
        /// Source file
        file: PathBuf,
    },
    /// Fold every eligible file in a project
    Scan {
        /// Project root (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Only fold files whose relative path matches this regex
        #[arg(long)]
        filter: Option<String>,

        /// Maximum number of files to list
        #[arg(long, default_value = "50")]
        limit: usize,

        #[command(flatten)]
        args: FoldArgs,
    },
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf, String> {
    let root = match root {
        Some(r) => r,
        None => std::env::current_dir().map_err(|e| format!("Could not determine current directory: {e}"))?,
    };
    root.canonicalize().map_err(|e| format!("Path '{}' not found: {e}", root.display()))
}

/// Config for a file: the nearest `.indentfold.toml` up from its directory, then CLI overrides.
fn config_for(file: &Path, args: &FoldArgs) -> FoldConfig {
    let dir = file.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let root = dir
        .ancestors()
        .find(|d| d.join(indentfold_core::CONFIG_FILE).exists())
        .unwrap_or(dir);
    tracing::debug!(file = %file.display(), root = %root.display(), "Resolved config root");
    let mut config = load_indentfold_config(root);
    apply_overrides(&mut config, args);
    config
}

fn apply_overrides(config: &mut FoldConfig, args: &FoldArgs) {
    if let Some(tab_size) = args.tab_size {
        config.tab_size = tab_size.max(1);
    }
    if args.skip_indent {
        config.start_offset = StartOffsetPolicy::SkipIndent;
    }
    if args.no_gate {
        config.require_activation = false;
    }
}

fn read_source(file: &Path) -> Result<(String, String), String> {
    let content =
        std::fs::read_to_string(file).map_err(|e| format!("Could not read {}: {e}", file.display()))?;
    let ext = file.extension().and_then(|e| e.to_str()).unwrap_or("").to_string();
    Ok((content, ext))
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => fail(format!("Could not serialize output: {e}")),
    }
}

fn print_regions(regions: &[FoldRegion]) {
    for r in regions {
        println!("{:>5} - {:<5} {:>7}..{:<7} {}", r.start_line + 1, r.end_line + 1, r.start_offset, r.end_offset, r.placeholder);
    }
}

/// Comment flags from the file outline, so block comment continuation lines count too.
fn comment_lines(content: &str, ext: &str) -> CommentLines {
    outline_for(content, ext).comment_lines
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("indentfold=warn".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fold { file, args } => {
            let config = config_for(&file, &args);
            let (content, ext) = read_source(&file).unwrap_or_else(|e| fail(e));
            let folds = fold_content(&file.display().to_string(), &content, &ext, &config);

            if cli.json {
                print_json(&folds);
            } else {
                if !folds.activated {
                    eprintln!("{}: not activated (no '{}' doc comment)", folds.path, config.activation_marker);
                    std::process::exit(1);
                }
                print_regions(&folds.regions);
                eprintln!("\n{} regions in {} methods", folds.regions.len(), folds.units);
            }
        }
        Commands::Lines { file, start, end, args } => {
            let config = config_for(&file, &args);
            let (content, ext) = read_source(&file).unwrap_or_else(|e| fail(e));
            let comments = comment_lines(&content, &ext);
            let source = TextSource::new(content);
            let finder = IndentationBlockFinder::from_config(&config);
            let regions = finder.find_fold_regions(&source, LineBounds::new(start, end), &comments);

            if cli.json {
                print_json(&regions);
            } else {
                print_regions(&regions);
                eprintln!("\n{} regions", regions.len());
            }
        }
        Commands::Outline { file } => {
            let config = config_for(&file, &FoldArgs::default());
            let (content, ext) = read_source(&file).unwrap_or_else(|e| fail(e));
            let outline = outline_for(&content, &ext);
            let activated = file_is_activated(&outline, &config);
            let units: Vec<_> = outline
                .units
                .iter()
                .map(|u| (u, resolve_bounds(&u.line_comments, u.body_bounds(), config.markers())))
                .collect();

            if cli.json {
                let items: Vec<serde_json::Value> = units
                    .iter()
                    .map(|(u, bounds)| {
                        serde_json::json!({
                            "name": u.name,
                            "header_line": u.header_line,
                            "open_line": u.open_line,
                            "close_line": u.close_line,
                            "scan": bounds,
                            "markers": u.line_comments.iter().filter(|c| c.text.contains(&config.start_marker) || c.text.contains(&config.end_marker)).count(),
                        })
                    })
                    .collect();
                print_json(&serde_json::json!({
                    "path": file.display().to_string(),
                    "family": outline.family,
                    "activated": activated,
                    "doc_comments": outline.doc_comments.len(),
                    "units": items,
                }));
            } else {
                println!("File:       {}", file.display());
                println!("Family:     {:?}", outline.family);
                println!("Activated:  {activated}");
                println!("Doc blocks: {}", outline.doc_comments.len());
                println!("\nMethods:");
                for (u, bounds) in &units {
                    println!("  {:<30} body {}-{}  scan {}-{}", u.name, u.open_line + 1, u.close_line + 1, bounds.start + 1, bounds.end + 1);
                }
            }
        }
        Commands::Scan { root, filter, limit, args } => {
            let root = resolve_root(root).unwrap_or_else(|e| fail(e));
            let mut config = load_indentfold_config(&root);
            apply_overrides(&mut config, &args);

            let re = match filter.as_deref().map(regex::Regex::new).transpose() {
                Ok(re) => re,
                Err(e) => fail(format!("Invalid filter: {e}")),
            };
            let report = fold_project(&config, |path| re.as_ref().map_or(true, |re| re.is_match(path)));

            if cli.json {
                print_json(&report);
            } else {
                if report.files.is_empty() {
                    eprintln!("No activated files under {}", root.display());
                    std::process::exit(1);
                }
                for f in report.files.iter().take(limit) {
                    println!("{:<60} {:>4} methods {:>5} regions", f.path, f.units, f.regions.len());
                }
                eprintln!(
                    "\n{} regions in {} activated files ({} scanned, {}ms)",
                    report.region_count, report.files_activated, report.files_scanned, report.scan_time_ms
                );
            }
        }
    }
}
