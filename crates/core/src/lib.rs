//! indentfold: indentation-based code folding for method bodies.
//!
//! Folds are found by indentation alone: a line opens a block when the next
//! line is indented deeper, and the block closes at the next line back at the
//! opener's level. Files opt in through a documentation comment containing
//! `use indentation-based folding strategy`; single-line marker comments can
//! narrow the folded range of an individual method.
//!
//! # Modules
//!
//! - [`finder`]: The indentation block finder and placeholder text
//! - [`markers`]: Activation gate and per-method marker resolution
//! - [`source`]: `LineSource` / `CommentClassifier` seams and an in-memory source
//! - [`outline`]: Lightweight lexer that discovers doc comments, methods and comment lines
//! - [`ast`]: tree-sitter outline backend for Java (feature-gated)
//! - [`scan`]: Parallel project walk that folds every eligible file
//! - [`types`]: Core types shared across the crate

#[cfg(feature = "treesitter")]
pub mod ast;
pub mod finder;
pub mod markers;
pub mod outline;
pub mod scan;
pub mod source;
pub mod types;

use std::path::Path;

use tracing::{debug, warn};

use finder::IndentationBlockFinder;
use markers::{is_activated, resolve_bounds};
use outline::{classify_language, LanguageFamily, Outline};
use source::TextSource;
use types::*;

// ---------------------------------------------------------------------------
// .indentfold.toml config loading
// ---------------------------------------------------------------------------

/// Name of the per-project configuration file.
pub const CONFIG_FILE: &str = ".indentfold.toml";

/// Known keys in `.indentfold.toml` for config validation.
const KNOWN_CONFIG_KEYS: &[&str] = &[
    "tab_size",
    "start_offset",
    "activation_marker",
    "start_marker",
    "end_marker",
    "require_activation",
    "extensions",
    "skip_dirs",
];

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Load folding configuration from `.indentfold.toml` in the given project root.
///
/// Returns a [`FoldConfig`] with defaults merged with any overrides from the config file.
/// If the file doesn't exist or can't be parsed, returns defaults with a warning.
/// Unknown keys and invalid values trigger a warning and are ignored.
pub fn load_indentfold_config(project_root: &Path) -> FoldConfig {
    let mut config = FoldConfig::new(project_root.to_path_buf());
    let config_path = project_root.join(CONFIG_FILE);

    if !config_path.exists() {
        return config;
    }

    debug!("Loading {CONFIG_FILE}");
    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %config_path.display(), error = %e, "Could not read {CONFIG_FILE}");
            return config;
        }
    };
    let table = match content.parse::<toml::Table>() {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "Failed to parse {CONFIG_FILE}");
            return config;
        }
    };

    apply_config_table(&mut config, &table);
    config
}

/// Merge the keys of a parsed config table into `config`.
pub fn apply_config_table(config: &mut FoldConfig, table: &toml::Table) {
    // Validate keys: warn on unknown
    for key in table.keys() {
        if KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
            continue;
        }
        let suggestion = KNOWN_CONFIG_KEYS.iter().min_by_key(|k| edit_distance(key, k));
        match suggestion {
            Some(suggestion) if edit_distance(key, suggestion) <= 3 => warn!(
                key = key.as_str(),
                suggestion = *suggestion,
                "Unknown key in {CONFIG_FILE}: did you mean '{suggestion}'?"
            ),
            _ => warn!(
                key = key.as_str(),
                "Unknown key in {CONFIG_FILE} (known keys: {})",
                KNOWN_CONFIG_KEYS.join(", ")
            ),
        }
    }

    // tab_size
    if let Some(value) = table.get("tab_size") {
        match value.as_integer() {
            Some(n) if n >= 1 => config.tab_size = n as usize,
            _ => warn!(value = %value, "tab_size must be a positive integer, keeping {}", config.tab_size),
        }
    }

    // start_offset
    if let Some(value) = table.get("start_offset") {
        match value.as_str().and_then(StartOffsetPolicy::parse) {
            Some(policy) => config.start_offset = policy,
            None => warn!(value = %value, "start_offset must be \"line-start\" or \"skip-indent\""),
        }
    }

    // markers
    for (key, slot) in [
        ("activation_marker", &mut config.activation_marker),
        ("start_marker", &mut config.start_marker),
        ("end_marker", &mut config.end_marker),
    ] {
        match table.get(key).map(|v| v.as_str()) {
            Some(Some(marker)) if !marker.is_empty() => *slot = marker.to_string(),
            Some(_) => warn!(key, "Marker must be a non-empty string"),
            None => {}
        }
    }

    // require_activation
    if let Some(value) = table.get("require_activation") {
        match value.as_bool() {
            Some(b) => config.require_activation = b,
            None => warn!(value = %value, "require_activation must be a boolean"),
        }
    }

    // extensions
    if let Some(exts) = table.get("extensions").and_then(|v| v.as_array()) {
        config.extensions = exts
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.trim_start_matches('.').to_string()))
            .collect();
    }

    // skip_dirs: merge with defaults
    if let Some(dirs) = table.get("skip_dirs").and_then(|v| v.as_array()) {
        for d in dirs {
            if let Some(s) = d.as_str() {
                config.skip_dirs.insert(s.to_string());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Folding pipeline
// ---------------------------------------------------------------------------

/// Build the outline of a file, preferring tree-sitter when it is compiled in.
pub fn outline_for(content: &str, ext: &str) -> Outline {
    #[cfg(feature = "treesitter")]
    if let Some(outline) = ast::parse_outline(content, ext) {
        return outline;
    }
    outline::outline(content, ext)
}

/// Whether the file's first documentation comment opts it into folding.
pub fn file_is_activated(outline: &Outline, config: &FoldConfig) -> bool {
    !config.require_activation
        || outline.first_doc_comment().is_some_and(|doc| is_activated(doc, &config.activation_marker))
}

/// Fold one file's content. `path` is only used for the report.
///
/// Nothing is folded for languages without brace-delimited methods or for
/// files that are not activated; neither case is an error.
pub fn fold_content(path: &str, content: &str, ext: &str, config: &FoldConfig) -> FileFolds {
    let mut folds = FileFolds { path: path.to_string(), activated: false, units: 0, regions: Vec::new() };

    if classify_language(ext) != LanguageFamily::BraceBased {
        debug!(path, ext, "No method discovery for this language");
        return folds;
    }

    let outline = outline_for(content, ext);
    folds.units = outline.units.len();
    folds.activated = file_is_activated(&outline, config);
    if !folds.activated {
        debug!(path, "Activation marker not found");
        return folds;
    }

    let source = TextSource::new(content);
    let finder = IndentationBlockFinder::from_config(config);
    for unit in &outline.units {
        let bounds = resolve_bounds(&unit.line_comments, unit.body_bounds(), config.markers());
        let regions = finder.find_fold_regions(&source, bounds, &outline.comment_lines);
        debug!(path, unit = unit.name.as_str(), start = bounds.start, end = bounds.end, regions = regions.len(), "Folded unit");
        folds.regions.extend(regions);
    }
    folds
}

/// Fold a source string and return only the regions.
pub fn fold_source(content: &str, ext: &str, config: &FoldConfig) -> Vec<FoldRegion> {
    fold_content("", content, ext, config).regions
}

/// Read and fold a single file from disk.
pub fn fold_file(path: &Path, config: &FoldConfig) -> Result<FileFolds, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Could not read {}: {e}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    Ok(fold_content(&path.display().to_string(), &content, ext, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVE: &str = "/**\n * #use indentation-based folding strategy#\n */\npublic class Page {\n    void render() {\n        html.body()\n            .div()\n                .text(\"x\")\n            .__()\n        .__();\n    }\n}\n";

    #[test]
    fn folds_activated_file() {
        let config = FoldConfig::default();
        let regions = fold_source(ACTIVE, "java", &config);
        // html.body() (5) closes at .__(); (9); .div() (6) closes at .__() (8)
        let pairs: Vec<_> = regions.iter().map(|r| (r.start_line, r.end_line)).collect();
        assert_eq!(pairs, vec![(5, 9), (6, 8)]);
        assert_eq!(regions[0].placeholder, ".body...");
        assert_eq!(regions[1].placeholder, ".div...");
    }

    #[test]
    fn inactive_file_is_skipped_unless_gate_disabled() {
        let src = ACTIVE.replace("#use indentation-based folding strategy#", "A page.");
        let mut config = FoldConfig::default();
        let folds = fold_content("Page.java", &src, "java", &config);
        assert!(!folds.activated);
        assert_eq!(folds.units, 1);
        assert!(folds.regions.is_empty());

        config.require_activation = false;
        assert_eq!(fold_source(&src, "java", &config).len(), 2);
    }

    #[test]
    fn indent_languages_are_not_folded() {
        let config = FoldConfig { require_activation: false, ..FoldConfig::default() };
        assert!(fold_source("def f():\n    if x:\n        y\n    z\n", "py", &config).is_empty());
    }

    #[test]
    fn config_table_overrides_defaults() {
        let table: toml::Table = r#"
            tab_size = 2
            start_offset = "skip-indent"
            start_marker = "fold>"
            require_activation = false
            extensions = [".java", "kt"]
            skip_dirs = ["generated"]
        "#
        .parse()
        .unwrap();
        let mut config = FoldConfig::default();
        apply_config_table(&mut config, &table);
        assert_eq!(config.tab_size, 2);
        assert_eq!(config.start_offset, StartOffsetPolicy::SkipIndent);
        assert_eq!(config.start_marker, "fold>");
        assert_eq!(config.end_marker, END_MARKER);
        assert!(!config.require_activation);
        assert!(config.extensions.contains("java") && config.extensions.contains("kt"));
        assert!(config.skip_dirs.contains("generated") && config.skip_dirs.contains(".git"));
    }

    #[test]
    fn invalid_config_values_keep_defaults() {
        let table: toml::Table = "tab_size = 0\nstart_offset = \"middle\"\nend_marker = \"\"\ntab_sise = 3\n"
            .parse()
            .unwrap();
        let mut config = FoldConfig::default();
        apply_config_table(&mut config, &table);
        assert_eq!(config.tab_size, DEFAULT_TAB_SIZE);
        assert_eq!(config.start_offset, StartOffsetPolicy::LineStart);
        assert_eq!(config.end_marker, END_MARKER);
    }

    #[test]
    fn edit_distance_suggests_close_keys() {
        assert_eq!(edit_distance("tab_sise", "tab_size"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
    }

    #[test]
    fn loads_config_from_project_root() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_indentfold_config(dir.path()).tab_size, DEFAULT_TAB_SIZE);

        std::fs::write(dir.path().join(CONFIG_FILE), "tab_size = 8\n").unwrap();
        assert_eq!(load_indentfold_config(dir.path()).tab_size, 8);

        std::fs::write(dir.path().join(CONFIG_FILE), "tab_size = [").unwrap();
        assert_eq!(load_indentfold_config(dir.path()).tab_size, DEFAULT_TAB_SIZE);
    }
}
