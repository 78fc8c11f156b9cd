//! Project scan: walk a source tree and fold every eligible file.

use ignore::WalkBuilder;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

use crate::outline::{classify_language, LanguageFamily};
use crate::types::*;

/// Result of folding a whole project.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub files_scanned: usize,
    pub files_activated: usize,
    pub region_count: usize,
    /// Activated files with their regions, sorted by path.
    pub files: Vec<FileFolds>,
    pub scan_time_ms: u64,
}

/// Should a file with this extension be folded?
pub fn is_eligible(ext: &str, extensions: &HashSet<String>) -> bool {
    if extensions.is_empty() {
        classify_language(ext) == LanguageFamily::BraceBased
    } else {
        extensions.contains(ext)
    }
}

fn walk_files_parallel(
    project_root: &Path,
    skip_dirs: &HashSet<String>,
    extensions: &HashSet<String>,
) -> Vec<(PathBuf, String)> {
    let results: Mutex<Vec<(PathBuf, String)>> = Mutex::new(Vec::new());

    let skip = skip_dirs.clone();
    WalkBuilder::new(project_root)
        .hidden(true)
        .git_ignore(true)
        .threads(rayon::current_num_threads().min(12))
        .filter_entry(move |entry| {
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                let name = entry.file_name().to_string_lossy();
                return !skip.contains(name.as_ref());
            }
            true
        })
        .build_parallel()
        .run(|| {
            Box::new(|entry| {
                let entry = match entry {
                    Ok(e) => e,
                    Err(_) => return ignore::WalkState::Continue,
                };
                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    return ignore::WalkState::Continue;
                }

                let abs_path = entry.path().to_path_buf();
                let ext = abs_path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if !is_eligible(ext, extensions) {
                    return ignore::WalkState::Continue;
                }

                let rel_path = abs_path
                    .strip_prefix(project_root)
                    .unwrap_or(&abs_path)
                    .to_string_lossy()
                    .replace('\\', "/");

                if let Ok(mut files) = results.lock() {
                    files.push((abs_path, rel_path));
                }
                ignore::WalkState::Continue
            })
        });

    results.into_inner().unwrap_or_default()
}

/// Fold every eligible file under `config.root` in parallel.
///
/// `filter` restricts the scan to relative paths it accepts. Files that are
/// unreadable, too large, or not activated are counted but left out of the
/// report's file list.
pub fn fold_project(config: &FoldConfig, filter: impl Fn(&str) -> bool + Sync) -> ScanReport {
    let start = Instant::now();
    info!(root = %config.root.display(), "Scanning project");

    let files: Vec<(PathBuf, String)> =
        walk_files_parallel(&config.root, &config.skip_dirs, &config.extensions)
            .into_iter()
            .filter(|(_, rel)| filter(rel))
            .collect();

    let mut folded: Vec<FileFolds> = files
        .par_iter()
        .filter_map(|(abs_path, rel_path)| {
            let size = fs::metadata(abs_path).map(|m| m.len()).unwrap_or(0);
            if size as usize > MAX_FILE_READ {
                debug!(path = rel_path.as_str(), size, "Skipping large file");
                return None;
            }
            let content = fs::read_to_string(abs_path).ok()?;
            let ext = abs_path.extension().and_then(|e| e.to_str()).unwrap_or("");
            Some(crate::fold_content(rel_path, &content, ext, config))
        })
        .collect();

    let files_scanned = folded.len();
    folded.retain(|f| f.activated);
    folded.sort_by(|a, b| a.path.cmp(&b.path));

    let region_count = folded.iter().map(|f| f.regions.len()).sum();
    let scan_time_ms = start.elapsed().as_millis() as u64;

    info!(
        files = files_scanned,
        activated = folded.len(),
        regions = region_count,
        time_ms = scan_time_ms,
        "Scan complete"
    );

    ScanReport {
        root: config.root.clone(),
        files_scanned,
        files_activated: folded.len(),
        region_count,
        files: folded,
        scan_time_ms,
    }
}
