//! File loading utilities

use std::path::{Path, PathBuf};
use std::sync::Arc;

use polars::prelude::*;
use relalg::{Catalog, is_valid_relation_char};

/// Load a DataFrame from a file path, collecting immediately
pub fn load_file(path: &Path) -> Result<DataFrame, PolarsError> {
    let pl_path = PlPath::Local(Arc::from(path));
    let lf = match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => LazyFrame::scan_parquet(pl_path, Default::default())?,
        Some("csv") => LazyCsvReader::new(pl_path).finish()?,
        Some("ipc" | "arrow") => LazyFrame::scan_ipc(pl_path, Default::default(), Default::default())?,
        Some(ext) => return Err(PolarsError::ComputeError(
            format!("unsupported file extension: {ext}").into(),
        )),
        None => return Err(PolarsError::ComputeError(
            "file has no extension".to_string().into(),
        )),
    };
    lf.collect()
}

/// Relation name for a file (its stem)
pub fn relation_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Whether `name` can be written as a relation in an expression
pub fn is_valid_relation_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_valid_relation_char)
}

/// Check if a file has a supported extension
pub fn is_supported_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("parquet" | "csv" | "ipc" | "arrow")
    )
}

/// Collect all supported files from paths (files or directories).
/// Directory entries are sorted so later files win name clashes predictably.
pub fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            if let Ok(entries) = std::fs::read_dir(path) {
                let mut found: Vec<PathBuf> = entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|p| p.is_file() && is_supported_file(p))
                    .collect();
                found.sort();
                files.extend(found);
            }
        } else if path.is_file() && is_supported_file(path) {
            files.push(path.clone());
        } else {
            log::warn!("Skipping {}: not a supported file or directory", path.display());
        }
    }
    files
}

/// Load every supported file under `paths` into a catalog.
///
/// Files that fail to load, or whose stem cannot be written as a relation
/// name, are skipped with a warning.
pub fn load_catalog(paths: &[PathBuf]) -> Catalog {
    let mut catalog = Catalog::new();
    for path in collect_files(paths) {
        let name = relation_name_from_path(&path);
        if !is_valid_relation_name(&name) {
            log::warn!(
                "Skipping {}: '{}' is not a valid relation name",
                path.display(),
                name
            );
            continue;
        }
        match load_file(&path) {
            Ok(df) => {
                log::info!("Loaded relation {} ({} rows) from {}", name, df.height(), path.display());
                if catalog.get(&name).is_some() {
                    log::warn!("Relation {} loaded twice, keeping {}", name, path.display());
                }
                catalog.insert(name, df);
            }
            Err(e) => {
                log::warn!("Failed to load {}: {}", path.display(), e);
            }
        }
    }
    catalog
}
