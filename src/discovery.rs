//! Locating town directories and classifying their GeoJSON files.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::config::TOWNS_SUBDIR;
use crate::error::{BoundaryError, Result};
use crate::models::{FileKind, Town, TownFiles};

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// List the town directories under `<data_root>/parcels/noise_by_town`,
/// sorted by identifier.
///
/// A missing towns directory is the one fatal condition of a run.
pub fn discover_towns(data_root: &Path) -> Result<Vec<Town>> {
    let towns_dir = data_root.join(TOWNS_SUBDIR);
    if !towns_dir.is_dir() {
        return Err(BoundaryError::MissingRoot { path: towns_dir });
    }
    list_towns(&towns_dir)
}

/// Immediate, non-hidden subdirectories of `towns_dir`.
pub fn list_towns(towns_dir: &Path) -> Result<Vec<Town>> {
    let mut towns = Vec::new();

    for entry in WalkDir::new(towns_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry in {}: {}", towns_dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if is_hidden(name) {
            continue;
        }
        towns.push(Town::new(name, entry.path()));
    }

    towns.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(towns)
}

/// Collect the town's `*.<extension>` files and bucket them by prefix.
pub fn classify_files(
    town_dir: &Path,
    extension: &str,
    no_data_prefix: &str,
) -> std::result::Result<TownFiles, walkdir::Error> {
    let mut files = TownFiles::default();

    let mut entries = Vec::new();
    for entry in WalkDir::new(town_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        entries.push(entry);
    }
    entries.sort_by(|a, b| a.file_name().cmp(b.file_name()));

    for entry in entries {
        let kind = FileKind::classify(&entry.file_name().to_string_lossy(), no_data_prefix);
        files.push(kind, entry.into_path());
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_towns(dir.path()).unwrap_err();
        assert!(matches!(err, BoundaryError::MissingRoot { .. }));
    }

    #[test]
    fn test_lists_visible_directories_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let towns_dir = dir.path().join(TOWNS_SUBDIR);
        fs::create_dir_all(towns_dir.join("Concord-012345")).unwrap();
        fs::create_dir_all(towns_dir.join("Acton-000001")).unwrap();
        fs::create_dir_all(towns_dir.join(".cache")).unwrap();
        fs::write(towns_dir.join("directory_map.json"), "{}").unwrap();

        let towns = discover_towns(dir.path()).unwrap();
        let ids: Vec<_> = towns.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["Acton-000001", "Concord-012345"]);
        assert_eq!(towns[1].dir, towns_dir.join("Concord-012345"));
    }

    #[test]
    fn test_classify_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Red.geojson", "Orange.geojson", "No_Data.geojson", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(dir.path().join("nested.geojson")).unwrap();

        let files = classify_files(dir.path(), "geojson", "No_Data").unwrap();
        assert_eq!(
            files.noise,
            vec![dir.path().join("Orange.geojson"), dir.path().join("Red.geojson")]
        );
        assert_eq!(files.no_data, vec![dir.path().join("No_Data.geojson")]);
    }
}
