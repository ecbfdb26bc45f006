//! Input file discovery.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("cannot list input folder {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Regular files directly inside `folder` whose name starts with `prefix`,
/// sorted by file name. Subdirectories are not searched.
pub fn discover_inputs(folder: &Path, prefix: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let read_dir_err = |source| DiscoveryError::ReadDir {
        path: folder.to_path_buf(),
        source,
    };

    let mut found = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        // Follows symlinks, like opening the file would.
        let is_file = std::fs::metadata(entry.path())
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            found.push(entry.path());
        }
    }
    found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(found)
}
