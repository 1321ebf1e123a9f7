//! Town directories and the classification of their GeoJSON files.

use std::path::{Path, PathBuf};

/// Separator between a town's display name and the rest of its identifier
/// (e.g. "Concord-012345").
pub const NAME_SEPARATOR: char = '-';

/// Which bucket a town's GeoJSON file falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Genuine noise band, one file per level
    Noise,
    /// Placeholder geometry for towns lacking measurements
    NoData,
}

impl FileKind {
    pub fn classify(file_name: &str, no_data_prefix: &str) -> Self {
        if file_name.starts_with(no_data_prefix) {
            FileKind::NoData
        } else {
            FileKind::Noise
        }
    }
}

/// One town directory under the noise root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Town {
    pub id: String,
    pub dir: PathBuf,
}

impl Town {
    pub fn new(id: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            dir: dir.into(),
        }
    }

    /// Display name: the identifier up to the first separator
    pub fn display_name(&self) -> &str {
        display_name(&self.id)
    }
}

pub fn display_name(town_id: &str) -> &str {
    town_id
        .split_once(NAME_SEPARATOR)
        .map_or(town_id, |(name, _)| name)
}

/// Noise level / color name of a noise file: its name minus the extension.
pub fn noise_level(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// A town's files split into the two buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TownFiles {
    pub noise: Vec<PathBuf>,
    pub no_data: Vec<PathBuf>,
}

impl TownFiles {
    pub fn push(&mut self, kind: FileKind, path: PathBuf) {
        match kind {
            FileKind::Noise => self.noise.push(path),
            FileKind::NoData => self.no_data.push(path),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.noise.is_empty() && self.no_data.is_empty()
    }

    pub fn has_noise_data(&self) -> bool {
        !self.noise.is_empty()
    }

    /// Files the boundary is built from: noise files when there are any,
    /// otherwise the no-data placeholders.
    pub fn selected(&self) -> &[PathBuf] {
        if self.has_noise_data() {
            &self.noise
        } else {
            &self.no_data
        }
    }
}
