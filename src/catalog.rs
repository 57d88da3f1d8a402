//! Track catalog: where tracks come from.
//!
//! A catalog supplies every known track. The playback session uses it as the
//! fallback playlist when playback starts without an explicit one, and the
//! front-end renders it as the browsable list.

mod manifest;
mod model;
mod scan;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::CatalogSettings;

pub use manifest::ManifestCatalog;
pub use model::{Track, TrackOwner};
pub use scan::LibraryCatalog;

/// Read-only source of tracks.
pub trait TrackCatalog {
    /// Every known track, in catalog order.
    fn list_all_tracks(&self) -> Vec<Track>;
}

impl<T: TrackCatalog + ?Sized> TrackCatalog for Arc<T> {
    fn list_all_tracks(&self) -> Vec<Track> {
        (**self).list_all_tracks()
    }
}

impl TrackCatalog for Vec<Track> {
    fn list_all_tracks(&self) -> Vec<Track> {
        self.clone()
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog path not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid track manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Open the catalog at `path`: a `.toml` file is read as a track manifest,
/// a directory is scanned for audio files.
pub fn open(
    path: &Path,
    settings: &CatalogSettings,
) -> Result<Arc<dyn TrackCatalog>, CatalogError> {
    if path.is_dir() {
        return Ok(Arc::new(LibraryCatalog::scan(path, settings)?));
    }

    let is_manifest = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_manifest && path.is_file() {
        Ok(Arc::new(ManifestCatalog::load(path)?))
    } else {
        Err(CatalogError::NotFound(path.to_path_buf()))
    }
}
