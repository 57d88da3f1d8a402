use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::model::Track;
use super::{CatalogError, TrackCatalog};

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    tracks: Vec<Track>,
}

/// Catalog read from a TOML track manifest (a snapshot of the backend's
/// track listing). Tracks are ordered newest upload first.
pub struct ManifestCatalog {
    tracks: Vec<Track>,
}

impl ManifestCatalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = Self::parse(&text).map_err(|source| CatalogError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;

        info!(manifest = %path.display(), tracks = catalog.tracks.len(), "manifest loaded");
        Ok(catalog)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let manifest: Manifest = toml::from_str(text)?;

        let mut tracks: Vec<Track> = manifest
            .tracks
            .into_iter()
            .map(Track::with_fallbacks)
            .collect();

        for t in tracks.iter().filter(|t| t.audio_url.trim().is_empty()) {
            warn!(track_id = %t.id, "manifest track has no audio_url");
        }

        // Newest first; `None` sorts below every timestamp so undated tracks land last.
        tracks.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

        Ok(Self { tracks })
    }
}

impl TrackCatalog for ManifestCatalog {
    fn list_all_tracks(&self) -> Vec<Track> {
        self.tracks.clone()
    }
}
