use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use lofty::prelude::*;
use tracing::{debug, info};
use url::Url;
use walkdir::WalkDir;

use crate::config::CatalogSettings;

use super::model::{Track, TrackOwner};
use super::{CatalogError, TrackCatalog};

const COVER_NAMES: [&str; 4] = ["cover.jpg", "cover.png", "folder.jpg", "folder.png"];

/// Catalog built by scanning a directory of audio files once at startup.
pub struct LibraryCatalog {
    tracks: Vec<Track>,
}

impl LibraryCatalog {
    pub fn scan(dir: &Path, settings: &CatalogSettings) -> Result<Self, CatalogError> {
        if !dir.is_dir() {
            return Err(CatalogError::NotFound(dir.to_path_buf()));
        }

        let tracks = scan_tracks(dir, settings);
        info!(root = %dir.display(), tracks = tracks.len(), "library scanned");

        Ok(Self { tracks })
    }
}

impl TrackCatalog for LibraryCatalog {
    fn list_all_tracks(&self) -> Vec<Track> {
        self.tracks.clone()
    }
}

pub(super) fn is_audio_file(path: &Path, settings: &CatalogSettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

pub(super) fn scan_tracks(dir: &Path, settings: &CatalogSettings) -> Vec<Track> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut tracks: Vec<Track> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_audio_file(path, settings))
        .map(|path| track_from_file(&path))
        .collect();

    tracks.sort_by_key(|t| t.display().to_lowercase());
    tracks
}

/// Build a `Track` for a local file, reading tags when the file has any.
fn track_from_file(path: &Path) -> Track {
    let mut title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut artist: Option<String> = None;
    let mut genre = String::new();
    let mut duration = 0;

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            duration = tagged.properties().duration().as_secs_f64().round() as u32;

            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag.title().filter(|v| !v.trim().is_empty()) {
                    title = v.trim().to_string();
                }
                artist = tag
                    .artist()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
                if let Some(v) = tag.genre() {
                    genre = v.trim().to_string();
                }
            }
        }
        Err(e) => debug!(path = %path.display(), error = %e, "no readable tags"),
    }

    let user = artist
        .map(|name| TrackOwner {
            id: name.clone(),
            display_name: name,
            avatar_url: String::new(),
        })
        .unwrap_or_default();

    let uploaded_at = fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from);

    Track {
        id: path.display().to_string(),
        title,
        audio_url: file_url(path),
        cover_art_url: path.parent().and_then(find_cover).unwrap_or_default(),
        duration,
        user,
        like_count: 0,
        genre,
        uploaded_at,
    }
    .with_fallbacks()
}

fn file_url(path: &Path) -> String {
    std::path::absolute(path)
        .ok()
        .and_then(|abs| Url::from_file_path(abs).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn find_cover(dir: &Path) -> Option<String> {
    COVER_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .map(|p| file_url(&p))
}
