use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNCATEGORIZED: &str = "Uncategorized";
const AVATAR_BASE: &str = "https://api.dicebear.com/8.x/initials/svg";

/// One playable item. Never mutated by the playback core.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    /// Media locator: `file://` URL, `http(s)://` URL or a filesystem path.
    pub audio_url: String,
    #[serde(default)]
    pub cover_art_url: String,
    /// Duration hint in seconds; 0 when unknown.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub user: TrackOwner,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// The uploading user, as far as the catalog knows it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackOwner {
    pub id: String,
    pub display_name: String,
    pub avatar_url: String,
}

impl Track {
    /// "Owner - Title", or just the title when the owner is unknown.
    pub fn display(&self) -> String {
        let owner = self.user.display_name.trim();
        if owner.is_empty() || owner == UNKNOWN_ARTIST {
            self.title.clone()
        } else {
            format!("{} - {}", owner, self.title)
        }
    }

    /// Fill the fields the backend leaves blank with their display fallbacks.
    pub(crate) fn with_fallbacks(mut self) -> Self {
        if self.user.display_name.trim().is_empty() {
            self.user.display_name = UNKNOWN_ARTIST.to_string();
        }
        if self.genre.trim().is_empty() {
            self.genre = UNCATEGORIZED.to_string();
        }
        if self.user.avatar_url.trim().is_empty() {
            self.user.avatar_url = initials_avatar(&self.user.display_name);
        }
        self
    }
}

/// Generated avatar for users without one.
fn initials_avatar(name: &str) -> String {
    match Url::parse(AVATAR_BASE) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("seed", name);
            url.to_string()
        }
        Err(_) => String::new(),
    }
}

#[cfg(test)]
impl Track {
    /// Minimal track whose locator is a local path named after `id`.
    pub(crate) fn sample(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: id.to_uppercase(),
            audio_url: format!("/music/{id}.mp3"),
            cover_art_url: String::new(),
            duration: 0,
            user: TrackOwner::default(),
            like_count: 0,
            genre: String::new(),
            uploaded_at: None,
        }
    }
}
