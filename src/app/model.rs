//! Front-end model: `App`.

use crate::catalog::Track;
use crate::session::PlaybackSnapshot;

/// The main application model.
pub struct App {
    pub tracks: Vec<Track>,
    pub selected: usize,

    /// Lowercased display strings, one per track, for filtering.
    search_keys: Vec<String>,

    pub follow_playback: bool,
    pub filter_mode: bool,
    pub filter_query: String,
    pub metadata_window: bool,

    /// What the catalog was opened from (directory or manifest path).
    pub source_label: Option<String>,
    /// Latest state published by the playback session.
    pub playback: PlaybackSnapshot,
    /// False when no audio output could be opened.
    pub player_available: bool,
    /// Last user-facing problem, shown in the status box.
    pub status_message: Option<String>,
}

impl App {
    pub fn new(tracks: Vec<Track>) -> Self {
        let search_keys = tracks.iter().map(|t| t.display().to_lowercase()).collect();

        Self {
            tracks,
            selected: 0,
            search_keys,
            follow_playback: true,
            filter_mode: false,
            filter_query: String::new(),
            metadata_window: false,
            source_label: None,
            playback: PlaybackSnapshot::default(),
            player_available: true,
            status_message: None,
        }
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    /// Catalog position of the track the session is playing, if it is listed.
    pub fn now_playing_index(&self) -> Option<usize> {
        let current = self.playback.current_track.as_ref()?;
        self.tracks.iter().position(|t| t.id == current.id)
    }

    /// Store a new snapshot and, when following playback, move the cursor
    /// onto the playing track.
    pub fn sync_playback(&mut self, snapshot: PlaybackSnapshot) {
        self.playback = snapshot;
        if self.follow_playback && !self.filter_mode {
            if let Some(idx) = self.now_playing_index() {
                if idx != self.selected {
                    self.set_selected(idx);
                }
            }
        }
    }

    /// Track indices in display order, after filtering.
    pub fn display_indices(&self) -> Vec<usize> {
        let query = self.filter_query.trim().to_lowercase();
        if query.is_empty() {
            return (0..self.tracks.len()).collect();
        }

        self.search_keys
            .iter()
            .enumerate()
            .filter(|(_, key)| subsequence_positions(key, &query).is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// The playlist to hand to the session when playing from the list.
    ///
    /// A filtered view plays within what is visible; the unfiltered view
    /// returns `None` so the session falls back to the whole catalog.
    pub fn visible_playlist(&self) -> Option<Vec<Track>> {
        if self.filter_query.trim().is_empty() {
            return None;
        }
        Some(
            self.display_indices()
                .into_iter()
                .map(|i| self.tracks[i].clone())
                .collect(),
        )
    }

    /// Character positions in track `track_index`'s display string matched by
    /// the current filter, for highlighting.
    pub fn filter_highlights(&self, track_index: usize) -> Option<Vec<usize>> {
        let query = self.filter_query.trim().to_lowercase();
        let key = self.search_keys.get(track_index)?;
        subsequence_positions(key, &query)
    }

    /// Subsequence match, case-insensitive. Returns the matched char positions.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        subsequence_positions(&title.to_lowercase(), &query.to_lowercase())
    }

    /// Next visible index after `current`, wrapping to the first.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }
        match display.iter().position(|&i| i == current) {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Previous visible index before `current`, wrapping to the last.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        let last = *display.last()?;
        match display.iter().position(|&i| i == current) {
            Some(0) | None => Some(last),
            Some(p) => Some(display[p - 1]),
        }
    }

    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }

    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.follow_playback_off();
        self.ensure_selected_visible();
    }

    /// Leave the prompt but keep the query applied.
    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Keep `selected` inside the filtered view, else move to its first entry.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        match display.first() {
            None => self.selected = 0,
            Some(&first) if !display.contains(&self.selected) => self.selected = first,
            Some(_) => {}
        }
    }
}

/// Volume after one `-`/`+` press, kept inside `[0, 1]`.
pub fn stepped_volume(current: f32, step: f32) -> f32 {
    (current + step).clamp(0.0, 1.0)
}

/// Mute toggles between silence and full volume.
pub fn mute_toggled(current: f32) -> f32 {
    if current > 0.0 { 0.0 } else { 1.0 }
}

fn subsequence_positions(haystack: &str, needle: &str) -> Option<Vec<usize>> {
    let mut positions = Vec::new();
    let mut chars = haystack.chars().enumerate();

    for qc in needle.chars() {
        let (pos, _) = chars.by_ref().find(|&(_, hc)| hc == qc)?;
        positions.push(pos);
    }
    Some(positions)
}
