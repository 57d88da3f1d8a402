//! Index arithmetic for the active playlist. Stepping wraps in both
//! directions; an index outside the playlist has no neighbours.

use crate::catalog::Track;

/// First position of the track with `id`.
pub(super) fn position(playlist: &[Track], id: &str) -> Option<usize> {
    playlist.iter().position(|t| t.id == id)
}

pub(super) fn next(index: usize, len: usize) -> Option<usize> {
    (index < len).then(|| (index + 1) % len)
}

pub(super) fn prev(index: usize, len: usize) -> Option<usize> {
    (index < len).then(|| (index + len - 1) % len)
}
