use super::*;
use crate::media::fake::{Call, FakeHandle, FakeResource};
use proptest::prelude::*;

type TestSession = PlaybackSession<FakeResource, Vec<Track>>;

fn session_with(catalog: Vec<Track>, auto_resolve: bool) -> (TestSession, FakeHandle) {
    let (resource, handle, events) = FakeResource::new(auto_resolve);
    let session = PlaybackSession::new(resource, events, catalog, 1.0);
    handle.clear();
    (session, handle)
}

fn abc() -> Vec<Track> {
    vec![Track::sample("a"), Track::sample("b"), Track::sample("c")]
}

fn playlist_of(len: usize) -> Vec<Track> {
    (0..len).map(|i| Track::sample(&format!("t{i}"))).collect()
}

fn current_id(session: &TestSession) -> Option<String> {
    session.snapshot().current_track.map(|t| t.id)
}

fn loads(handle: &FakeHandle) -> usize {
    handle
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Load(..)))
        .count()
}

#[test]
fn new_session_mirrors_initial_volume_on_resource() {
    let (resource, handle, events) = FakeResource::new(false);
    let session = PlaybackSession::new(resource, events, Vec::<Track>::new(), 0.4);
    assert_eq!(handle.calls(), vec![Call::SetVolume(0.4)]);
    assert_eq!(session.snapshot().volume, 0.4);
    assert_eq!(session.phase(), Phase::Idle);
}

#[test]
fn play_track_loads_then_plays_and_resolves_to_playing() {
    let (mut session, handle) = session_with(vec![], true);
    let tracks = abc();

    session.play_track(tracks[1].clone(), Some(tracks.clone())).unwrap();
    assert_eq!(
        handle.calls(),
        vec![
            Call::Load(Locator::parse("/music/b.mp3").unwrap(), SourceId(1)),
            Call::Play(PlayTicket(1)),
        ]
    );
    assert_eq!(session.phase(), Phase::Loading);
    assert!(!session.snapshot().is_playing);

    session.process_pending();
    let snap = session.snapshot();
    assert!(snap.is_playing);
    assert_eq!(snap.current_index, Some(1));
    assert_eq!(snap.progress, 0.0);
    assert_eq!(snap.duration, 0.0);
}

#[test]
fn next_walks_the_ring_from_the_played_track() {
    let (mut session, _handle) = session_with(vec![], true);
    let tracks = abc();

    session.play_track(tracks[1].clone(), Some(tracks.clone())).unwrap();
    assert_eq!(session.current_index(), Some(1));

    session.play_next().unwrap();
    assert_eq!(session.current_index(), Some(2));
    assert_eq!(current_id(&session).as_deref(), Some("c"));

    session.play_next().unwrap();
    assert_eq!(session.current_index(), Some(0));
    assert_eq!(current_id(&session).as_deref(), Some("a"));

    session.play_prev().unwrap();
    assert_eq!(current_id(&session).as_deref(), Some("c"));
}

#[test]
fn missing_playlist_falls_back_to_catalog() {
    let (mut session, _handle) = session_with(abc(), true);
    session.play_track(Track::sample("c"), None).unwrap();
    assert_eq!(session.playlist().len(), 3);
    assert_eq!(session.current_index(), Some(2));

    session.play_next().unwrap();
    assert_eq!(current_id(&session).as_deref(), Some("a"));
}

#[test]
fn index_is_first_match_when_playlist_has_duplicates() {
    let (mut session, _handle) = session_with(vec![], true);
    let tracks = vec![Track::sample("a"), Track::sample("b"), Track::sample("a")];
    session.play_track(tracks[2].clone(), Some(tracks)).unwrap();
    assert_eq!(session.current_index(), Some(0));
}

#[test]
fn empty_playlist_leaves_index_unset_and_steps_are_noops() {
    let (mut session, handle) = session_with(abc(), true);
    session.play_track(Track::sample("x"), Some(vec![])).unwrap();
    assert_eq!(session.current_index(), None);
    assert_eq!(loads(&handle), 1);

    let before = session.snapshot();
    session.play_next().unwrap();
    session.play_prev().unwrap();
    assert_eq!(loads(&handle), 1);
    assert_eq!(session.snapshot(), before);
}

#[test]
fn track_outside_playlist_cannot_step() {
    let (mut session, handle) = session_with(vec![], true);
    session
        .play_track(Track::sample("x"), Some(vec![Track::sample("a"), Track::sample("b")]))
        .unwrap();
    assert_eq!(session.current_index(), None);

    session.play_next().unwrap();
    assert_eq!(loads(&handle), 1);
    assert_eq!(current_id(&session).as_deref(), Some("x"));
}

#[test]
fn toggle_with_nothing_loaded_is_a_noop() {
    let (mut session, handle) = session_with(abc(), true);
    session.toggle_play_pause();
    assert!(handle.calls().is_empty());
    assert_eq!(session.phase(), Phase::Idle);
    session.play_next().unwrap();
    assert!(handle.calls().is_empty());
}

#[test]
fn toggle_pauses_and_resumes_with_a_fresh_ticket() {
    let (mut session, handle) = session_with(vec![], false);
    session.play_track(Track::sample("a"), Some(abc())).unwrap();
    handle.resolve(handle.last_ticket(), Ok(()));
    session.process_pending();
    assert!(session.snapshot().is_playing);

    session.toggle_play_pause();
    assert_eq!(handle.calls().last(), Some(&Call::Pause));
    assert_eq!(session.phase(), Phase::Paused);

    session.toggle_play_pause();
    let resumed = handle.last_ticket();
    assert_eq!(resumed, PlayTicket(2));
    assert_eq!(session.phase(), Phase::Loading);

    handle.resolve(resumed, Ok(()));
    session.process_pending();
    assert!(session.snapshot().is_playing);
    // Resuming never reloads.
    assert_eq!(loads(&handle), 1);
}

#[test]
fn pausing_while_loading_discards_the_pending_start() {
    let (mut session, handle) = session_with(vec![], false);
    session.play_track(Track::sample("a"), Some(abc())).unwrap();
    let pending = handle.last_ticket();

    session.toggle_play_pause();
    assert_eq!(session.phase(), Phase::Paused);

    handle.resolve(pending, Ok(()));
    session.process_pending();
    assert!(!session.snapshot().is_playing);
    assert_eq!(session.phase(), Phase::Paused);
}

#[test]
fn rapid_play_requests_only_honour_the_latest() {
    let (mut session, handle) = session_with(vec![], false);
    let tracks = abc();
    session.play_track(tracks[0].clone(), Some(tracks.clone())).unwrap();
    session.play_track(tracks[1].clone(), Some(tracks.clone())).unwrap();
    let tickets = handle.tickets();
    assert_eq!(tickets.len(), 2);

    handle.resolve(tickets[0], Ok(()));
    session.process_pending();
    assert!(!session.snapshot().is_playing);
    assert_eq!(current_id(&session).as_deref(), Some("b"));

    handle.resolve(
        tickets[1],
        Err(StartFailure::Open {
            locator: "/music/b.mp3".into(),
            reason: "missing".into(),
        }),
    );
    session.process_pending();
    assert!(!session.snapshot().is_playing);
    assert_eq!(current_id(&session).as_deref(), Some("b"));
}

#[test]
fn late_failure_of_superseded_request_does_not_stop_playback() {
    let (mut session, handle) = session_with(vec![], false);
    let tracks = abc();
    session.play_track(tracks[0].clone(), Some(tracks.clone())).unwrap();
    session.play_track(tracks[1].clone(), Some(tracks)).unwrap();
    let tickets = handle.tickets();

    handle.resolve(tickets[1], Ok(()));
    handle.resolve(tickets[0], Err(StartFailure::NoSource));
    session.process_pending();
    assert!(session.snapshot().is_playing);
}

#[test]
fn start_failure_leaves_session_not_playing() {
    let (mut session, handle) = session_with(vec![], false);
    session.play_track(Track::sample("a"), None).unwrap();
    handle.resolve(handle.last_ticket(), Err(StartFailure::Disconnected));
    session.process_pending();

    let snap = session.snapshot();
    assert!(!snap.is_playing);
    assert_eq!(snap.current_track.map(|t| t.id).as_deref(), Some("a"));
    assert_eq!(session.phase(), Phase::Paused);
}

#[test]
fn ended_advances_to_next_track_and_wraps() {
    let (mut session, handle) = session_with(vec![], true);
    let tracks = abc();
    session.play_track(tracks[2].clone(), Some(tracks)).unwrap();
    session.process_pending();

    handle.ended(handle.last_source());
    session.process_pending();
    assert_eq!(current_id(&session).as_deref(), Some("a"));
    assert_eq!(session.current_index(), Some(0));
    assert!(session.snapshot().is_playing);
}

#[test]
fn ended_from_superseded_source_is_ignored() {
    let (mut session, handle) = session_with(vec![], true);
    let tracks = abc();
    session.play_track(tracks[0].clone(), Some(tracks.clone())).unwrap();
    let old = handle.last_source();
    session.play_track(tracks[1].clone(), Some(tracks)).unwrap();
    session.process_pending();

    handle.ended(old);
    session.process_pending();
    assert_eq!(current_id(&session).as_deref(), Some("b"));
    assert_eq!(loads(&handle), 2);
}

#[test]
fn ended_without_a_neighbour_pauses() {
    let (mut session, handle) = session_with(vec![], true);
    session.play_track(Track::sample("x"), Some(vec![])).unwrap();
    session.process_pending();
    assert!(session.snapshot().is_playing);

    handle.ended(handle.last_source());
    session.process_pending();
    assert_eq!(session.phase(), Phase::Paused);
    assert_eq!(loads(&handle), 1);
}

#[test]
fn ended_while_paused_does_not_advance() {
    let (mut session, handle) = session_with(vec![], true);
    session.play_track(Track::sample("a"), Some(abc())).unwrap();
    session.process_pending();
    session.toggle_play_pause();

    handle.ended(handle.last_source());
    session.process_pending();
    assert_eq!(current_id(&session).as_deref(), Some("a"));
    assert_eq!(loads(&handle), 1);
}

#[test]
fn position_and_duration_follow_the_current_source_only() {
    let (mut session, handle) = session_with(vec![], true);
    let tracks = abc();
    session.play_track(tracks[0].clone(), Some(tracks.clone())).unwrap();
    let old = handle.last_source();
    session.play_track(tracks[1].clone(), Some(tracks)).unwrap();
    let current = handle.last_source();

    handle.position(old, 99.0);
    handle.duration(old, 300.0);
    handle.position(current, 12.5);
    handle.duration(current, 180.0);
    session.process_pending();

    let snap = session.snapshot();
    assert_eq!(snap.progress, 12.5);
    assert_eq!(snap.duration, 180.0);
}

#[test]
fn wait_for_event_applies_one_notification_or_times_out() {
    let (mut session, handle) = session_with(vec![], false);
    session.play_track(Track::sample("a"), None).unwrap();
    assert!(!session.wait_for_event(Duration::from_millis(10)));

    handle.resolve(handle.last_ticket(), Ok(()));
    handle.position(handle.last_source(), 4.0);
    assert!(session.wait_for_event(Duration::from_millis(10)));
    assert!(session.snapshot().is_playing);
    assert_eq!(session.snapshot().progress, 0.0);

    assert_eq!(session.process_pending(), 1);
    assert_eq!(session.snapshot().progress, 4.0);
}

#[test]
fn seek_updates_progress_immediately() {
    let (mut session, handle) = session_with(vec![], true);
    session.play_track(Track::sample("a"), None).unwrap();

    session.seek(42.0);
    assert_eq!(session.snapshot().progress, 42.0);
    assert_eq!(handle.calls().last(), Some(&Call::Seek(42.0)));

    session.seek(f64::NAN);
    assert_eq!(session.snapshot().progress, 42.0);
    assert_eq!(handle.calls().last(), Some(&Call::Seek(42.0)));
}

#[test]
fn set_volume_is_idempotent_and_clamped() {
    let (mut session, handle) = session_with(vec![], true);
    session.set_volume(0.3);
    let once = session.snapshot();
    session.set_volume(0.3);
    assert_eq!(session.snapshot(), once);
    assert_eq!(handle.calls(), vec![Call::SetVolume(0.3), Call::SetVolume(0.3)]);

    session.set_volume(1.7);
    assert_eq!(session.snapshot().volume, 1.0);
    session.set_volume(-0.2);
    assert_eq!(session.snapshot().volume, 0.0);

    session.set_volume(f32::NAN);
    assert_eq!(session.snapshot().volume, 0.0);
    assert_eq!(handle.calls().len(), 4);
}

#[test]
fn invalid_locator_is_rejected_without_touching_the_resource() {
    let (mut session, handle) = session_with(vec![], true);
    let mut bad = Track::sample("bad");
    bad.audio_url = "  ".into();

    let err = session.play_track(bad, None).unwrap_err();
    assert!(matches!(
        err,
        PlaybackError::InvalidTrack { ref track_id, source: LocatorError::Empty } if track_id == "bad"
    ));
    assert!(handle.calls().is_empty());
    assert_eq!(session.phase(), Phase::Idle);
}

#[test]
fn invalid_neighbour_keeps_current_track_and_playlist() {
    let (mut session, handle) = session_with(vec![], true);
    let mut bad = Track::sample("b");
    bad.audio_url = "gopher://old.example/b".into();
    let tracks = vec![Track::sample("a"), bad, Track::sample("c")];

    session.play_track(tracks[0].clone(), Some(tracks)).unwrap();
    assert!(session.play_next().is_err());
    assert_eq!(current_id(&session).as_deref(), Some("a"));
    assert_eq!(session.playlist().len(), 3);
    assert_eq!(loads(&handle), 1);

    session.play_prev().unwrap();
    assert_eq!(current_id(&session).as_deref(), Some("c"));
}

#[test]
fn subscribers_get_current_state_then_every_change() {
    let (mut session, _handle) = session_with(vec![], true);
    let sub = session.subscribe();
    assert_eq!(sub.try_next(), Some(PlaybackSnapshot::default()));

    session.play_track(Track::sample("a"), None).unwrap();
    let loading = sub.try_next().unwrap();
    assert_eq!(loading.current_track.map(|t| t.id).as_deref(), Some("a"));
    assert!(!loading.is_playing);

    session.process_pending();
    assert!(sub.latest().unwrap().is_playing);
    assert_eq!(sub.latest(), None);
}

#[test]
fn unsubscribed_and_dropped_listeners_are_removed() {
    let (mut session, _handle) = session_with(vec![], true);
    let kept = session.subscribe();
    let removed = session.subscribe();
    let dropped = session.subscribe();
    assert_eq!(session.subscriber_count(), 3);

    assert!(session.unsubscribe(removed.id()));
    assert!(!session.unsubscribe(removed.id()));
    drop(dropped);

    session.set_volume(0.5);
    assert_eq!(session.subscriber_count(), 1);
    assert_eq!(kept.latest().map(|s| s.volume), Some(0.5));
    assert_eq!(removed.latest(), Some(PlaybackSnapshot::default()));
}

#[test]
fn shutdown_unsubscribes_before_pausing_and_ignores_later_commands() {
    let (mut session, handle) = session_with(vec![], true);
    session.play_track(Track::sample("a"), Some(abc())).unwrap();
    session.process_pending();
    let sub = session.subscribe();
    handle.clear();

    session.shutdown();
    assert_eq!(handle.calls(), vec![Call::Unsubscribe, Call::Pause]);
    assert!(session.is_closed());
    assert!(!sub.latest().unwrap().is_playing);

    session.play_track(Track::sample("b"), None).unwrap();
    session.toggle_play_pause();
    session.play_next().unwrap();
    session.seek(3.0);
    session.set_volume(0.1);
    handle.ended(SourceId(1));
    session.process_pending();
    session.shutdown();

    assert_eq!(handle.calls(), vec![Call::Unsubscribe, Call::Pause]);
    assert_eq!(current_id(&session).as_deref(), Some("a"));
}

#[test]
fn dropping_the_session_tears_it_down() {
    let (mut session, handle) = session_with(vec![], true);
    session.play_track(Track::sample("a"), None).unwrap();
    handle.clear();

    drop(session);
    assert_eq!(handle.calls(), vec![Call::Unsubscribe, Call::Pause]);
}

#[test]
fn progress_ratio_is_clamped_for_display() {
    let mut snap = PlaybackSnapshot {
        progress: 30.0,
        duration: 120.0,
        ..PlaybackSnapshot::default()
    };
    assert_eq!(snap.progress_ratio(), 0.25);
    snap.progress = 500.0;
    assert_eq!(snap.progress_ratio(), 1.0);
    snap.duration = 0.0;
    assert_eq!(snap.progress_ratio(), 0.0);
}

#[test]
fn ring_steps_wrap_and_reject_out_of_range() {
    assert_eq!(ring::next(2, 3), Some(0));
    assert_eq!(ring::prev(0, 3), Some(2));
    assert_eq!(ring::next(0, 1), Some(0));
    assert_eq!(ring::next(0, 0), None);
    assert_eq!(ring::prev(3, 3), None);
}

proptest! {
    #[test]
    fn stepping_next_len_times_returns_to_start(len in 1usize..8, seed in 0usize..64) {
        let start = seed % len;
        let tracks = playlist_of(len);
        let (mut session, _handle) = session_with(vec![], true);
        session.play_track(tracks[start].clone(), Some(tracks.clone())).unwrap();

        for _ in 0..len {
            session.play_next().unwrap();
        }
        prop_assert_eq!(session.current_index(), Some(start));
        prop_assert_eq!(current_id(&session), Some(tracks[start].id.clone()));
    }

    #[test]
    fn prev_undoes_next(len in 1usize..8, seed in 0usize..64) {
        let start = seed % len;
        let tracks = playlist_of(len);
        let (mut session, _handle) = session_with(vec![], true);
        session.play_track(tracks[start].clone(), Some(tracks.clone())).unwrap();

        session.play_next().unwrap();
        session.play_prev().unwrap();
        prop_assert_eq!(current_id(&session), Some(tracks[start].id.clone()));
    }
}

#[test]
fn play_while_loading_keeps_the_pending_start() {
    let (mut session, handle) = session_with(vec![], false);
    session.play_track(Track::sample("a"), Some(abc())).unwrap();
    let pending = handle.last_ticket();

    session.play();
    assert_eq!(handle.tickets(), vec![pending]);
    assert_eq!(session.phase(), Phase::Loading);

    handle.resolve(pending, Ok(()));
    session.process_pending();
    assert!(session.snapshot().is_playing);

    // Already playing: nothing to do.
    handle.clear();
    session.play();
    assert!(handle.calls().is_empty());
}

#[test]
fn pause_while_loading_cancels_the_pending_start() {
    let (mut session, handle) = session_with(vec![], false);
    session.play_track(Track::sample("a"), Some(abc())).unwrap();
    let pending = handle.last_ticket();

    session.pause();
    assert_eq!(session.phase(), Phase::Paused);
    assert_eq!(handle.calls().last(), Some(&Call::Pause));

    handle.resolve(pending, Ok(()));
    session.process_pending();
    assert_eq!(session.phase(), Phase::Paused);

    // Pausing again is a no-op; play resumes with a fresh ticket.
    handle.clear();
    session.pause();
    assert!(handle.calls().is_empty());
    session.play();
    assert_eq!(handle.calls(), vec![Call::Play(PlayTicket(3))]);
    assert_eq!(session.phase(), Phase::Loading);
}

#[test]
fn play_and_pause_without_a_track_do_nothing() {
    let (mut session, handle) = session_with(abc(), true);
    session.play();
    session.pause();
    assert!(handle.calls().is_empty());
    assert_eq!(session.phase(), Phase::Idle);
}
