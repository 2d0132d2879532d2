use futures::executor::block_on;
use iced_video_controls::testing::{Call, FakeMedia};
use iced_video_controls::time::format_time;
use iced_video_controls::{
    Exclusive, Media, Message, PlaybackRate, Player, SeekRequest, Settings, Slot,
};

fn mounted() -> Player<FakeMedia> {
    Player::new(FakeMedia::new(), Settings::default())
        .picture_in_picture(Slot::new())
        .fullscreen(Slot::new())
}

#[test]
fn time_label_follows_metadata_and_progress() {
    let mut player = mounted();
    assert_eq!(player.time_label(), "00:00 / 00:00");
    assert_eq!(player.progress(), 0.0);

    player.media_mut().load_metadata(125.0);
    assert_eq!(player.time_label(), "00:00 / 02:05");

    player.media_mut().advance_to(30.0);
    assert_eq!(player.time_label(), "00:30 / 02:05");
    assert!((player.progress() * 100.0 - 24.0).abs() < 1e-9);
}

#[test]
fn format_examples() {
    assert_eq!(format_time(65.0), "01:05");
    assert_eq!(format_time(0.0), "00:00");
    assert_eq!(format_time(f64::INFINITY), "00:00");
    assert_eq!(format_time(f64::NAN), "00:00");
}

#[test]
fn seek_fractions_map_onto_duration() {
    let mut player = mounted();
    player.media_mut().load_metadata(80.0);

    for fraction in [0.0_f32, 0.1, 0.5, 0.9, 1.0] {
        let _ = player.update(Message::Seek(SeekRequest {
            pointer_x: 20.0 + 400.0 * fraction,
            track_left: 20.0,
            track_width: 400.0,
        }));
        let expected = f64::from(fraction) * 80.0;
        assert!(
            (player.media().current_time() - expected).abs() < 1e-3,
            "fraction {fraction}: {} != {expected}",
            player.media().current_time()
        );
    }
}

#[test]
fn seek_before_metadata_leaves_position() {
    let mut player = mounted();
    player.media_mut().advance_to(4.0);
    let _ = player.update(Message::Seek(SeekRequest {
        pointer_x: 300.0,
        track_left: 0.0,
        track_width: 400.0,
    }));
    assert_eq!(player.media().current_time(), 4.0);
}

#[test]
fn volume_slider_round_trips() {
    let mut player = mounted();
    for step in 0..=10 {
        let volume = f64::from(step) / 10.0;
        let _ = player.update(Message::VolumeChanged(volume));
        assert_eq!(player.state().volume.value(), volume);
        assert_eq!(player.media().volume(), volume);
    }
}

#[test]
fn every_menu_rate_applies_and_closes_menu() {
    let mut player = mounted();
    for rate in PlaybackRate::ALL {
        let _ = player.update(Message::ToggleSpeedMenu);
        let _ = player.update(Message::RateSelected(rate));

        let state = player.state();
        assert_eq!(player.media().playback_rate(), rate.value());
        assert_eq!(state.rate, rate);
        assert!(!state.speed_menu_open);
    }
}

#[test]
fn late_play_result_after_unmount_is_ignored() {
    let mut first = mounted();
    let pending = first.toggle_play().expect("paused media starts playing");
    drop(first);

    // whatever the app mounts next must not pick up the stale result
    let mut second = mounted();
    second.finish_play(&pending.ticket, Ok(()));
    assert!(!second.state().is_playing);
    assert!(!pending.ticket.is_live());
}

#[test]
fn play_round_trip_through_executor() {
    let mut player = mounted();
    let pending = player.toggle_play().expect("paused media starts playing");
    assert_eq!(player.media().pending_plays(), 1);

    player.media_mut().resolve_play();
    let result = block_on(pending.future);
    let _ = player.update(Message::PlaySettled(pending.ticket, result));

    assert!(player.state().is_playing);
    let calls = player.media().calls();
    let play = calls.iter().position(|c| *c == Call::Play).unwrap();
    assert_eq!(calls[play - 1], Call::SetMuted(true));
    assert_eq!(calls[play + 1], Call::SetMuted(false));
}

#[test]
fn picture_in_picture_is_exclusive_across_players() {
    let pip = Slot::new();
    let mut first = Player::new(FakeMedia::new(), Settings::default())
        .picture_in_picture(pip.clone())
        .fullscreen(Slot::new());
    let mut second = Player::new(FakeMedia::new(), Settings::default())
        .picture_in_picture(pip.clone())
        .fullscreen(Slot::new());

    let _ = first.update(Message::TogglePictureInPicture);
    assert_eq!(pip.holder().unwrap(), Some(first.id()));
    assert!(first.in_pip());

    // another player's toggle exits the current session
    let _ = second.update(Message::TogglePictureInPicture);
    assert_eq!(pip.holder().unwrap(), None);

    let _ = second.update(Message::TogglePictureInPicture);
    assert!(second.in_pip());
    assert!(!first.in_pip());
}

#[test]
fn unmount_detaches_listeners() {
    let player = mounted();
    let listeners = player.media().listeners().clone();
    assert_eq!(listeners.len(), 2);
    drop(player);
    assert!(listeners.is_empty());
}

#[test]
fn pausing_before_play_settles_keeps_controls_paused() {
    let mut player = mounted();
    let pending = player.toggle_play().expect("paused media starts playing");
    let _ = player.update(Message::TogglePlay);

    let result = block_on(pending.future);
    let _ = player.update(Message::PlaySettled(pending.ticket, result));

    assert!(player.media().paused());
    assert!(!player.state().is_playing);
    assert!(player.media().calls().contains(&Call::Pause));
}
