use crate::config::Settings;
use crate::exclusive::{Exclusive, HolderId, Slot};
use crate::media::{Media, PlayFuture};
use crate::state::{PlaybackRate, PlaybackState, Volume};
use crate::sync::Mirror;
use crate::time::{self, format_time};
use crate::timeline::{SeekRequest, Timeline};
use crate::{Error, PlayRejected};
use iced::alignment::{Horizontal, Vertical};
use iced::widget::{button, column, container, image, row, slider, text, Column};
use iced::{window, Element, Length, Size, Subscription, Task};
use log::{debug, error};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Proof that a play request came from a particular, still-mounted player.
#[derive(Debug, Clone)]
pub struct PlayTicket {
    player: u64,
    alive: Arc<AtomicBool>,
}

impl PlayTicket {
    /// Whether the issuing player is still mounted.
    pub fn is_live(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// A play request waiting for the media to confirm playback.
pub struct PendingPlay {
    pub ticket: PlayTicket,
    pub future: PlayFuture,
}

#[derive(Debug, Clone)]
pub enum Message {
    TogglePlay,
    PlaySettled(PlayTicket, Result<(), PlayRejected>),
    Seek(SeekRequest),
    SkipBack,
    SkipForward,
    VolumeChanged(f64),
    ToggleSpeedMenu,
    RateSelected(PlaybackRate),
    TogglePictureInPicture,
    /// The window to shrink into picture-in-picture and its size beforehand.
    PictureInPictureReady(window::Id, Size),
    ToggleFullscreen,
    Tick,
}

/// A video player with its own playback controls.
///
/// Dropping the player detaches its event listeners, gives back any
/// exclusive mode it holds and invalidates outstanding [`PlayTicket`]s.
/// Call [`Player::unmount`] first to also restore the window.
pub struct Player<M: Media> {
    id: u64,
    media: M,
    state: Rc<RefCell<PlaybackState>>,
    _mirror: Mirror,
    alive: Arc<AtomicBool>,
    picture_in_picture: Box<dyn Exclusive>,
    fullscreen: Box<dyn Exclusive>,
    restore_size: Option<Size>,
    settings: Settings,
}

impl<M: Media> Player<M> {
    /// Mounts a player over `media` using the process-wide exclusive slots.
    pub fn new(mut media: M, settings: Settings) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);

        let state = Rc::new(RefCell::new(PlaybackState {
            volume: Volume::new(settings.initial_volume),
            ..PlaybackState::default()
        }));
        let mirror = Mirror::mount(&mut media, &state);

        Player {
            id,
            media,
            state,
            _mirror: mirror,
            alive: Arc::new(AtomicBool::new(true)),
            picture_in_picture: Box::new(Slot::picture_in_picture()),
            fullscreen: Box::new(Slot::fullscreen()),
            restore_size: None,
            settings,
        }
    }

    /// Replaces the picture-in-picture capability.
    pub fn picture_in_picture(mut self, slot: impl Exclusive + 'static) -> Self {
        self.picture_in_picture = Box::new(slot);
        self
    }

    /// Replaces the fullscreen capability.
    pub fn fullscreen(mut self, slot: impl Exclusive + 'static) -> Self {
        self.fullscreen = Box::new(slot);
        self
    }

    pub fn id(&self) -> HolderId {
        self.id
    }

    /// A snapshot of the mirrored state.
    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    /// Starts or pauses playback.
    ///
    /// Starting mutes the media for the duration of the request so autoplay
    /// policies allow it. The returned [`PendingPlay`] must be settled with
    /// [`Player::finish_play`]; `is_playing` only changes once it has.
    pub fn toggle_play(&mut self) -> Option<PendingPlay> {
        if self.media.paused() {
            self.media.set_muted(true);
            let future = self.media.play();
            Some(PendingPlay {
                ticket: PlayTicket {
                    player: self.id,
                    alive: Arc::clone(&self.alive),
                },
                future,
            })
        } else {
            self.media.pause();
            self.state.borrow_mut().is_playing = false;
            None
        }
    }

    /// Applies the outcome of a play request.
    ///
    /// Results for another player, or for a player that has been torn down,
    /// are ignored.
    pub fn finish_play(&mut self, ticket: &PlayTicket, result: Result<(), PlayRejected>) {
        if ticket.player != self.id || !ticket.is_live() {
            debug!("discarding play result for player {}", ticket.player);
            return;
        }

        self.media.set_muted(false);
        match result {
            // paused again before the request settled
            Ok(()) if self.media.paused() => debug!("play settled after pause"),
            Ok(()) => self.state.borrow_mut().is_playing = true,
            Err(err) => error!("{err}"),
        }
    }

    /// Seeks proportionally to where the timeline was clicked.
    ///
    /// Does nothing until the duration is known.
    pub fn seek(&mut self, request: SeekRequest) {
        let state = self.state();
        if !state.duration_known() {
            return;
        }
        let duration = state.duration;

        let target = time::seek_target(
            f64::from(request.pointer_x),
            f64::from(request.track_left),
            f64::from(request.track_width),
            duration,
        );
        self.media.set_current_time(target);
    }

    pub fn change_volume(&mut self, volume: f64) {
        let volume = Volume::new(volume);
        self.media.set_volume(volume.value());
        self.state.borrow_mut().volume = volume;
    }

    /// Switches speed and closes the speed menu.
    pub fn set_playback_rate(&mut self, rate: PlaybackRate) {
        self.media.set_playback_rate(rate.value());
        let mut state = self.state.borrow_mut();
        state.rate = rate;
        state.speed_menu_open = false;
    }

    pub fn toggle_speed_menu(&mut self) {
        let mut state = self.state.borrow_mut();
        state.speed_menu_open = !state.speed_menu_open;
    }

    /// Moves the playhead by `delta` seconds, leaving bounds to the media.
    pub fn skip(&mut self, delta: f64) {
        let target = self.media.current_time() + delta;
        self.media.set_current_time(target);
    }

    /// Leaves picture-in-picture if anyone is in it, otherwise enters it.
    pub fn toggle_pip(&mut self) -> Result<(), Error> {
        toggle(self.picture_in_picture.as_ref(), self.id)
    }

    /// Leaves fullscreen if anyone is in it, otherwise enters it.
    pub fn toggle_fullscreen(&mut self) -> Result<(), Error> {
        toggle(self.fullscreen.as_ref(), self.id)
    }

    pub fn in_pip(&self) -> bool {
        holds(self.picture_in_picture.as_ref(), self.id)
    }

    pub fn in_fullscreen(&self) -> bool {
        holds(self.fullscreen.as_ref(), self.id)
    }

    /// Gives back the exclusive modes this player holds and returns the
    /// window to its normal level, size and mode.
    ///
    /// Dropping a player releases its modes too, but cannot touch the window.
    pub fn unmount(&mut self) -> Task<Message> {
        self.alive.store(false, Ordering::Release);

        let mut tasks = Vec::new();
        if release_held(self.fullscreen.as_ref(), self.id) {
            tasks.push(change_mode(window::Mode::Windowed));
        }
        if release_held(self.picture_in_picture.as_ref(), self.id) {
            tasks.push(self.restore_window());
        }
        if tasks.is_empty() {
            Task::none()
        } else {
            Task::batch(tasks)
        }
    }

    /// Puts the window back on the normal level at its size from before
    /// picture-in-picture.
    fn restore_window(&mut self) -> Task<Message> {
        let size = self.restore_size.take();
        window::get_latest().and_then(move |id| {
            let level = window::change_level(id, window::Level::Normal);
            match size {
                Some(size) => level.chain(window::resize(id, size)),
                None => level,
            }
        })
    }

    /// `"MM:SS / MM:SS"` for the current position and duration.
    pub fn time_label(&self) -> String {
        let state = self.state();
        format!(
            "{} / {}",
            format_time(state.current_time),
            format_time(state.duration)
        )
    }

    /// Fraction of the timeline to fill.
    pub fn progress(&self) -> f64 {
        let state = self.state();
        time::progress(state.current_time, state.duration)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TogglePlay => match self.toggle_play() {
                Some(PendingPlay { ticket, future }) => {
                    Task::perform(future, move |result| {
                        Message::PlaySettled(ticket.clone(), result)
                    })
                }
                None => Task::none(),
            },
            Message::PlaySettled(ticket, result) => {
                self.finish_play(&ticket, result);
                Task::none()
            }
            Message::Seek(request) => {
                self.seek(request);
                Task::none()
            }
            Message::SkipBack => {
                self.skip(-self.settings.skip_step);
                Task::none()
            }
            Message::SkipForward => {
                self.skip(self.settings.skip_step);
                Task::none()
            }
            Message::VolumeChanged(volume) => {
                self.change_volume(volume);
                Task::none()
            }
            Message::ToggleSpeedMenu => {
                self.toggle_speed_menu();
                Task::none()
            }
            Message::RateSelected(rate) => {
                self.set_playback_rate(rate);
                Task::none()
            }
            Message::TogglePictureInPicture => match self.toggle_pip() {
                Ok(()) if self.in_pip() => window::get_latest().and_then(|id| {
                    window::get_size(id).map(move |size| Message::PictureInPictureReady(id, size))
                }),
                Ok(()) => self.restore_window(),
                Err(err) => {
                    error!("picture-in-picture toggle failed: {err}");
                    Task::none()
                }
            },
            Message::PictureInPictureReady(id, size) => {
                // left again before the window size arrived
                if !self.in_pip() {
                    return Task::none();
                }
                self.restore_size = Some(size);
                Task::batch([
                    window::change_level(id, window::Level::AlwaysOnTop),
                    window::resize(id, self.settings.pip_size),
                ])
            }
            Message::ToggleFullscreen => match self.toggle_fullscreen() {
                Ok(()) => change_mode(if self.in_fullscreen() {
                    window::Mode::Fullscreen
                } else {
                    window::Mode::Windowed
                }),
                Err(err) => {
                    error!("fullscreen toggle failed: {err}");
                    Task::none()
                }
            },
            Message::Tick => {
                self.media.poll();
                Task::none()
            }
        }
    }

    /// Drives time-progress events from the media.
    pub fn subscription(&self) -> Subscription<Message> {
        iced::time::every(self.settings.tick_interval).map(|_| Message::Tick)
    }

    pub fn view(&self) -> Element<'_, Message> {
        if self.in_pip() {
            return self.mini_view();
        }
        let state = self.state();
        let screen = self.screen();

        let timeline = column![
            text(format_time(state.current_time)).size(12),
            Timeline::new(self.progress()).on_seek(Message::Seek),
        ]
        .spacing(4);

        let volume_icon = if state.volume.is_silent() {
            "Muted"
        } else {
            "Volume"
        };
        let left = row![
            text(volume_icon),
            slider(0.0..=1.0, state.volume.value(), Message::VolumeChanged)
                .step(0.001)
                .width(Length::Fixed(100.0)),
            text(self.time_label()),
        ]
        .spacing(8)
        .align_y(Vertical::Center);

        let center = row![
            button(text("-5s")).on_press(Message::SkipBack),
            play_button(&state),
            button(text("+5s")).on_press(Message::SkipForward),
        ]
        .spacing(8)
        .align_y(Vertical::Center);

        let right = row![
            speed_control(&state),
            toggle_button("PiP", self.in_pip(), Message::TogglePictureInPicture),
            toggle_button("Fullscreen", self.in_fullscreen(), Message::ToggleFullscreen),
        ]
        .spacing(8)
        .align_y(Vertical::Center);

        let controls = row![
            container(left).width(Length::Fill),
            center,
            container(right)
                .width(Length::Fill)
                .align_x(Horizontal::Right),
        ]
        .align_y(Vertical::Bottom);

        column![screen, timeline, controls]
            .spacing(8)
            .padding(10)
            .into()
    }

    /// The compact always-on-top layout: frame, a thin timeline and just
    /// enough controls to pause or leave.
    fn mini_view(&self) -> Element<'_, Message> {
        let state = self.state();

        let controls = row![
            play_button(&state),
            text(self.time_label()).size(12),
            container(toggle_button("Exit PiP", true, Message::TogglePictureInPicture))
                .width(Length::Fill)
                .align_x(Horizontal::Right),
        ]
        .spacing(6)
        .align_y(Vertical::Center);

        column![
            self.screen(),
            Timeline::new(self.progress())
                .height(MINI_TIMELINE_HEIGHT)
                .on_seek(Message::Seek),
            controls,
        ]
        .spacing(4)
        .padding(4)
        .into()
    }

    fn screen(&self) -> Element<'_, Message> {
        match self.media.frame() {
            Some(handle) => image(handle)
                .content_fit(iced::ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => placeholder(),
        }
    }
}

impl<M: Media> Drop for Player<M> {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
        release_held(self.picture_in_picture.as_ref(), self.id);
        release_held(self.fullscreen.as_ref(), self.id);
    }
}

const MINI_TIMELINE_HEIGHT: f32 = 4.0;

fn toggle(slot: &dyn Exclusive, id: HolderId) -> Result<(), Error> {
    if slot.holder()?.is_some() {
        slot.release()
    } else {
        slot.request(id)
    }
}

fn holds(slot: &dyn Exclusive, id: HolderId) -> bool {
    matches!(slot.holder(), Ok(Some(holder)) if holder == id)
}

/// Releases `slot` if `id` holds it. Returns whether it did.
fn release_held(slot: &dyn Exclusive, id: HolderId) -> bool {
    if !holds(slot, id) {
        return false;
    }
    match slot.release() {
        Ok(()) => true,
        Err(err) => {
            error!("failed to release exclusive mode: {err}");
            false
        }
    }
}

fn change_mode(mode: window::Mode) -> Task<Message> {
    window::get_latest().and_then(move |id| window::change_mode(id, mode))
}

fn placeholder<'a>() -> Element<'a, Message> {
    container(text(""))
        .center(Length::Fill)
        .style(|_theme: &iced::Theme| container::Style {
            background: Some(iced::Color::BLACK.into()),
            text_color: Some(iced::Color::WHITE),
            ..Default::default()
        })
        .into()
}

fn speed_control<'a>(state: &PlaybackState) -> Element<'a, Message> {
    let toggle = button(text("Speed")).on_press(Message::ToggleSpeedMenu);
    if !state.speed_menu_open {
        return toggle.into();
    }

    let options = PlaybackRate::ALL.into_iter().fold(Column::new(), |menu, rate| {
        let option = button(text(rate.to_string()))
            .width(Length::Fill)
            .on_press(Message::RateSelected(rate))
            .style(if rate == state.rate {
                button::primary
            } else {
                button::text
            });
        menu.push(option)
    });

    column![options.width(Length::Fixed(90.0)), toggle]
        .spacing(4)
        .into()
}

fn play_button<'a>(state: &PlaybackState) -> Element<'a, Message> {
    button(text(if state.is_playing { "Pause" } else { "Play" }))
        .on_press(Message::TogglePlay)
        .into()
}

fn toggle_button<'a>(label: &'a str, active: bool, message: Message) -> Element<'a, Message> {
    button(text(label))
        .on_press(message)
        .style(if active {
            button::primary
        } else {
            button::secondary
        })
        .into()
}
