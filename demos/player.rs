use iced::widget::{container, text};
use iced::{Element, Length, Subscription, Task};
use iced_video_controls::{Message, Player, Settings, Video};
use tracing_subscriber::EnvFilter;

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    iced::application("Iced Video Controls", App::update, App::view)
        .subscription(App::subscription)
        .run_with(App::new)
}

enum App {
    Ready(Player<Video>),
    Failed(String),
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let mut settings = Settings::default();
        if let Some(source) = std::env::args().nth(1) {
            settings = settings.source(source);
        }

        let app = match settings
            .source_url()
            .and_then(|url| Video::new(&url))
        {
            Ok(video) => App::Ready(Player::new(video, settings)),
            Err(err) => {
                log::error!("cannot open {}: {err}", settings.source);
                App::Failed(err.to_string())
            }
        };
        (app, Task::none())
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match self {
            App::Ready(player) => player.update(message),
            App::Failed(_) => Task::none(),
        }
    }

    fn view(&self) -> Element<Message> {
        match self {
            App::Ready(player) => player.view(),
            App::Failed(reason) => container(text(format!("Cannot play video: {reason}")))
                .center(Length::Fill)
                .into(),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        match self {
            App::Ready(player) => player.subscription(),
            App::Failed(_) => Subscription::none(),
        }
    }
}
