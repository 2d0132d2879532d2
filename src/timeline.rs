use iced::{
    advanced::{self, layout, mouse, renderer, widget, Widget},
    event::Status,
    Border, Color, Element, Length, Point, Rectangle, Shadow, Size,
};

const DEFAULT_HEIGHT: f32 = 8.0;

/// A click on the timeline, in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekRequest {
    pub pointer_x: f32,
    pub track_left: f32,
    pub track_width: f32,
}

impl SeekRequest {
    fn at(bounds: Rectangle, pointer: Point) -> Self {
        SeekRequest {
            pointer_x: pointer.x,
            track_left: bounds.x,
            track_width: bounds.width,
        }
    }
}

/// Timeline bar with a progress fill; clicking it requests a seek.
pub struct Timeline<'a, Message> {
    progress: f32,
    height: f32,
    track_color: Color,
    fill_color: Color,
    on_seek: Option<Box<dyn Fn(SeekRequest) -> Message + 'a>>,
}

impl<'a, Message> Timeline<'a, Message> {
    /// Creates a timeline filled to `progress` (`0.0..=1.0`).
    pub fn new(progress: f64) -> Self {
        Timeline {
            progress: progress.clamp(0.0, 1.0) as f32,
            height: DEFAULT_HEIGHT,
            track_color: Color::from_rgba(1.0, 1.0, 1.0, 0.2),
            fill_color: Color::from_rgb8(0x22, 0x89, 0xff),
            on_seek: None,
        }
    }

    /// Sets the height of the bar in pixels.
    pub fn height(self, height: f32) -> Self {
        Timeline { height, ..self }
    }

    /// Message to send when the timeline is clicked.
    pub fn on_seek<F>(self, on_seek: F) -> Self
    where
        F: 'a + Fn(SeekRequest) -> Message,
    {
        Timeline {
            on_seek: Some(Box::new(on_seek)),
            ..self
        }
    }

    fn fill_bounds(&self, bounds: Rectangle) -> Rectangle {
        Rectangle {
            width: bounds.width * self.progress,
            ..bounds
        }
    }
}

impl<'a, Message, Theme, Renderer> Widget<Message, Theme, Renderer> for Timeline<'a, Message>
where
    Renderer: advanced::Renderer,
{
    fn size(&self) -> Size<Length> {
        Size {
            width: Length::Fill,
            height: Length::Fixed(self.height),
        }
    }

    fn layout(
        &self,
        _tree: &mut widget::Tree,
        _renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        let size = limits.resolve(Length::Fill, Length::Fixed(self.height), Size::ZERO);
        layout::Node::new(size)
    }

    fn draw(
        &self,
        _tree: &widget::Tree,
        renderer: &mut Renderer,
        _theme: &Theme,
        _style: &renderer::Style,
        layout: advanced::Layout<'_>,
        _cursor: mouse::Cursor,
        _viewport: &Rectangle,
    ) {
        let bounds = layout.bounds();

        renderer.fill_quad(
            renderer::Quad {
                bounds,
                border: Border::default(),
                shadow: Shadow::default(),
            },
            self.track_color,
        );

        if self.progress > 0.0 {
            renderer.fill_quad(
                renderer::Quad {
                    bounds: self.fill_bounds(bounds),
                    border: Border::default(),
                    shadow: Shadow::default(),
                },
                self.fill_color,
            );
        }
    }

    fn on_event(
        &mut self,
        _state: &mut widget::Tree,
        event: iced::Event,
        layout: advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _renderer: &Renderer,
        _clipboard: &mut dyn advanced::Clipboard,
        shell: &mut advanced::Shell<'_, Message>,
        _viewport: &Rectangle,
    ) -> Status {
        let Some(on_seek) = self.on_seek.as_ref() else {
            return Status::Ignored;
        };

        if let iced::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) = event {
            let bounds = layout.bounds();
            if let Some(pointer) = cursor.position_over(bounds) {
                shell.publish(on_seek(SeekRequest::at(bounds, pointer)));
                return Status::Captured;
            }
        }

        Status::Ignored
    }

    fn mouse_interaction(
        &self,
        _tree: &widget::Tree,
        layout: advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _viewport: &Rectangle,
        _renderer: &Renderer,
    ) -> mouse::Interaction {
        if self.on_seek.is_some() && cursor.is_over(layout.bounds()) {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::default()
        }
    }
}

impl<'a, Message, Theme, Renderer> From<Timeline<'a, Message>>
    for Element<'a, Message, Theme, Renderer>
where
    Message: 'a,
    Theme: 'a,
    Renderer: 'a + advanced::Renderer,
{
    fn from(timeline: Timeline<'a, Message>) -> Self {
        Self::new(timeline)
    }
}
