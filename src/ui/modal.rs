use iced::widget::{center, container, mouse_area, opaque, stack};
use iced::{Color, Element};

use crate::Message;

/// Lay `content` over `base` on a dimmed backdrop.
/// Clicking the backdrop emits `on_blur`; clicks on the content itself are swallowed.
pub fn modal<'a>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_blur: Message,
) -> Element<'a, Message> {
    stack![
        base.into(),
        opaque(
            mouse_area(center(opaque(content)).style(|_theme| container::Style {
                background: Some(Color { a: 0.8, ..Color::BLACK }.into()),
                ..container::Style::default()
            }))
            .on_press(on_blur)
        )
    ]
    .into()
}
