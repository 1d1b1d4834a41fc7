use iced::widget::{button, center, column, container, mouse_area, opaque, stack, text};
use iced::{Color, Element, Length};

use crate::format::human_bytes;
use crate::state::data::CacheSummary;
use crate::Message;

/// Lay `content` over `base` with a dimmed backdrop. Clicking the
/// backdrop sends `on_blur`.
pub fn modal<'a>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_blur: Message,
) -> Element<'a, Message> {
    stack![
        base.into(),
        opaque(
            mouse_area(center(opaque(content)).style(|_theme| container::Style {
                background: Some(
                    Color {
                        a: 0.8,
                        ..Color::BLACK
                    }
                    .into(),
                ),
                ..container::Style::default()
            }))
            .on_press(on_blur)
        )
    ]
    .into()
}

/// Body of the "Cache Info" dialog
pub fn cache_info(summary: CacheSummary) -> Element<'static, Message> {
    let body = if summary.available {
        format!(
            "Entries: {}\nTotal size: {}",
            summary.entry_count,
            human_bytes(summary.total_bytes)
        )
    } else {
        "The cache store is unavailable on this system.".to_string()
    };

    container(
        column![
            text("Cache Info").size(24),
            text(body).size(16),
            button("Close").on_press(Message::CloseModal),
        ]
        .spacing(16),
    )
    .width(Length::Fixed(320.0))
    .padding(20)
    .style(container::rounded_box)
    .into()
}
