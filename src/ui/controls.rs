use iced::widget::{button, column, row, text, Column};
use iced::{Alignment, Element};

use crate::bench::batch::RunKind;
use crate::format::human_bytes;
use crate::state::data::CacheSummary;
use crate::state::session::Session;
use crate::Message;

/// File selection, run buttons and the status line
pub fn controls(session: &Session) -> Element<'_, Message> {
    let idle = !session.is_running();
    let has_files = !session.files().is_empty();

    let header = row![
        button("Select images").on_press_maybe(idle.then_some(Message::PickFiles)),
        button("Add folder").on_press_maybe(idle.then_some(Message::PickFolder)),
        button("Reset").style(button::secondary).on_press(Message::Reset),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let mut content: Column<'_, Message> = column![
        header,
        text("🔒 Nothing is uploaded. Your images stay on your device").size(13),
    ]
    .spacing(12);

    if has_files {
        let ready = idle.then_some(());
        let actions = row![
            action_button(
                "Test Without Cache",
                "Fresh load (clears cache)",
                ready.map(|_| Message::Run(RunKind::Cold)),
            ),
            action_button(
                "Test With Cache",
                "Repeat visit (uses cache)",
                ready.map(|_| Message::Run(RunKind::Warm)),
            ),
            button("Cancel")
                .style(button::danger)
                .on_press_maybe(session.is_running().then_some(Message::Cancel)),
            button("Export JSON")
                .style(button::secondary)
                .on_press_maybe(session.records().next().map(|_| Message::Export)),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        content = content.push(actions);

        let status = session.status();
        if !status.is_empty() {
            content = content.push(text(status).size(16));
        }
    }

    content.into()
}

fn action_button<'a>(label: &'a str, hint: &'a str, on_press: Option<Message>) -> Element<'a, Message> {
    button(column![text(label).size(16), text(hint).size(12)].spacing(2))
        .padding(10)
        .on_press_maybe(on_press)
        .into()
}

/// One line of cache state plus its two actions
pub fn cache_bar(summary: Option<CacheSummary>) -> Element<'static, Message> {
    let info = match summary {
        Some(summary) if summary.available => format!(
            "Cache: {} entries, {}",
            summary.entry_count,
            human_bytes(summary.total_bytes)
        ),
        Some(_) => "Cache: unavailable".to_string(),
        None => "Cache: not checked yet".to_string(),
    };

    row![
        button("Clear cache").style(button::secondary).on_press(Message::ClearCache),
        button("Show cache").style(button::secondary).on_press(Message::ShowCache),
        text(info).size(14),
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}
