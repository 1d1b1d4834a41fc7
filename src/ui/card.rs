/// Per-file comparison card
///
/// Left: thumbnail, name and size. Right: either a prompt to run the
/// benchmark or the Base64 vs external comparison table.
use iced::widget::{button, column, container, image, row, text, Column, Row};
use iced::{Alignment, Element, Length};

use crate::bench::batch::RunKind;
use crate::format::{human_bytes, human_bytes_opt, millis};
use crate::state::data::{MeasurementRecord, RecommendationKind, SelectedFile};
use crate::state::session::Session;
use crate::Message;

const THUMB_SIZE: f32 = 96.0;

pub fn file_card<'a>(session: &'a Session, index: usize, file: &'a SelectedFile) -> Element<'a, Message> {
    let thumb: Element<'a, Message> = match session
        .preview(index)
        .and_then(|preview| session.registry().handle(preview))
    {
        Some(handle) => image(handle)
            .width(Length::Fixed(THUMB_SIZE))
            .height(Length::Fixed(THUMB_SIZE))
            .into(),
        None => container(text("no preview").size(12))
            .width(Length::Fixed(THUMB_SIZE))
            .height(Length::Fixed(THUMB_SIZE))
            .center_x(Length::Fixed(THUMB_SIZE))
            .center_y(Length::Fixed(THUMB_SIZE))
            .into(),
    };

    let run = button(text("Run").size(14))
        .style(button::secondary)
        .on_press_maybe((!session.is_running()).then_some(Message::Run(RunKind::Single(index))));

    let sidebar = column![
        thumb,
        text(&file.name).size(14),
        text(human_bytes(file.size)).size(12),
        run,
    ]
    .spacing(6)
    .width(Length::Fixed(THUMB_SIZE + 40.0));

    let content: Element<'a, Message> = match session.record(index) {
        None => container(text("Ready to benchmark").size(14))
            .center_x(Length::Fill)
            .center_y(Length::Fixed(THUMB_SIZE))
            .into(),
        Some(record) => comparison(record),
    };

    container(row![sidebar, content].spacing(20))
        .padding(16)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}

fn cell<'a>(label: String) -> Element<'a, Message> {
    container(text(label).size(14))
        .width(Length::FillPortion(1))
        .into()
}

fn table_row<'a>(metric: &str, base64: String, external: String) -> Row<'a, Message> {
    row![cell(metric.to_string()), cell(base64), cell(external)]
        .spacing(10)
        .align_y(Alignment::Center)
}

fn comparison<'a>(record: &'a MeasurementRecord) -> Element<'a, Message> {
    let payload_base64 = match record.inflation_percent {
        Some(inflation) => format!("{} (+{:.1}%)", human_bytes_opt(record.base64_size), inflation),
        None => human_bytes_opt(record.base64_size),
    };

    let transferred_base64 = if record.cached {
        format!("{} (redownloaded)", human_bytes_opt(record.base64_size))
    } else {
        human_bytes_opt(record.base64_size)
    };
    let transferred_external = if record.cached {
        format!("{} (cached)", human_bytes(record.external_transferred()))
    } else {
        human_bytes(record.external_transferred())
    };

    let inline_time = if record.has_base64_timing() {
        millis(Some(record.total_time))
    } else {
        millis(None)
    };

    let recommendation = text(record.recommendation.text).size(14).style(
        match record.recommendation.kind {
            RecommendationKind::Good => text::success,
            RecommendationKind::Bad => text::danger,
        },
    );

    let table: Column<'a, Message> = column![
        table_row("Metric", "Inline (Base64)".into(), "External (File)".into()),
        table_row("Payload size", payload_base64, human_bytes(record.original_size)),
        table_row("Data transferred", transferred_base64, transferred_external),
        table_row("Decode time", inline_time, millis(record.decode_time)),
        recommendation,
    ]
    .spacing(8);

    table.width(Length::Fill).into()
}
