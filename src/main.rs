use iced::widget::{column, scrollable, text, Column};
use iced::{Element, Length, Task, Theme};
use rfd::FileDialog;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod bench;
mod config;
mod error;
mod format;
mod state;
mod ui;

use bench::batch::{BatchJob, Progress, RunKind, Runner};
use bench::report::Report;
use config::BenchConfig;
use state::cache::Cache;
use state::data::{CacheSummary, SelectedFile};
use state::preview::PreviewRegistry;
use state::selection::{load_folder, load_selection, IMAGE_EXTENSIONS};
use state::session::Session;

/// Main application state
struct ImageBench {
    /// Selection, previews, results and batch phase
    session: Session,
    /// Cache, registry and settings, cloned into background tasks
    runner: Runner,
    /// Whether the cache-info dialog is shown
    show_cache_modal: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Select images"
    PickFiles,
    /// User clicked "Add folder"
    PickFolder,
    /// Picked files were stat'ed and are ready
    FilesLoaded(Vec<SelectedFile>),
    Reset,
    /// Start a cold, warm or single-file run
    Run(RunKind),
    Cancel,
    /// Output from the running batch
    Progress(Progress),
    ClearCache,
    ShowCache,
    /// A fresh cache summary, optionally opening the dialog
    CacheChecked { summary: CacheSummary, show: bool },
    CloseModal,
    Export,
}

impl ImageBench {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = BenchConfig::load();
        let cache = Cache::open(config.cache_db_path());
        let registry = PreviewRegistry::new();

        let runner = Runner::new(cache, registry.clone(), config);
        let session = Session::new(registry);

        if runner.cache.is_available() {
            info!("🎨 Image Bench initialized");
        } else {
            info!("🎨 Image Bench initialized (cache unavailable, warm runs measure uncached)");
        }

        let check = Self::check_cache(runner.cache.clone(), false);
        (
            ImageBench {
                session,
                runner,
                show_cache_modal: false,
            },
            check,
        )
    }

    fn check_cache(cache: Cache, show: bool) -> Task<Message> {
        Task::perform(async move { cache.summary() }, move |summary| {
            Message::CacheChecked { summary, show }
        })
    }

    /// Stream a batch's progress back as messages
    fn run_batch(runner: Runner, job: BatchJob) -> Task<Message> {
        Task::run(
            iced::stream::channel(64, move |output| async move {
                runner.run(job, output).await;
            }),
            Message::Progress,
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFiles => {
                let paths = FileDialog::new()
                    .set_title("Select images to benchmark")
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .pick_files();

                match paths {
                    Some(paths) => Task::perform(load_selection(paths), Message::FilesLoaded),
                    None => Task::none(),
                }
            }
            Message::PickFolder => {
                let folder = FileDialog::new()
                    .set_title("Select a folder of images")
                    .pick_folder();

                match folder {
                    Some(folder) => Task::perform(load_folder(folder), Message::FilesLoaded),
                    None => Task::none(),
                }
            }
            Message::FilesLoaded(files) => {
                self.session.select(files);
                Task::none()
            }
            Message::Reset => {
                self.session.reset();
                Task::none()
            }
            Message::Run(kind) => match self.session.begin(kind) {
                Some(job) => Self::run_batch(self.runner.clone(), job),
                None => Task::none(),
            },
            Message::Cancel => {
                self.session.cancel();
                Task::none()
            }
            Message::Progress(progress) => {
                self.session.apply(progress);
                Task::none()
            }
            Message::ClearCache => {
                if self.session.is_running() {
                    return Task::none();
                }
                let cache = self.runner.cache.clone();
                Task::perform(
                    async move {
                        if let Err(e) = cache.clear() {
                            error!("❌ Clear cache failed: {}", e);
                        }
                        cache.summary()
                    },
                    |summary| Message::CacheChecked {
                        summary,
                        show: false,
                    },
                )
            }
            Message::ShowCache => Self::check_cache(self.runner.cache.clone(), true),
            Message::CacheChecked { summary, show } => {
                self.session.set_cache_summary(summary);
                self.show_cache_modal |= show;
                Task::none()
            }
            Message::CloseModal => {
                self.show_cache_modal = false;
                Task::none()
            }
            Message::Export => {
                let path = FileDialog::new()
                    .set_title("Export results")
                    .add_filter("JSON", &["json"])
                    .set_file_name("image-bench-report.json")
                    .save_file();

                if let Some(path) = path {
                    if let Err(e) = Report::from_session(&self.session).write(&path) {
                        error!("❌ Export failed: {}", e);
                    }
                }
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let cards: Column<'_, Message> = self
            .session
            .files()
            .iter()
            .enumerate()
            .fold(column![].spacing(16), |cards, (index, file)| {
                cards.push(ui::card::file_card(&self.session, index, file))
            });

        let page = column![
            text("Image Bench: Base64 vs External").size(36),
            text(
                "Select images to compare Base64-encoded vs external file performance: \
                 payload size, data transferred and decode time, with and without a cache."
            )
            .size(14),
            ui::controls::controls(&self.session),
            ui::controls::cache_bar(self.session.cache_summary()),
            cards,
        ]
        .spacing(20)
        .padding(30);

        let base = scrollable(page).height(Length::Fill);

        if self.show_cache_modal {
            let summary = self.session.cache_summary().unwrap_or_default();
            ui::modal::modal(base, ui::modal::cache_info(summary), Message::CloseModal)
        } else {
            base.into()
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("image_bench=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> iced::Result {
    init_logging();

    iced::application("Image Bench", ImageBench::update, ImageBench::view)
        .theme(ImageBench::theme)
        .centered()
        .run_with(ImageBench::new)
}
