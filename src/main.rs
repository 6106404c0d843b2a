use chrono::Utc;
use iced::keyboard;
use iced::widget::image::Handle;
use iced::widget::{
    button, center, column, container, mouse_area, row, stack, text, text_editor, Column, Image, Space,
};
use iced::{mouse, Alignment, Border, Color, ContentFit, Element, Length, Subscription, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::time::{Duration, Instant};

mod config;
mod error;
mod imaging;
mod remote;
mod state;
mod ui;

use config::AppConfig;
use error::StudioError;
use imaging::data_url::DataUrl;
use imaging::{crop, encode, export};
use remote::gemini::GeminiClient;
use state::aspect::AspectRatio;
use state::session::{CropJob, GenerationJob, Session};

const ACCENT: Color = Color::from_rgb(0.75, 0.52, 0.99);
const MUTED: Color = Color::from_rgb(0.55, 0.57, 0.62);

/// Main application state
struct BrandingStudio {
    /// Everything the current editing run knows about
    session: Session,
    config: AppConfig,
    client: GeminiClient,
    /// Backing buffer of the prompt editor (mirrored into `session.prompt`)
    prompt: text_editor::Content,
    /// Decoded crop, ready for the image widget
    cropped_preview: Option<Handle>,
    /// Decoded result, ready for the image widget
    generated_preview: Option<Handle>,
    spinner_angle: f32,
    last_tick: Option<Instant>,
    /// Status line at the bottom of the window
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the upload area
    PickFile,
    /// Background read of the picked file finished (ticket, result)
    FileEncoded(u64, Result<DataUrl, StudioError>),
    AspectRatioSelected(AspectRatio),
    /// Background crop finished (ticket, result)
    CropFinished(u64, Result<DataUrl, StudioError>),
    PromptEdited(text_editor::Action),
    /// User clicked "Generate"
    Generate,
    /// Remote model answered (ticket, result)
    GenerationFinished(u64, Result<DataUrl, StudioError>),
    /// User clicked "Download"
    Download,
    Saved(Result<PathBuf, StudioError>),
    /// User clicked "Start over"
    Reset,
    OpenPreview,
    ClosePreview,
    /// Animation frame for the spinners
    Tick(Instant),
}

impl BrandingStudio {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = AppConfig::load();
        let client = GeminiClient::new(&config);

        log::info!("🎨 Branding Studio initialized (model: {})", config.model);

        let status = if config.api_key.is_some() {
            format!("Ready. Using {}.", config.model)
        } else {
            "GEMINI_API_KEY is not set. Generation is disabled until it is configured.".to_string()
        };

        (
            BrandingStudio {
                session: Session::new(),
                config,
                client,
                prompt: text_editor::Content::new(),
                cropped_preview: None,
                generated_preview: None,
                spinner_angle: 0.0,
                last_tick: None,
                status,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFile => {
                // Show the native file picker dialog
                let file = FileDialog::new()
                    .set_title("Select a Portrait")
                    .add_filter("Images", &encode::IMAGE_EXTENSIONS)
                    .pick_file();

                if let Some(path) = file {
                    // Reset everything for a new image
                    let ticket = self.reset();
                    self.status = format!("Loading {}...", path.display());
                    return Task::perform(encode::file_to_data_url(path), move |result| {
                        Message::FileEncoded(ticket, result)
                    });
                }

                Task::none()
            }
            Message::FileEncoded(ticket, Ok(original)) => match self.session.set_original(ticket, original) {
                Some(job) => self.crop_task(job),
                None => {
                    log::debug!("Dropping stale upload #{}", ticket);
                    Task::none()
                }
            },
            Message::FileEncoded(ticket, Err(error)) => {
                self.log_failure("upload", &error);
                if !self.session.upload_failed(ticket, error) {
                    log::debug!("Dropping stale upload error #{}", ticket);
                }
                Task::none()
            }
            Message::AspectRatioSelected(ratio) => match self.session.select_aspect_ratio(ratio) {
                Some(job) => self.crop_task(job),
                None => Task::none(),
            },
            Message::CropFinished(ticket, result) => {
                if let Err(error) = &result {
                    self.log_failure("crop", error);
                }
                if self.session.finish_crop(ticket, result) {
                    self.cropped_preview = self.session.cropped.as_ref().and_then(preview_handle);
                    self.status = match &self.session.error {
                        None => format!("Cropped to {}.", self.session.aspect_ratio),
                        Some(_) => "Crop failed.".to_string(),
                    };
                } else {
                    log::debug!("Dropping stale crop result #{}", ticket);
                }
                log::debug!("Session phase: {:?}", self.session.phase());
                Task::none()
            }
            Message::PromptEdited(action) => {
                if self.session.prompt_enabled() {
                    self.prompt.perform(action);
                    self.session.set_prompt(editor_text(&self.prompt));
                }
                Task::none()
            }
            Message::Generate => match self.session.begin_generation() {
                Some(job) => {
                    self.generated_preview = None;
                    self.status = "Generating...".to_string();
                    self.generation_task(job)
                }
                None => Task::none(),
            },
            Message::GenerationFinished(ticket, result) => {
                if self.session.finish_generation(ticket, result) {
                    self.generated_preview = self.session.generated.as_ref().and_then(preview_handle);
                    self.status = match &self.session.error {
                        None => "✅ Image generated. Click it to view full size.".to_string(),
                        Some(_) => "Generation failed.".to_string(),
                    };
                } else {
                    log::debug!("Dropping stale generation result #{}", ticket);
                }
                log::debug!("Session phase: {:?}", self.session.phase());
                Task::none()
            }
            Message::Download => {
                if !self.session.can_download() {
                    return Task::none();
                }
                let Some(image) = self.session.generated.clone() else {
                    return Task::none();
                };

                // Show the native save dialog
                let file_name = export::suggested_file_name(&image, Utc::now());
                let path = FileDialog::new()
                    .set_title("Save Branded Image")
                    .set_file_name(file_name)
                    .save_file();

                match path {
                    Some(path) => Task::perform(export::save_image(image, path), Message::Saved),
                    None => Task::none(),
                }
            }
            Message::Saved(Ok(path)) => {
                self.status = format!("✅ Saved to {}", path.display());
                Task::none()
            }
            Message::Saved(Err(error)) => {
                self.log_failure("save", &error);
                self.session.report(error);
                Task::none()
            }
            Message::Reset => {
                self.reset();
                self.status = "Ready.".to_string();
                Task::none()
            }
            Message::OpenPreview => {
                self.session.open_preview();
                Task::none()
            }
            Message::ClosePreview => {
                self.session.close_preview();
                Task::none()
            }
            Message::Tick(now) => {
                if let Some(last) = self.last_tick {
                    self.spinner_angle = ui::spinner::advance(self.spinner_angle, now - last);
                }
                self.last_tick = Some(now);
                Task::none()
            }
        }
    }

    /// Clear the session and every cached view of it.
    /// Returns the ticket for a file read started right after.
    fn reset(&mut self) -> u64 {
        let ticket = self.session.begin_upload();
        self.prompt = text_editor::Content::new();
        self.cropped_preview = None;
        self.generated_preview = None;
        ticket
    }

    fn crop_task(&mut self, job: CropJob) -> Task<Message> {
        let CropJob { ticket, source, ratio } = job;
        self.status = format!("Cropping to {}...", ratio);
        Task::perform(
            crop::crop_image(source, ratio, self.config.jpeg_quality),
            move |result| Message::CropFinished(ticket, result),
        )
    }

    fn generation_task(&self, job: GenerationJob) -> Task<Message> {
        let GenerationJob { ticket, image, prompt } = job;
        Task::perform(
            self.client.clone().generate_branded_image(image, prompt),
            move |result| Message::GenerationFinished(ticket, result),
        )
    }

    fn log_failure(&self, stage: &str, error: &StudioError) {
        match error.detail() {
            Some(detail) => log::warn!("⚠️  {} failed: {} ({})", stage, error, detail),
            None => log::warn!("⚠️  {} failed: {}", stage, error),
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let header = column![
            text("Personal Branding Studio").size(44).color(ACCENT),
            text("Professional personal-branding photos with AI").size(18).color(MUTED),
        ]
        .spacing(6)
        .align_x(Alignment::Center)
        .width(Length::Fill);

        let panels = row![self.upload_panel(), self.prompt_panel(), self.result_panel()]
            .spacing(24)
            .height(Length::Fill);

        let content: Column<Message> = column![header]
            .push_maybe(self.session.error.as_ref().map(error_banner))
            .push(panels)
            .push(text(&self.status).size(14).color(MUTED))
            .spacing(24)
            .padding(32)
            .max_width(1400);

        let page = container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill);

        match (&self.generated_preview, self.session.is_preview_open) {
            (Some(handle), true) => ui::modal::modal(page, preview_overlay(handle), Message::ClosePreview),
            _ => page.into(),
        }
    }

    /// Step 1: upload area and aspect ratio choice
    fn upload_panel(&self) -> Element<Message> {
        let busy = self.session.is_cropping;

        let inner: Element<Message> = match &self.cropped_preview {
            Some(handle) => {
                let picture = Image::new(handle.clone())
                    .content_fit(ContentFit::Contain)
                    .width(Length::Fill)
                    .height(Length::Fill);
                if busy {
                    stack![
                        picture,
                        center(ui::spinner::view(self.spinner_angle, 48.0, Color::WHITE)).style(|_theme| {
                            container::Style {
                                background: Some(Color { a: 0.5, ..Color::BLACK }.into()),
                                ..container::Style::default()
                            }
                        }),
                    ]
                    .into()
                } else {
                    picture.into()
                }
            }
            None if busy => center(ui::spinner::view(self.spinner_angle, 48.0, Color::WHITE)).into(),
            None => center(
                column![text("⬆").size(40).color(MUTED), text("Click to upload an image").color(MUTED)]
                    .spacing(8)
                    .align_x(Alignment::Center),
            )
            .into(),
        };

        let upload_area = mouse_area(
            container(inner)
                .width(Length::Fill)
                .height(Length::Fixed(360.0))
                .padding(8)
                .style(drop_zone_style),
        )
        .on_press(Message::PickFile)
        .interaction(mouse::Interaction::Pointer);

        let ratio_picker = self.session.original.as_ref().map(|_| {
            let buttons = AspectRatio::ALL.iter().map(|&ratio| {
                let style = if ratio == self.session.aspect_ratio {
                    button::primary
                } else {
                    button::secondary
                };
                button(text(ratio.label()).width(Length::Fill).align_x(Alignment::Center))
                    .on_press(Message::AspectRatioSelected(ratio))
                    .style(style)
                    .width(Length::Fill)
                    .into()
            });

            column![text("Size").size(16), row(buttons).spacing(8)].spacing(8)
        });

        panel(
            1,
            "Upload your photo",
            column![upload_area].push_maybe(ratio_picker).spacing(16),
        )
    }

    /// Step 2: prompt and generate button
    fn prompt_panel(&self) -> Element<Message> {
        let mut editor = text_editor(&self.prompt)
            .placeholder(
                "Example: a professional portrait, wearing a black suit, \
                 standing in a modern office with a blurred background...",
            )
            .height(Length::Fill)
            .padding(12);
        if self.session.prompt_enabled() {
            editor = editor.on_action(Message::PromptEdited);
        }

        let label = if self.session.is_loading {
            "Processing..."
        } else {
            "✨ Generate"
        };
        let generate = button(text(label).width(Length::Fill).align_x(Alignment::Center))
            .on_press_maybe(self.session.can_generate().then_some(Message::Generate))
            .style(button::primary)
            .padding(12)
            .width(Length::Fill);

        panel(2, "Describe the photo you want", column![editor, generate].spacing(16))
    }

    /// Step 3: result, download and reset
    fn result_panel(&self) -> Element<Message> {
        let inner: Element<Message> = if self.session.is_loading {
            center(
                column![
                    ui::spinner::view(self.spinner_angle, 64.0, ACCENT),
                    text("AI is creating, please wait...").color(MUTED),
                ]
                .spacing(16)
                .align_x(Alignment::Center),
            )
            .into()
        } else if let Some(handle) = &self.generated_preview {
            mouse_area(
                Image::new(handle.clone())
                    .content_fit(ContentFit::Contain)
                    .width(Length::Fill)
                    .height(Length::Fill),
            )
            .on_press(Message::OpenPreview)
            .interaction(mouse::Interaction::Pointer)
            .into()
        } else {
            center(
                column![text("✨").size(40).color(MUTED), text("Your image will appear here").color(MUTED)]
                    .spacing(8)
                    .align_x(Alignment::Center),
            )
            .into()
        };

        let result_area = container(inner)
            .width(Length::Fill)
            .height(Length::Fixed(360.0))
            .padding(8)
            .style(container::bordered_box);

        let download = button(text("Download").width(Length::Fill).align_x(Alignment::Center))
            .on_press_maybe(self.session.can_download().then_some(Message::Download))
            .style(button::success)
            .width(Length::Fill);
        let reset = button(text("Start over").width(Length::Fill).align_x(Alignment::Center))
            .on_press(Message::Reset)
            .style(button::secondary)
            .width(Length::Fill);

        panel(3, "Result", column![result_area, row![download, reset].spacing(8)].spacing(16))
    }

    /// Spin the busy indicators only while something is running
    fn subscription(&self) -> Subscription<Message> {
        let escape = keyboard::on_key_press(|key, _modifiers| match key {
            keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::ClosePreview),
            _ => None,
        });

        if self.session.is_loading || self.session.is_cropping {
            Subscription::batch([escape, iced::time::every(Duration::from_millis(16)).map(Message::Tick)])
        } else {
            escape
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Numbered step card
fn panel<'a>(step: u8, title: &'a str, body: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    let heading = row![
        container(text(step.to_string()).size(18).color(ACCENT))
            .padding([4, 12])
            .style(|_theme| container::Style {
                background: Some(Color { a: 0.2, ..ACCENT }.into()),
                border: Border {
                    radius: 16.0.into(),
                    ..Border::default()
                },
                ..container::Style::default()
            }),
        text(title).size(22).color(ACCENT),
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    container(column![heading, body.into()].spacing(16))
        .padding(24)
        .width(Length::FillPortion(1))
        .height(Length::Fill)
        .style(container::rounded_box)
        .into()
}

fn error_banner(error: &StudioError) -> Element<'_, Message> {
    container(
        text(error.to_string())
            .color(Color::from_rgb(0.99, 0.65, 0.65))
            .width(Length::Fill)
            .align_x(Alignment::Center),
    )
    .padding(12)
    .width(Length::Fill)
    .style(|_theme| container::Style {
        background: Some(Color::from_rgba(0.5, 0.11, 0.11, 0.5).into()),
        border: Border {
            color: Color::from_rgb(0.73, 0.11, 0.11),
            width: 1.0,
            radius: 8.0.into(),
        },
        ..container::Style::default()
    })
    .into()
}

fn preview_overlay(handle: &Handle) -> Element<'_, Message> {
    let close = button(text("✕").size(18))
        .on_press(Message::ClosePreview)
        .style(button::secondary)
        .padding([4, 10]);

    container(
        column![
            row![Space::with_width(Length::Fill), close],
            Image::new(handle.clone()).content_fit(ContentFit::Contain),
        ]
        .spacing(8),
    )
    .max_width(1100)
    .max_height(800)
    .padding(12)
    .style(container::rounded_box)
    .into()
}

fn drop_zone_style(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();
    container::Style {
        background: Some(palette.background.base.color.into()),
        border: Border {
            color: palette.background.strong.color,
            width: 2.0,
            radius: 8.0.into(),
        },
        ..container::Style::default()
    }
}

/// Decode a `data:` URL into an image handle for display
fn preview_handle(image: &DataUrl) -> Option<Handle> {
    match image.decode() {
        Ok(bytes) => Some(Handle::from_bytes(bytes)),
        Err(e) => {
            log::warn!("⚠️  Cannot display {}: {}", image.mime_type, e);
            None
        }
    }
}

/// Editor contents without the trailing newline the editor keeps
fn editor_text(content: &text_editor::Content) -> String {
    content.text().trim_end_matches('\n').to_string()
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application(
        "Personal Branding Studio",
        BrandingStudio::update,
        BrandingStudio::view,
    )
    .theme(BrandingStudio::theme)
    .subscription(BrandingStudio::subscription)
    .window_size((1320.0, 860.0))
    .centered()
    .run_with(BrandingStudio::new)
}
