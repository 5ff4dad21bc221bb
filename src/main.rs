//! Desktop GUI for downloading videos and audio via yt-dlp.

// Persisted download history
mod history;
// Data models for tasks, presets and worker events
mod model;
// Preview probe (yt-dlp -J)
mod probe;
// Progress-template parsing
mod progress;
// FIFO queue of pending downloads
mod queue;
// Thumbnail fetching
mod thumbnail;
// URL validation
mod urls;
// yt-dlp worker
mod downloader;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use eframe::egui::{self, ColorImage, Color32, RichText, TextureOptions, Visuals};
use eframe::{App, Frame};
use once_cell::sync::OnceCell;
use rfd::FileDialog;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing_subscriber::EnvFilter;

use history::{HistoryEntry, HistoryStore};
use model::{DownloadTask, Quality, VideoInfo, WorkerEvent};
use queue::DownloadQueue;

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rt = Arc::new(Runtime::new().unwrap());
    RUNTIME.set(rt).unwrap();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([550.0, 750.0])
            .with_min_inner_size([500.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "TubeGrab",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(Visuals::light());
            Box::new(DownApp::new())
        }),
    )
}

/// The download currently owned by the worker.
struct ActiveDownload {
    task: DownloadTask,
    /// Title reported by yt-dlp, once known.
    title: Option<String>,
    cancel: Arc<AtomicBool>,
    events: UnboundedReceiver<WorkerEvent>,
}

/// Application state for the GUI.
struct DownApp {
    url_input: String,
    dest_dir: String,
    quality: Quality,
    queue: DownloadQueue,
    active: Option<ActiveDownload>,
    progress: f32,
    status_line: String,
    history: HistoryStore,
    history_visible: bool,
    confirm_clear: bool,
    dark_mode: bool,
    error_modal: Option<String>,
    preview: Option<VideoInfo>,
    preview_rx: Option<UnboundedReceiver<Result<VideoInfo, String>>>,
    /// Thumbnail handed over from the blocking fetch task.
    thumbnail_slot: Arc<Mutex<Option<ColorImage>>>,
    thumbnail: Option<egui::TextureHandle>,
}

impl DownApp {
    fn new() -> Self {
        Self {
            url_input: String::new(),
            dest_dir: default_download_dir(),
            quality: Quality::P720,
            queue: DownloadQueue::default(),
            active: None,
            progress: 0.0,
            status_line: "Ready to download".to_string(),
            history: HistoryStore::load(HistoryStore::default_path()),
            history_visible: false,
            confirm_clear: false,
            dark_mode: false,
            error_modal: None,
            preview: None,
            preview_rx: None,
            thumbnail_slot: Arc::new(Mutex::new(None)),
            thumbnail: None,
        }
    }

    /// Validates the inputs, ensures the destination folder exists, and
    /// enqueues a task; the queue starts it as soon as the worker is free.
    fn queue_download(&mut self) {
        let url = self.url_input.trim().to_string();
        if url.is_empty() {
            self.error_modal = Some("Please enter a video URL".to_string());
            return;
        }
        if !urls::is_valid_video_url(&url) {
            self.error_modal = Some("Invalid video URL".to_string());
            return;
        }

        let mut folder = self.dest_dir.trim().to_string();
        if folder.is_empty() {
            folder = default_download_dir();
            self.dest_dir = folder.clone();
        }
        let dest_dir = PathBuf::from(&folder);
        if let Err(error) = std::fs::create_dir_all(&dest_dir) {
            self.error_modal = Some(format!("Could not create download folder: {error}"));
            return;
        }

        self.queue.push(DownloadTask { url, quality: self.quality, dest_dir });
        if self.queue.is_active() {
            self.status_line = format!("Queued ({} waiting)", self.queue.pending_len());
        }
        self.start_next();
    }

    /// Starts the next queued task unless one is already running.
    fn start_next(&mut self) {
        if self.active.is_some() {
            return;
        }
        let Some(task) = self.queue.take_next() else {
            return;
        };
        self.progress = 0.0;
        self.status_line = "Preparing download...".to_string();

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = unbounded_channel();
        RUNTIME
            .get()
            .unwrap()
            .spawn(downloader::run(task.clone(), Arc::clone(&cancel), tx));
        self.active = Some(ActiveDownload { task, title: None, cancel, events: rx });
    }

    /// Records the outcome, rewrites the history file, and moves on to the
    /// next queued task regardless of how this one ended.
    fn finish_active(&mut self, event: WorkerEvent) {
        let Some(success) = event.history_outcome() else {
            return;
        };
        let Some(active) = self.active.take() else {
            return;
        };

        let title = active.title.unwrap_or_else(|| {
            self.preview
                .as_ref()
                .map(|info| info.title.clone())
                .unwrap_or_else(|| "Unknown".to_string())
        });
        match &event {
            WorkerEvent::Finished => {
                self.progress = 1.0;
                self.status_line = format!("Download complete: {title}");
            }
            WorkerEvent::Failed(message) => {
                self.progress = 0.0;
                self.status_line = format!("Error: {message}");
            }
            // only Cancelled is left; non-terminal events returned above
            _ => {
                self.progress = 0.0;
                self.status_line = "Download cancelled".to_string();
            }
        }

        self.history.push(HistoryEntry::new(
            title,
            active.task.quality.token(),
            active.task.url,
            success,
        ));
        self.queue.finish_active();
        self.start_next();
    }

    /// Cancels the active download, or clears the pending queue when idle.
    fn cancel(&mut self) {
        if let Some(active) = &self.active {
            active.cancel.store(true, Ordering::Relaxed);
            self.status_line = "Cancelling download...".to_string();
        } else {
            self.queue.clear_pending();
            self.progress = 0.0;
            self.status_line = "Ready to download".to_string();
        }
    }

    /// Kicks off the metadata probe on a blocking task.
    fn start_preview(&mut self, ctx: &egui::Context) {
        let url = self.url_input.trim().to_string();
        if url.is_empty() {
            self.error_modal = Some("Please enter a video URL".to_string());
            return;
        }
        if !urls::is_valid_video_url(&url) {
            self.error_modal = Some("Invalid video URL".to_string());
            return;
        }
        if self.preview_rx.is_some() {
            return;
        }
        self.status_line = "Getting video information...".to_string();

        let (tx, rx) = unbounded_channel();
        self.preview_rx = Some(rx);
        let ctx_c = ctx.clone();
        RUNTIME.get().unwrap().spawn_blocking(move || {
            let result = downloader::find_ytdlp()
                .map_err(|error| error.to_string())
                .and_then(|binary| {
                    probe::probe_url(&binary, &url).map_err(|error| error.to_string())
                })
                .map(|mut info| {
                    if info.thumbnail_url.is_none() {
                        info.thumbnail_url = urls::extract_video_id(&url)
                            .map(|id| thumbnail::default_thumbnail_url(&id));
                    }
                    info
                });
            let _ = tx.send(result);
            ctx_c.request_repaint();
        });
    }

    fn apply_preview(&mut self, ctx: &egui::Context, info: VideoInfo) {
        self.quality = Quality::suggest(&info.heights);
        self.status_line = format!(
            "Video: {}\nDuration: {}\nReady to download",
            info.title,
            info.duration_text()
        );

        self.thumbnail = None;
        if let Some(url) = info.thumbnail_url.clone() {
            let slot = Arc::clone(&self.thumbnail_slot);
            let ctx_c = ctx.clone();
            RUNTIME.get().unwrap().spawn_blocking(move || {
                if let Some(img) = thumbnail::fetch_thumbnail(&url) {
                    *slot.lock().unwrap() = Some(img);
                    ctx_c.request_repaint();
                }
            });
        }
        self.preview = Some(info);
    }

    /// Drains worker and probe channels; called at the top of every frame.
    fn poll_background(&mut self, ctx: &egui::Context) {
        let mut terminal = None;
        if let Some(active) = self.active.as_mut() {
            while let Ok(event) = active.events.try_recv() {
                match event {
                    WorkerEvent::Progress { fraction, eta } => {
                        self.progress = fraction;
                        self.status_line = if fraction >= 1.0 {
                            "Processing...".to_string()
                        } else {
                            match &eta {
                                Some(eta) => format!("Downloading: {eta} remaining"),
                                None => "Downloading...".to_string(),
                            }
                        };
                    }
                    WorkerEvent::Title(title) => active.title = Some(title),
                    event => {
                        terminal = Some(event);
                        break;
                    }
                }
            }
        }
        if let Some(event) = terminal {
            self.finish_active(event);
        }

        let mut preview_done = None;
        if let Some(rx) = self.preview_rx.as_mut() {
            if let Ok(result) = rx.try_recv() {
                preview_done = Some(result);
            }
        }
        if let Some(result) = preview_done {
            self.preview_rx = None;
            match result {
                Ok(info) => self.apply_preview(ctx, info),
                Err(message) => {
                    self.status_line = "Ready to download".to_string();
                    self.error_modal = Some(message);
                }
            }
        }

        let fetched = self.thumbnail_slot.lock().unwrap().take();
        if let Some(img) = fetched {
            self.thumbnail = Some(ctx.load_texture("preview_thumbnail", img, TextureOptions::default()));
        }
    }

    fn toggle_theme(&mut self, ctx: &egui::Context) {
        self.dark_mode = !self.dark_mode;
        ctx.set_visuals(if self.dark_mode {
            Visuals::dark()
        } else {
            Visuals::light()
        });
    }

    fn header_section(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("TubeGrab");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🌓").on_hover_text("Toggle theme").clicked() {
                    self.toggle_theme(ctx);
                }
            });
        });
        ui.weak("Download videos and audio with ease");
    }

    fn input_section(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.label("Video URL:");
        ui.add(
            egui::TextEdit::singleline(&mut self.url_input)
                .desired_width(f32::INFINITY)
                .hint_text("https://www.youtube.com/watch?v=..."),
        );
        ui.horizontal(|ui| {
            ui.label("Download folder:");
            ui.text_edit_singleline(&mut self.dest_dir);
            if ui.button("Browse…").clicked() {
                if let Some(folder) = FileDialog::new()
                    .set_directory(Path::new(&self.dest_dir))
                    .pick_folder()
                {
                    self.dest_dir = folder.display().to_string();
                }
            }
        });
        ui.horizontal(|ui| {
            egui::ComboBox::from_label("Quality")
                .selected_text(self.quality.label())
                .show_ui(ui, |ui| {
                    for preset in Quality::ALL {
                        ui.selectable_value(&mut self.quality, preset, preset.label());
                    }
                });
            if ui.button("Preview").clicked() {
                self.start_preview(ctx);
            }
        });
    }

    fn preview_section(&mut self, ui: &mut egui::Ui) {
        let Some(info) = &self.preview else {
            return;
        };
        ui.group(|ui| {
            ui.horizontal(|ui| {
                if let Some(tex) = &self.thumbnail {
                    ui.add(egui::Image::new(tex).max_width(160.0));
                }
                ui.vertical(|ui| {
                    ui.label(RichText::new(&info.title).strong());
                    ui.label(format!("Duration: {}", info.duration_text()));
                });
            });
        });
    }

    fn progress_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(&self.status_line);
            ui.add(egui::ProgressBar::new(self.progress).show_percentage());
            if self.queue.pending_len() > 0 {
                ui.weak(format!("{} download(s) queued", self.queue.pending_len()));
            }
            ui.horizontal(|ui| {
                if ui
                    .add(egui::Button::new(RichText::new("DOWNLOAD").strong()).fill(Color32::from_rgb(0x33, 0xb2, 0x49)))
                    .clicked()
                {
                    self.queue_download();
                }
                if ui
                    .add(egui::Button::new("CANCEL").fill(Color32::from_rgb(0xcc, 0x33, 0x33)))
                    .clicked()
                {
                    self.cancel();
                }
                let history_label = if self.history_visible { "HIDE HISTORY" } else { "HISTORY" };
                if ui
                    .add(egui::Button::new(history_label).fill(Color32::from_rgb(0x66, 0x66, 0xe6)))
                    .clicked()
                {
                    self.history_visible = !self.history_visible;
                }
            });
        });
    }

    fn history_section(&mut self, ui: &mut egui::Ui) {
        if !self.history_visible {
            return;
        }
        ui.separator();
        let mut clear_confirmed = false;
        ui.horizontal(|ui| {
            ui.label(RichText::new("Download History").strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if self.confirm_clear {
                    if ui.button("Yes, clear").clicked() {
                        clear_confirmed = true;
                    }
                    if ui.button("Keep").clicked() {
                        self.confirm_clear = false;
                    }
                    ui.label("Clear all history?");
                } else if ui.button("Clear").clicked() {
                    self.confirm_clear = true;
                }
            });
        });
        if clear_confirmed {
            self.history.clear();
            self.confirm_clear = false;
        }

        if self.history.is_empty() {
            ui.weak("No download history yet");
            return;
        }
        for entry in self.history.entries() {
            ui.group(|ui| {
                let icon = if entry.success { "✅" } else { "❌" };
                ui.label(RichText::new(format!("{icon} {}", entry.title)).strong());
                ui.label(format!("Quality: {} | {}", entry.quality, entry.timestamp));
                ui.weak(RichText::new(&entry.url).small());
            });
        }
    }

    fn error_window(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error_modal.clone() else {
            return;
        };
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.error_modal = None;
                }
            });
    }
}

impl App for DownApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_background(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    self.header_section(ctx, ui);
                    ui.separator();
                    self.input_section(ctx, ui);
                    ui.add_space(8.0);
                    self.preview_section(ui);
                    ui.add_space(8.0);
                    self.progress_section(ui);
                    self.history_section(ui);
                });
        });

        self.error_window(ctx);

        // Keep progress moving while a worker is active
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

/// The user's Downloads directory, falling back to ./downloads.
fn default_download_dir() -> String {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("./downloads"))
        .display()
        .to_string()
}
