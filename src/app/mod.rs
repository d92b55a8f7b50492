use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};

use crate::bubble::{Batch, DragState, Palette, ViewTransform};
use crate::config::Config;
use crate::ledger::{LoadedFile, load_bytes, load_file};

mod map;
mod render_utils;
mod ui;

type LoadResult = Result<LoadedFile, String>;

pub struct BubbleMapApp {
    config: Config,
    palette: Palette,
    state: AppState,
    load_rx: Option<Receiver<LoadResult>>,
    loading_name: Option<String>,
    alert: Option<String>,
    next_batch_id: u64,
    canvas_size: Vec2,
}

enum AppState {
    Empty,
    Ready(Box<ViewModel>),
}

struct ViewModel {
    batch: Batch,
    palette: Palette,
    view: ViewTransform,
    drag: DragState,
    /// Node pressed with the primary button this gesture, if any.
    press_target: Option<usize>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    selected: Option<usize>,
    show_links: bool,
    show_labels: bool,
    paused: bool,
}

struct SearchMatchCache {
    query: String,
    batch_id: u64,
    matches: Arc<HashSet<usize>>,
}

/// What the side panel asked the app to do this frame.
#[derive(Default)]
struct PanelRequests {
    open_dialog: bool,
}

impl BubbleMapApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: Config,
        palette: Palette,
        initial_file: Option<PathBuf>,
        window_size: Vec2,
    ) -> Self {
        let mut app = Self::with_config(config, palette, window_size);
        if let Some(path) = initial_file {
            app.start_file_load(path);
        }
        app
    }

    fn with_config(config: Config, palette: Palette, window_size: Vec2) -> Self {
        Self {
            config,
            palette,
            state: AppState::Empty,
            load_rx: None,
            loading_name: None,
            alert: None,
            next_batch_id: 1,
            canvas_size: window_size,
        }
    }

    fn spawn_load<F>(load: F) -> Receiver<LoadResult>
    where
        F: FnOnce() -> anyhow::Result<LoadedFile> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load().map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_file_load(&mut self, path: PathBuf) {
        log::info!("loading {}", path.display());
        self.loading_name = Some(path.display().to_string());
        self.load_rx = Some(Self::spawn_load(move || load_file(&path)));
    }

    fn start_bytes_load(&mut self, name: String, bytes: Arc<[u8]>) {
        log::info!("loading dropped file {name}");
        self.loading_name = Some(name.clone());
        self.load_rx = Some(Self::spawn_load(move || load_bytes(&name, &bytes)));
    }

    fn open_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Open transactions")
            .add_filter("Transactions", &["csv", "json"])
            .add_filter("All files", &["*"])
            .pick_file();
        if let Some(path) = picked {
            self.start_file_load(path);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &Context) {
        let dropped = ctx.input(|input| input.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };

        if let Some(bytes) = file.bytes {
            let name = if file.name.is_empty() {
                "dropped file".to_owned()
            } else {
                file.name
            };
            self.start_bytes_load(name, bytes);
        } else if let Some(path) = file.path {
            self.start_file_load(path);
        }
    }

    fn poll_load(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => {
                self.load_rx = Some(rx);
                return;
            }
            Err(TryRecvError::Disconnected) => Err("background load worker disconnected".to_owned()),
        };
        self.apply_load(result);
    }

    /// A finished load replaces the whole batch; a failed one leaves the
    /// current batch alone and raises an alert.
    fn apply_load(&mut self, result: LoadResult) {
        self.loading_name = None;

        match result {
            Ok(file) => {
                let id = self.next_batch_id;
                self.next_batch_id += 1;
                let batch = Batch::build(
                    id,
                    file.name,
                    file.records,
                    self.canvas_size,
                    &self.config.batch_options(),
                );
                if let AppState::Ready(previous) = &self.state {
                    log::info!("replacing batch {} with batch {id}", previous.batch.id);
                }
                self.state = AppState::Ready(Box::new(ViewModel::new(batch, self.palette.clone())));
            }
            Err(error) => {
                log::warn!("load failed: {error}");
                self.alert = Some(error);
            }
        }
    }

    fn draw_alert(&mut self, ctx: &Context) {
        let Some(message) = self.alert.clone() else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new("Could not load file")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            self.alert = None;
        }
    }

    fn draw_empty(&mut self, ctx: &Context) -> PanelRequests {
        let mut requests = PanelRequests::default();
        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas_size = ui.available_size();
            ui.vertical_centered(|ui| {
                ui.add_space(120.0);
                if let Some(name) = &self.loading_name {
                    ui.heading(format!("Loading {name}..."));
                    ui.add_space(8.0);
                    ui.spinner();
                } else {
                    ui.heading("No transactions loaded");
                    ui.add_space(6.0);
                    ui.label("Drop a CSV or JSON export onto the window, or");
                    ui.add_space(6.0);
                    if ui.button("Open file...").clicked() {
                        requests.open_dialog = true;
                    }
                }
            });
        });
        requests
    }
}

impl eframe::App for BubbleMapApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        self.poll_load();
        if self.load_rx.is_some() {
            ctx.request_repaint();
        }

        let loading = self.loading_name.as_deref();
        let requests = match &mut self.state {
            AppState::Empty => None,
            AppState::Ready(model) => Some(model.show(ctx, loading, &mut self.canvas_size)),
        };
        let requests = match requests {
            Some(requests) => requests,
            None => self.draw_empty(ctx),
        };

        if requests.open_dialog {
            self.open_dialog();
        }

        self.draw_alert(ctx);
    }
}

#[cfg(test)]
mod tests {
    use crate::ledger::TransactionRecord;

    use super::*;

    fn app() -> BubbleMapApp {
        let config = Config::default();
        let palette = config.palette().unwrap();
        BubbleMapApp::with_config(config, palette, Vec2::new(800.0, 600.0))
    }

    fn loaded(name: &str, to: &str) -> LoadResult {
        Ok(LoadedFile {
            name: name.to_owned(),
            records: vec![TransactionRecord::from_parts("A", to, Some(10.0))],
        })
    }

    fn ready_batch_id(app: &BubbleMapApp) -> Option<u64> {
        match &app.state {
            AppState::Ready(model) => Some(model.batch.id),
            AppState::Empty => None,
        }
    }

    #[test]
    fn failed_load_keeps_current_batch() {
        let mut app = app();
        app.apply_load(loaded("first.csv", "B"));
        assert_eq!(ready_batch_id(&app), Some(1));
        assert!(app.alert.is_none());

        app.loading_name = Some("broken.csv".to_owned());
        app.apply_load(Err("broken.csv: file is empty".to_owned()));

        assert_eq!(ready_batch_id(&app), Some(1));
        assert_eq!(app.alert.as_deref(), Some("broken.csv: file is empty"));
        assert!(app.loading_name.is_none());
    }

    #[test]
    fn successful_load_replaces_batch() {
        let mut app = app();
        app.apply_load(loaded("first.csv", "B"));
        app.apply_load(loaded("second.csv", "C"));

        let AppState::Ready(model) = &app.state else {
            panic!("expected a loaded batch");
        };
        assert_eq!(model.batch.id, 2);
        assert_eq!(model.batch.source, "second.csv");
        assert_eq!(model.batch.nodes()[0].name, "C");
    }

    #[test]
    fn disconnected_worker_raises_alert() {
        let mut app = app();
        let (tx, rx) = mpsc::channel::<LoadResult>();
        drop(tx);
        app.load_rx = Some(rx);

        app.poll_load();

        assert!(app.load_rx.is_none());
        assert!(app.alert.is_some());
        assert_eq!(ready_batch_id(&app), None);
    }
}
