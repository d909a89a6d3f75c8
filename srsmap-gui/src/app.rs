use chrono::{Local, Utc};
use eframe::egui;
use std::time::Duration;

use srsmap_core::tree_view::TOGGLE_WIDTH;
use srsmap_core::{
    create_source, BackgroundFetcher, Clipboard, ClipboardError, DetailView, Entry, EntryStatus,
    LoadState, MappingSession, Notice, NoticeAction, NoticeKind, Settings,
};

/// Repaint interval while a fetch is running or a notice is counting down
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// CLIPBOARD
// =============================================================================

/// System clipboard backed by arboard
///
/// Opened lazily so a missing clipboard only matters when copying.
struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    fn new() -> Self {
        Self { inner: None }
    }

    fn open(&mut self) -> Result<&mut arboard::Clipboard, ClipboardError> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().map_err(map_clipboard_error)?);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| ClipboardError::Other("clipboard unavailable".to_string()))
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let clipboard = self.open()?;
        clipboard
            .set_text(text.to_string())
            .map_err(map_clipboard_error)?;
        copy_to_primary_selection(clipboard, text);
        Ok(())
    }
}

fn map_clipboard_error(e: arboard::Error) -> ClipboardError {
    match e {
        arboard::Error::ClipboardNotSupported => ClipboardError::Unsupported,
        arboard::Error::ClipboardOccupied => ClipboardError::PermissionDenied,
        other => ClipboardError::Other(other.to_string()),
    }
}

/// Also fills the X11/Wayland PRIMARY selection for middle-click paste
#[cfg(target_os = "linux")]
fn copy_to_primary_selection(clipboard: &mut arboard::Clipboard, text: &str) {
    use arboard::SetExtLinux;
    let _ = clipboard
        .set()
        .clipboard(arboard::LinuxClipboardKind::Primary)
        .text(text.to_string());
}

#[cfg(not(target_os = "linux"))]
fn copy_to_primary_selection(_clipboard: &mut arboard::Clipboard, _text: &str) {}

// =============================================================================
// APPLICATION
// =============================================================================

fn status_color(status: EntryStatus) -> egui::Color32 {
    let (r, g, b) = status.rgb();
    egui::Color32::from_rgb(r, g, b)
}

fn apply_theme(ctx: &egui::Context, dark_mode: bool) {
    if dark_mode {
        ctx.set_visuals(egui::Visuals::dark());
    } else {
        ctx.set_visuals(egui::Visuals::light());
    }
}

/// Expand/collapse button, or a placeholder of the same width on leaves
///
/// The placeholder is allocated like a widget so item spacing matches the button.
fn tree_toggle(ui: &mut egui::Ui, has_children: bool, expanded: bool) -> bool {
    let size = egui::vec2(TOGGLE_WIDTH, 18.0);
    if has_children {
        let text = if expanded { "-" } else { "+" };
        ui.add_sized(size, egui::Button::new(text)).clicked()
    } else {
        ui.allocate_exact_size(size, egui::Sense::hover());
        false
    }
}

/// User interaction with a notice, applied after the notice area is drawn
enum NoticeCommand {
    Dismiss(usize),
    Retry(usize),
}

pub struct SrsMappingApp {
    settings: Settings,
    session: MappingSession,
    /// None when the configured source could not be set up
    fetcher: Option<BackgroundFetcher>,
    clipboard: SystemClipboard,
    /// Search box contents, pushed into the session on change
    search_text: String,
}

impl SrsMappingApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut settings = Settings::load();
        settings.apply_env_overrides();
        apply_theme(&cc.egui_ctx, settings.dark_mode());

        let session = MappingSession::new(&settings);
        let mut app = Self {
            settings,
            session,
            fetcher: None,
            clipboard: SystemClipboard::new(),
            search_text: String::new(),
        };
        app.rebuild_source();
        app.refresh();
        app
    }

    /// (Re)creates the fetcher for the configured source
    fn rebuild_source(&mut self) {
        match create_source(self.settings.source()) {
            Ok(source) => {
                log::info!("Using entry source {}", source.describe());
                match &mut self.fetcher {
                    Some(fetcher) => {
                        self.session.cancel_fetch(fetcher);
                        fetcher.set_source(source);
                    }
                    None => self.fetcher = Some(BackgroundFetcher::new(source)),
                }
            }
            Err(e) => {
                log::warn!("Could not set up entry source: {}", e);
                if let Some(fetcher) = &mut self.fetcher {
                    self.session.cancel_fetch(fetcher);
                }
                self.fetcher = None;
                self.session
                    .push_notice(Notice::error("Could not set up entry source", e.to_string()));
            }
        }
    }

    fn refresh(&mut self) {
        let collection_id = self.settings.source().collection_id.clone();
        if let Some(fetcher) = &mut self.fetcher {
            self.session.refresh(fetcher, &collection_id);
        }
    }

    fn save_settings(&mut self) {
        match self.settings.save() {
            Ok(path) => log::debug!("Saved settings to {}", path.display()),
            Err(e) => {
                log::warn!("Failed to save settings: {}", e);
                self.session
                    .push_notice(Notice::error("Failed to save settings", e.to_string()));
            }
        }
    }

    fn toggle_dark_mode(&mut self, ctx: &egui::Context) {
        let dark = self.settings.toggle_dark_mode();
        apply_theme(ctx, dark);
        self.save_settings();
    }

    fn open_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_title("Open SRS mapping")
            .add_filter("SRS mapping", &["json", "yaml", "yml"])
            .pick_file()
        else {
            return;
        };

        log::info!("Loading mapping file {}", path.display());
        self.settings.set_file_source(path);
        self.save_settings();
        self.rebuild_source();
        self.refresh();
    }

    fn copy_snippet(&mut self) {
        self.session.copy_selected_snippet(&mut self.clipboard);
    }

    // =========================================================================
    // Panels
    // =========================================================================

    fn show_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("SRS Mapping");
                ui.separator();

                ui.label("🔍");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.search_text)
                        .hint_text("Search requirements...")
                        .desired_width(220.0),
                );
                if response.changed() {
                    self.session.set_query(self.search_text.clone());
                }

                ui.separator();
                for status in EntryStatus::ALL {
                    let active = self.session.filter().status == Some(status);
                    let text = egui::RichText::new(format!("{} {}", status.icon(), status.label()))
                        .color(status_color(status));
                    if ui.selectable_label(active, text).clicked() {
                        self.session.toggle_status(status);
                    }
                }
                if !self.session.filter().is_empty()
                    && ui.button("✖").on_hover_text("Clear filters").clicked()
                {
                    self.session.clear_filters();
                    self.search_text.clear();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let theme_icon = if self.settings.dark_mode() { "☀" } else { "🌙" };
                    if ui.button(theme_icon).on_hover_text("Toggle dark mode").clicked() {
                        self.toggle_dark_mode(ctx);
                    }
                    if ui.button("📂 Open file…").clicked() {
                        self.open_file();
                    }

                    let can_refresh = self.fetcher.is_some() && !self.session.is_loading();
                    if ui
                        .add_enabled(can_refresh, egui::Button::new("🔄 Refresh"))
                        .clicked()
                    {
                        self.refresh();
                    }

                    match self.session.load_state() {
                        LoadState::Loading => {
                            ui.spinner();
                        }
                        LoadState::Loaded { at } => {
                            ui.weak(format!(
                                "Loaded {}",
                                at.with_timezone(&Local).format("%H:%M:%S")
                            ));
                        }
                        LoadState::Failed { .. } => {
                            ui.colored_label(egui::Color32::RED, "Load failed");
                        }
                        LoadState::Idle => {}
                    }
                    if let Some(fetcher) = &self.fetcher {
                        ui.weak(fetcher.describe());
                    }
                });
            });
        });
    }

    fn show_notices(&mut self, ctx: &egui::Context) {
        if self.session.notices().is_empty() {
            return;
        }

        let mut command = None;
        egui::TopBottomPanel::bottom("notices_panel").show(ctx, |ui| {
            for (idx, notice) in self.session.notices().iter().enumerate() {
                let color = match notice.kind {
                    NoticeKind::Error => egui::Color32::from_rgb(239, 68, 68),
                    NoticeKind::Info => egui::Color32::from_rgb(34, 197, 94),
                };
                ui.horizontal(|ui| {
                    ui.colored_label(color, egui::RichText::new(&notice.title).strong());
                    if let Some(description) = &notice.description {
                        ui.label(description);
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✖").on_hover_text("Dismiss").clicked() {
                            command = Some(NoticeCommand::Dismiss(idx));
                        }
                        if notice.action == Some(NoticeAction::Retry)
                            && ui.small_button("Retry").clicked()
                        {
                            command = Some(NoticeCommand::Retry(idx));
                        }
                    });
                });
            }
        });

        match command {
            Some(NoticeCommand::Dismiss(idx)) => self.session.dismiss_notice(idx),
            Some(NoticeCommand::Retry(idx)) => {
                self.session.dismiss_notice(idx);
                self.refresh();
            }
            None => {}
        }
    }

    fn show_tree_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("tree_panel")
            .min_width(240.0)
            .default_width(380.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Requirements");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("⊟").on_hover_text("Collapse all").clicked() {
                            self.session.tree_mut().collapse_all();
                        }
                        if ui.small_button("⊞").on_hover_text("Expand all").clicked() {
                            let filtered = self.session.filtered();
                            self.session.tree_mut().expand_all(&filtered.entries);
                        }
                    });
                });
                ui.separator();
                self.show_tree(ui);
            });
    }

    fn show_tree(&mut self, ui: &mut egui::Ui) {
        let result = self.session.filtered();

        if result.entries.is_empty() {
            ui.add_space(20.0);
            ui.vertical_centered(|ui| {
                if self.session.is_loading() {
                    ui.spinner();
                    ui.label("Loading SRS mappings...");
                } else if !self.session.filter().is_empty() {
                    ui.label("No requirements match your filters");
                } else if matches!(self.session.load_state(), LoadState::Failed { .. }) {
                    ui.label("Could not load SRS mappings");
                } else {
                    ui.label("No requirements");
                }
            });
            return;
        }

        let rows = self.session.tree().visible_rows(&result.entries);
        let indent_per_level = self.settings.indent_per_level();
        let mut toggled: Option<String> = None;
        let mut clicked: Option<String> = None;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for row in &rows {
                    let entry = row.entry;
                    ui.horizontal(|ui| {
                        ui.add_space(row.indent(indent_per_level));

                        if tree_toggle(ui, row.has_children, row.expanded) {
                            toggled = Some(entry.id.clone());
                        }

                        ui.label(
                            egui::RichText::new(entry.status.icon()).color(status_color(entry.status)),
                        );

                        // Context entries are only shown as the path to a match
                        let mut text =
                            egui::RichText::new(format!("{}  {}", entry.external_id, entry.title));
                        if result.is_context(&entry.id) {
                            text = text.color(egui::Color32::from_gray(140));
                        }
                        let mut response = ui.selectable_label(row.selected, text);
                        if !entry.description.is_empty() {
                            response = response.on_hover_text(&entry.description);
                        }
                        if response.clicked() {
                            clicked = Some(entry.id.clone());
                        }
                    });
                }
            });

        if let Some(id) = toggled {
            self.session.toggle_expand(&id);
        }
        if let Some(id) = clicked {
            self.session.select_id(&id);
        }
    }

    fn show_detail_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let mut copy_requested = false;
            let detail = self.session.detail();

            match &detail {
                DetailView::Empty => {
                    ui.vertical_centered(|ui| {
                        ui.add_space(60.0);
                        ui.heading(detail.headline());
                        ui.label(detail.message());
                    });
                }
                DetailView::NoImplementation { entry, .. } => {
                    show_entry_header(ui, entry);
                    ui.separator();
                    ui.vertical_centered(|ui| {
                        ui.add_space(40.0);
                        ui.heading(detail.headline());
                        ui.label(detail.message());
                    });
                }
                DetailView::Implementation(info) => {
                    show_entry_header(ui, info.entry);
                    ui.separator();

                    egui::Grid::new("implementation_grid")
                        .num_columns(2)
                        .spacing([12.0, 4.0])
                        .show(ui, |ui| {
                            ui.strong("File");
                            ui.monospace(info.file_path);
                            ui.end_row();
                            if let Some(function) = info.function_name {
                                ui.strong("Function");
                                ui.monospace(function);
                                ui.end_row();
                            }
                            if let Some(timestamp) = info.timestamp {
                                ui.strong("Last modified");
                                ui.label(timestamp);
                                ui.end_row();
                            }
                            if let Some(commit) = info.last_commit {
                                ui.strong("Commit");
                                ui.label(commit);
                                ui.end_row();
                            }
                        });

                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(info.file_name).monospace().strong());
                        ui.weak(info.language);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("📋 Copy").on_hover_text("Copy code").clicked() {
                                copy_requested = true;
                            }
                        });
                    });

                    egui::ScrollArea::both()
                        .auto_shrink([false, false])
                        .show(ui, |ui| {
                            // &str is a read-only text buffer
                            let mut snippet = info.snippet;
                            ui.add(
                                egui::TextEdit::multiline(&mut snippet)
                                    .code_editor()
                                    .desired_width(f32::INFINITY)
                                    .desired_rows(16),
                            );
                        });
                }
            }

            if copy_requested {
                self.copy_snippet();
            }
        });
    }
}

fn show_entry_header(ui: &mut egui::Ui, entry: &Entry) {
    ui.horizontal(|ui| {
        ui.heading(egui::RichText::new(&entry.external_id).strong());
        ui.heading(&entry.title);
    });
    ui.label(
        egui::RichText::new(format!("{} {}", entry.status.icon(), entry.status.label()))
            .color(status_color(entry.status)),
    );
    if !entry.description.is_empty() {
        ui.label(&entry.description);
    }
}

impl eframe::App for SrsMappingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(fetcher) = &mut self.fetcher {
            self.session.poll(fetcher);
        }
        self.session.expire_notices(Utc::now());

        if self.session.is_loading()
            || self.session.notices().iter().any(|n| n.lifetime.is_some())
        {
            ctx.request_repaint_after(POLL_INTERVAL);
        }

        self.show_top_panel(ctx);
        self.show_notices(ctx);
        self.show_tree_panel(ctx);
        self.show_detail_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cursor position right after the toggle column of one row
    fn cursor_after_toggle(has_children: bool) -> f32 {
        let ctx = egui::Context::default();
        let mut x = 0.0;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.horizontal(|ui| {
                    tree_toggle(ui, has_children, false);
                    x = ui.cursor().min.x;
                });
            });
        });
        x
    }

    #[test]
    fn test_leaf_rows_align_with_branch_rows() {
        let branch = cursor_after_toggle(true);
        let leaf = cursor_after_toggle(false);
        assert!((branch - leaf).abs() < 0.01, "branch {} vs leaf {}", branch, leaf);
        assert!(leaf >= TOGGLE_WIDTH);
    }
}
