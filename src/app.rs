use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use stt_layout::storage;
use stt_layout::{Component, Field, TemplateDocument};

use crate::config::Config;

const MAX_NAME_LEN: usize = 48;
const MAX_PATH_LEN: usize = 512;
/// Status messages stay up for this many ticks.
const STATUS_TICKS: u32 = 16;

#[derive(Clone, Copy, PartialEq)]
pub enum Tab {
    Editor,
    Template,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Editor, Tab::Template]
    }

    pub fn title(&self) -> &str {
        match self {
            Tab::Editor => " Channels ",
            Tab::Template => " Template ",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Editor => 0,
            Tab::Template => 1,
        }
    }
}

/// Table columns: component, then the four coordinates.
pub const COLUMNS: usize = 5;

pub fn column_field(col: usize) -> Option<Field> {
    match col {
        1 => Some(Field::NegX),
        2 => Some(Field::NegY),
        3 => Some(Field::PosX),
        4 => Some(Field::PosY),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PromptKind {
    Coordinate { row: usize, field: Field },
    Name,
    Open,
}

impl PromptKind {
    pub fn title(&self) -> String {
        match self {
            PromptKind::Coordinate { row, field } => format!(" Ch {} {} (m) ", row + 1, field),
            PromptKind::Name => " Template name ".to_string(),
            PromptKind::Open => " Open .stt file ".to_string(),
        }
    }

    fn accepts(&self, c: char, len: usize) -> bool {
        match self {
            PromptKind::Coordinate { .. } => {
                len < 24 && (c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
            }
            PromptKind::Name => len < MAX_NAME_LEN && !c.is_control(),
            PromptKind::Open => len < MAX_PATH_LEN && !c.is_control(),
        }
    }
}

pub struct Prompt {
    pub kind: PromptKind,
    pub buffer: String,
}

pub struct Status {
    pub text: String,
    pub is_error: bool,
    ticks_left: u32,
}

pub struct App {
    pub should_quit: bool,
    pub current_tab: Tab,
    pub document: TemplateDocument,
    pub selected_row: usize,
    pub selected_col: usize,
    pub template_scroll: u16,
    pub prompt: Option<Prompt>,
    pub status: Option<Status>,
    output_dir: PathBuf,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            should_quit: false,
            current_tab: Tab::Editor,
            document: TemplateDocument::default(),
            selected_row: 0,
            selected_col: 0,
            template_scroll: 0,
            prompt: None,
            status: None,
            output_dir: config.output_dir.clone(),
        }
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_mut() {
            status.ticks_left = status.ticks_left.saturating_sub(1);
            if status.ticks_left == 0 {
                self.status = None;
            }
        }
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.status = Some(Status { text: text.into(), is_error: false, ticks_left: STATUS_TICKS });
    }

    fn fail(&mut self, text: impl Into<String>) {
        self.status = Some(Status { text: text.into(), is_error: true, ticks_left: STATUS_TICKS * 2 });
    }

    /// Loads a template file; on failure the current document stays.
    pub fn open(&mut self, path: &Path) {
        match storage::load_template_file(&mut self.document, path) {
            Ok(parsed) => {
                self.selected_row = 0;
                self.template_scroll = 0;
                let mut msg = format!(
                    "Loaded {} channel(s) from {}",
                    self.document.len(),
                    path.display()
                );
                if !parsed.dropped.is_empty() {
                    msg.push_str(&format!(", {} block(s) skipped", parsed.dropped.len()));
                }
                self.notify(msg);
            }
            Err(e) => {
                warn!(error = %e, "template load failed");
                self.fail(format!("Error: {}", e));
            }
        }
    }

    pub fn save(&mut self) {
        match storage::save_template(&self.document, &self.output_dir) {
            Ok(path) => self.notify(format!("Saved {}", path.display())),
            Err(e) => {
                warn!(error = %e, "template save failed");
                self.fail(format!("Error: {}", e));
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.prompt.is_some() {
            self.handle_prompt_input(key);
            return;
        }

        // Global keys
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.prev_tab();
                } else {
                    self.next_tab();
                }
                return;
            }
            KeyCode::BackTab => {
                self.prev_tab();
                return;
            }
            KeyCode::Char('z') | KeyCode::Char('Z') => {
                self.document.toggle_z_polarity();
                self.notify(format!("+Z is now {}", self.document.z_polarity()));
                return;
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.open_prompt(PromptKind::Name, self.document.name().to_string());
                return;
            }
            KeyCode::Char('o') | KeyCode::Char('O') => {
                self.open_prompt(PromptKind::Open, String::new());
                return;
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.save();
                return;
            }
            _ => {}
        }

        match self.current_tab {
            Tab::Editor => self.handle_editor_input(key),
            Tab::Template => self.handle_template_input(key),
        }
    }

    fn handle_editor_input(&mut self, key: KeyEvent) {
        let rows = self.document.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_row = (self.selected_row + rows - 1) % rows;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_row = (self.selected_row + 1) % rows;
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected_col = (self.selected_col + COLUMNS - 1) % COLUMNS;
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.selected_col = (self.selected_col + 1) % COLUMNS;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.document.set_count(rows + 1);
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                self.document.set_count(rows.saturating_sub(1));
                self.selected_row = self.selected_row.min(self.document.len() - 1);
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Err(e) = self.document.set_component(self.selected_row, Component::Off) {
                    self.fail(e.to_string());
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Backspace => {
                let forward = key.code != KeyCode::Backspace
                    && !key.modifiers.contains(KeyModifiers::SHIFT);
                self.activate_cell(forward);
            }
            _ => {}
        }
    }

    fn activate_cell(&mut self, forward: bool) {
        let row = self.selected_row;
        let Some(field) = column_field(self.selected_col) else {
            if let Err(e) = self.document.cycle_component(row, forward) {
                self.fail(e.to_string());
            }
            return;
        };
        let Some(ch) = self.document.channel(row) else { return };
        if !ch.is_editable(field) {
            self.fail(format!("{} is n/a for {}", field, ch.component()));
            return;
        }
        let current = ch.coordinate(field);
        self.open_prompt(PromptKind::Coordinate { row, field }, format!("{}", current));
    }

    fn handle_template_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.template_scroll = self.template_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.template_scroll = self.template_scroll.saturating_add(1);
            }
            KeyCode::PageUp => {
                self.template_scroll = self.template_scroll.saturating_sub(10);
            }
            KeyCode::PageDown => {
                self.template_scroll = self.template_scroll.saturating_add(10);
            }
            KeyCode::Home => self.template_scroll = 0,
            _ => {}
        }
    }

    fn open_prompt(&mut self, kind: PromptKind, buffer: String) {
        self.prompt = Some(Prompt { kind, buffer });
    }

    fn handle_prompt_input(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else { return };
        match key.code {
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.commit_prompt(prompt);
                }
            }
            KeyCode::Esc => {
                self.prompt = None;
            }
            KeyCode::Backspace => {
                prompt.buffer.pop();
            }
            KeyCode::Char(c) => {
                if prompt.kind.accepts(c, prompt.buffer.chars().count()) {
                    prompt.buffer.push(c);
                }
            }
            _ => {}
        }
    }

    fn commit_prompt(&mut self, prompt: Prompt) {
        match prompt.kind {
            PromptKind::Coordinate { row, field } => {
                let text = prompt.buffer.trim();
                // Empty entry means 0, as in a cleared number box
                let value = if text.is_empty() { Ok(0.0) } else { text.parse::<f64>() };
                match value {
                    Ok(v) if v.is_finite() => {
                        if let Err(e) = self.document.set_coordinate(row, field, v) {
                            self.fail(e.to_string());
                        }
                    }
                    _ => self.fail(format!("Not a number: {:?}", prompt.buffer)),
                }
            }
            PromptKind::Name => {
                self.document.set_name(prompt.buffer.trim());
                info!(name = %self.document.display_name(), "template renamed");
            }
            PromptKind::Open => {
                let path = prompt.buffer.trim();
                if !path.is_empty() {
                    self.open(Path::new(path));
                }
            }
        }
    }

    fn next_tab(&mut self) {
        let tabs = Tab::all();
        let idx = self.current_tab.index();
        self.current_tab = tabs[(idx + 1) % tabs.len()];
    }

    fn prev_tab(&mut self) {
        let tabs = Tab::all();
        let idx = self.current_tab.index();
        self.current_tab = tabs[(idx + tabs.len() - 1) % tabs.len()];
    }
}
