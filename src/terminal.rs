// SPDX-License-Identifier: GPL-3.0-only

//! Terminal control panel
//!
//! Keyboard-driven front end over [`CaptureController`]. Keys are first
//! turned into [`PanelCommand`]s by [`PanelState::handle_key`]; only the
//! event loop touches the controller.

use crate::capture::{CaptureController, CaptureForm, CaptureMode, PreviewState, ToolRunner};
use crate::config::Config;
use crate::constants::capture::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};
use crate::errors::CaptureError;
use crate::profile::{RESOLUTION_PRESETS, parse_selector, resolve_resolution};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

/// Editable text fields, in focus order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Filename,
    Framerate,
    Duration,
    Interval,
    SaveDir,
}

impl Field {
    const ORDER: [Field; 5] = [
        Field::Filename,
        Field::Framerate,
        Field::Duration,
        Field::Interval,
        Field::SaveDir,
    ];

    /// Whether the field applies to `mode`
    pub fn enabled(&self, mode: CaptureMode) -> bool {
        match self {
            Field::Filename | Field::SaveDir => true,
            Field::Framerate => mode == CaptureMode::Video,
            Field::Duration => mode.uses_duration(),
            Field::Interval => mode == CaptureMode::Timelapse,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Field::Filename => "Filename",
            Field::Framerate => "Framerate",
            Field::Duration => "Duration",
            Field::Interval => "Interval",
            Field::SaveDir => "Save path",
        }
    }
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    None,
    TogglePreview,
    ChangeResolution(u8),
    Capture,
    Quit,
}

/// Form contents and focus of the panel
#[derive(Debug, Clone)]
pub struct PanelState {
    pub form: CaptureForm,
    /// Folder receiving captures, editable for this session only
    pub save_dir: String,
    pub focus: Option<Field>,
    pub status: String,
    pub show_help: bool,
}

impl PanelState {
    pub fn new(default_resolution: u8, save_dir: &Path) -> Self {
        Self {
            form: CaptureForm {
                resolution: default_resolution.to_string(),
                ..CaptureForm::default()
            },
            save_dir: save_dir.display().to_string(),
            focus: None,
            status: build_status_message(),
            show_help: false,
        }
    }

    /// Save folder to capture into; blank falls back to `default`
    pub fn save_dir_or(&self, default: &Path) -> PathBuf {
        match self.save_dir.trim() {
            "" => default.to_path_buf(),
            dir => PathBuf::from(dir),
        }
    }

    /// Apply a key press to the form and report the resulting command
    pub fn handle_key(&mut self, key: KeyEvent) -> PanelCommand {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return PanelCommand::Quit;
        }

        match key.code {
            KeyCode::Enter => {
                self.focus = None;
                return PanelCommand::Capture;
            }
            KeyCode::Tab => {
                self.move_focus(true);
                return PanelCommand::None;
            }
            KeyCode::BackTab => {
                self.move_focus(false);
                return PanelCommand::None;
            }
            KeyCode::Esc => {
                self.focus = None;
                return PanelCommand::None;
            }
            _ => {}
        }

        match self.focus {
            Some(field) => {
                self.edit_field(field, key.code);
                PanelCommand::None
            }
            None => self.handle_shortcut(key.code),
        }
    }

    fn handle_shortcut(&mut self, code: KeyCode) -> PanelCommand {
        match code {
            KeyCode::Char('p') | KeyCode::Char('P') => PanelCommand::TogglePreview,
            KeyCode::Char('m') => {
                self.form.mode = self.form.mode.next();
                PanelCommand::None
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let Ok(selector) = parse_selector(&c.to_string()) else {
                    return PanelCommand::None;
                };
                self.form.resolution = selector.to_string();
                PanelCommand::ChangeResolution(selector)
            }
            KeyCode::Char('h') => {
                self.show_help = !self.show_help;
                self.status = if self.show_help {
                    build_help_message()
                } else {
                    build_status_message()
                };
                PanelCommand::None
            }
            KeyCode::Char('q') => PanelCommand::Quit,
            _ => PanelCommand::None,
        }
    }

    fn edit_field(&mut self, field: Field, code: KeyCode) {
        if field == Field::Interval {
            let interval = &mut self.form.interval_seconds;
            match code {
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    let digit = c.to_digit(10).unwrap_or(0);
                    *interval = interval
                        .saturating_mul(10)
                        .saturating_add(digit)
                        .min(MAX_INTERVAL_SECS);
                }
                KeyCode::Backspace => *interval /= 10,
                KeyCode::Up => *interval = (*interval + 1).min(MAX_INTERVAL_SECS),
                KeyCode::Down => *interval = interval.saturating_sub(1).max(MIN_INTERVAL_SECS),
                _ => {}
            }
            return;
        }

        let text = match field {
            Field::Filename => &mut self.form.filename,
            Field::Framerate => &mut self.form.framerate,
            Field::Duration => &mut self.form.duration,
            Field::SaveDir => &mut self.save_dir,
            Field::Interval => return,
        };
        match code {
            KeyCode::Char(c) => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            _ => {}
        }
    }

    fn move_focus(&mut self, forward: bool) {
        let mode = self.form.mode;
        let enabled: Vec<Field> = Field::ORDER
            .into_iter()
            .filter(|f| f.enabled(mode))
            .collect();

        let position = self
            .focus
            .and_then(|f| enabled.iter().position(|e| *e == f));

        self.focus = match (position, forward) {
            (None, true) => enabled.first().copied(),
            (None, false) => enabled.last().copied(),
            (Some(i), true) => enabled.get(i + 1).copied(),
            (Some(0), false) => None,
            (Some(i), false) => enabled.get(i - 1).copied(),
        };
    }
}

/// Run the control panel until the user quits
pub fn run<R: ToolRunner>(
    config: &Config,
    controller: &mut CaptureController<R>,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, config, controller);

    // The preview must not outlive the panel
    controller.stop_preview();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<R: ToolRunner>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
    controller: &mut CaptureController<R>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = PanelState::new(config.default_resolution, &config.save_dir);
    info!(model = %controller.device_model(), "Control panel started");

    loop {
        if controller.is_previewing() && controller.poll_preview() == PreviewState::Idle {
            state.status = "Preview window closed".to_string();
        }
        draw(terminal, &state, controller)?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match state.handle_key(key) {
            PanelCommand::None => {}
            PanelCommand::Quit => break,
            PanelCommand::TogglePreview => {
                let result = parse_selector(&state.form.resolution)
                    .and_then(|selector| controller.toggle_preview(selector));
                state.status = match result {
                    Ok(PreviewState::Previewing(selector)) => {
                        format!("Preview running at resolution {}", selector)
                    }
                    Ok(PreviewState::Idle) => "Preview stopped".to_string(),
                    Err(e) => report_error(&e),
                };
            }
            PanelCommand::ChangeResolution(selector) => {
                if let Err(e) = controller.change_resolution(selector) {
                    state.status = report_error(&e);
                }
            }
            PanelCommand::Capture => {
                let save_dir = state.save_dir_or(&config.save_dir);
                let request = match state.form.to_request(&save_dir) {
                    Ok(request) => request,
                    Err(e) => {
                        state.status = report_error(&e);
                        continue;
                    }
                };

                // Captures block; show what is happening first
                state.status = format!(
                    "Capturing {} to {} ...",
                    request.mode,
                    request.output_base_path.display()
                );
                draw(terminal, &state, controller)?;

                state.status = match controller.capture(&request) {
                    Ok(output) => match output.merged {
                        Some(merged) => format!("Saved: {} (merging into {})", output.primary.display(), merged.display()),
                        None => format!("Saved: {}", output.primary.display()),
                    },
                    Err(e) => report_error(&e),
                };
            }
        }
    }

    Ok(())
}

fn draw<R: ToolRunner>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &PanelState,
    controller: &CaptureController<R>,
) -> io::Result<()> {
    terminal.draw(|f| {
        let area = f.area();

        let form_area = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        f.render_widget(
            PanelWidget {
                state,
                model: controller.device_model(),
                preview: controller.state(),
            },
            form_area,
        );

        let status_area = Rect {
            x: area.x,
            y: area.height.saturating_sub(1),
            width: area.width,
            height: 1,
        };
        f.render_widget(
            StatusBar {
                message: &state.status,
            },
            status_area,
        );
    })?;
    Ok(())
}

fn report_error(e: &CaptureError) -> String {
    if e.is_input_error() {
        format!("Input error: {}", e)
    } else {
        error!(error = %e, "Capture failed");
        format!("Error: {}", e)
    }
}

fn build_status_message() -> String {
    "'p' preview | 'm' mode | '1'-'4' resolution | Tab edit | Enter capture | 'h' help | 'q' quit"
        .to_string()
}

fn build_help_message() -> String {
    "Tab/Shift+Tab: next/previous field | Esc: leave field | Up/Down: interval | q/Ctrl+C: quit"
        .to_string()
}

/// Form rendering
struct PanelWidget<'a> {
    state: &'a PanelState,
    model: &'a str,
    preview: PreviewState,
}

impl PanelWidget<'_> {
    fn field_value(&self, field: Field) -> String {
        let form = &self.state.form;
        match field {
            Field::Filename if form.filename.is_empty() => "(timestamp)".to_string(),
            Field::Filename => form.filename.clone(),
            Field::Framerate if form.framerate.is_empty() => "(max)".to_string(),
            Field::Framerate => form.framerate.clone(),
            Field::Duration => form.duration.clone(),
            Field::Interval => format!("{} s/frame", form.interval_seconds),
            Field::SaveDir if self.state.save_dir.trim().is_empty() => "(config default)".to_string(),
            Field::SaveDir => self.state.save_dir.clone(),
        }
    }
}

impl Widget for PanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let normal = Style::default().fg(Color::White);
        let dim = Style::default().fg(Color::DarkGray);
        let focused = Style::default().add_modifier(Modifier::REVERSED);
        let heading = Style::default().add_modifier(Modifier::BOLD);

        let mode_line = CaptureMode::ALL
            .iter()
            .map(|m| {
                if *m == self.state.form.mode {
                    format!("[{}]", m)
                } else {
                    m.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");

        let resolution_line = parse_selector(&self.state.form.resolution)
            .and_then(resolve_resolution)
            .map(|p| p.label())
            .unwrap_or_else(|_| self.state.form.resolution.clone());

        let preview_line = match self.preview {
            PreviewState::Idle => "stopped".to_string(),
            PreviewState::Previewing(selector) => format!("running ({})", selector),
        };

        let mut lines: Vec<(String, Style)> = vec![
            ("Microscope Camera Control".to_string(), heading),
            (format!("Raspberry Pi Model: {}", self.model), normal),
            (String::new(), normal),
            (format!("Mode:        {}", mode_line), normal),
            (format!("Resolution:  {}", resolution_line), normal),
            (format!("Preview:     {}", preview_line), normal),
            (String::new(), normal),
        ];

        for field in Field::ORDER {
            let style = if self.state.focus == Some(field) {
                focused
            } else if field.enabled(self.state.form.mode) {
                normal
            } else {
                dim
            };
            lines.push((
                format!("{:<12} {}", format!("{}:", field.label()), self.field_value(field)),
                style,
            ));
        }

        lines.push((String::new(), normal));
        for preset in RESOLUTION_PRESETS {
            lines.push((format!("  {}", preset.label()), dim));
        }

        for (row, (text, style)) in lines.iter().enumerate() {
            let y = area.y + row as u16;
            if y >= area.y + area.height {
                break;
            }
            let visible: String = text.chars().take(area.width as usize).collect();
            buf.set_string(area.x, y, visible, *style);
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> PanelState {
        PanelState::new(1, Path::new("/data/scope"))
    }

    fn press(state: &mut PanelState, code: KeyCode) -> PanelCommand {
        state.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_shortcuts() {
        let mut state = panel();
        assert_eq!(press(&mut state, KeyCode::Char('p')), PanelCommand::TogglePreview);
        assert_eq!(press(&mut state, KeyCode::Char('3')), PanelCommand::ChangeResolution(3));
        assert_eq!(state.form.resolution, "3");
        assert_eq!(press(&mut state, KeyCode::Char('9')), PanelCommand::None);
        assert_eq!(state.form.resolution, "3");
        assert_eq!(press(&mut state, KeyCode::Enter), PanelCommand::Capture);
        assert_eq!(press(&mut state, KeyCode::Char('q')), PanelCommand::Quit);
    }

    #[test]
    fn test_ctrl_c_quits_while_editing() {
        let mut state = panel();
        press(&mut state, KeyCode::Tab);
        assert_eq!(
            state.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            PanelCommand::Quit
        );
    }

    #[test]
    fn test_typing_into_focused_field() {
        let mut state = panel();
        press(&mut state, KeyCode::Tab);
        assert_eq!(state.focus, Some(Field::Filename));
        for c in "pq1".chars() {
            assert_eq!(press(&mut state, KeyCode::Char(c)), PanelCommand::None);
        }
        press(&mut state, KeyCode::Backspace);
        assert_eq!(state.form.filename, "pq");
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.focus, None);
    }

    #[test]
    fn test_focus_skips_disabled_fields() {
        let mut state = panel();
        // Image mode: only the file name and save folder are editable
        press(&mut state, KeyCode::Tab);
        press(&mut state, KeyCode::Tab);
        assert_eq!(state.focus, Some(Field::SaveDir));
        press(&mut state, KeyCode::Tab);
        assert_eq!(state.focus, None);

        press(&mut state, KeyCode::Char('m'));
        assert_eq!(state.form.mode, CaptureMode::Video);
        let mut visited = Vec::new();
        while let Some(field) = {
            press(&mut state, KeyCode::Tab);
            state.focus
        } {
            visited.push(field);
        }
        assert_eq!(
            visited,
            [Field::Filename, Field::Framerate, Field::Duration, Field::SaveDir]
        );
    }

    #[test]
    fn test_save_folder_can_be_changed() {
        let mut state = panel();
        let config_dir = Path::new("/data/scope");
        assert_eq!(state.save_dir_or(config_dir), PathBuf::from("/data/scope"));

        press(&mut state, KeyCode::BackTab);
        assert_eq!(state.focus, Some(Field::SaveDir));
        for _ in 0.."scope".len() {
            press(&mut state, KeyCode::Backspace);
        }
        for c in "slides".chars() {
            press(&mut state, KeyCode::Char(c));
        }
        assert_eq!(state.save_dir_or(config_dir), PathBuf::from("/data/slides"));

        state.save_dir.clear();
        assert_eq!(state.save_dir_or(config_dir), PathBuf::from("/data/scope"));
    }

    #[test]
    fn test_interval_editing_is_clamped() {
        let mut state = panel();
        state.form.mode = CaptureMode::Timelapse;
        state.focus = Some(Field::Interval);
        press(&mut state, KeyCode::Backspace);
        assert_eq!(state.form.interval_seconds, 0);
        for c in "99999".chars() {
            press(&mut state, KeyCode::Char(c));
        }
        assert_eq!(state.form.interval_seconds, MAX_INTERVAL_SECS);
        press(&mut state, KeyCode::Up);
        assert_eq!(state.form.interval_seconds, MAX_INTERVAL_SECS);
        state.form.interval_seconds = 1;
        press(&mut state, KeyCode::Down);
        assert_eq!(state.form.interval_seconds, MIN_INTERVAL_SECS);
    }
}
