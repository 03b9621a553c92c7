// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based camera front end
//!
//! Renders the live preview with Unicode half-block characters and drives
//! the capture controller from key and mouse events.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │                preview            ┌────┐ │
//! │                                   │thumb│ │
//! │                                   └────┘ │
//! ├──────────────────────────────────────────┤
//! │ [ SHUTTER ]  back · flash auto · 12 shots│  ← control bar
//! │ notice or key help                       │  ← status bar
//! └──────────────────────────────────────────┘
//! ```

use crate::app::{CaptureController, CaptureState, Message};
use crate::backends::camera::types::{CameraFrame, FocusPoint, FrameReceiver};
use crate::backends::camera::{get_permission_gate, get_service};
use crate::config::Config;
use crate::storage::Thumbnail;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tracing::info;

/// Preview channel depth; older frames are dropped by the backend
const PREVIEW_QUEUE: usize = 4;
/// Thumbnail size in terminal cells
const THUMBNAIL_COLS: u16 = 16;
const THUMBNAIL_ROWS: u16 = 6;
/// Width of the shutter button at the left of the control bar
const SHUTTER_LABEL: &str = "[ SHUTTER ]";

/// Run the terminal camera front end
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let (preview_tx, preview_rx) = futures::channel::mpsc::channel(PREVIEW_QUEUE);
    let service = get_service(config.backend, &config);
    let gate = get_permission_gate(config.backend);
    let mut controller = CaptureController::new(config, service, gate).with_preview(preview_tx);
    controller.start();

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    // Key release events make a held space bar work as a shutter
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    info!(enhanced, "Terminal UI started");
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut controller, preview_rx, enhanced);

    // Restore terminal
    controller.shutdown();
    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

/// What an input event asks the loop to do
#[derive(Debug)]
enum Action {
    Send(Message),
    ToggleHelp,
    Quit,
}

/// Screen regions computed for the last draw, used for mouse hit tests
#[derive(Debug, Default, Clone, Copy)]
struct Layout {
    preview: Rect,
    image: Rect,
    shutter: Rect,
}

impl Layout {
    fn split(area: Rect, frame: Option<&CameraFrame>) -> Self {
        let preview = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height: area.height.saturating_sub(2),
        };
        let image = frame
            .map(|f| fit_rect(preview, f.width, f.height))
            .unwrap_or(preview);
        let shutter = Rect {
            x: area.x,
            y: area.y + preview.height,
            width: (SHUTTER_LABEL.len() as u16).min(area.width),
            height: 1,
        };
        Self {
            preview,
            image,
            shutter,
        }
    }
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut CaptureController,
    mut preview: FrameReceiver,
    enhanced: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut frame_widget = FrameWidget::new();
    let mut show_help = false;
    let mut layout = Layout::default();
    let mut mouse_press: Option<Instant> = None;
    let mut key_press: Option<Instant> = None;
    let tx = controller.sender();

    loop {
        controller.process_pending();

        // Drain all available frames to get the latest
        while let Ok(frame) = preview.try_recv() {
            frame_widget.update_frame(frame);
        }

        let state = *controller.state();
        let status = match controller.notice() {
            Some(notice) => notice.text.clone(),
            None if show_help => build_help_message(enhanced),
            None => build_status_message(&state),
        };
        let controls = build_control_message(controller);

        terminal.draw(|f| {
            let area = f.area();
            layout = Layout::split(area, frame_widget.frame.as_ref());

            f.render_widget(&frame_widget, layout.preview);

            if let Some(thumb) = controller.thumbnail() {
                let thumb_area = Rect {
                    x: layout.preview.x
                        + layout.preview.width.saturating_sub(THUMBNAIL_COLS + 1),
                    y: layout.preview.y
                        + layout.preview.height.saturating_sub(THUMBNAIL_ROWS + 1),
                    width: THUMBNAIL_COLS.min(layout.preview.width),
                    height: THUMBNAIL_ROWS.min(layout.preview.height),
                };
                f.render_widget(ThumbnailWidget { thumbnail: thumb }, thumb_area);
            }

            let control_area = Rect {
                x: area.x,
                y: area.y + layout.preview.height,
                width: area.width,
                height: 1,
            };
            f.render_widget(
                ControlBar {
                    message: &controls,
                    burst_active: state.burst_active,
                },
                control_area,
            );

            if area.height >= 2 {
                let status_area = Rect {
                    x: area.x,
                    y: area.y + area.height - 1,
                    width: area.width,
                    height: 1,
                };
                f.render_widget(StatusBar { message: &status }, status_area);
            }
        })?;

        // Handle input with timeout for frame updates
        if !event::poll(Duration::from_millis(16))? {
            continue;
        }

        let action = match event::read()? {
            Event::Key(key) => map_key(
                key,
                enhanced,
                state.burst_active,
                &mut key_press,
                controller.config().burst_interval(),
            ),
            Event::Mouse(mouse) => map_mouse(
                mouse,
                &layout,
                &mut mouse_press,
                controller.config().burst_interval(),
            ),
            _ => Vec::new(),
        };

        for action in action {
            match action {
                Action::Quit => return Ok(()),
                Action::ToggleHelp => show_help = !show_help,
                Action::Send(message) => {
                    show_help = false;
                    tx.send(message)?;
                }
            }
        }
    }
}

/// Map a key event to actions
///
/// Space works as a hold-to-burst shutter when the terminal reports key
/// releases, with the same short-tap rule as the mouse shutter; otherwise
/// `b` toggles the burst.
fn map_key(
    key: KeyEvent,
    enhanced: bool,
    burst_active: bool,
    press: &mut Option<Instant>,
    burst_interval: Duration,
) -> Vec<Action> {
    if key.code == KeyCode::Char(' ') && enhanced {
        return match key.kind {
            KeyEventKind::Press if press.is_none() => {
                *press = Some(Instant::now());
                vec![Action::Send(Message::ShutterPressed)]
            }
            KeyEventKind::Release => release_shutter(press, burst_interval),
            KeyEventKind::Press | KeyEventKind::Repeat => Vec::new(),
        };
    }

    if key.kind != KeyEventKind::Press {
        return Vec::new();
    }

    let action = match key.code {
        // Ctrl+C to quit
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') | KeyCode::Enter => Action::Send(Message::Capture),
        KeyCode::Char('s') => Action::Send(Message::SwitchCamera),
        KeyCode::Char('f') => Action::Send(Message::CycleFlashMode),
        KeyCode::Char('r') => Action::Send(Message::RetryBind),
        KeyCode::Char('c') => Action::Send(Message::FocusTap(FocusPoint::center())),
        KeyCode::Char('b') | KeyCode::Char(' ') => {
            if burst_active {
                Action::Send(Message::ShutterReleased)
            } else {
                Action::Send(Message::ShutterPressed)
            }
        }
        KeyCode::Char('h') => Action::ToggleHelp,
        _ => return Vec::new(),
    };
    vec![action]
}

/// Map a mouse event to actions
///
/// The shutter button bursts while held; a click shorter than one burst
/// interval takes a single photo. A click on the image focuses there.
fn map_mouse(
    mouse: MouseEvent,
    layout: &Layout,
    press: &mut Option<Instant>,
    burst_interval: Duration,
) -> Vec<Action> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if contains(layout.shutter, mouse.column, mouse.row) {
                *press = Some(Instant::now());
                vec![Action::Send(Message::ShutterPressed)]
            } else if contains(layout.image, mouse.column, mouse.row) {
                let point = FocusPoint::from_view(
                    (mouse.column - layout.image.x) as f32 + 0.5,
                    (mouse.row - layout.image.y) as f32 + 0.5,
                    layout.image.width as f32,
                    layout.image.height as f32,
                );
                vec![Action::Send(Message::FocusTap(point))]
            } else {
                Vec::new()
            }
        }
        MouseEventKind::Up(MouseButton::Left) => release_shutter(press, burst_interval),
        _ => Vec::new(),
    }
}

/// End a shutter hold; a hold shorter than one burst interval is a single photo
fn release_shutter(press: &mut Option<Instant>, burst_interval: Duration) -> Vec<Action> {
    let Some(pressed_at) = press.take() else {
        return Vec::new();
    };
    let mut actions = vec![Action::Send(Message::ShutterReleased)];
    if pressed_at.elapsed() < burst_interval {
        actions.push(Action::Send(Message::Capture));
    }
    actions
}

fn build_status_message(state: &CaptureState) -> String {
    if !state.permission.is_granted() {
        return "Camera permission needed | 'q' quit".to_string();
    }
    if state.bind_failed {
        return "Camera unavailable | 'r' retry | 'q' quit".to_string();
    }
    "'p' photo | 'b' burst | 's' switch | 'f' flash | 'h' help | 'q' quit".to_string()
}

fn build_help_message(enhanced: bool) -> String {
    let mut msg = String::from("p/Enter: Photo | ");
    if enhanced {
        msg.push_str("hold Space: Burst | ");
    } else {
        msg.push_str("b/Space: Start/stop burst | ");
    }
    msg.push_str("s: Switch | f: Flash | c: Focus center | click: Focus | r: Retry | q: Quit");
    msg
}

fn build_control_message(controller: &CaptureController) -> String {
    let state = controller.state();
    let camera = controller
        .camera_name()
        .unwrap_or_else(|| "no camera".to_string());
    let flash = if controller.has_flash_unit() {
        state.flash_mode.label()
    } else {
        "n/a"
    };
    let stats = controller.stats();

    let mut msg = format!(
        "{}  {} ({}) · flash {} · {} saved",
        SHUTTER_LABEL, camera, state.facing, flash, stats.saved
    );
    if state.burst_active {
        msg.push_str(" · ● BURST");
    }
    msg
}

/// Largest rect with the frame's aspect ratio centred in `area`
///
/// Each cell holds two vertical pixels.
fn fit_rect(area: Rect, frame_width: u32, frame_height: u32) -> Rect {
    if frame_width == 0 || frame_height == 0 || area.width == 0 || area.height == 0 {
        return Rect {
            x: area.x,
            y: area.y,
            width: 0,
            height: 0,
        };
    }

    let frame_aspect = frame_width as f64 / frame_height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height * 2) as f64;

    let (display_width, display_height) = if term_width / term_height > frame_aspect {
        // Terminal is wider - fit to height
        let h = term_height;
        let w = h * frame_aspect;
        (w as u16, (h / 2.0) as u16)
    } else {
        // Terminal is taller - fit to width
        let w = term_width;
        let h = w / frame_aspect;
        (w as u16, (h / 2.0) as u16)
    };

    Rect {
        x: area.x + area.width.saturating_sub(display_width) / 2,
        y: area.y + area.height.saturating_sub(display_height) / 2,
        width: display_width.min(area.width),
        height: display_height.min(area.height),
    }
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    frame: Option<CameraFrame>,
}

impl FrameWidget {
    fn new() -> Self {
        Self { frame: None }
    }

    fn update_frame(&mut self, frame: CameraFrame) {
        self.frame = Some(frame);
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };

        let target = fit_rect(area, frame.width, frame.height);
        render_half_blocks(target, buf, frame.width, frame.height, |x, y| {
            frame.pixel_rgb(x, y)
        });
    }
}

/// Gallery thumbnail in the preview corner
struct ThumbnailWidget<'a> {
    thumbnail: &'a Thumbnail,
}

impl Widget for ThumbnailWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let thumb = self.thumbnail;
        if thumb.width == 0 || thumb.height == 0 {
            return;
        }
        let target = fit_rect(area, thumb.width, thumb.height);
        render_half_blocks(target, buf, thumb.width, thumb.height, |x, y| {
            let x = x.min(thumb.width - 1);
            let y = y.min(thumb.height - 1);
            let idx = ((y * thumb.width + x) * 4) as usize;
            match thumb.rgba.get(idx..idx + 3) {
                Some(px) => (px[0], px[1], px[2]),
                None => (0, 0, 0),
            }
        });
    }
}

/// Paint an image into `target`: upper half (▀) as fg, lower half as bg
fn render_half_blocks<F>(target: Rect, buf: &mut Buffer, width: u32, height: u32, sample: F)
where
    F: Fn(u32, u32) -> (u8, u8, u8),
{
    if target.width == 0 || target.height == 0 {
        return;
    }

    let x_scale = width as f64 / target.width as f64;
    let y_scale = height as f64 / (target.height * 2) as f64;

    for ty in 0..target.height {
        for tx in 0..target.width {
            let src_x = (tx as f64 * x_scale) as u32;
            let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
            let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

            let (r, g, b) = sample(src_x, src_y_top);
            let top = Color::Rgb(r, g, b);
            let (r, g, b) = sample(src_x, src_y_bottom);
            let bottom = Color::Rgb(r, g, b);

            if let Some(cell) = buf.cell_mut((target.x + tx, target.y + ty)) {
                cell.set_char('▀');
                cell.set_fg(top);
                cell.set_bg(bottom);
            }
        }
    }
}

/// Control bar widget: shutter button plus camera state
struct ControlBar<'a> {
    message: &'a str,
    burst_active: bool,
}

impl Widget for ControlBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = if self.burst_active {
            Color::Red
        } else {
            Color::Black
        };
        fill_line(area, buf, bg);
        buf.set_string(
            area.x,
            area.y,
            truncate(self.message, area.width),
            ratatui::style::Style::default().fg(Color::White).bg(bg),
        );
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        fill_line(area, buf, Color::DarkGray);
        buf.set_string(
            area.x,
            area.y,
            truncate(self.message, area.width),
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}

fn fill_line(area: Rect, buf: &mut Buffer, bg: Color) {
    for x in area.x..area.x + area.width {
        if let Some(cell) = buf.cell_mut((x, area.y)) {
            cell.set_char(' ');
            cell.set_bg(bg);
        }
    }
}

/// Cut `text` to at most `width` characters
fn truncate(text: &str, width: u16) -> String {
    text.chars().take(width as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    fn sent(actions: &[Action]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Send(m) => Some(format!("{:?}", m)),
                _ => None,
            })
            .collect()
    }

    /// Map a key with no shutter hold in progress
    fn map_plain(event: KeyEvent, enhanced: bool, burst_active: bool) -> Vec<Action> {
        map_key(event, enhanced, burst_active, &mut None, Duration::from_millis(500))
    }

    #[test]
    fn test_space_hold_with_release_events() {
        let mut press = None;
        let interval = Duration::ZERO;

        let down = map_key(key(KeyCode::Char(' '), KeyEventKind::Press), true, false, &mut press, interval);
        assert_eq!(sent(&down), vec!["ShutterPressed"]);

        let repeat = map_key(key(KeyCode::Char(' '), KeyEventKind::Repeat), true, true, &mut press, interval);
        assert!(repeat.is_empty());

        // Held past the interval: burst only, no extra photo
        let release = map_key(key(KeyCode::Char(' '), KeyEventKind::Release), true, true, &mut press, interval);
        assert_eq!(sent(&release), vec!["ShutterReleased"]);
        assert!(press.is_none());
    }

    #[test]
    fn test_short_space_tap_captures_once() {
        let mut press = None;
        let interval = Duration::from_secs(60);

        let down = map_key(key(KeyCode::Char(' '), KeyEventKind::Press), true, false, &mut press, interval);
        assert_eq!(sent(&down), vec!["ShutterPressed"]);

        let up = map_key(key(KeyCode::Char(' '), KeyEventKind::Release), true, true, &mut press, interval);
        assert_eq!(sent(&up), vec!["ShutterReleased", "Capture"]);
    }

    #[test]
    fn test_burst_toggle_without_release_events() {
        let start = map_plain(key(KeyCode::Char('b'), KeyEventKind::Press), false, false);
        assert_eq!(sent(&start), vec!["ShutterPressed"]);

        let stop = map_plain(key(KeyCode::Char(' '), KeyEventKind::Press), false, true);
        assert_eq!(sent(&stop), vec!["ShutterReleased"]);
    }

    #[test]
    fn test_quit_keys() {
        let ctrl_c =
            KeyEvent::new_with_kind(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert!(matches!(map_plain(ctrl_c, false, false).as_slice(), [Action::Quit]));
        assert!(matches!(
            map_plain(key(KeyCode::Char('q'), KeyEventKind::Press), false, false).as_slice(),
            [Action::Quit]
        ));
    }

    #[test]
    fn test_short_click_on_shutter_captures_once() {
        let layout = Layout::split(Rect::new(0, 0, 80, 24), None);
        let mut press = None;
        let down = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 2,
            row: layout.shutter.y,
            modifiers: KeyModifiers::NONE,
        };
        let up = MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            ..down
        };

        let actions = map_mouse(down, &layout, &mut press, Duration::from_secs(60));
        assert_eq!(sent(&actions), vec!["ShutterPressed"]);
        let actions = map_mouse(up, &layout, &mut press, Duration::from_secs(60));
        assert_eq!(sent(&actions), vec!["ShutterReleased", "Capture"]);
    }

    #[test]
    fn test_click_on_image_focuses() {
        let layout = Layout::split(Rect::new(0, 0, 80, 24), None);
        let mut press = None;
        let down = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };

        let actions = map_mouse(down, &layout, &mut press, Duration::from_millis(500));
        match actions.as_slice() {
            [Action::Send(Message::FocusTap(p))] => assert!(p.x < 0.05 && p.y < 0.05),
            other => panic!("unexpected actions: {:?}", other),
        }
        assert!(press.is_none());
    }

    #[test]
    fn test_fit_rect_keeps_aspect() {
        // 4:3 frame in an 80x20 area: 40 pixel rows fit, so 53 columns wide
        let rect = fit_rect(Rect::new(0, 0, 80, 20), 640, 480);
        assert_eq!((rect.width, rect.height), (53, 20));
        assert_eq!(rect.x, 13);

        let empty = fit_rect(Rect::new(5, 5, 80, 20), 0, 480);
        assert_eq!((empty.width, empty.height), (0, 0));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("● BURST", 3), "● B");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
