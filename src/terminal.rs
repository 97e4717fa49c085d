// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front end
//!
//! Drives a [`ScreenController`] from keyboard input and renders the screen
//! content, drawing camera frames and photos with Unicode half-block
//! characters for improved vertical resolution.
//!
//! Everything runs on one current-thread tokio runtime. Permission and
//! capture commands are spawned as tasks; their completion actions come
//! back through a channel and are dispatched on the loop.

use crate::app::view::{Backdrop, ScreenContent, screen_content};
use crate::app::{Action, Command, Notice, ScreenController, ScreenMode};
use crate::backends::camera::{CameraFrame, PhotoRef, SystemCamera};
use crate::backends::permission::SystemPermission;
use crate::config::Config;
use crate::constants::timing;
use crate::errors::AppResult;
use crate::storage;

use crossterm::ExecutableCommand;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Paragraph, Widget, Wrap},
};
use std::io::{self, Stdout};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info};

type AppTerminal = Terminal<CrosstermBackend<Stdout>>;
type Controller = ScreenController<SystemPermission, SystemCamera>;

/// Run the terminal camera screen
pub fn run(config: Config) -> AppResult<()> {
    let permission = SystemPermission::from_backend(config.permission_backend);
    let camera = SystemCamera::from_config(&config);
    info!(
        permission = permission.name(),
        camera = ?camera.backend_type(),
        "Starting terminal UI"
    );
    let controller = ScreenController::new(permission, camera, config.camera_kind);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let (mut terminal, guard) = setup_terminal()?;
    let result = rt.block_on(run_app(&mut terminal, controller));
    drop(guard);

    result
}

/// Restores the terminal on drop and on panic
struct TerminalGuard {
    cleanup: Arc<Mutex<Option<Box<dyn FnOnce() + Send + 'static>>>>,
}

impl TerminalGuard {
    fn new<F: FnOnce() + Send + 'static>(cleanup: F) -> Self {
        let guard = Self {
            cleanup: Arc::new(Mutex::new(Some(Box::new(cleanup)))),
        };
        guard.install_panic_hook();
        guard
    }

    fn install_panic_hook(&self) {
        let cleanup = Arc::clone(&self.cleanup);
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if let Ok(mut slot) = cleanup.lock()
                && let Some(cleanup) = slot.take()
            {
                cleanup();
            }
            default_hook(info);
        }));
    }

    fn restore(&self) {
        if let Ok(mut slot) = self.cleanup.lock()
            && let Some(cleanup) = slot.take()
        {
            cleanup();
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

fn setup_terminal() -> io::Result<(AppTerminal, TerminalGuard)> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    let guard = TerminalGuard::new(|| {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
        let _ = stdout.execute(Show);
    });

    Ok((terminal, guard))
}

/// What a key press means on the current screen
#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyOutcome {
    Quit,
    Dispatch(Action),
}

fn key_outcome(mode: ScreenMode, key: &KeyEvent) -> Option<KeyOutcome> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KeyOutcome::Quit);
    }

    let action = match (mode, key.code) {
        (_, KeyCode::Char('q')) => return Some(KeyOutcome::Quit),
        (_, KeyCode::Char('d')) => Action::DismissNotice,

        (ScreenMode::Home, KeyCode::Char('o') | KeyCode::Enter) => Action::OpenCamera,

        (ScreenMode::PermissionBlocked, KeyCode::Char('g')) => Action::RequestPermission,
        (
            ScreenMode::PermissionBlocked | ScreenMode::DeviceUnavailable,
            KeyCode::Esc | KeyCode::Char('b'),
        ) => Action::CloseCamera,

        (ScreenMode::CameraLive, KeyCode::Char(' ') | KeyCode::Char('p')) => Action::CapturePhoto,
        (ScreenMode::CameraLive, KeyCode::Esc | KeyCode::Char('x')) => Action::CloseCamera,

        _ => return None,
    };

    Some(KeyOutcome::Dispatch(action))
}

fn spawn_command(controller: &Controller, command: Command, sender: &mpsc::UnboundedSender<Action>) {
    let Some(task) = controller.perform(command) else {
        return;
    };
    let sender = sender.clone();
    tokio::spawn(async move {
        let action = task.await;
        // Receiver gone means the UI is shutting down
        let _ = sender.send(action);
    });
}

/// Decoded last photo, reloaded when the photo changes
#[derive(Default)]
struct PhotoPreview {
    photo: Option<PhotoRef>,
    frame: Option<Arc<CameraFrame>>,
}

impl PhotoPreview {
    async fn refresh(&mut self, current: Option<&PhotoRef>) {
        if self.photo.as_ref() == current {
            return;
        }
        self.photo = current.cloned();
        self.frame = match current {
            Some(photo) => storage::load_preview(photo).await,
            None => None,
        };
    }
}

/// Auto-dismiss clock for the notice banner
///
/// Restarts whenever a different notice appears.
#[derive(Debug, Default)]
struct NoticeTimer {
    shown: Option<(Notice, Instant)>,
}

impl NoticeTimer {
    /// Track `notice` and report whether it has been up for `NOTICE_TIMEOUT`
    fn expired(&mut self, notice: Option<&Notice>, now: Instant) -> bool {
        let Some(notice) = notice else {
            self.shown = None;
            return false;
        };
        match &self.shown {
            Some((shown, since)) if shown == notice => {
                if now.duration_since(*since) >= timing::NOTICE_TIMEOUT {
                    self.shown = None;
                    true
                } else {
                    false
                }
            }
            _ => {
                self.shown = Some((notice.clone(), now));
                false
            }
        }
    }
}

async fn run_app(terminal: &mut AppTerminal, mut controller: Controller) -> AppResult<()> {
    let (sender, mut completions) = mpsc::unbounded_channel::<Action>();
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(timing::REDRAW_INTERVAL);
    redraw.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut preview = PhotoPreview::default();
    let mut notice_timer = NoticeTimer::default();

    controller.resolve_device();
    let command = controller.dispatch(Action::Initialize);
    spawn_command(&controller, command, &sender);

    loop {
        preview
            .refresh(controller.state().photo.as_ref())
            .await;

        let content = screen_content(controller.state());
        let live = controller.latest_frame();
        terminal.draw(|f| draw(f, &content, live, preview.frame.clone()))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match key_outcome(controller.current_mode(), &key) {
                        Some(KeyOutcome::Quit) => break,
                        Some(KeyOutcome::Dispatch(action)) => {
                            if matches!(action, Action::OpenCamera) {
                                controller.resolve_device();
                            }
                            let command = controller.dispatch(action);
                            spawn_command(&controller, command, &sender);
                        }
                        None => {}
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(action) = completions.recv() => {
                debug!(?action, "Async action completed");
                let command = controller.dispatch(action);
                spawn_command(&controller, command, &sender);
            }
            _ = redraw.tick() => {}
        }

        // Notices go away on their own after a while
        if notice_timer.expired(controller.state().notice.as_ref(), Instant::now()) {
            controller.dismiss_notice();
        }
    }

    info!("Terminal UI exiting");
    Ok(())
}

fn draw(
    f: &mut Frame,
    content: &ScreenContent,
    live: Option<Arc<CameraFrame>>,
    photo: Option<Arc<CameraFrame>>,
) {
    let notice_height = u16::from(content.notice.is_some());
    let [title_area, body_area, lines_area, notice_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(content.lines.len() as u16),
        Constraint::Length(notice_height),
        Constraint::Length(1),
    ])
    .areas(f.area());

    f.render_widget(
        Paragraph::new(Line::from(content.title.as_str()))
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD)),
        title_area,
    );

    let body_lines = || {
        Paragraph::new(content.lines.iter().map(|l| Line::from(l.as_str())).collect::<Vec<_>>())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
    };

    match content.backdrop {
        Backdrop::LiveFrame => {
            f.render_widget(FrameWidget::new(live, "Waiting for camera..."), body_area);
            f.render_widget(body_lines(), lines_area);
        }
        Backdrop::Photo => {
            f.render_widget(FrameWidget::new(photo, "No photo"), body_area);
            f.render_widget(body_lines(), lines_area);
        }
        Backdrop::Empty => {
            // Message screens center their text in the body instead
            let middle = Rect {
                y: body_area.y + body_area.height.saturating_sub(content.lines.len() as u16) / 2,
                height: body_area.height.min(content.lines.len() as u16),
                ..body_area
            };
            f.render_widget(body_lines(), middle);
        }
    }

    if let Some(notice) = &content.notice {
        f.render_widget(
            Paragraph::new(Line::from(notice.as_str()))
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::White).bg(Color::Red)),
            notice_area,
        );
    }

    f.render_widget(
        StatusBar {
            message: &content.hint_line(),
        },
        status_area,
    );
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget<'a> {
    frame: Option<Arc<CameraFrame>>,
    placeholder: &'a str,
}

impl<'a> FrameWidget<'a> {
    fn new(frame: Option<Arc<CameraFrame>>, placeholder: &'a str) -> Self {
        Self { frame, placeholder }
    }
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let Some(frame) = &self.frame else {
            let x = area.x + (area.width.saturating_sub(self.placeholder.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            buf.set_string(x, y, self.placeholder, Style::default());
            return;
        };

        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
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
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.pixel(src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = frame.pixel(src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);
        buf.set_style(area, style);
        buf.set_stringn(area.x, area.y, self.message, area.width as usize, style);
    }
}
