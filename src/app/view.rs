// SPDX-License-Identifier: GPL-3.0-only

//! Screen content
//!
//! Maps a state snapshot to what the screen shows. Nothing here touches
//! the terminal; `crate::terminal` draws the result.

use crate::app::state::{ScreenMode, ScreenState};

/// Key and what it does on the current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHint {
    pub key: &'static str,
    pub label: &'static str,
}

impl KeyHint {
    const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

/// Which image fills the main area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backdrop {
    /// Last captured photo, or a placeholder
    Photo,
    /// Live preview frames
    LiveFrame,
    /// Message only
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenContent {
    pub mode: ScreenMode,
    pub title: String,
    pub lines: Vec<String>,
    pub backdrop: Backdrop,
    pub hints: Vec<KeyHint>,
    /// Transient notice shown over the screen
    pub notice: Option<String>,
}

impl ScreenContent {
    /// Hints rendered as one status line
    pub fn hint_line(&self) -> String {
        self.hints
            .iter()
            .map(|h| format!("'{}' {}", h.key, h.label))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

const QUIT: KeyHint = KeyHint::new("q", "quit");
const DISMISS: KeyHint = KeyHint::new("d", "dismiss");

pub fn screen_content(state: &ScreenState) -> ScreenContent {
    let mode = state.current_mode();

    let (title, lines, backdrop, mut hints) = match mode {
        ScreenMode::Home => {
            let lines = match &state.photo {
                Some(photo) => vec![format!("Last photo: {}", photo.path().display())],
                None => vec!["No photo taken yet".to_string()],
            };
            (
                "Camera".to_string(),
                lines,
                Backdrop::Photo,
                vec![KeyHint::new("o", "open camera")],
            )
        }

        ScreenMode::PermissionBlocked => {
            let mut lines = vec!["Camera access is required to take photos.".to_string()];
            if state.pending.permission {
                lines.push("Waiting for permission...".to_string());
            }
            (
                "Camera access needed".to_string(),
                lines,
                Backdrop::Empty,
                vec![KeyHint::new("g", "grant access"), KeyHint::new("Esc", "back")],
            )
        }

        ScreenMode::DeviceUnavailable => (
            "No camera".to_string(),
            vec!["No camera of the requested kind is available.".to_string()],
            Backdrop::Empty,
            vec![KeyHint::new("Esc", "back")],
        ),

        ScreenMode::CameraLive => {
            let title = state
                .device
                .as_ref()
                .map(|d| d.name.clone())
                .unwrap_or_else(|| "Camera".to_string());
            let lines = if state.pending.capture {
                vec!["Capturing...".to_string()]
            } else {
                Vec::new()
            };
            (
                title,
                lines,
                Backdrop::LiveFrame,
                vec![KeyHint::new("Space", "take photo"), KeyHint::new("Esc", "close")],
            )
        }
    };

    let notice = state.notice.as_ref().map(|n| n.message());
    if notice.is_some() {
        hints.push(DISMISS);
    }
    hints.push(QUIT);

    ScreenContent {
        mode,
        title,
        lines,
        backdrop,
        hints,
        notice,
    }
}
