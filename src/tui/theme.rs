// Colors for the TUI
//
// One palette; every style the views use comes from here.

use ratatui::style::{Color, Modifier, Style};
use tracing::Level;

use crate::events::LineKind;

/// Complete theme definition with all UI colors
#[derive(Debug, Clone)]
pub struct Theme {
    // Base colors
    pub fg: Color,
    pub dim: Color,
    pub border: Color,
    pub border_focused: Color,

    // Accents
    pub accent: Color,
    pub accent_dark: Color,

    // Selection
    pub selected_bg: Color,
    pub selected_fg: Color,

    // Connection indicator
    pub connected: Color,
    pub disconnected: Color,

    pub error: Color,

    // Log levels
    pub log_error: Color,
    pub log_warn: Color,
    pub log_info: Color,
    pub log_debug: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::pink()
    }
}

impl Theme {
    pub fn pink() -> Self {
        Self {
            fg: Color::Reset,
            dim: Color::Rgb(0x6B, 0x72, 0x80),
            border: Color::Rgb(0x6B, 0x72, 0x80),
            border_focused: Color::Rgb(0xDB, 0x27, 0x77),

            accent: Color::Rgb(0xDB, 0x27, 0x77),
            accent_dark: Color::Rgb(0xAC, 0x21, 0x5F),

            selected_bg: Color::Rgb(0xAC, 0x21, 0x5F),
            selected_fg: Color::Black,

            connected: Color::Green,
            disconnected: Color::Rgb(0x6B, 0x72, 0x80),

            error: Color::Red,

            log_error: Color::Red,
            log_warn: Color::Yellow,
            log_info: Color::Blue,
            log_debug: Color::Gray,
        }
    }

    pub fn border(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.selected_fg)
            .bg(self.accent_dark)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected(&self) -> Style {
        Style::default().fg(self.selected_fg).bg(self.selected_bg)
    }

    pub fn line(&self, kind: LineKind) -> Style {
        match kind {
            LineKind::Message => Style::default().fg(self.fg),
            LineKind::OwnMessage => Style::default().fg(self.accent_dark),
            LineKind::Status => Style::default().fg(self.dim),
        }
    }

    pub fn log_level(&self, level: Level) -> Style {
        let color = match level {
            Level::ERROR => self.log_error,
            Level::WARN => self.log_warn,
            Level::INFO => self.log_info,
            _ => self.log_debug,
        };
        Style::default().fg(color)
    }
}
