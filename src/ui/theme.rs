use crate::domain::{BookStatus, MessageRole};
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub muted: Style,
    pub reader: Style,
    pub assistant: Style,
}

impl Theme {
    /// Colors only when stdout is a terminal
    pub fn detect() -> Self {
        if console::Term::stdout().is_term() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
            muted: Style::new().bright_black(),
            reader: Style::new().blue().bold(),
            assistant: Style::new().green(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            muted: Style::new(),
            reader: Style::new(),
            assistant: Style::new(),
        }
    }

    pub fn for_status(&self, status: BookStatus) -> Style {
        match status {
            BookStatus::Pending => self.muted.clone(),
            BookStatus::Ingesting => self.warn.clone(),
            BookStatus::Ready => self.success.clone(),
            BookStatus::Failed => self.error.clone(),
        }
    }

    pub fn for_role(&self, role: MessageRole) -> Style {
        match role {
            MessageRole::User => self.reader.clone(),
            MessageRole::Assistant => self.assistant.clone(),
            MessageRole::ToolResult => self.dim.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

