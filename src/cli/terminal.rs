//! Colored status output for the `gpml` commands.
//!
//! Color is only emitted when stdout supports it; otherwise every helper
//! returns the plain text.

use std::{
    fmt::{self, Display},
    sync::OnceLock,
};

use owo_colors::{OwoColorize, Style, colors::css};

fn color_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| supports_color::on(supports_color::Stream::Stdout).is_some())
}

fn paint(text: &dyn Display, style: Style) -> String {
    if color_enabled() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// The mark printed in front of a per-document result line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// The document passed.
    Pass,
    /// The document loaded but has problems.
    Warn,
    /// The document could not be loaded.
    Fail,
}

impl Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self {
            Self::Pass => "✓".success(),
            Self::Warn => "✗".warning(),
            Self::Fail => "✗".error(),
        };
        f.write_str(&mark)
    }
}

/// Styles for result text.
pub trait Colorize {
    /// Green, for clean results.
    fn success(&self) -> String;
    /// Amber, for documents with problems.
    fn warning(&self) -> String;
    /// Red, for failures.
    fn error(&self) -> String;
    /// Dimmed, for labels and detail lines.
    fn dim(&self) -> String;
}

impl<T: Display + ?Sized> Colorize for T {
    fn success(&self) -> String {
        paint(&self, Style::new().fg::<css::Green>())
    }

    fn warning(&self) -> String {
        paint(&self, Style::new().fg::<css::Orange>())
    }

    fn error(&self) -> String {
        paint(&self, Style::new().fg::<css::Red>())
    }

    fn dim(&self) -> String {
        paint(&self, Style::new().dimmed())
    }
}
