//! Colouring for command output.
//!
//! Connectivity reports, identifier tables and individual listings use these
//! helpers. Output is left plain when the terminal does not support colour.

use owo_colors::{OwoColorize, colors::css};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

fn styled(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// Green, for a clean connectivity check
    fn success(&self) -> String;
    /// Amber, for disconnected individuals
    fn warning(&self) -> String;
    /// Blue, for field descriptions
    fn info(&self) -> String;
    /// Bold, for headers and table headings
    fn heading(&self) -> String;
    /// Dimmed, for cross-references and summaries
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        styled(self, |text| text.fg::<css::Green>().to_string())
    }

    fn warning(&self) -> String {
        styled(self, |text| text.fg::<css::Orange>().to_string())
    }

    fn info(&self) -> String {
        styled(self, |text| text.fg::<css::LightBlue>().to_string())
    }

    fn heading(&self) -> String {
        styled(self, |text| text.bold().to_string())
    }

    fn dim(&self) -> String {
        styled(self, |text| text.dimmed().to_string())
    }
}

impl Colorize for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn info(&self) -> String {
        self.as_str().info()
    }

    fn heading(&self) -> String {
        self.as_str().heading()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}
