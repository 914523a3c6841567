//! Colors for translation output.

use owo_colors::OwoColorize;
use std::fmt::Display;

/// Styles for the parts of a printed translation.
pub struct Style;

impl Style {
    /// "Found new word:" and similar headings.
    pub fn heading<T: Display>(text: T) -> String {
        format!("{}", text.red())
    }

    /// The looked-up word and its transcription.
    pub fn word<T: Display>(text: T) -> String {
        format!("{}", text.green())
    }

    pub fn variant<T: Display>(text: T) -> String {
        format!("{}", text.yellow())
    }

    /// Usage context shown next to a variant.
    pub fn context<T: Display>(text: T) -> String {
        format!("{}", text.white())
    }

    pub fn error<T: Display>(text: T) -> String {
        format!("{}", text.red().bold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_keep_text() {
        for styled in [
            Style::heading("x"),
            Style::word("x"),
            Style::variant("x"),
            Style::context("x"),
            Style::error("x"),
        ] {
            assert!(styled.contains('x'));
            assert!(styled.starts_with('\u{1b}'), "{styled:?} is not colored");
        }
    }
}
