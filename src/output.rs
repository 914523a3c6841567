//! Printing translations for the user.
//!
//! Translations go to stdout; logs and progress go to stderr. Colors are
//! disabled by `--no-color` or the `NO_COLOR` environment variable.

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::OnceLock;

use crate::translation::{Direction, WordTranslation};
use crate::ui::Style;

static OUTPUT_CONFIG: OnceLock<OutputConfig> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub no_color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            // https://no-color.org/
            no_color: std::env::var_os("NO_COLOR").is_some(),
        }
    }
}

/// Sets the process-wide output configuration. Later calls are ignored.
pub fn init(config: OutputConfig) {
    let _ = OUTPUT_CONFIG.set(config);
}

pub fn config() -> &'static OutputConfig {
    OUTPUT_CONFIG.get_or_init(OutputConfig::default)
}

pub fn is_no_color() -> bool {
    config().no_color
}

/// Presents pipeline outcomes to the user.
pub trait Outputer: Send + Sync {
    /// Prints a translated word with its variants.
    fn output(&self, translation: &WordTranslation) -> io::Result<()>;

    /// Reports a word whose translations were added to the dictionary.
    fn report_added(&self, translation: &WordTranslation) -> io::Result<()>;

    /// Reports a word the dictionary has no translations for.
    fn report_missing(&self, word: &str) -> io::Result<()>;
}

/// Writes colored, line-oriented output.
pub struct TerminalOutputer<W> {
    writer: Mutex<W>,
    colored: bool,
}

impl TerminalOutputer<io::Stdout> {
    /// Prints to stdout, colored unless disabled globally.
    pub fn stdout() -> Self {
        Self::new(io::stdout(), !is_no_color())
    }
}

impl<W: Write> TerminalOutputer<W> {
    pub fn new(writer: W, colored: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            colored,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn paint(&self, text: String, style: fn(String) -> String) -> String {
        if self.colored { style(text) } else { text }
    }

    fn write_block(&self, block: &str) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(block.as_bytes())?;
        writer.flush()
    }
}

impl<W: Write + Send> Outputer for TerminalOutputer<W> {
    fn output(&self, translation: &WordTranslation) -> io::Result<()> {
        let state = if translation.in_dictionary() {
            "existing"
        } else {
            "new"
        };

        let mut block = String::new();
        block.push_str(&self.paint(format!("Found {state} word:"), Style::heading));
        block.push('\n');

        let title = match translation.direction() {
            Direction::English => {
                format!("['{}'] ({})", translation.word, translation.transcription)
            }
            Direction::Russian => format!("['{}']", translation.word),
        };
        block.push_str(&self.paint(title, Style::word));
        if !translation.part_of_speech.is_empty() {
            block.push_str(&self.paint(
                format!(" {}", translation.part_of_speech),
                Style::context,
            ));
        }
        block.push('\n');

        for variant in &translation.variants {
            block.push_str(&self.paint(variant.value.clone(), Style::variant));
            if !variant.context.is_empty() {
                block.push_str(&self.paint(format!(" ({})", variant.context), Style::context));
            }
            block.push('\n');
        }

        self.write_block(&block)
    }

    fn report_added(&self, translation: &WordTranslation) -> io::Result<()> {
        let state = if translation.in_dictionary() {
            "Updated existing"
        } else {
            "Added new"
        };
        let block = format!(
            "{}{}\n",
            self.paint(format!("{state} word: "), Style::heading),
            self.paint(
                format!("['{}'] ['{}']", translation.word, translation.to_add.join(", ")),
                Style::word,
            ),
        );
        self.write_block(&block)
    }

    fn report_missing(&self, word: &str) -> io::Result<()> {
        let block = format!(
            "{}{}\n",
            self.paint("There are no translations for word: ".to_string(), Style::heading),
            self.paint(format!("['{word}']"), Style::word),
        );
        self.write_block(&block)
    }
}
