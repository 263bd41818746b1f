//! Syntax highlighting for JSON and TOML printed to a terminal.

use std::io::{self, IsTerminal};

use syntect::{
    easy::HighlightLines,
    highlighting::Style,
    parsing::SyntaxSet,
    util::{LinesWithEndings, as_24_bit_terminal_escaped},
};
use two_face::{
    syntax::extra_newlines as extra_syntaxes,
    theme::{EmbeddedLazyThemeSet, EmbeddedThemeName, extra as extra_themes},
};

use super::color_enabled;

/// Highlights documents when stdout is a color terminal; passes them
/// through untouched otherwise.
pub struct Highlighter {
    /// Loaded syntaxes, or `None` when color is off.
    syntaxes: Option<(SyntaxSet, EmbeddedLazyThemeSet)>,
}

impl Highlighter {
    /// Creates a highlighter for standard output.
    pub fn for_stdout() -> Self {
        let enabled = io::stdout().is_terminal() && color_enabled();
        Self {
            syntaxes: enabled.then(|| (extra_syntaxes(), extra_themes())),
        }
    }

    /// Highlights a JSON document.
    pub fn json(&self, content: &str) -> String {
        self.paint(content, "json")
    }

    /// Highlights a TOML document.
    pub fn toml(&self, content: &str) -> String {
        self.paint(content, "toml")
    }

    /// Highlights `content` using the syntax registered for `extension`.
    fn paint(&self, content: &str, extension: &str) -> String {
        let Some((syntax_set, theme_set)) = &self.syntaxes else {
            return content.to_string();
        };
        let syntax = syntax_set
            .find_syntax_by_extension(extension)
            .unwrap_or_else(|| syntax_set.find_syntax_plain_text());
        let mut lines = HighlightLines::new(syntax, theme_set.get(EmbeddedThemeName::Dracula));

        let mut out = String::with_capacity(content.len() * 2);
        for line in LinesWithEndings::from(content) {
            let ranges: Vec<(Style, &str)> = lines
                .highlight_line(line, syntax_set)
                .unwrap_or_else(|_| vec![(Style::default(), line)]);
            out.push_str(&as_24_bit_terminal_escaped(&ranges, false));
        }
        out.push_str("\x1b[0m");
        out
    }
}
