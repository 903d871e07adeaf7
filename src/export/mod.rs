// Export
// Serializers from a Document to the three chat-ready text formats.

pub mod html_dialect;
pub mod markdown_dialect;
pub mod quoted_literal;

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::richtext::Document;

pub use html_dialect::to_html_dialect;
pub use markdown_dialect::to_escaped_markdown;
pub use quoted_literal::{to_quoted_literal, unquote_literal};

/// Target format of an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Telegram-flavoured HTML
    #[default]
    Html,
    /// Telegram MarkdownV2 with reserved characters escaped
    #[serde(rename = "markdown")]
    #[value(name = "markdown")]
    MarkdownV2,
    /// The HTML output as a single-quoted string expression
    Calculator,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [
        ExportFormat::Html,
        ExportFormat::MarkdownV2,
        ExportFormat::Calculator,
    ];

    /// Serialize `doc` without touching it
    pub fn export(self, doc: &Document) -> String {
        match self {
            ExportFormat::Html => to_html_dialect(doc),
            ExportFormat::MarkdownV2 => to_escaped_markdown(doc),
            ExportFormat::Calculator => to_quoted_literal(doc),
        }
    }

    /// Name of the UI action that triggers this export
    pub fn action_name(self) -> &'static str {
        match self {
            ExportFormat::Html => "export_html",
            ExportFormat::MarkdownV2 => "export_markdown",
            ExportFormat::Calculator => "export_calculator",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::MarkdownV2 => "markdown",
            ExportFormat::Calculator => "calculator",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown export format `{0}` (expected html, markdown or calculator)")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(ExportFormat::Html),
            "markdown" | "markdownv2" | "md" => Ok(ExportFormat::MarkdownV2),
            "calculator" | "literal" => Ok(ExportFormat::Calculator),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Result of an export together with the format that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub format: ExportFormat,
    pub text: String,
}

impl Export {
    pub fn action_name(&self) -> &'static str {
        self.format.action_name()
    }
}

/// Drop trailing newlines only; leading and inner ones stay
pub(crate) fn strip_trailing_newlines(out: &mut String) {
    let len = out.trim_end_matches('\n').len();
    out.truncate(len);
}
