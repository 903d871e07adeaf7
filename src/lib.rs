// Library exports for tgformat

pub mod config;
pub mod export;
pub mod richtext;
pub mod session;

pub use export::{Export, ExportFormat};
pub use session::{ClipboardPayload, FormatterSession};
