//! Syntax highlighting seam. Highlighting is cosmetic: failures are logged and ignored.

use tracing::warn;

use crate::error::HighlightError;
use crate::render::CodePane;

pub trait Highlighter: Send + Sync {
    fn highlight(&self, pane: CodePane, code: &str) -> Result<(), HighlightError>;
}

/// Used when nothing paints colours (the console, headless runs).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHighlight;

impl Highlighter for NoHighlight {
    fn highlight(&self, _pane: CodePane, _code: &str) -> Result<(), HighlightError> {
        Ok(())
    }
}

/// Run the highlighter and swallow any failure after logging it.
pub fn highlight_quietly(h: &dyn Highlighter, pane: CodePane, code: &str) {
    if let Err(e) = h.highlight(pane, code) {
        warn!(target: "auditor_client", ?pane, error = %e, "Highlighting failed; continuing without it");
    }
}
