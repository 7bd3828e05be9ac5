//! Render commands: the declarative surface between session logic and whatever paints it.
//!
//! The logic never touches a UI. It emits these commands in order and a `Renderer`
//! applies them.

use crate::domain::{Challenge, SubmissionResult};
use crate::config::Messages;
use crate::util::fill_template;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    Challenge,
    Assessment,
    Results,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    Submit,
    Diff,
    NewChallenge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodePane {
    Vulnerable,
    Fixed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CodeLayout {
    Single,
    SideBySide { fixed_code: String },
}

/// Everything the results panel shows, already worded.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultView {
    pub correct: bool,
    pub headline: String,
    pub score_line: String,
    pub correct_answer: String,
    pub solution: String,
    pub total_score: Option<i64>,
    pub completed_count: Option<i64>,
}

impl ResultView {
    pub fn from_result(r: &SubmissionResult, messages: &Messages) -> Self {
        let headline = if r.correct { &messages.result_correct } else { &messages.result_incorrect };
        Self {
            correct: r.correct,
            headline: headline.clone(),
            score_line: fill_template(&messages.score_line, &[("score", &r.score_earned.to_string())]),
            correct_answer: r.correct_answer_label(),
            solution: r
                .solution
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| messages.no_solution.clone()),
            total_score: r.total_score,
            completed_count: r.completed_count,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    ShowLoading(bool),
    ShowError(String),
    HideError,
    /// Empty both code panes and show `id_placeholder` where the challenge id goes.
    ClearChallenge { id_placeholder: String },
    ShowChallenge {
        id: String,
        title: String,
        difficulty: String,
        cve_id: Option<String>,
        code: String,
    },
    /// Keep the difficulty selector in sync with what the service actually served.
    SetDifficulty(String),
    ClearSelection,
    ShowPanel { panel: Panel, visible: bool },
    SetCodeLayout { layout: CodeLayout, title: String },
    ShowResult(ResultView),
    SetControl { control: Control, enabled: bool, label: String },
}

impl RenderCommand {
    pub fn challenge(c: &Challenge) -> Self {
        RenderCommand::ShowChallenge {
            id: c.id.to_string(),
            title: c.display_title(),
            difficulty: c.difficulty.clone(),
            cve_id: c.cve_id.clone(),
            code: c.vulnerable_code.clone(),
        }
    }

    pub fn panel(panel: Panel, visible: bool) -> Self {
        RenderCommand::ShowPanel { panel, visible }
    }

    pub fn control(control: Control, enabled: bool, label: impl Into<String>) -> Self {
        RenderCommand::SetControl { control, enabled, label: label.into() }
    }
}

/// Consumer of render commands (DOM bridge, terminal, test recorder...).
pub trait Renderer: Send {
    fn render(&mut self, cmd: &RenderCommand);
}

/// Keeps every command it receives. Handy for embedding and for tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingRenderer {
    commands: std::sync::Arc<std::sync::Mutex<Vec<RenderCommand>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<RenderCommand> {
        match self.commands.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, cmd: &RenderCommand) {
        match self.commands.lock() {
            Ok(mut guard) => guard.push(cmd.clone()),
            Err(poisoned) => poisoned.into_inner().push(cmd.clone()),
        }
    }
}
