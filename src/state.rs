//! Session state: the mutable, owned value describing one challenge attempt.
//!
//! Exactly one `Session` is current at a time. Starting a new challenge replaces it wholesale
//! with a fresh `SessionId`, which is how late network completions for a discarded attempt
//! are recognised and dropped.

use std::fmt;

use uuid::Uuid;

use crate::domain::{Challenge, SubmissionResult};

/// Identity of one session. Completions carry the id of the session that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle stage of a session. Showing the fixed code is tracked separately by
/// `Session::diff_revealed` because it never changes the parent phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Active,
    Submitting,
    Submitted,
    Error,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Active => "active",
            Phase::Submitting => "submitting",
            Phase::Submitted => "submitted",
            Phase::Error => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    pub id: SessionId,
    pub phase: Phase,
    pub difficulty: String,
    pub challenge: Option<Challenge>,
    /// Selected classification, e.g. "CWE-89". Not yet encoded.
    pub selection: Option<String>,

    pub diff_revealed: bool,
    /// Once true, stays true until the session is replaced.
    pub diff_penalty_applied: bool,
    /// Filled at most once, on the first successful reveal.
    pub fixed_code_cache: Option<String>,
    /// A fixed-code fetch is in flight; the diff control is gated.
    pub diff_pending: bool,
    /// Submission is gated after a 429 until the cooldown elapses.
    pub submit_cooldown: bool,

    pub result: Option<SubmissionResult>,
}

impl Session {
    /// Fresh session for a challenge request at `difficulty`.
    pub fn loading(difficulty: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            phase: Phase::Loading,
            difficulty: difficulty.into(),
            ..Self::default()
        }
    }

    /// Active or showing the fixed code: the states that accept diff toggles and submissions.
    pub fn is_assessing(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn can_submit(&self) -> bool {
        self.is_assessing() && !self.submit_cooldown
    }

    pub fn can_toggle_diff(&self) -> bool {
        self.is_assessing() && !self.diff_pending
    }

    /// "active", "diff_revealed", ... for logs.
    pub fn state_label(&self) -> &'static str {
        if self.phase == Phase::Active && self.diff_revealed {
            "diff_revealed"
        } else {
            self.phase.as_str()
        }
    }
}
