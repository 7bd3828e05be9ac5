//! Session transitions.
//!
//! `step` is pure: it takes the current `Session` by value plus one `Event` and returns the next
//! `Session`, the render commands to apply, and the effects (network calls, timers, highlighting)
//! the controller must start. Nothing here blocks or performs I/O.
//!
//! Gating rules:
//!   - while a phase-changing request is in flight, its trigger is ignored (and shown disabled)
//!   - completions tagged with another session's id are dropped
//!   - after a 429 the submit control stays disabled until `SubmitCooldownElapsed`

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::domain::{Challenge, ChallengeId, SubmissionResult};
use crate::error::{HttpError, ServiceError, UserInputError};
use crate::render::{CodeLayout, CodePane, Control, Panel, RenderCommand, ResultView};
use crate::state::{Phase, Session, SessionId};
use crate::util::{encode_selection, fill_template};

/// Triggers the session reacts to: user actions and completions of earlier effects.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
  /// Difficulty selector changed. Always starts over, even mid-load.
  SelectDifficulty(String),
  /// "New challenge" / "next challenge" at the current difficulty.
  NewChallenge,
  /// Classification chosen in the selector (None or blank clears it).
  Choose(Option<String>),
  ToggleDiff,
  Submit,

  ChallengeLoaded { session: SessionId, result: Result<Challenge, ServiceError> },
  FixedCodeLoaded { session: SessionId, result: Result<String, ServiceError> },
  SubmissionFinished { session: SessionId, result: Result<SubmissionResult, ServiceError> },
  SubmitCooldownElapsed { session: SessionId },
}

impl Event {
  /// Session id carried by completion events.
  fn origin(&self) -> Option<SessionId> {
    match self {
      Event::ChallengeLoaded { session, .. }
      | Event::FixedCodeLoaded { session, .. }
      | Event::SubmissionFinished { session, .. }
      | Event::SubmitCooldownElapsed { session } => Some(*session),
      _ => None,
    }
  }
}

/// Work the controller performs on behalf of a transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
  FetchChallenge { session: SessionId, difficulty: String },
  FetchFixedCode { session: SessionId, challenge_id: ChallengeId },
  SubmitAnswer {
    session: SessionId,
    challenge_id: ChallengeId,
    encoded_selection: String,
    used_diff: bool,
  },
  /// One-shot timer; fires `SubmitCooldownElapsed`. Never resubmits.
  ReenableSubmitAfter { session: SessionId, delay: Duration },
  Highlight { pane: CodePane, code: String },
}

#[derive(Debug)]
pub struct Transition {
  pub session: Session,
  pub commands: Vec<RenderCommand>,
  pub effects: Vec<Effect>,
}

impl Transition {
  fn unchanged(session: Session) -> Self {
    Self { session, commands: Vec::new(), effects: Vec::new() }
  }
}

/// Apply one event to the session.
pub fn step(session: Session, event: Event, cfg: &ClientConfig) -> Transition {
  if let Some(origin) = event.origin() {
    if origin != session.id {
      debug!(target: "session", current = %session.id, stale = %origin, "Discarding completion for a replaced session");
      return Transition::unchanged(session);
    }
  }

  let before = session.state_label();
  let t = match event {
    Event::SelectDifficulty(difficulty) => start_loading(difficulty, cfg),
    Event::NewChallenge => new_challenge(session, cfg),
    Event::Choose(selection) => choose(session, selection),
    Event::ToggleDiff => toggle_diff(session, cfg),
    Event::Submit => submit(session, cfg),
    Event::ChallengeLoaded { result, .. } => challenge_loaded(session, result, cfg),
    Event::FixedCodeLoaded { result, .. } => fixed_code_loaded(session, result, cfg),
    Event::SubmissionFinished { result, .. } => submission_finished(session, result, cfg),
    Event::SubmitCooldownElapsed { .. } => cooldown_elapsed(session, cfg),
  };
  let after = t.session.state_label();
  if before != after {
    info!(target: "session", id = %t.session.id, from = before, to = after, "Session transition");
  }
  t
}

fn start_loading(difficulty: String, cfg: &ClientConfig) -> Transition {
  let m = &cfg.messages;
  let session = Session::loading(difficulty);
  let commands = vec![
    RenderCommand::HideError,
    RenderCommand::ClearChallenge { id_placeholder: m.loading_id_placeholder.clone() },
    RenderCommand::SetCodeLayout { layout: CodeLayout::Single, title: m.code_title.clone() },
    RenderCommand::ClearSelection,
    RenderCommand::panel(Panel::Assessment, false),
    RenderCommand::panel(Panel::Results, false),
    RenderCommand::control(Control::Diff, false, cfg.diff_show_label()),
    RenderCommand::control(Control::Submit, false, m.submit_label.clone()),
    RenderCommand::control(Control::NewChallenge, false, m.new_challenge_label.clone()),
    RenderCommand::ShowLoading(true),
  ];
  let effects = vec![Effect::FetchChallenge {
    session: session.id,
    difficulty: session.difficulty.clone(),
  }];
  Transition { session, commands, effects }
}

fn new_challenge(session: Session, cfg: &ClientConfig) -> Transition {
  if session.phase == Phase::Loading {
    debug!(target: "session", "New challenge ignored: already loading");
    return Transition::unchanged(session);
  }
  let difficulty = if session.difficulty.is_empty() {
    cfg.start_difficulty.clone()
  } else {
    session.difficulty
  };
  start_loading(difficulty, cfg)
}

fn choose(mut session: Session, selection: Option<String>) -> Transition {
  if !session.is_assessing() {
    debug!(target: "session", phase = %session.phase, "Selection ignored: not assessing");
    return Transition::unchanged(session);
  }
  session.selection = selection
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty());
  Transition::unchanged(session)
}

fn toggle_diff(mut session: Session, cfg: &ClientConfig) -> Transition {
  let m = &cfg.messages;
  if session.phase == Phase::Loading {
    debug!(target: "session", "Diff toggle ignored: loading");
    return Transition::unchanged(session);
  }
  let Some(challenge) = session.challenge.as_ref() else {
    return Transition {
      session,
      commands: vec![RenderCommand::HideError, RenderCommand::ShowError(m.no_challenge_for_diff.clone())],
      effects: Vec::new(),
    };
  };
  if !session.can_toggle_diff() {
    debug!(target: "session", phase = %session.phase, pending = session.diff_pending, "Diff toggle ignored");
    return Transition::unchanged(session);
  }

  let mut commands = vec![RenderCommand::HideError];
  let mut effects = Vec::new();

  if session.diff_revealed {
    // Hiding only swaps the visible pane; cache and penalty stay.
    session.diff_revealed = false;
    commands.push(single_pane(cfg));
    commands.push(RenderCommand::control(Control::Diff, true, cfg.diff_show_label()));
    effects.push(Effect::Highlight { pane: CodePane::Vulnerable, code: challenge.vulnerable_code.clone() });
    return Transition { session, commands, effects };
  }

  if !session.diff_penalty_applied {
    session.diff_penalty_applied = true;
    info!(target: "session", id = %session.id, challenge = %challenge.id, "Diff penalty applied");
  }

  match session.fixed_code_cache.clone() {
    Some(fixed) => {
      session.diff_revealed = true;
      commands.extend(reveal(&fixed, cfg));
      effects.extend(highlight_both(challenge, &fixed));
    }
    None => {
      session.diff_pending = true;
      effects.push(Effect::FetchFixedCode { session: session.id, challenge_id: challenge.id.clone() });
      commands.push(RenderCommand::control(Control::Diff, false, m.diff_loading_label.clone()));
    }
  }
  Transition { session, commands, effects }
}

fn submit(mut session: Session, cfg: &ClientConfig) -> Transition {
  let m = &cfg.messages;
  if session.phase != Phase::Active || session.challenge.is_none() {
    if session.challenge.is_none() && session.phase != Phase::Loading {
      return user_input_error(session, UserInputError::NoChallenge, cfg);
    }
    debug!(target: "session", phase = %session.phase, "Submit ignored: not accepting submissions");
    return Transition::unchanged(session);
  }
  if session.submit_cooldown {
    debug!(target: "session", "Submit ignored: rate-limit cooldown running");
    return Transition::unchanged(session);
  }
  let Some(selection) = session.selection.clone() else {
    return user_input_error(session, UserInputError::NoSelection, cfg);
  };
  let challenge_id = match session.challenge.as_ref() {
    Some(c) => c.id.clone(),
    None => return user_input_error(session, UserInputError::NoChallenge, cfg),
  };

  session.phase = Phase::Submitting;
  let effects = vec![Effect::SubmitAnswer {
    session: session.id,
    challenge_id,
    encoded_selection: encode_selection(&selection),
    used_diff: session.diff_penalty_applied,
  }];
  let commands = vec![
    RenderCommand::HideError,
    RenderCommand::control(Control::Submit, false, m.submitting_label.clone()),
  ];
  Transition { session, commands, effects }
}

fn user_input_error(session: Session, err: UserInputError, cfg: &ClientConfig) -> Transition {
  let m = &cfg.messages;
  debug!(target: "session", error = %err, "Rejected locally");
  let text = match err {
    UserInputError::NoChallenge => m.no_challenge.clone(),
    UserInputError::NoSelection => m.no_selection.clone(),
  };
  Transition {
    session,
    commands: vec![RenderCommand::HideError, RenderCommand::ShowError(text)],
    effects: Vec::new(),
  }
}

fn challenge_loaded(
  mut session: Session,
  result: Result<Challenge, ServiceError>,
  cfg: &ClientConfig,
) -> Transition {
  let m = &cfg.messages;
  if session.phase != Phase::Loading {
    debug!(target: "session", phase = %session.phase, "Challenge completion ignored: not loading");
    return Transition::unchanged(session);
  }

  match result {
    Ok(challenge) => {
      session.phase = Phase::Active;
      session.difficulty = challenge.difficulty.clone();
      session.diff_revealed = false;
      session.diff_penalty_applied = false;
      session.fixed_code_cache = None;
      session.diff_pending = false;
      session.submit_cooldown = false;
      session.selection = None;
      session.result = None;

      let commands = vec![
        RenderCommand::ShowLoading(false),
        RenderCommand::challenge(&challenge),
        RenderCommand::SetDifficulty(challenge.difficulty.clone()),
        RenderCommand::panel(Panel::Challenge, true),
        RenderCommand::panel(Panel::Assessment, true),
        RenderCommand::panel(Panel::Results, false),
        RenderCommand::control(Control::Diff, true, cfg.diff_show_label()),
        RenderCommand::control(Control::Submit, true, m.submit_label.clone()),
        RenderCommand::control(Control::NewChallenge, true, m.new_challenge_label.clone()),
      ];
      let effects = vec![Effect::Highlight {
        pane: CodePane::Vulnerable,
        code: challenge.vulnerable_code.clone(),
      }];
      session.challenge = Some(challenge);
      Transition { session, commands, effects }
    }
    Err(e) => {
      warn!(target: "session", difficulty = %session.difficulty, error = %e, "Challenge load failed");
      let text = load_error_text(&e, &session.difficulty, cfg);
      session.phase = Phase::Error;
      let commands = vec![
        RenderCommand::ShowLoading(false),
        RenderCommand::ShowError(text),
        RenderCommand::panel(Panel::Challenge, false),
        RenderCommand::panel(Panel::Assessment, false),
        RenderCommand::panel(Panel::Results, false),
        RenderCommand::control(Control::NewChallenge, true, m.new_challenge_label.clone()),
      ];
      Transition { session, commands, effects: Vec::new() }
    }
  }
}

fn fixed_code_loaded(
  mut session: Session,
  result: Result<String, ServiceError>,
  cfg: &ClientConfig,
) -> Transition {
  let m = &cfg.messages;
  if !session.diff_pending {
    return Transition::unchanged(session);
  }
  session.diff_pending = false;

  // A submission may have gone out while the fetch was running; keep the code but leave
  // the (now disabled) diff control alone.
  let showing = session.phase == Phase::Active;

  match result {
    Ok(fixed) => {
      if session.fixed_code_cache.is_none() {
        session.fixed_code_cache = Some(fixed);
      }
      if !showing {
        return Transition::unchanged(session);
      }
      let (Some(challenge), Some(fixed)) = (session.challenge.as_ref(), session.fixed_code_cache.as_ref()) else {
        return Transition::unchanged(session);
      };
      let commands = reveal(fixed, cfg);
      let effects = highlight_both(challenge, fixed);
      session.diff_revealed = true;
      Transition { session, commands, effects }
    }
    Err(e) => {
      warn!(target: "session", error = %e, "Fixed code fetch failed");
      if !showing {
        return Transition::unchanged(session);
      }
      session.diff_revealed = false;
      let text = fill_template(&m.diff_failed, &[("error", &service_error_text(&e))]);
      let mut effects = Vec::new();
      if let Some(c) = session.challenge.as_ref() {
        effects.push(Effect::Highlight { pane: CodePane::Vulnerable, code: c.vulnerable_code.clone() });
      }
      let commands = vec![
        RenderCommand::ShowError(text),
        single_pane(cfg),
        RenderCommand::control(Control::Diff, true, cfg.diff_show_label()),
      ];
      Transition { session, commands, effects }
    }
  }
}

fn submission_finished(
  mut session: Session,
  result: Result<SubmissionResult, ServiceError>,
  cfg: &ClientConfig,
) -> Transition {
  let m = &cfg.messages;
  if session.phase != Phase::Submitting {
    debug!(target: "session", phase = %session.phase, "Submission completion ignored: not submitting");
    return Transition::unchanged(session);
  }

  match result {
    Ok(result) => {
      info!(target: "session", id = %session.id, correct = result.correct, score = result.score_earned, "Submission accepted");
      session.phase = Phase::Submitted;
      let diff_label = if session.diff_revealed { m.diff_hide_label.clone() } else { cfg.diff_show_label() };
      let commands = vec![
        RenderCommand::ShowResult(ResultView::from_result(&result, m)),
        RenderCommand::panel(Panel::Assessment, false),
        RenderCommand::panel(Panel::Results, true),
        RenderCommand::control(Control::Submit, false, m.submit_label.clone()),
        RenderCommand::control(Control::Diff, false, diff_label),
      ];
      session.result = Some(result);
      Transition { session, commands, effects: Vec::new() }
    }
    Err(ServiceError::Http(HttpError::RateLimited { retry_after_secs })) => {
      let delay = cfg.submit_cooldown(retry_after_secs);
      warn!(target: "session", ?retry_after_secs, ?delay, "Submission rate limited; cooling down");
      session.phase = Phase::Active;
      session.submit_cooldown = true;
      let text = match retry_after_secs {
        Some(secs) => fill_template(&m.rate_limited_retry, &[("seconds", &secs.to_string())]),
        None => m.rate_limited.clone(),
      };
      let effects = vec![Effect::ReenableSubmitAfter { session: session.id, delay }];
      let commands = vec![
        RenderCommand::ShowError(text),
        RenderCommand::control(Control::Submit, false, m.submitting_label.clone()),
      ];
      Transition { session, commands, effects }
    }
    Err(e) => {
      warn!(target: "session", error = %e, "Submission failed");
      session.phase = Phase::Active;
      let text = fill_template(&m.submit_failed, &[("error", &service_error_text(&e))]);
      let commands = vec![
        RenderCommand::ShowError(text),
        RenderCommand::control(Control::Submit, true, m.submit_label.clone()),
      ];
      Transition { session, commands, effects: Vec::new() }
    }
  }
}

fn cooldown_elapsed(mut session: Session, cfg: &ClientConfig) -> Transition {
  if !session.submit_cooldown {
    return Transition::unchanged(session);
  }
  session.submit_cooldown = false;
  if session.phase != Phase::Active {
    return Transition::unchanged(session);
  }
  debug!(target: "session", "Submit cooldown over");
  let commands = vec![RenderCommand::control(Control::Submit, true, cfg.messages.submit_label.clone())];
  Transition { session, commands, effects: Vec::new() }
}

fn single_pane(cfg: &ClientConfig) -> RenderCommand {
  RenderCommand::SetCodeLayout { layout: CodeLayout::Single, title: cfg.messages.code_title.clone() }
}

fn reveal(fixed: &str, cfg: &ClientConfig) -> Vec<RenderCommand> {
  vec![
    RenderCommand::SetCodeLayout {
      layout: CodeLayout::SideBySide { fixed_code: fixed.to_string() },
      title: cfg.messages.diff_title.clone(),
    },
    RenderCommand::control(Control::Diff, true, cfg.messages.diff_hide_label.clone()),
  ]
}

fn highlight_both(challenge: &Challenge, fixed: &str) -> Vec<Effect> {
  vec![
    Effect::Highlight { pane: CodePane::Vulnerable, code: challenge.vulnerable_code.clone() },
    Effect::Highlight { pane: CodePane::Fixed, code: fixed.to_string() },
  ]
}

/// Message for a failed challenge load.
pub fn load_error_text(e: &ServiceError, difficulty: &str, cfg: &ClientConfig) -> String {
  let m = &cfg.messages;
  match e {
    ServiceError::Http(HttpError::NotFound { message }) => message
      .clone()
      .unwrap_or_else(|| fill_template(&m.not_found, &[("difficulty", difficulty)])),
    ServiceError::Http(HttpError::Other { message: Some(msg), .. }) => msg.clone(),
    ServiceError::Http(HttpError::Other { status, reason, message: None }) => {
      let status = match reason {
        Some(r) => format!("{status} {r}"),
        None => status.to_string(),
      };
      fill_template(&m.load_failed_status, &[("status", &status)])
    }
    ServiceError::Http(HttpError::RateLimited { .. }) => {
      fill_template(&m.load_failed_status, &[("status", "429 Too Many Requests")])
    }
    other => fill_template(&m.load_failed, &[("error", &other.to_string())]),
  }
}

/// Short error text used inside the diff and submit messages.
pub fn service_error_text(e: &ServiceError) -> String {
  match e {
    ServiceError::Http(http) => match http.server_message() {
      Some(msg) => msg.to_string(),
      None => match http {
        HttpError::NotFound { .. } => "HTTP error! Status: 404".to_string(),
        HttpError::Other { status, .. } => format!("HTTP error! Status: {status}"),
        HttpError::RateLimited { .. } => "HTTP error! Status: 429".to_string(),
      },
    },
    other => other.to_string(),
  }
}
