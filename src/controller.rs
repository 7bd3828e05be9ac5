//! Session controller: owns the current `Session`, applies `logic::step`, hands render
//! commands to the renderer and runs effects as tokio tasks.
//!
//! Completions come back through an internal channel as ordinary `Event`s, so every state
//! change goes through `step` on one task. No locks guard the session; gating lives in the
//! transitions and stale completions are dropped by session id.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::highlight::{highlight_quietly, Highlighter};
use crate::logic::{step, Effect, Event, Transition};
use crate::remote::RemoteService;
use crate::render::Renderer;
use crate::state::Session;

pub struct Controller {
    cfg: Arc<ClientConfig>,
    session: Session,
    remote: Arc<dyn RemoteService>,
    renderer: Box<dyn Renderer>,
    highlighter: Arc<dyn Highlighter>,
    completions_tx: mpsc::UnboundedSender<Event>,
    completions_rx: mpsc::UnboundedReceiver<Event>,
}

impl Controller {
    pub fn new(
        cfg: ClientConfig,
        remote: Arc<dyn RemoteService>,
        renderer: Box<dyn Renderer>,
        highlighter: Arc<dyn Highlighter>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            cfg: Arc::new(cfg),
            session: Session::default(),
            remote,
            renderer,
            highlighter,
            completions_tx,
            completions_rx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    /// Load the first challenge at the configured start difficulty.
    pub fn start(&mut self) {
        let difficulty = self.cfg.start_difficulty.clone();
        self.handle(Event::SelectDifficulty(difficulty));
    }

    /// Apply one event: transition, render, launch effects. Never blocks.
    #[instrument(level = "debug", skip_all, fields(session = %self.session.id))]
    pub fn handle(&mut self, event: Event) {
        let current = std::mem::take(&mut self.session);
        let Transition { session, commands, effects } = step(current, event, &self.cfg);
        self.session = session;

        for cmd in &commands {
            self.renderer.render(cmd);
        }
        for effect in effects {
            self.launch(effect);
        }
    }

    /// Wait for the next completion (network result or timer) and apply it.
    /// Returns false only if the completion channel is gone.
    pub async fn pump(&mut self) -> bool {
        match self.completions_rx.recv().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    /// Apply a completion if one is already queued.
    pub fn try_pump(&mut self) -> bool {
        match self.completions_rx.try_recv() {
            Ok(event) => {
                self.handle(event);
                true
            }
            Err(_) => false,
        }
    }

    /// Event loop: user events from `inputs`, completions from running effects.
    /// Ends when the input side is dropped, returning the last session.
    pub async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<Event>) -> Session {
        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(event) => self.handle(event),
                    None => break,
                },
                Some(event) = self.completions_rx.recv() => self.handle(event),
            }
        }
        debug!(target: "auditor_client", "Input closed; controller stopping");
        self.session
    }

    fn launch(&self, effect: Effect) {
        let tx = self.completions_tx.clone();
        match effect {
            Effect::FetchChallenge { session, difficulty } => {
                let remote = Arc::clone(&self.remote);
                tokio::spawn(async move {
                    let result = remote.fetch_challenge(&difficulty).await;
                    let _ = tx.send(Event::ChallengeLoaded { session, result });
                });
            }
            Effect::FetchFixedCode { session, challenge_id } => {
                let remote = Arc::clone(&self.remote);
                tokio::spawn(async move {
                    let result = remote.fetch_fixed_code(&challenge_id).await;
                    let _ = tx.send(Event::FixedCodeLoaded { session, result });
                });
            }
            Effect::SubmitAnswer { session, challenge_id, encoded_selection, used_diff } => {
                let remote = Arc::clone(&self.remote);
                tokio::spawn(async move {
                    let result = remote
                        .submit_answer(&challenge_id, &encoded_selection, used_diff)
                        .await;
                    let _ = tx.send(Event::SubmissionFinished { session, result });
                });
            }
            Effect::ReenableSubmitAfter { session, delay } => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Event::SubmitCooldownElapsed { session });
                });
            }
            Effect::Highlight { pane, code } => {
                let delay = self.cfg.highlight_delay();
                if delay.is_zero() {
                    highlight_quietly(self.highlighter.as_ref(), pane, &code);
                } else {
                    let highlighter = Arc::clone(&self.highlighter);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        highlight_quietly(highlighter.as_ref(), pane, &code);
                    });
                }
            }
        }
    }
}
