//! Auditor CTF · console client
//!
//! - Loads vulnerable code samples from the Auditor service
//! - Optional fixed-code reveal (score penalty), CWE classification, scored results
//! - Commands on stdin, output on stdout, logs on stderr
//!
//! Important env variables:
//!   AUDITOR_BASE_URL       : service root (default "http://127.0.0.1:5000")
//!   AUDITOR_SESSION_COOKIE : raw Cookie header for an authenticated session
//!   AUDITOR_DIFFICULTY     : difficulty of the first challenge (default "easy")
//!   AUDITOR_CONFIG_PATH    : path to TOML config (timings + wording)
//!   LOG_LEVEL              : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT             : "pretty" (default) or "json"

mod console;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use auditor_client::highlight::NoHighlight;
use auditor_client::{telemetry, ClientConfig, Controller, HttpRemote};

use crate::console::{read_commands, ConsoleRenderer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = ClientConfig::from_env();
  let remote = HttpRemote::new(&cfg)?;
  info!(
    target: "auditor_client",
    base_url = %remote.base_url(),
    difficulty = %cfg.start_difficulty,
    authenticated = cfg.session_cookie.is_some(),
    "Auditor client starting"
  );

  let mut controller = Controller::new(
    cfg,
    Arc::new(remote),
    Box::new(ConsoleRenderer::new()),
    Arc::new(NoHighlight),
  );
  controller.start();

  // Console input runs on its own task; closing the channel ends the controller loop.
  let (tx, rx) = mpsc::unbounded_channel();
  let input = tokio::spawn(read_commands(tx));

  let last = controller.run(rx).await;
  input.await?;
  info!(target: "auditor_client", state = last.state_label(), "Auditor client stopped");
  Ok(())
}
