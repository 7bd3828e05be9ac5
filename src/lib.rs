//! Auditor CTF client.
//!
//! Session controller for the vulnerability-classification quiz: fetch a vulnerable code
//! sample, optionally reveal the fixed version (at a score penalty), submit a CWE
//! classification and show the scored result.
//!
//! - `logic::step` holds every state transition and is pure
//! - `controller::Controller` runs effects on tokio and feeds completions back
//! - `remote::HttpRemote` speaks the service's HTTP contract
//! - rendering and highlighting are traits (`render::Renderer`, `highlight::Highlighter`)

pub mod catalog;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod highlight;
pub mod logic;
pub mod protocol;
pub mod remote;
pub mod render;
pub mod state;
pub mod telemetry;
pub mod util;

pub use config::ClientConfig;
pub use controller::Controller;
pub use domain::{Challenge, ChallengeId, SubmissionResult};
pub use error::{HttpError, ServiceError, UserInputError};
pub use logic::{Effect, Event};
pub use remote::{HttpRemote, RemoteService};
pub use render::{RenderCommand, Renderer};
pub use state::{Phase, Session, SessionId};
