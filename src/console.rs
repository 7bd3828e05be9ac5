//! Line-oriented console front-end: stdin commands in, render commands printed to stdout.

use std::collections::HashMap;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error};

use auditor_client::catalog::{cwe_name, is_known_difficulty, resolve_selection, CWE_CLASSES, DIFFICULTIES};
use auditor_client::render::{CodeLayout, Control, Panel, RenderCommand, Renderer};
use auditor_client::Event;

const HELP: &str = "\
commands:
  difficulty <easy|medium|hard|insane>   load a challenge at that difficulty
  new | next                             load another challenge
  diff                                   show/hide the fixed code (score penalty)
  select <CWE-id | number | #index>      choose the vulnerability type
  submit                                 submit the selected type
  list                                   list vulnerability types
  help                                   this text
  quit                                   exit";

#[derive(Debug, PartialEq)]
pub enum Command {
  Difficulty(String),
  New,
  Diff,
  Select(String),
  Submit,
  List,
  Help,
  Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
  let mut parts = line.trim().splitn(2, char::is_whitespace);
  let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
  let arg = parts.next().map(str::trim).unwrap_or_default();

  match verb.as_str() {
    "difficulty" | "d" => {
      let d = arg.to_ascii_lowercase();
      if is_known_difficulty(&d) {
        Ok(Command::Difficulty(d))
      } else {
        Err(format!("unknown difficulty '{arg}' (one of: {})", DIFFICULTIES.join(", ")))
      }
    }
    "new" | "next" | "n" => Ok(Command::New),
    "diff" => Ok(Command::Diff),
    "select" | "s" => resolve_selection(arg)
      .map(Command::Select)
      .ok_or_else(|| format!("cannot read '{arg}' as a CWE id (try 'list')")),
    "submit" => Ok(Command::Submit),
    "list" | "ls" => Ok(Command::List),
    "help" | "?" => Ok(Command::Help),
    "quit" | "exit" | "q" => Ok(Command::Quit),
    "" => Err(String::new()),
    other => Err(format!("unknown command '{other}' (try 'help')")),
  }
}

/// Read stdin until EOF or `quit`, forwarding session events. Dropping `tx` stops the controller.
pub async fn read_commands(tx: mpsc::UnboundedSender<Event>) {
  println!("{HELP}");
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  loop {
    let line = match lines.next_line().await {
      Ok(Some(line)) => line,
      Ok(None) => break,
      Err(e) => {
        error!(target: "auditor_client", error = %e, "stdin read failed");
        break;
      }
    };
    let event = match parse_command(&line) {
      Ok(Command::Difficulty(d)) => Event::SelectDifficulty(d),
      Ok(Command::New) => Event::NewChallenge,
      Ok(Command::Diff) => Event::ToggleDiff,
      Ok(Command::Select(cwe)) => {
        println!("selected {cwe}{}", cwe_name(&cwe).map(|n| format!(" ({n})")).unwrap_or_default());
        Event::Choose(Some(cwe))
      }
      Ok(Command::Submit) => Event::Submit,
      Ok(Command::List) => {
        for (i, (id, name)) in CWE_CLASSES.iter().enumerate() {
          println!("  #{:<2} {id:<8} {name}", i + 1);
        }
        continue;
      }
      Ok(Command::Help) => {
        println!("{HELP}");
        continue;
      }
      Ok(Command::Quit) => break,
      Err(msg) => {
        if !msg.is_empty() {
          println!("? {msg}");
        }
        continue;
      }
    };
    if tx.send(event).is_err() {
      break;
    }
  }
  debug!(target: "auditor_client", "Console input finished");
}

/// Prints render commands as plain text. Control changes are printed only when they differ
/// from what was last shown.
#[derive(Default)]
pub struct ConsoleRenderer {
  controls: HashMap<Control, (bool, String)>,
  side_by_side: bool,
}

impl ConsoleRenderer {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Renderer for ConsoleRenderer {
  fn render(&mut self, cmd: &RenderCommand) {
    match cmd {
      RenderCommand::ShowLoading(true) => println!("… loading challenge"),
      RenderCommand::ShowLoading(false) | RenderCommand::HideError => {}
      RenderCommand::ShowError(msg) => println!("! {msg}"),
      RenderCommand::ClearChallenge { .. } | RenderCommand::ClearSelection => {}
      RenderCommand::ShowChallenge { id, title, difficulty, cve_id, code } => {
        println!();
        println!("== {title} [id {id}, {difficulty}]{}", cve_id.as_deref().map(|c| format!(" {c}")).unwrap_or_default());
        print_code(code);
      }
      RenderCommand::SetDifficulty(d) => debug!(target: "auditor_client", difficulty = %d, "Difficulty synced"),
      RenderCommand::ShowPanel { panel: Panel::Assessment, visible: true } => {
        println!("-- choose a vulnerability type ('select <cwe>', then 'submit')");
      }
      RenderCommand::ShowPanel { .. } => {}
      RenderCommand::SetCodeLayout { layout: CodeLayout::SideBySide { fixed_code }, title } => {
        self.side_by_side = true;
        println!("== {title}: fixed code");
        print_code(fixed_code);
      }
      RenderCommand::SetCodeLayout { layout: CodeLayout::Single, title } => {
        if self.side_by_side {
          println!("== {title}: fixed code hidden");
        }
        self.side_by_side = false;
      }
      RenderCommand::ShowResult(view) => {
        println!();
        println!("** {}", view.headline);
        println!("   {}", view.score_line);
        println!("   Correct Vulnerability Type: {}", view.correct_answer);
        println!("   {}", view.solution);
        if let (Some(total), Some(done)) = (view.total_score, view.completed_count) {
          println!("   Total score: {total} | Completed: {done}");
        }
        println!("-- 'next' for another challenge");
      }
      RenderCommand::SetControl { control, enabled, label } => {
        let next = (*enabled, label.clone());
        if self.controls.get(control) != Some(&next) {
          let name = match control {
            Control::Submit => "submit",
            Control::Diff => "diff",
            Control::NewChallenge => "new",
          };
          let state = if *enabled { label.as_str() } else { "(disabled)" };
          debug!(target: "auditor_client", control = name, enabled, %label, "Control changed");
          if *control == Control::Submit && *enabled {
            println!("   [{name}] {state}");
          }
          self.controls.insert(*control, next);
        }
      }
    }
  }
}

fn print_code(code: &str) {
  for (n, line) in code.lines().enumerate() {
    println!("{:>4} | {line}", n + 1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_commands() {
    assert_eq!(parse_command("difficulty Hard"), Ok(Command::Difficulty("hard".into())));
    assert_eq!(parse_command("  next "), Ok(Command::New));
    assert_eq!(parse_command("select 89"), Ok(Command::Select("CWE-89".into())));
    assert_eq!(parse_command("s #2"), Ok(Command::Select("CWE-120".into())));
    assert_eq!(parse_command("q"), Ok(Command::Quit));
    assert!(parse_command("difficulty trivial").is_err());
    assert!(parse_command("select injection").is_err());
    assert_eq!(parse_command(""), Err(String::new()));
  }
}
