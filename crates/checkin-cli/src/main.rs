//! `checkin` — the employee wellness check-in, at a terminal prompt.
//!
//! # Usage
//!
//! ```
//! checkin --base-url https://wellness.example
//! checkin --config ~/.config/checkin.toml
//! ```
//!
//! Recording needs the `cpal` feature:
//!
//! ```
//! cargo run -p checkin-cli --features cpal
//! ```

mod command;
mod microphone;
mod settings;

use std::{io::Write as _, path::PathBuf};

use anyhow::Context as _;
use checkin_capture::{CaptureState, Microphone, StopReason};
use checkin_client::HttpBackend;
use checkin_core::{
  backend::WellnessBackend,
  identity::OnboardingProfile,
  store::FactStore,
  view::View,
};
use checkin_session::{CheckIn, CheckInError};
use checkin_store_sqlite::SqliteStore;
use clap::Parser;
use command::{Command, HELP};
use settings::Settings;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "checkin", version, about = "Employee wellness check-in")]
pub struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "checkin.toml")]
  pub config: PathBuf,

  /// Base URL of the wellness service.
  #[arg(long, env = "CHECKIN_BASE_URL")]
  pub base_url: Option<String>,

  /// Where the sign-in is remembered between runs.
  #[arg(long, env = "CHECKIN_STORE_PATH")]
  pub store_path: Option<String>,

  /// Longest a single recording may run, in seconds.
  #[arg(long, env = "CHECKIN_CEILING_SECS")]
  pub ceiling_secs: Option<u64>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli)?;

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
  let backend = HttpBackend::new(settings.client()).context("failed to build HTTP client")?;

  let mut app = CheckIn::open(
    store,
    backend,
    microphone::default_microphone(),
    settings.capture(),
  )
  .await;

  println!("{HELP}\n");
  run(&mut app, settings.ceiling_secs).await
}

// ─── Prompt loop ──────────────────────────────────────────────────────────────

type Input = Lines<BufReader<Stdin>>;

async fn run<S, B, M>(app: &mut CheckIn<S, B, M>, ceiling_secs: u64) -> anyhow::Result<()>
where
  S: FactStore,
  B: WellnessBackend,
  M: Microphone,
{
  let mut input = BufReader::new(tokio::io::stdin()).lines();
  let mut states = app.capture().subscribe();
  let mut watching = false;

  show_view(app);
  loop {
    prompt(app.view());
    let line = tokio::select! {
      line = input.next_line() => line.context("failed to read stdin")?,
      Ok(()) = states.changed(), if watching => {
        if *states.borrow_and_update() == CaptureState::Stopped {
          watching = false;
          let reason = app.capture().stop_reason();
          println!("\n{}", auto_stop_notice(reason, ceiling_secs));
        }
        continue;
      }
    };
    let Some(line) = line else { break };

    let command = match Command::parse(&line) {
      Ok(Some(command)) => command,
      Ok(None) => continue,
      Err(error) => {
        println!("{error:#}");
        continue;
      }
    };

    match command {
      Command::Quit => break,
      Command::Record => watching = false,
      Command::Stop => watching = false,
      _ => {}
    }
    let before = app.view();
    let recording = command == Command::Record;

    match dispatch(app, command, &mut input).await {
      Ok(()) => {
        if recording {
          states.borrow_and_update();
          watching = true;
        }
        if app.view() != before {
          show_view(app);
        }
      }
      Err(error) => report(&error),
    }
  }

  // Leave nothing recording behind.
  if app.capture().is_recording() {
    let _ = app.stop_recording().await;
  }
  Ok(())
}

async fn dispatch<S, B, M>(
  app: &mut CheckIn<S, B, M>,
  command: Command,
  input: &mut Input,
) -> anyhow::Result<()>
where
  S: FactStore,
  B: WellnessBackend,
  M: Microphone,
{
  match command {
    Command::Login(email) => app.login(&email).await?,
    Command::Signup => app.show_onboarding()?,
    Command::Onboard => {
      let profile = read_profile(input).await?;
      app.onboard(&profile).await?;
    }
    Command::Back => app.back().await?,
    Command::Start => app.start_session().await?,
    Command::Record => {
      app.start_recording().await?;
      println!("recording… `stop` when you are done");
    }
    Command::Stop => {
      let artifact = app.stop_recording().await?;
      println!(
        "recorded {:.1}s ({} bytes)",
        artifact.duration.as_secs_f32(),
        artifact.len()
      );
    }
    Command::Mood(value) => {
      let mood = app.select_mood(value)?;
      println!("mood: {} ({})", mood.value(), mood.label());
    }
    Command::Submit => {
      println!("submitting…");
      app.submit().await?;
    }
    Command::New => app.new_session()?,
    Command::Logout => app.logout().await?,
    Command::Status => show_status(app),
    Command::Help => println!("{HELP}"),
    Command::Quit => {}
  }
  Ok(())
}

async fn read_profile(input: &mut Input) -> anyhow::Result<OnboardingProfile> {
  let mut profile = OnboardingProfile::new(
    ask(input, "name").await?,
    ask(input, "email").await?,
    ask(input, "department").await?,
    ask(input, "role").await?,
  );
  profile.github = optional(ask(input, "github (optional)").await?);
  profile.linkedin = optional(ask(input, "linkedin (optional)").await?);
  profile.cultural_background = optional(ask(input, "cultural background (optional)").await?);
  if let Some(language) = optional(ask(input, "preferred language [en]").await?) {
    profile.preferred_language = language;
  }
  Ok(profile)
}

async fn ask(input: &mut Input, label: &str) -> anyhow::Result<String> {
  print!("  {label}: ");
  std::io::stdout().flush().ok();
  let line = input
    .next_line()
    .await
    .context("failed to read stdin")?
    .context("input closed")?;
  Ok(line.trim().to_string())
}

fn optional(value: String) -> Option<String> { (!value.is_empty()).then_some(value) }

// ─── Output ───────────────────────────────────────────────────────────────────

fn prompt(view: View) {
  print!("{}> ", view.to_string().to_lowercase());
  std::io::stdout().flush().ok();
}

fn show_view<S, B, M>(app: &CheckIn<S, B, M>)
where
  S: FactStore,
  B: WellnessBackend,
  M: Microphone,
{
  let name = app.identity().map(|id| id.display_name.as_str()).unwrap_or_default();
  match app.view() {
    View::Login => println!("── Sign in ── `login <email>` or `signup`"),
    View::Onboarding => println!("── New account ── `onboard` or `back`"),
    View::Welcome => println!("── Welcome, {name} ── `start` a check-in or `logout`"),
    View::Session => println!("── Check-in ── `record`, `stop`, `mood <1-5>`, `submit`"),
    View::Complete => {
      let message = app
        .last_outcome()
        .and_then(|o| o.summary_str("message"))
        .unwrap_or("check-in recorded");
      println!("── Thanks, {name} ── {message}. `new` or `logout`");
    }
  }
}

fn show_status<S, B, M>(app: &CheckIn<S, B, M>)
where
  S: FactStore,
  B: WellnessBackend,
  M: Microphone,
{
  println!("view:    {}", app.view());
  if let Some(id) = app.identity() {
    println!("user:    {} ({})", id.display_name, id.employee_id);
  }
  println!("capture: {:?}", app.capture_state());
  if let Some(mood) = app.mood() {
    println!("mood:    {} ({})", mood.value(), mood.label());
  }
  if let Some(artifact) = app.artifact() {
    println!("audio:   {} bytes, {}", artifact.len(), artifact.content_type);
  }
}

/// What to say when a recording ends without a `stop` command.
fn auto_stop_notice(reason: Option<StopReason>, ceiling_secs: u64) -> String {
  match reason {
    Some(StopReason::Ceiling) => {
      format!("recording reached the {ceiling_secs}s limit; `stop` keeps it")
    }
    Some(StopReason::SourceClosed) => {
      "the microphone went away; `stop` keeps what was recorded".to_string()
    }
    Some(StopReason::Requested) | None => "recording stopped; `stop` keeps it".to_string(),
  }
}

fn report(error: &anyhow::Error) {
  match error.downcast_ref::<CheckInError>() {
    Some(e) if e.is_recoverable() => println!("{e}; you can try again"),
    Some(e) => {
      tracing::debug!(error = %e, "command refused");
      println!("{e}");
    }
    None => println!("{error:#}"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn auto_stop_notice_names_the_cause() {
    assert_eq!(
      auto_stop_notice(Some(StopReason::Ceiling), 30),
      "recording reached the 30s limit; `stop` keeps it"
    );
    let unplugged = auto_stop_notice(Some(StopReason::SourceClosed), 30);
    assert!(unplugged.starts_with("the microphone went away"));
    assert!(!unplugged.contains("limit"));
  }
}
