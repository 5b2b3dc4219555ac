//! Prompt commands.

use anyhow::{Context as _, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  Login(String),
  Signup,
  Onboard,
  Back,
  Start,
  Record,
  Stop,
  Mood(u8),
  Submit,
  New,
  Logout,
  Status,
  Help,
  Quit,
}

pub const HELP: &str = "\
commands:
  login <email>   sign in
  signup          create an account
  onboard         fill in the new-account form
  back            previous view
  start           begin a check-in
  record / stop   capture your voice note
  mood <1-5>      rate how you feel
  submit          send the check-in
  new             start over after a check-in
  logout          forget this device's sign-in
  status          show where you are
  quit";

impl Command {
  /// Parse one input line. Blank lines yield `None`.
  pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
      return Ok(None);
    };
    let arg = words.next();
    if words.next().is_some() {
      bail!("too many arguments for `{verb}`");
    }

    let command = match (verb.to_ascii_lowercase().as_str(), arg) {
      ("login", Some(email)) => Self::Login(email.to_string()),
      ("login", None) => bail!("usage: login <email>"),
      ("mood", Some(n)) => Self::Mood(
        n.parse()
          .with_context(|| format!("`{n}` is not a mood rating"))?,
      ),
      ("mood", None) => bail!("usage: mood <1-5>"),
      (_, Some(_)) => bail!("`{verb}` takes no argument"),
      ("signup", None) => Self::Signup,
      ("onboard", None) => Self::Onboard,
      ("back", None) => Self::Back,
      ("start", None) => Self::Start,
      ("record", None) => Self::Record,
      ("stop", None) => Self::Stop,
      ("submit", None) => Self::Submit,
      ("new", None) => Self::New,
      ("logout", None) => Self::Logout,
      ("status", None) => Self::Status,
      ("help" | "?", None) => Self::Help,
      ("quit" | "exit", None) => Self::Quit,
      _ => bail!("unknown command `{verb}`; try `help`"),
    };
    Ok(Some(command))
  }
}
