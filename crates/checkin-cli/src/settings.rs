//! Layered settings: defaults, then the TOML file, then `CHECKIN_*`
//! environment variables, then command-line flags.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use checkin_capture::CaptureConfig;
use checkin_client::ClientConfig;
use serde::Deserialize;

use crate::Cli;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
  #[serde(default = "default_base_url")]
  pub base_url:             String,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  #[serde(default = "default_secs")]
  pub request_timeout_secs: u64,
  #[serde(default = "default_secs")]
  pub ceiling_secs:         u64,
}

fn default_base_url() -> String { "http://127.0.0.1:8000".to_string() }

fn default_store_path() -> PathBuf { PathBuf::from("~/.checkin/auth.db") }

fn default_secs() -> u64 { 30 }

impl Settings {
  pub fn load(cli: &Cli) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(cli.config.clone()).required(false))
      .add_source(config::Environment::with_prefix("CHECKIN"))
      .set_override_option("base_url", cli.base_url.clone())?
      .set_override_option("store_path", cli.store_path.clone())?
      .set_override_option("ceiling_secs", ceiling_override(cli.ceiling_secs)?)?
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    if settings.ceiling_secs == 0 {
      anyhow::bail!("ceiling_secs must be at least 1");
    }
    if settings.request_timeout_secs == 0 {
      anyhow::bail!("request_timeout_secs must be at least 1");
    }
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }

  pub fn client(&self) -> ClientConfig {
    ClientConfig {
      base_url: self.base_url.clone(),
      timeout:  Duration::from_secs(self.request_timeout_secs),
    }
  }

  pub fn capture(&self) -> CaptureConfig {
    CaptureConfig { ceiling: Duration::from_secs(self.ceiling_secs) }
  }
}

// `config` stores integers as i64.
fn ceiling_override(secs: Option<u64>) -> anyhow::Result<Option<i64>> {
  secs
    .map(i64::try_from)
    .transpose()
    .context("--ceiling-secs is out of range")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
