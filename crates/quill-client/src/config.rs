//! Client configuration, read from an optional TOML file and `QUILL_*`
//! environment variables.

use std::path::{Path, PathBuf};

use quill_core::DEFAULT_GUEST_NOTE_LIMIT;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
  /// Base URL of the Quill server.
  pub base_url:         String,
  /// Directory holding guest notes and the stored session.
  pub data_dir:         PathBuf,
  pub guest_note_limit: usize,
}

impl ClientConfig {
  pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
    let mut builder = config::Config::builder()
      .set_default("base_url", "http://127.0.0.1:5280")?
      .set_default("data_dir", "~/.local/share/quill/client")?
      .set_default("guest_note_limit", DEFAULT_GUEST_NOTE_LIMIT as u64)?;

    if let Some(path) = file {
      builder = builder.add_source(config::File::from(path).required(false));
    }

    let mut cfg: Self = builder
      .add_source(config::Environment::with_prefix("QUILL"))
      .build()?
      .try_deserialize()?;
    cfg.data_dir = expand_tilde(&cfg.data_dir);
    Ok(cfg)
  }
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

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_values_override_defaults() {
    let dir = std::env::temp_dir().join(format!("quill-config-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let file = dir.join("client.toml");
    std::fs::write(
      &file,
      "base_url = \"http://notes.test\"\ndata_dir = \"/tmp/quill-data\"\nguest_note_limit = 5\n",
    )
    .unwrap();

    let cfg = ClientConfig::load(Some(&file)).unwrap();
    assert_eq!(cfg.base_url, "http://notes.test");
    assert_eq!(cfg.data_dir, PathBuf::from("/tmp/quill-data"));
    assert_eq!(cfg.guest_note_limit, 5);
    std::fs::remove_dir_all(&dir).ok();
  }

  #[test]
  fn missing_file_falls_back_to_defaults() {
    let cfg = ClientConfig::load(Some(Path::new("/nonexistent/quill.toml"))).unwrap();
    assert_eq!(cfg.guest_note_limit, DEFAULT_GUEST_NOTE_LIMIT);
  }
}
