//! Shell profile integration.
//!
//! The exports live in a fragment inside the output directory that is
//! regenerated on every run. The user's startup file only receives a guarded
//! line sourcing that fragment, appended once.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{APP_NAME, PMI_ANALYSIS_DIR};
use crate::platform::Shell;

/// Comment written above the source line in the startup file.
pub const PROFILE_MARKER: &str = "added by impforge";

#[derive(Debug, Error)]
pub enum ProfileError {
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
  pub fragment: PathBuf,
  pub startup_file: PathBuf,
  /// False when the startup file already sourced the fragment.
  pub appended: bool,
}

pub fn fragment_path(out_dir: &Path, shell: Shell) -> PathBuf {
  out_dir.join(format!("{}-env.{}", APP_NAME, shell.script_extension()))
}

/// Fragment contents: the analysis tools on `PYTHONPATH` and `IMPENV`
/// pointing at the IMP environment setup script.
pub fn render_fragment(shell: Shell, out_dir: &Path) -> String {
  let pyext = out_dir.join(PMI_ANALYSIS_DIR).join("pyext").join("src");
  let setup = out_dir.join("imp_release").join("setup_environment.sh");
  let lines = [
    shell.header().to_string(),
    shell.comment(&format!("generated by {}, rewritten on every install", APP_NAME)),
    shell.append_path("PYTHONPATH", &pyext.display().to_string()),
    shell.export_var("IMPENV", &setup.display().to_string()),
  ];
  format!("{}\n", lines.join("\n"))
}

pub fn write_fragment(shell: Shell, out_dir: &Path) -> Result<PathBuf, ProfileError> {
  let path = fragment_path(out_dir, shell);
  fs::write(&path, render_fragment(shell, out_dir)).map_err(|source| ProfileError::Write {
    path: path.clone(),
    source,
  })?;
  debug!(path = %path.display(), "wrote shell fragment");
  Ok(path)
}

/// Append the source line for `fragment` to `startup_file` unless it is already there.
///
/// Returns whether anything was appended.
pub fn ensure_sourced(shell: Shell, startup_file: &Path, fragment: &Path) -> Result<bool, ProfileError> {
  let line = shell.source_line(fragment);
  let existing = match fs::read_to_string(startup_file) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
    Err(source) => {
      return Err(ProfileError::Read {
        path: startup_file.to_path_buf(),
        source,
      });
    }
  };

  if existing.lines().any(|l| l.trim() == line) {
    info!(file = %startup_file.display(), "shell profile already up to date");
    return Ok(false);
  }

  let write_err = |source: io::Error| ProfileError::Write {
    path: startup_file.to_path_buf(),
    source,
  };
  if let Some(parent) = startup_file.parent() {
    fs::create_dir_all(parent).map_err(write_err)?;
  }

  let mut block = String::new();
  if !existing.is_empty() && !existing.ends_with('\n') {
    block.push('\n');
  }
  block.push('\n');
  block.push_str(&shell.comment(PROFILE_MARKER));
  block.push('\n');
  block.push_str(&line);
  block.push('\n');

  let mut file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(startup_file)
    .map_err(write_err)?;
  file.write_all(block.as_bytes()).map_err(write_err)?;

  info!(file = %startup_file.display(), "added environment to shell profile");
  Ok(true)
}

/// Regenerate the fragment and make sure `startup_file` sources it.
pub fn update_shell_profile(shell: Shell, out_dir: &Path, startup_file: &Path) -> Result<ProfileUpdate, ProfileError> {
  let fragment = write_fragment(shell, out_dir)?;
  let appended = ensure_sourced(shell, startup_file, &fragment)?;
  Ok(ProfileUpdate {
    fragment,
    startup_file: startup_file.to_path_buf(),
    appended,
  })
}
