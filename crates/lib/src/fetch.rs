//! Repository retrieval.
//!
//! Clones every manifest entry into the output directory with the `git`
//! client. For IMP itself, submodules are initialised and the one-time
//! `setup_git.py` step is run inside the checkout. Checkouts left by a
//! previous run are reused as long as they still open as git repositories;
//! IMP's submodule and setup steps run again on a reused checkout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::exec::{CommandRunner, CommandSpec, ExecError};
use crate::manifest::{SourceEntry, SourceKind, SourceManifest};
use crate::prereq::{GIT, PYTHON};

/// Errors that can occur during fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("failed to create directory '{}': {source}", path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to clone '{url}': {detail}")]
  Clone { url: String, detail: String },

  #[error("failed to initialise submodules in '{}': {detail}", path.display())]
  Submodules { path: PathBuf, detail: String },

  #[error("setup step failed in '{}': {detail}", path.display())]
  Setup { path: PathBuf, detail: String },

  #[error(transparent)]
  Exec(#[from] ExecError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum FetchStatus {
  Cloned,
  /// An existing checkout was found at the destination.
  Reused,
  /// Failed, tolerated because of continue-on-error.
  Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
  pub dir: String,
  pub path: PathBuf,
  pub status: FetchStatus,
  /// Commit checked out at `path`, when it could be read.
  pub commit: Option<String>,
}

/// Fetch every manifest entry into `dest_root/<dir>`.
///
/// With `continue_on_error`, a failing entry is recorded as
/// [`FetchStatus::Failed`] and the remaining entries are still fetched;
/// otherwise the first failure is returned.
pub fn fetch_sources(
  runner: &dyn CommandRunner,
  manifest: &SourceManifest,
  dest_root: &Path,
  continue_on_error: bool,
) -> Result<Vec<FetchOutcome>, FetchError> {
  fs::create_dir_all(dest_root).map_err(|source| FetchError::CreateDir {
    path: dest_root.to_path_buf(),
    source,
  })?;

  let mut outcomes = Vec::with_capacity(manifest.len());
  for entry in manifest.entries() {
    let path = dest_root.join(entry.dir);
    let status = match fetch_entry(runner, entry, &path) {
      Ok(status) => status,
      Err(e) if continue_on_error => {
        warn!(dir = entry.dir, error = %e, "fetch failed, continuing");
        FetchStatus::Failed(e.to_string())
      }
      Err(e) => return Err(e),
    };

    outcomes.push(FetchOutcome {
      dir: entry.dir.to_string(),
      commit: head_commit(&path),
      path,
      status,
    });
  }

  Ok(outcomes)
}

fn fetch_entry(runner: &dyn CommandRunner, entry: &SourceEntry, path: &Path) -> Result<FetchStatus, FetchError> {
  let status = if is_repository(path) {
    info!(dir = entry.dir, path = %path.display(), "reusing existing checkout");
    FetchStatus::Reused
  } else {
    info!(dir = entry.dir, url = entry.url, "cloning repository");
    let clone = CommandSpec::new(GIT)
      .arg("clone")
      .arg(entry.url)
      .arg(path.display().to_string());
    let output = runner.run(&clone)?;
    if !output.success() {
      return Err(FetchError::Clone {
        url: entry.url.to_string(),
        detail: output.failure_detail(),
      });
    }
    FetchStatus::Cloned
  };

  // Both steps are idempotent; a reused checkout may come from a run that
  // stopped between the clone and the setup.
  if entry.kind == SourceKind::Main {
    prepare_main_checkout(runner, path)?;
  }

  Ok(status)
}

fn prepare_main_checkout(runner: &dyn CommandRunner, path: &Path) -> Result<(), FetchError> {
  debug!(path = %path.display(), "initialising submodules");
  let output = runner.run(
    &CommandSpec::new(GIT)
      .args(["submodule", "update", "--init"])
      .current_dir(path),
  )?;
  if !output.success() {
    return Err(FetchError::Submodules {
      path: path.to_path_buf(),
      detail: output.failure_detail(),
    });
  }

  debug!(path = %path.display(), "running setup_git.py");
  let output = runner.run(&CommandSpec::new(PYTHON).arg("setup_git.py").current_dir(path))?;
  if !output.success() {
    return Err(FetchError::Setup {
      path: path.to_path_buf(),
      detail: output.failure_detail(),
    });
  }
  Ok(())
}

/// Whether `path` opens as a git repository.
pub fn is_repository(path: &Path) -> bool {
  path.join(".git").exists() && gix::open(path).is_ok()
}

/// Commit id of HEAD at `path`, if it is a repository with at least one commit.
pub fn head_commit(path: &Path) -> Option<String> {
  let repo = gix::open(path).ok()?;
  let id = repo.head_id().ok()?;
  Some(id.to_string())
}
