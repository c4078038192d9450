//! Platform build dispatch.
//!
//! IMP is compiled by a platform-specific shell script that takes the
//! environment name, output directory, disabled modules and process count as
//! positional arguments. The script drops a `.done` marker into the output
//! directory after `make install` succeeds.

mod script;

pub use script::{incremental_script_name, rewrite_build_script, write_incremental_script};

use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::DisabledModules;
use crate::consts::BUILD_DONE_MARKER;
use crate::exec::{CommandRunner, CommandSpec, ExecError};
use crate::platform::Platform;
use crate::prereq::BASH;

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("build script not found: {}", path.display())]
  ScriptNotFound { path: PathBuf },

  #[error("build script {} failed: {detail}", script.display())]
  Failed { script: PathBuf, detail: String },

  #[error("build finished without leaving {}", marker.display())]
  Incomplete { marker: PathBuf },

  #[error("I/O error at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Exec(#[from] ExecError),
}

/// Everything the build script is invoked with.
#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
  pub platform: Platform,
  pub env_name: &'a str,
  pub out_dir: &'a Path,
  pub disabled_modules: &'a DisabledModules,
  pub nproc: NonZeroUsize,
  pub scripts_dir: &'a Path,
}

impl BuildRequest<'_> {
  pub fn script_path(&self) -> PathBuf {
    self.scripts_dir.join(self.platform.build_script())
  }

  pub fn marker_path(&self) -> PathBuf {
    self.out_dir.join(BUILD_DONE_MARKER)
  }

  /// `bash <script> <env> <out_dir> <disabled> <nproc>`, streaming to the terminal.
  pub fn command(&self) -> CommandSpec {
    CommandSpec::new(BASH)
      .arg(self.script_path().display().to_string())
      .arg(self.env_name)
      .arg(self.out_dir.display().to_string())
      .arg(self.disabled_modules.to_arg())
      .arg(self.nproc.to_string())
      .inherit_output()
  }
}

/// Run the platform build script and block until it exits.
///
/// Success needs both a zero exit status and the done marker; a marker left
/// over from an earlier run is removed first.
pub fn dispatch_build(runner: &dyn CommandRunner, request: &BuildRequest<'_>) -> Result<(), BuildError> {
  let script = request.script_path();
  if !script.is_file() {
    return Err(BuildError::ScriptNotFound { path: script });
  }

  let marker = request.marker_path();
  match fs::remove_file(&marker) {
    Ok(()) => debug!(marker = %marker.display(), "removed stale build marker"),
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(source) => return Err(BuildError::Io { path: marker, source }),
  }

  let command = request.command();
  info!(command = %command, "starting build");
  let output = runner.run(&command)?;
  if !output.success() {
    return Err(BuildError::Failed {
      script,
      detail: output.failure_detail(),
    });
  }

  if !marker.is_file() {
    return Err(BuildError::Incomplete { marker });
  }

  info!(platform = %request.platform, "build completed");
  Ok(())
}
