//! Conda environment creation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::exec::{CommandRunner, CommandSpec, ExecError};
use crate::prereq::CONDA;

#[derive(Debug, Error)]
pub enum CondaError {
  #[error("failed to create conda environment '{name}' from {}: {detail}", file.display())]
  Create {
    name: String,
    file: PathBuf,
    detail: String,
  },

  #[error("failed to list conda environments: {detail}")]
  List { detail: String },

  #[error("failed to parse conda environment list: {0}")]
  ParseEnvList(#[from] serde_json::Error),

  #[error(transparent)]
  Exec(#[from] ExecError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentStatus {
  Created,
  /// An environment of that name already existed.
  Reused,
}

#[derive(Debug, Deserialize)]
struct EnvList {
  envs: Vec<PathBuf>,
}

/// Whether conda already knows an environment called `name`.
pub fn environment_exists(runner: &dyn CommandRunner, name: &str) -> Result<bool, CondaError> {
  let output = runner.run(&CommandSpec::new(CONDA).args(["env", "list", "--json"]))?;
  if !output.success() {
    return Err(CondaError::List {
      detail: output.failure_detail(),
    });
  }

  let list: EnvList = serde_json::from_str(&output.stdout)?;
  Ok(list.envs.iter().any(|prefix| prefix.file_name().is_some_and(|n| n == name)))
}

/// Create `env_name` from the definition in `env_file`, then drop the
/// downloaded package tarballs.
pub fn create_environment(
  runner: &dyn CommandRunner,
  env_file: &Path,
  env_name: &str,
) -> Result<EnvironmentStatus, CondaError> {
  if environment_exists(runner, env_name)? {
    info!(env = env_name, "conda environment already exists, reusing");
    return Ok(EnvironmentStatus::Reused);
  }

  info!(env = env_name, file = %env_file.display(), "creating conda environment");
  let output = runner.run(
    &CommandSpec::new(CONDA)
      .args(["env", "create", "-f"])
      .arg(env_file.display().to_string())
      .inherit_output(),
  )?;
  if !output.success() {
    return Err(CondaError::Create {
      name: env_name.to_string(),
      file: env_file.to_path_buf(),
      detail: output.failure_detail(),
    });
  }

  let clean = runner.run(&CommandSpec::new(CONDA).args(["clean", "--tarballs", "--yes"]))?;
  if !clean.success() {
    warn!(detail = %clean.failure_detail(), "conda clean failed");
  }

  Ok(EnvironmentStatus::Created)
}
