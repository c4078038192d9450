//! Prerequisite checks run before anything touches the network.

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Mode;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec, ExecError};

pub const GIT: &str = "git";
pub const CONDA: &str = "conda";
pub const PYTHON: &str = "python3";
pub const BASH: &str = "bash";

#[derive(Debug, Error)]
pub enum PrerequisiteError {
  #[error("required program '{program}' not found on PATH")]
  Missing { program: String },

  #[error("required program '{program}' is not usable: {detail}")]
  Unusable { program: String, detail: String },

  #[error("python 3 is required for the IMP setup step, found: {found}")]
  UnsupportedInterpreter { found: String },
}

/// Programs a mode needs. Python and bash are only needed to build IMP.
pub fn required_programs(mode: Mode) -> Vec<&'static str> {
  let mut programs = vec![GIT, CONDA];
  if mode.builds_from_source() {
    programs.extend([PYTHON, BASH]);
  }
  programs
}

/// Verify every program the mode needs answers `--version`, and that the
/// interpreter used for IMP's setup script is python 3.
pub fn check_prerequisites(runner: &dyn CommandRunner, mode: Mode) -> Result<(), PrerequisiteError> {
  for program in required_programs(mode) {
    let output = probe(runner, program)?;
    if program == PYTHON {
      let version = version_text(&output);
      if parse_python_major(&version) != Some(3) {
        return Err(PrerequisiteError::UnsupportedInterpreter { found: version });
      }
    }
    debug!(program, version = %version_text(&output), "prerequisite found");
  }
  info!(mode = %mode, "prerequisites satisfied");
  Ok(())
}

fn probe(runner: &dyn CommandRunner, program: &str) -> Result<CommandOutput, PrerequisiteError> {
  let output = runner
    .run(&CommandSpec::new(program).arg("--version"))
    .map_err(|e| match e {
      ExecError::NotFound { .. } => PrerequisiteError::Missing {
        program: program.to_string(),
      },
      other => PrerequisiteError::Unusable {
        program: program.to_string(),
        detail: other.to_string(),
      },
    })?;

  if !output.success() {
    return Err(PrerequisiteError::Unusable {
      program: program.to_string(),
      detail: output.failure_detail(),
    });
  }
  Ok(output)
}

/// Older interpreters print their version on stderr.
fn version_text(output: &CommandOutput) -> String {
  let stdout = output.stdout.trim();
  if stdout.is_empty() {
    output.stderr.trim().to_string()
  } else {
    stdout.to_string()
  }
}

/// Extract the major version from `Python 3.11.4`.
pub fn parse_python_major(version: &str) -> Option<u32> {
  version
    .split_whitespace()
    .find(|word| word.starts_with(|c: char| c.is_ascii_digit()))
    .and_then(|v| v.split('.').next())
    .and_then(|major| major.parse().ok())
}
