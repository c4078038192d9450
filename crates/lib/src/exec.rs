//! Blocking execution of external tools.
//!
//! Every git, conda, python and build-script invocation goes through the
//! [`CommandRunner`] trait so its exit status and output are captured and the
//! orchestrator can be driven against a test double.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

/// Errors starting a process. A process that ran and failed is not an error
/// here; callers inspect [`CommandOutput`].
#[derive(Debug, Error)]
pub enum ExecError {
  #[error("program not found: {program}")]
  NotFound { program: String },

  #[error("failed to run '{command}': {source}")]
  Spawn {
    command: String,
    #[source]
    source: io::Error,
  },
}

/// What happens to the child's stdout/stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
  /// Collect into [`CommandOutput`].
  #[default]
  Capture,
  /// Stream to the terminal; nothing is collected.
  Inherit,
}

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
  pub output: OutputMode,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      output: OutputMode::Capture,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn inherit_output(mut self) -> Self {
    self.output = OutputMode::Inherit;
    self
  }
}

impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// Exit status and captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  /// `None` when the process was killed by a signal.
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  pub fn ok(stdout: impl Into<String>) -> Self {
    Self {
      code: Some(0),
      stdout: stdout.into(),
      stderr: String::new(),
    }
  }

  pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
    Self {
      code: Some(code),
      stdout: String::new(),
      stderr: stderr.into(),
    }
  }

  pub fn success(&self) -> bool {
    self.code == Some(0)
  }

  /// One-line description of a failure: exit code plus the last stderr line.
  pub fn failure_detail(&self) -> String {
    let code = match self.code {
      Some(code) => format!("exit code {}", code),
      None => "terminated by signal".to_string(),
    };
    match self.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
      Some(line) => format!("{}: {}", code, line.trim()),
      None => code,
    }
  }
}

/// Runs external programs to completion.
pub trait CommandRunner {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError>;
}

/// Runs programs on the host with `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
    let mut command = Command::new(&spec.program);
    command.args(&spec.args);
    if let Some(cwd) = &spec.cwd {
      command.current_dir(cwd);
    }

    debug!(command = %spec, cwd = ?spec.cwd, "spawning process");

    let result = match spec.output {
      OutputMode::Capture => command.stdin(Stdio::null()).output().map(|output| CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
      }),
      OutputMode::Inherit => command.status().map(|status| CommandOutput {
        code: status.code(),
        ..Default::default()
      }),
    };

    let output = result.map_err(|source| {
      // A missing working directory also surfaces as NotFound.
      let cwd_missing = spec.cwd.as_ref().is_some_and(|dir| !dir.is_dir());
      if source.kind() == io::ErrorKind::NotFound && !cwd_missing {
        ExecError::NotFound {
          program: spec.program.clone(),
        }
      } else {
        ExecError::Spawn {
          command: spec.to_string(),
          source,
        }
      }
    })?;

    if !output.stderr.is_empty() {
      debug!(stderr = %output.stderr.trim_end(), "command stderr");
    }
    if !output.stdout.is_empty() {
      debug!(stdout = %output.stdout.trim_end(), "command stdout");
    }
    debug!(command = %spec, code = ?output.code, "process exited");

    Ok(output)
  }
}
