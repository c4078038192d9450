use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use super::{InstallReport, Stage};
use crate::build::BuildError;
use crate::buildlog::LogError;
use crate::conda::CondaError;
use crate::fetch::FetchError;
use crate::platform::PlatformError;
use crate::prereq::PrerequisiteError;
use crate::profile::ProfileError;
use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum InstallError {
  #[error(transparent)]
  Prerequisite(#[from] PrerequisiteError),

  #[error("failed to create output directory {}: {source}", path.display())]
  OutDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error(transparent)]
  Conda(#[from] CondaError),

  #[error(transparent)]
  Platform(#[from] PlatformError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  Log(#[from] LogError),

  #[error(transparent)]
  Profile(#[from] ProfileError),

  #[error("failed to read confirmation: {0}")]
  Prompt(#[source] io::Error),

  #[error("build aborted at confirmation prompt")]
  Aborted,
}

/// Error classes, each with its own process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  MissingPrerequisite,
  UnsupportedInterpreterVersion,
  UnsupportedPlatform,
  TemplateNotFound,
  TemplateMalformed,
  Fetch,
  EnvCreation,
  Build,
  Io,
  Aborted,
}

impl ErrorKind {
  pub fn exit_code(&self) -> i32 {
    match self {
      ErrorKind::MissingPrerequisite => 10,
      ErrorKind::UnsupportedInterpreterVersion => 11,
      ErrorKind::UnsupportedPlatform => 12,
      ErrorKind::TemplateNotFound => 13,
      ErrorKind::TemplateMalformed => 14,
      ErrorKind::Fetch => 20,
      ErrorKind::EnvCreation => 21,
      ErrorKind::Build => 22,
      ErrorKind::Io => 30,
      ErrorKind::Aborted => 40,
    }
  }
}

impl InstallError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      InstallError::Prerequisite(PrerequisiteError::UnsupportedInterpreter { .. }) => {
        ErrorKind::UnsupportedInterpreterVersion
      }
      InstallError::Prerequisite(_) => ErrorKind::MissingPrerequisite,
      InstallError::Fetch(FetchError::CreateDir { .. }) => ErrorKind::Io,
      InstallError::Fetch(_) => ErrorKind::Fetch,
      InstallError::Template(TemplateError::NotFound { .. }) => ErrorKind::TemplateNotFound,
      InstallError::Template(TemplateError::Malformed { .. }) => ErrorKind::TemplateMalformed,
      InstallError::Template(_) => ErrorKind::Io,
      InstallError::Conda(_) => ErrorKind::EnvCreation,
      InstallError::Platform(PlatformError::Unsupported { .. }) => ErrorKind::UnsupportedPlatform,
      InstallError::Platform(PlatformError::NoHomeDirectory) => ErrorKind::Io,
      InstallError::Build(_) => ErrorKind::Build,
      InstallError::OutDir { .. } | InstallError::Log(_) | InstallError::Profile(_) | InstallError::Prompt(_) => {
        ErrorKind::Io
      }
      InstallError::Aborted => ErrorKind::Aborted,
    }
  }

  pub fn exit_code(&self) -> i32 {
    self.kind().exit_code()
  }
}

/// A fatal error together with where it happened and what was done before.
#[derive(Debug, Error)]
#[error("{} failed: {error}", stage.describe())]
pub struct InstallFailure {
  /// The state the orchestrator was working towards.
  pub stage: Stage,
  #[source]
  pub error: InstallError,
  /// Build log carrying the failure, when the output directory existed.
  pub build_log: Option<PathBuf>,
  pub report: InstallReport,
}

impl InstallFailure {
  pub fn exit_code(&self) -> i32 {
    self.error.exit_code()
  }
}
