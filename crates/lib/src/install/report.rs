use std::path::PathBuf;

use serde::Serialize;

use super::{ErrorKind, Stage};
use crate::conda::EnvironmentStatus;
use crate::config::Mode;
use crate::fetch::FetchOutcome;
use crate::platform::Platform;
use crate::profile::ProfileUpdate;

/// A failure the run kept going past because of continue-on-error.
#[derive(Debug, Clone, Serialize)]
pub struct ToleratedFailure {
  pub stage: Stage,
  pub kind: ErrorKind,
  pub message: String,
}

/// What an install run did.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
  pub mode: Mode,
  /// States reached, in order.
  pub stages: Vec<Stage>,
  pub fetched: Vec<FetchOutcome>,
  pub env_file: Option<PathBuf>,
  pub environment: Option<EnvironmentStatus>,
  pub platform: Option<Platform>,
  /// `None` when no build was attempted.
  pub build_succeeded: Option<bool>,
  pub incremental_script: Option<PathBuf>,
  pub build_log: Option<PathBuf>,
  pub profile: Option<ProfileUpdate>,
  pub failures: Vec<ToleratedFailure>,
}

impl InstallReport {
  pub fn new(mode: Mode) -> Self {
    Self {
      mode,
      stages: Vec::new(),
      fetched: Vec::new(),
      env_file: None,
      environment: None,
      platform: None,
      build_succeeded: None,
      incremental_script: None,
      build_log: None,
      profile: None,
      failures: Vec::new(),
    }
  }

  pub fn success(&self) -> bool {
    self.failures.is_empty()
  }

  /// 0 on success, otherwise the code of the first tolerated failure.
  pub fn exit_code(&self) -> i32 {
    self.failures.first().map(|f| f.kind.exit_code()).unwrap_or(0)
  }

  pub fn last_stage(&self) -> Option<Stage> {
    self.stages.last().copied()
  }
}
