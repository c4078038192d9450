use std::fmt;

use serde::Serialize;

/// Orchestrator states, in the order a development install passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Init,
  SourcesFetched,
  EnvironmentTemplated,
  EnvironmentCreated,
  PlatformDetected,
  BuildDispatched,
  LogWritten,
  ShellProfileUpdated,
  Done,
}

impl Stage {
  /// The work that leads into this state, for error messages.
  pub fn describe(&self) -> &'static str {
    match self {
      Stage::Init => "checking prerequisites",
      Stage::SourcesFetched => "fetching sources",
      Stage::EnvironmentTemplated => "rendering environment template",
      Stage::EnvironmentCreated => "creating conda environment",
      Stage::PlatformDetected => "detecting platform",
      Stage::BuildDispatched => "building IMP",
      Stage::LogWritten => "writing build log",
      Stage::ShellProfileUpdated => "updating shell profile",
      Stage::Done => "finishing",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.describe())
  }
}
