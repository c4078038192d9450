use std::fmt;

use serde::Serialize;

use super::PlatformError;
use crate::consts::{LINUX_BUILD_SCRIPT, MACOS_BUILD_SCRIPT};

/// Operating systems IMP can be built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
  Linux,
  Darwin,
}

impl Platform {
  /// Map an OS identifier (`uname -s` style or Rust's `std::env::consts::OS`).
  pub fn from_os_identifier(id: &str) -> Result<Self, PlatformError> {
    match id.trim().to_ascii_lowercase().as_str() {
      "linux" => Ok(Self::Linux),
      "darwin" | "macos" => Ok(Self::Darwin),
      _ => Err(PlatformError::Unsupported { os: id.to_string() }),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::Darwin => "darwin",
    }
  }

  /// Name of the build script for this platform.
  pub fn build_script(&self) -> &'static str {
    match self {
      Self::Linux => LINUX_BUILD_SCRIPT,
      Self::Darwin => MACOS_BUILD_SCRIPT,
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
