//! Host platform: operating system, shell and home directory.

pub mod os;
pub mod paths;
pub mod shell;

use std::path::PathBuf;

use thiserror::Error;

pub use os::Platform;
pub use shell::Shell;

#[derive(Debug, Error)]
pub enum PlatformError {
  #[error("unsupported platform '{os}' (supported: linux, darwin)")]
  Unsupported { os: String },

  #[error("failed to determine home directory")]
  NoHomeDirectory,
}

/// Facts about the machine the installer runs on.
///
/// Collected once at startup so the orchestrator never reads process-global
/// state directly.
#[derive(Debug, Clone)]
pub struct Host {
  /// Raw OS identifier (`linux`, `macos`, ...).
  pub os: String,
  pub home_dir: Option<PathBuf>,
  /// Conda environment active in the invoking shell.
  pub conda_prefix: Option<String>,
  pub shell: Shell,
}

impl Host {
  pub fn current() -> Self {
    Self {
      os: std::env::consts::OS.to_string(),
      home_dir: paths::home_dir(),
      conda_prefix: std::env::var("CONDA_PREFIX").ok().filter(|p| !p.is_empty()),
      shell: Shell::detect(),
    }
  }

  pub fn platform(&self) -> Result<Platform, PlatformError> {
    Platform::from_os_identifier(&self.os)
  }

  pub fn home(&self) -> Result<&PathBuf, PlatformError> {
    self.home_dir.as_ref().ok_or(PlatformError::NoHomeDirectory)
  }
}
