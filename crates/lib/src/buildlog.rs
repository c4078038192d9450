//! Build log record.
//!
//! One text file per invocation, `<out_dir>/IMP_build_spec_<timestamp>.txt`,
//! in `>>key=value` lines. The record is written on success and on every
//! failure after the output directory exists.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{InstallConfig, Mode};
use crate::consts::BUILD_LOG_PREFIX;
use crate::platform::Platform;

/// Filesystem-safe: no slashes, no colons.
pub const TIMESTAMP_FORMAT: &str = "%d%B%Y_%I-%M-%S_%p";

#[derive(Debug, Error)]
pub enum LogError {
  #[error("failed to write build log {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Checked-out commit of one fetched repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCommit {
  pub dir: String,
  pub commit: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildLogRecord {
  pub mode: Mode,
  pub platform: Option<Platform>,
  /// Conda environment active when the installer was started.
  pub base_env: Option<String>,
  pub env_name: String,
  pub nproc: usize,
  pub disabled_modules: String,
  pub minimal_install: bool,
  pub success: bool,
  /// Failing stage and error, when the run did not succeed.
  pub failure: Option<String>,
  pub sources: Vec<SourceCommit>,
}

impl BuildLogRecord {
  /// Record for `config` before anything has run.
  pub fn new(config: &InstallConfig, base_env: Option<&str>) -> Self {
    Self {
      mode: config.mode,
      platform: None,
      base_env: base_env.map(str::to_string),
      env_name: config.env_name.clone(),
      nproc: config.nproc.get(),
      disabled_modules: config.disabled_modules.to_arg(),
      minimal_install: config.minimal_install,
      success: false,
      failure: None,
      sources: Vec::new(),
    }
  }

  /// Build parameters, without the outcome. Shown before the build starts.
  pub fn summary(&self) -> String {
    let mut out = String::from("IMP build specs:\n");
    let platform = self.platform.map(|p| p.as_str()).unwrap_or("n/a");
    let _ = writeln!(out, ">>platform={}", platform);
    let _ = writeln!(out, ">>base conda env={}", self.base_env.as_deref().unwrap_or("unknown"));
    let _ = writeln!(out, ">>conda env={}", self.env_name);
    let _ = writeln!(out, ">>build from scratch={}", py_bool(self.mode.builds_from_source()));
    let _ = writeln!(out, ">>number of processors for parallel build={}", self.nproc);
    let _ = writeln!(out, ">>disabled modules= {}", self.disabled_modules);
    let _ = writeln!(out, ">>minimal install={}", py_bool(self.minimal_install));
    out
  }

  /// Full log file contents.
  pub fn render(&self) -> String {
    let mut out = self.summary();
    for source in &self.sources {
      let _ = writeln!(out, ">>source {}={}", source.dir, source.commit);
    }
    let _ = writeln!(out, ">>success={}", py_bool(self.success));
    if let Some(failure) = &self.failure {
      let _ = writeln!(out, ">>failure={}", failure);
    }
    out
  }
}

fn py_bool(value: bool) -> &'static str {
  if value { "True" } else { "False" }
}

pub fn timestamp_token(now: &NaiveDateTime) -> String {
  now.format(TIMESTAMP_FORMAT).to_string()
}

pub fn build_log_path(out_dir: &Path, timestamp: &str) -> PathBuf {
  out_dir.join(format!("{}{}.txt", BUILD_LOG_PREFIX, timestamp))
}

/// Write `record` under `out_dir`, replacing a log with the same timestamp.
pub fn write_build_log(out_dir: &Path, record: &BuildLogRecord, timestamp: &str) -> Result<PathBuf, LogError> {
  let path = build_log_path(out_dir, timestamp);
  fs::write(&path, record.render()).map_err(|source| LogError::Write {
    path: path.clone(),
    source,
  })?;
  info!(path = %path.display(), success = record.success, "wrote build log");
  Ok(path)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::InstallOptions;
  use chrono::NaiveDate;
  use tempfile::TempDir;

  fn record() -> BuildLogRecord {
    let config = InstallConfig::from_options(InstallOptions {
      nproc: 4,
      dev_mode: true,
      ..Default::default()
    })
    .unwrap();
    let mut record = BuildLogRecord::new(&config, Some("/opt/conda"));
    record.platform = Some(Platform::Linux);
    record
  }

  #[test]
  fn timestamp_is_filesystem_safe() {
    let now = NaiveDate::from_ymd_opt(2026, 10, 16)
      .unwrap()
      .and_hms_opt(15, 4, 5)
      .unwrap();
    let token = timestamp_token(&now);

    assert_eq!(token, "16October2026_03-04-05_PM");
    assert!(!token.contains('/'));
    assert!(!token.contains(':'));
  }

  #[test]
  fn summary_lists_parameters() {
    let summary = record().summary();
    assert!(summary.starts_with("IMP build specs:\n"));
    assert!(summary.contains(">>platform=linux\n"));
    assert!(summary.contains(">>base conda env=/opt/conda\n"));
    assert!(summary.contains(">>build from scratch=True\n"));
    assert!(summary.contains(">>number of processors for parallel build=4\n"));
    assert!(summary.contains(">>disabled modules= \"\"\n"));
    assert!(summary.contains(">>minimal install=False\n"));
    assert!(!summary.contains(">>success"));
  }

  #[test]
  fn render_appends_outcome() {
    let mut record = record();
    record.sources.push(SourceCommit {
      dir: "imp".to_string(),
      commit: "0123abc".to_string(),
    });
    record.failure = Some("build dispatch: exit code 2".to_string());

    let rendered = record.render();
    assert!(rendered.contains(">>source imp=0123abc\n"));
    assert!(rendered.contains(">>success=False\n"));
    assert!(rendered.ends_with(">>failure=build dispatch: exit code 2\n"));
  }

  #[test]
  fn writes_single_file() {
    let temp = TempDir::new().unwrap();
    let mut record = record();
    record.success = true;

    let path = write_build_log(temp.path(), &record, "16October2026_03-04-05_PM").unwrap();
    // rewriting with the same timestamp replaces the file
    write_build_log(temp.path(), &record, "16October2026_03-04-05_PM").unwrap();

    assert_eq!(path, temp.path().join("IMP_build_spec_16October2026_03-04-05_PM.txt"));
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    assert!(fs::read_to_string(&path).unwrap().contains(">>success=True"));
  }

  #[test]
  fn unwritable_directory_is_error() {
    let err = write_build_log(Path::new("/nonexistent/impforge"), &record(), "ts").unwrap_err();
    assert!(matches!(err, LogError::Write { .. }));
  }
}
