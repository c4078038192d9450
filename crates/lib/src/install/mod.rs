//! The install orchestrator.
//!
//! Sequences prerequisite checks, repository retrieval, environment
//! templating and creation, platform detection, the build, the build log and
//! the shell profile update. Each step moves the run to the next [`Stage`];
//! there is no rollback, a failure leaves whatever the earlier steps produced.
//!
//! Whatever happens after the output directory exists, a build log carrying
//! the outcome is written before returning.

mod error;
mod report;
mod stage;

pub use error::{ErrorKind, InstallError, InstallFailure};
pub use report::{InstallReport, ToleratedFailure};
pub use stage::Stage;

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use crate::build::{self, BuildRequest};
use crate::buildlog::{self, BuildLogRecord, SourceCommit};
use crate::conda;
use crate::config::{InstallConfig, ProfileTarget};
use crate::exec::CommandRunner;
use crate::fetch::{self, FetchStatus};
use crate::manifest::SourceManifest;
use crate::platform::{Host, paths};
use crate::prereq;
use crate::profile;
use crate::template;

/// Asked before the build starts when confirmation is enabled. Receives the
/// build summary; `Ok(false)` aborts.
pub type ConfirmFn<'f> = dyn FnMut(&str) -> io::Result<bool> + 'f;

/// Error tagged with the stage it interrupted.
struct StageError {
  stage: Stage,
  error: InstallError,
}

trait AtStage<T> {
  fn at(self, stage: Stage) -> Result<T, StageError>;
}

impl<T, E: Into<InstallError>> AtStage<T> for Result<T, E> {
  fn at(self, stage: Stage) -> Result<T, StageError> {
    self.map_err(|e| StageError {
      stage,
      error: e.into(),
    })
  }
}

/// Mutable bookkeeping of one run.
struct Run {
  report: InstallReport,
  record: BuildLogRecord,
}

impl Run {
  fn reach(&mut self, stage: Stage) {
    info!(stage = ?stage, "stage complete");
    self.report.stages.push(stage);
  }

  fn tolerate(&mut self, stage: Stage, error: &InstallError) {
    warn!(stage = ?stage, error = %error, "continuing after failure");
    self.report.failures.push(ToleratedFailure {
      stage,
      kind: error.kind(),
      message: error.to_string(),
    });
  }

  fn failure_summary(&self) -> Option<String> {
    if self.report.failures.is_empty() {
      return None;
    }
    let parts: Vec<String> = self
      .report
      .failures
      .iter()
      .map(|f| format!("{}: {}", f.stage.describe(), f.message))
      .collect();
    Some(parts.join("; "))
  }
}

pub struct Orchestrator<'a> {
  config: &'a InstallConfig,
  host: &'a Host,
  runner: &'a dyn CommandRunner,
  timestamp: String,
}

impl<'a> Orchestrator<'a> {
  pub fn new(config: &'a InstallConfig, host: &'a Host, runner: &'a dyn CommandRunner) -> Self {
    Self {
      config,
      host,
      runner,
      timestamp: buildlog::timestamp_token(&Local::now().naive_local()),
    }
  }

  /// Fix the time used for the build log and incremental script names.
  pub fn at_time(mut self, now: NaiveDateTime) -> Self {
    self.timestamp = buildlog::timestamp_token(&now);
    self
  }

  pub fn run(&self, confirm: &mut ConfirmFn<'_>) -> Result<InstallReport, InstallFailure> {
    let mut run = Run {
      report: InstallReport::new(self.config.mode),
      record: BuildLogRecord::new(self.config, self.host.conda_prefix.as_deref()),
    };

    info!(
      mode = %self.config.mode,
      env = %self.config.env_name,
      out_dir = %self.config.out_dir.display(),
      "starting install"
    );

    match self.execute(&mut run, confirm) {
      Ok(()) => Ok(run.report),
      Err(e) => Err(self.abort(run, e)),
    }
  }

  fn execute(&self, run: &mut Run, confirm: &mut ConfirmFn<'_>) -> Result<(), StageError> {
    let config = self.config;

    prereq::check_prerequisites(self.runner, config.mode).at(Stage::Init)?;
    fs::create_dir_all(&config.out_dir)
      .map_err(|source| InstallError::OutDir {
        path: config.out_dir.clone(),
        source,
      })
      .at(Stage::Init)?;
    run.reach(Stage::Init);

    self.fetch(run)?;

    let rendered =
      template::render_environment_template(&config.template_path, &config.env_name).at(Stage::EnvironmentTemplated)?;
    let env_file = template::materialize_environment(&rendered, &config.out_dir).at(Stage::EnvironmentTemplated)?;
    run.report.env_file = Some(env_file.clone());
    run.reach(Stage::EnvironmentTemplated);

    let status = conda::create_environment(self.runner, &env_file, &config.env_name).at(Stage::EnvironmentCreated)?;
    run.report.environment = Some(status);
    run.reach(Stage::EnvironmentCreated);

    if config.mode.builds_from_source() {
      self.build(run, confirm)?;
    }

    run.record.success = run.report.success();
    run.record.failure = run.failure_summary();
    let log = buildlog::write_build_log(&config.out_dir, &run.record, &self.timestamp).at(Stage::LogWritten)?;
    run.report.build_log = Some(log);
    run.reach(Stage::LogWritten);

    if !run.report.success() {
      info!("skipping shell profile update after failures");
    } else if let Some(startup_file) = self.startup_file().at(Stage::ShellProfileUpdated)? {
      let shell = config.shell.unwrap_or(self.host.shell);
      let update =
        profile::update_shell_profile(shell, &config.out_dir, &startup_file).at(Stage::ShellProfileUpdated)?;
      run.report.profile = Some(update);
      run.reach(Stage::ShellProfileUpdated);
    } else {
      info!("shell profile update disabled");
    }

    run.reach(Stage::Done);
    Ok(())
  }

  fn fetch(&self, run: &mut Run) -> Result<(), StageError> {
    let config = self.config;
    let manifest = SourceManifest::resolve(config.mode);
    let outcomes =
      fetch::fetch_sources(self.runner, &manifest, &config.out_dir, config.continue_on_error).at(Stage::SourcesFetched)?;

    for outcome in &outcomes {
      if let FetchStatus::Failed(reason) = &outcome.status {
        run.report.failures.push(ToleratedFailure {
          stage: Stage::SourcesFetched,
          kind: ErrorKind::Fetch,
          message: format!("{}: {}", outcome.dir, reason),
        });
      }
      if let Some(commit) = &outcome.commit {
        run.record.sources.push(SourceCommit {
          dir: outcome.dir.clone(),
          commit: commit.clone(),
        });
      }
    }

    run.report.fetched = outcomes;
    run.reach(Stage::SourcesFetched);
    Ok(())
  }

  fn build(&self, run: &mut Run, confirm: &mut ConfirmFn<'_>) -> Result<(), StageError> {
    let config = self.config;

    let platform = self.host.platform().at(Stage::PlatformDetected)?;
    run.record.platform = Some(platform);
    run.report.platform = Some(platform);
    run.reach(Stage::PlatformDetected);

    let summary = run.record.summary();
    if config.confirm {
      let proceed = confirm(&summary)
        .map_err(InstallError::Prompt)
        .at(Stage::BuildDispatched)?;
      if !proceed {
        return Err(StageError {
          stage: Stage::BuildDispatched,
          error: InstallError::Aborted,
        });
      }
    } else {
      for line in summary.lines() {
        info!("{}", line);
      }
    }

    let request = BuildRequest {
      platform,
      env_name: &config.env_name,
      out_dir: &config.out_dir,
      disabled_modules: &config.disabled_modules,
      nproc: config.nproc,
      scripts_dir: &config.scripts_dir,
    };

    match build::dispatch_build(self.runner, &request) {
      Ok(()) => run.report.build_succeeded = Some(true),
      Err(e) if config.continue_on_error => {
        run.report.build_succeeded = Some(false);
        run.tolerate(Stage::BuildDispatched, &InstallError::from(e));
      }
      Err(e) => return Err(e).at(Stage::BuildDispatched),
    }

    match build::write_incremental_script(&request, &self.timestamp) {
      Ok(path) => run.report.incremental_script = Some(path),
      Err(e) => warn!(error = %e, "could not write incremental build script"),
    }

    run.reach(Stage::BuildDispatched);
    Ok(())
  }

  /// Startup file to hook into, `None` when profile updates are disabled.
  fn startup_file(&self) -> Result<Option<PathBuf>, InstallError> {
    let home = self.host.home_dir.as_deref();
    match &self.config.profile {
      ProfileTarget::Skip => Ok(None),
      ProfileTarget::File(path) => Ok(Some(paths::expand_tilde(path, home))),
      ProfileTarget::Detect => {
        let shell = self.config.shell.unwrap_or(self.host.shell);
        Ok(Some(shell.startup_file(self.host.home()?)))
      }
    }
  }

  /// Record the failure in the build log, if there is somewhere to put it.
  fn abort(&self, mut run: Run, failed: StageError) -> InstallFailure {
    let StageError { stage, error } = failed;
    warn!(stage = ?stage, error = %error, "install failed");

    let mut build_log = None;
    if self.config.out_dir.is_dir() {
      run.record.success = false;
      let fatal = format!("{}: {}", stage.describe(), error);
      run.record.failure = Some(match run.failure_summary() {
        Some(tolerated) => format!("{}; {}", tolerated, fatal),
        None => fatal,
      });
      match buildlog::write_build_log(&self.config.out_dir, &run.record, &self.timestamp) {
        Ok(path) => build_log = Some(path),
        Err(e) => warn!(error = %e, "could not write build log"),
      }
    }
    run.report.build_log = build_log.clone();

    InstallFailure {
      stage,
      error,
      build_log,
      report: run.report,
    }
  }
}
