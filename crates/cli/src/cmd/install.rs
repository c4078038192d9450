//! Implementation of the install run.
//!
//! Validates the flags into an [`InstallConfig`], runs the orchestrator
//! against the real host and prints the outcome.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use serde_json::json;
use tracing::debug;

use impforge_lib::conda::EnvironmentStatus;
use impforge_lib::config::{InstallConfig, InstallOptions};
use impforge_lib::consts::{DEFAULT_ENV_NAME, DEFAULT_OUT_DIR, DEFAULT_SCRIPTS_DIR, DEFAULT_TEMPLATE};
use impforge_lib::exec::SystemRunner;
use impforge_lib::fetch::FetchStatus;
use impforge_lib::install::{InstallFailure, InstallReport, Orchestrator};
use impforge_lib::platform::Host;

use crate::output::{
  OutputFormat, format_duration, print_error, print_info, print_json, print_stat, print_success, print_warning,
  truncate_hash,
};
use crate::prompts;

/// Exit code for flag values that parse but do not validate.
const CONFIG_ERROR_EXIT: i32 = 2;

#[derive(Debug, Args)]
pub struct InstallArgs {
  /// Name of the conda environment to create
  #[arg(short = 'n', long, env = "IMPFORGE_ENV_NAME", default_value = DEFAULT_ENV_NAME)]
  pub env_name: String,

  /// Directory receiving the checkouts, the build and the logs
  #[arg(short, long, env = "IMPFORGE_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
  pub out_dir: PathBuf,

  /// Parallel processes for the build
  #[arg(short = 'j', long, env = "IMPFORGE_NPROC", default_value = "1")]
  pub nproc: NonZeroUsize,

  /// IMP modules to leave out of the build (repeatable, or colon-separated)
  #[arg(short, long, env = "IMPFORGE_DISABLED_MODULES", value_delimiter = ':', num_args = 1..)]
  pub disabled_modules: Vec<String>,

  /// Also disable the heavyweight modules
  #[arg(short, long, env = "IMPFORGE_MINIMAL_INSTALL")]
  pub minimal_install: bool,

  /// Build IMP from source instead of installing only the analysis tools
  #[arg(long, env = "IMPFORGE_DEV_MODE")]
  pub dev_mode: bool,

  /// Show the build summary and ask before building
  #[arg(long, env = "IMPFORGE_CONFIRM")]
  pub confirm: bool,

  /// Keep going after a failed clone or build
  #[arg(long, env = "IMPFORGE_CONTINUE_ON_ERROR")]
  pub continue_on_error: bool,

  /// Conda environment template
  #[arg(long, env = "IMPFORGE_TEMPLATE", default_value = DEFAULT_TEMPLATE)]
  pub template: PathBuf,

  /// Directory holding the platform build scripts
  #[arg(long, env = "IMPFORGE_SCRIPTS_DIR", default_value = DEFAULT_SCRIPTS_DIR)]
  pub scripts_dir: PathBuf,

  /// Shell to write the environment hook for (bash, zsh, fish, sh; detected if not specified)
  #[arg(long, env = "IMPFORGE_SHELL")]
  pub shell: Option<String>,

  /// Startup file to hook into instead of the shell's default
  #[arg(long, env = "IMPFORGE_PROFILE", conflicts_with = "no_profile")]
  pub profile: Option<PathBuf>,

  /// Do not touch any shell startup file
  #[arg(long, env = "IMPFORGE_NO_PROFILE")]
  pub no_profile: bool,
}

impl InstallArgs {
  fn into_options(self) -> InstallOptions {
    InstallOptions {
      env_name: self.env_name,
      out_dir: self.out_dir,
      nproc: self.nproc.get(),
      disabled_modules: self.disabled_modules,
      minimal_install: self.minimal_install,
      dev_mode: self.dev_mode,
      template_path: self.template,
      scripts_dir: self.scripts_dir,
      confirm: self.confirm,
      continue_on_error: self.continue_on_error,
      shell: self.shell,
      profile: self.profile,
      no_profile: self.no_profile,
    }
  }
}

/// Run the install and return the process exit code.
pub fn cmd_install(args: InstallArgs, format: OutputFormat) -> Result<i32> {
  let config = match InstallConfig::from_options(args.into_options()) {
    Ok(config) => config,
    Err(e) => {
      print_error(&e.to_string());
      return Ok(CONFIG_ERROR_EXIT);
    }
  };

  let host = Host::current();
  debug!(?config, ?host, "resolved configuration");
  let started = Instant::now();
  let result = Orchestrator::new(&config, &host, &SystemRunner).run(&mut prompts::confirm_build);
  let elapsed = started.elapsed();

  match result {
    Ok(report) => {
      if format.is_json() {
        print_json(&json!({
          "success": report.success(),
          "exit_code": report.exit_code(),
          "report": report,
        }))?;
      } else {
        print_report(&report);
        print_stat("Elapsed", &format_duration(elapsed));
      }
      Ok(report.exit_code())
    }
    Err(failure) => {
      print_error(&failure.to_string());
      if format.is_json() {
        print_json(&json!({
          "success": false,
          "exit_code": failure.exit_code(),
          "stage": failure.stage,
          "kind": failure.error.kind(),
          "error": failure.error.to_string(),
          "report": failure.report,
        }))?;
      } else {
        print_failure(&failure);
      }
      Ok(failure.exit_code())
    }
  }
}

fn print_report(report: &InstallReport) {
  println!();
  if report.success() {
    print_success(&format!("Install complete ({} mode)", report.mode));
  } else {
    print_warning(&format!(
      "Install finished with {} tolerated failure(s)",
      report.failures.len()
    ));
  }

  print_sources(report);

  if let Some(env_file) = &report.env_file {
    print_stat("Environment file", &env_file.display().to_string());
  }
  if let Some(status) = report.environment {
    let status = match status {
      EnvironmentStatus::Created => "created",
      EnvironmentStatus::Reused => "reused",
    };
    print_stat("Conda environment", status);
  }
  if let Some(platform) = report.platform {
    print_stat("Platform", platform.as_str());
  }
  if let Some(succeeded) = report.build_succeeded {
    print_stat("Build", if succeeded { "succeeded" } else { "failed" });
  }
  if let Some(script) = &report.incremental_script {
    print_stat("Rebuild script", &script.display().to_string());
  }
  if let Some(log) = &report.build_log {
    print_stat("Build log", &log.display().to_string());
  }

  match &report.profile {
    Some(profile) if profile.appended => {
      print_stat("Shell hook", &profile.startup_file.display().to_string());
      print_info(&format!(
        "Open a new shell or source {} to pick up the environment",
        profile.fragment.display()
      ));
    }
    Some(profile) => print_stat("Shell hook", &format!("{} (unchanged)", profile.startup_file.display())),
    None => {}
  }

  for failure in &report.failures {
    print_warning(&format!("{}: {}", failure.stage.describe(), failure.message));
  }
}

fn print_sources(report: &InstallReport) {
  for outcome in &report.fetched {
    let status = match &outcome.status {
      FetchStatus::Cloned => "cloned".to_string(),
      FetchStatus::Reused => "reused".to_string(),
      FetchStatus::Failed(reason) => format!("failed ({})", reason),
    };
    let value = match &outcome.commit {
      Some(commit) => format!("{} @ {}", status, truncate_hash(commit)),
      None => status,
    };
    print_stat(&outcome.dir, &value);
  }
}

fn print_failure(failure: &InstallFailure) {
  let report = &failure.report;
  if let Some(stage) = report.last_stage() {
    print_stat("Last completed stage", &format!("{:?}", stage));
  }
  match &failure.build_log {
    Some(log) => print_stat("Build log", &log.display().to_string()),
    None => print_stat("Build log", "not written"),
  }
  for tolerated in &report.failures {
    print_warning(&format!("{}: {}", tolerated.stage.describe(), tolerated.message));
  }
}
