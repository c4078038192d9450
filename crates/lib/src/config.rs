//! Install configuration.
//!
//! [`InstallOptions`] holds the raw values collected from the command line;
//! [`InstallConfig::from_options`] validates them once and produces the
//! immutable configuration every orchestrator step reads from.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::consts::{
  DEFAULT_ENV_NAME, DEFAULT_OUT_DIR, DEFAULT_SCRIPTS_DIR, DEFAULT_TEMPLATE, EMPTY_MODULES_TOKEN, HEAVY_MODULES,
};
use crate::platform::Shell;

/// Errors raised while validating install options.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid environment name '{name}': must be non-empty without whitespace or '/'")]
  InvalidEnvName { name: String },

  #[error("process count must be at least 1")]
  ZeroProcesses,

  #[error("unknown shell '{name}' (supported: bash, zsh, fish, sh)")]
  UnknownShell { name: String },

  #[error("failed to resolve output directory {}: {source}", path.display())]
  OutDir { path: PathBuf, source: std::io::Error },
}

/// Install variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  /// Only the auxiliary analysis tools; IMP itself comes from elsewhere.
  Production,
  /// Clone and compile IMP from source alongside the tools.
  Development,
}

impl Mode {
  pub fn select(dev_mode: bool) -> Self {
    if dev_mode { Mode::Development } else { Mode::Production }
  }

  pub fn builds_from_source(self) -> bool {
    matches!(self, Mode::Development)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Mode::Production => "production",
      Mode::Development => "development",
    }
  }
}

impl fmt::Display for Mode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Set of IMP modules excluded from the build.
///
/// Kept sorted so the colon-joined form handed to the build script is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisabledModules(BTreeSet<String>);

impl DisabledModules {
  /// Collect module names, accepting colon-separated entries as well.
  pub fn new<I, S>(modules: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let set = modules
      .into_iter()
      .flat_map(|m| {
        m.as_ref()
          .split(':')
          .map(|part| part.trim().to_string())
          .collect::<Vec<_>>()
      })
      .filter(|m| !m.is_empty() && m != EMPTY_MODULES_TOKEN)
      .collect();
    Self(set)
  }

  /// Add the fixed list of heavyweight modules.
  pub fn with_heavy_modules(mut self) -> Self {
    self.0.extend(HEAVY_MODULES.iter().map(|m| m.to_string()));
    self
  }

  pub fn contains(&self, module: &str) -> bool {
    self.0.contains(module)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }

  /// Colon-joined form passed to the build script; `""` when nothing is disabled.
  pub fn to_arg(&self) -> String {
    if self.0.is_empty() {
      EMPTY_MODULES_TOKEN.to_string()
    } else {
      self.iter().collect::<Vec<_>>().join(":")
    }
  }
}

impl fmt::Display for DisabledModules {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_arg())
  }
}

/// Where the shell startup hook goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileTarget {
  /// Leave the user's shell configuration alone.
  Skip,
  /// Use the startup file of the detected (or requested) shell.
  Detect,
  /// Use this file.
  File(PathBuf),
}

/// Raw, unvalidated options as collected from flags and environment.
#[derive(Debug, Clone)]
pub struct InstallOptions {
  pub env_name: String,
  pub out_dir: PathBuf,
  pub nproc: usize,
  pub disabled_modules: Vec<String>,
  pub minimal_install: bool,
  pub dev_mode: bool,
  pub template_path: PathBuf,
  pub scripts_dir: PathBuf,
  pub confirm: bool,
  pub continue_on_error: bool,
  pub shell: Option<String>,
  pub profile: Option<PathBuf>,
  pub no_profile: bool,
}

impl Default for InstallOptions {
  fn default() -> Self {
    Self {
      env_name: DEFAULT_ENV_NAME.to_string(),
      out_dir: PathBuf::from(DEFAULT_OUT_DIR),
      nproc: 1,
      disabled_modules: Vec::new(),
      minimal_install: false,
      dev_mode: false,
      template_path: PathBuf::from(DEFAULT_TEMPLATE),
      scripts_dir: PathBuf::from(DEFAULT_SCRIPTS_DIR),
      confirm: false,
      continue_on_error: false,
      shell: None,
      profile: None,
      no_profile: false,
    }
  }
}

/// Validated install configuration. Constructed once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct InstallConfig {
  pub env_name: String,
  /// Absolute output directory.
  pub out_dir: PathBuf,
  pub nproc: NonZeroUsize,
  pub disabled_modules: DisabledModules,
  pub minimal_install: bool,
  pub mode: Mode,
  pub template_path: PathBuf,
  pub scripts_dir: PathBuf,
  /// Ask before starting the build.
  pub confirm: bool,
  /// Keep going after fetch or build failures.
  pub continue_on_error: bool,
  /// Shell override; detected from the host when unset.
  #[serde(skip)]
  pub shell: Option<Shell>,
  pub profile: ProfileTarget,
}

impl InstallConfig {
  pub fn from_options(options: InstallOptions) -> Result<Self, ConfigError> {
    let env_name = options.env_name.trim().to_string();
    if env_name.is_empty() || env_name.contains(char::is_whitespace) || env_name.contains('/') {
      return Err(ConfigError::InvalidEnvName { name: options.env_name });
    }

    let nproc = NonZeroUsize::new(options.nproc).ok_or(ConfigError::ZeroProcesses)?;

    let mut disabled_modules = DisabledModules::new(&options.disabled_modules);
    if options.minimal_install {
      disabled_modules = disabled_modules.with_heavy_modules();
    }

    let shell = match options.shell.as_deref() {
      Some(name) => Some(Shell::from_name(name).ok_or_else(|| ConfigError::UnknownShell { name: name.to_string() })?),
      None => None,
    };

    let profile = match (options.no_profile, options.profile) {
      (true, _) => ProfileTarget::Skip,
      (false, Some(path)) => ProfileTarget::File(path),
      (false, None) => ProfileTarget::Detect,
    };

    Ok(Self {
      env_name,
      out_dir: absolute(&options.out_dir)?,
      nproc,
      disabled_modules,
      minimal_install: options.minimal_install,
      mode: Mode::select(options.dev_mode),
      template_path: options.template_path,
      scripts_dir: options.scripts_dir,
      confirm: options.confirm,
      continue_on_error: options.continue_on_error,
      shell,
      profile,
    })
  }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
  std::path::absolute(path).map_err(|source| ConfigError::OutDir {
    path: path.to_path_buf(),
    source,
  })
}
