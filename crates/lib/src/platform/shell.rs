//! Shell detection and environment script generation

use std::env;
use std::path::{Path, PathBuf};

/// Supported shell types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
  Bash,
  Zsh,
  Fish,
  Sh,
}

impl Shell {
  /// Detect the current shell from `$SHELL`, falling back to POSIX sh.
  pub fn detect() -> Self {
    env::var("SHELL")
      .ok()
      .map(|shell| Self::from_path(&shell))
      .unwrap_or(Shell::Sh)
  }

  /// Classify a shell executable path such as `/usr/bin/zsh`.
  pub fn from_path(path: &str) -> Self {
    let shell_name = Path::new(path)
      .file_name()
      .and_then(|n| n.to_str())
      .unwrap_or("")
      .to_lowercase();

    if let Some(shell) = Self::from_name(&shell_name) {
      return shell;
    }

    if shell_name.contains("zsh") {
      Shell::Zsh
    } else if shell_name.contains("bash") {
      Shell::Bash
    } else if shell_name.contains("fish") {
      Shell::Fish
    } else {
      Shell::Sh
    }
  }

  /// Parse a user-supplied shell name.
  pub fn from_name(name: &str) -> Option<Self> {
    match name.to_lowercase().as_str() {
      "bash" => Some(Shell::Bash),
      "zsh" => Some(Shell::Zsh),
      "fish" => Some(Shell::Fish),
      "sh" => Some(Shell::Sh),
      _ => None,
    }
  }

  /// Get the shell name as a string
  pub fn as_str(&self) -> &'static str {
    match self {
      Shell::Bash => "bash",
      Shell::Zsh => "zsh",
      Shell::Fish => "fish",
      Shell::Sh => "sh",
    }
  }

  /// Get the file extension for this shell's scripts
  pub fn script_extension(&self) -> &'static str {
    match self {
      Shell::Bash | Shell::Sh => "sh",
      Shell::Zsh => "zsh",
      Shell::Fish => "fish",
    }
  }

  /// Interactive startup file under `home`.
  pub fn startup_file(&self, home: &Path) -> PathBuf {
    match self {
      Shell::Bash => home.join(".bashrc"),
      Shell::Zsh => home.join(".zshrc"),
      Shell::Fish => home.join(".config").join("fish").join("config.fish"),
      Shell::Sh => home.join(".profile"),
    }
  }

  /// Single-quote `value` so the shell reads it literally.
  pub fn quote(&self, value: &str) -> String {
    match self {
      // fish honours `\\` and `\'` inside single quotes
      Shell::Fish => format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'")),
      Shell::Bash | Shell::Zsh | Shell::Sh => format!("'{}'", value.replace('\'', "'\\''")),
    }
  }

  /// Generate an export statement for setting an environment variable
  pub fn export_var(&self, name: &str, value: &str) -> String {
    match self {
      Shell::Fish => format!("set -gx {} {}", name, self.quote(value)),
      Shell::Bash | Shell::Zsh | Shell::Sh => format!("export {}={}", name, self.quote(value)),
    }
  }

  /// Generate an append statement for a PATH-like variable
  pub fn append_path(&self, name: &str, value: &str) -> String {
    match self {
      Shell::Fish => format!("set -gx {} ${} {}", name, name, self.quote(value)),
      Shell::Bash | Shell::Zsh | Shell::Sh => {
        format!("export {}=\"${}\":{}", name, name, self.quote(value))
      }
    }
  }

  /// Statement that sources `script` if it exists.
  pub fn source_line(&self, script: &Path) -> String {
    let script = self.quote(&script.display().to_string());
    match self {
      Shell::Fish => format!("test -f {}; and source {}", script, script),
      Shell::Bash | Shell::Zsh | Shell::Sh => format!("[ -f {} ] && . {}", script, script),
    }
  }

  /// Generate a comment for this shell
  pub fn comment(&self, text: &str) -> String {
    format!("# {}", text)
  }

  /// Generate the script header/shebang
  pub fn header(&self) -> &'static str {
    match self {
      Shell::Bash => "#!/usr/bin/env bash",
      Shell::Zsh => "#!/usr/bin/env zsh",
      Shell::Fish => "# Fish shell environment",
      Shell::Sh => "#!/bin/sh",
    }
  }
}

impl std::fmt::Display for Shell {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
