use std::path::{Path, PathBuf};

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("HOME").filter(|h| !h.is_empty()).map(PathBuf::from)
}

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("USERPROFILE").filter(|h| !h.is_empty()).map(PathBuf::from)
}

/// Expand a leading `~` against `home`.
///
/// Paths handed in through environment variables never went through shell
/// expansion, so `IMPFORGE_PROFILE=~/.bashrc` arrives verbatim.
pub fn expand_tilde(path: &Path, home: Option<&Path>) -> PathBuf {
  let Some(home) = home else {
    return path.to_path_buf();
  };
  let path_str = path.to_string_lossy();
  if path_str == "~" {
    home.to_path_buf()
  } else if let Some(rest) = path_str.strip_prefix("~/") {
    home.join(rest)
  } else {
    path.to_path_buf()
  }
}
