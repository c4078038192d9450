//! Conda environment definition rendering.
//!
//! The environment template is a YAML file carrying a single placeholder for
//! the environment name. Rendering is plain substitution; nothing else in the
//! file is interpreted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Placeholder replaced with the environment name.
pub const ENV_NAME_PLACEHOLDER: &str = "%(ENVNAME)s";

/// File name of the rendered definition inside the output directory.
pub const ENV_FILE_NAME: &str = "impenv.yml";

#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("environment template not found: {}", path.display())]
  NotFound { path: PathBuf },

  #[error("failed to read environment template {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("environment template {} has no '{placeholder}' placeholder", path.display())]
  Malformed { path: PathBuf, placeholder: &'static str },

  #[error("failed to write environment file {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },
}

/// Substitute `env_name` for the placeholder. `None` when the template has no placeholder.
pub fn render(template: &str, env_name: &str) -> Option<String> {
  template
    .contains(ENV_NAME_PLACEHOLDER)
    .then(|| template.replace(ENV_NAME_PLACEHOLDER, env_name))
}

pub fn render_environment_template(template_path: &Path, env_name: &str) -> Result<String, TemplateError> {
  let template = fs::read_to_string(template_path).map_err(|source| {
    if source.kind() == io::ErrorKind::NotFound {
      TemplateError::NotFound {
        path: template_path.to_path_buf(),
      }
    } else {
      TemplateError::Read {
        path: template_path.to_path_buf(),
        source,
      }
    }
  })?;

  render(&template, env_name).ok_or_else(|| TemplateError::Malformed {
    path: template_path.to_path_buf(),
    placeholder: ENV_NAME_PLACEHOLDER,
  })
}

/// Write the rendered definition to `<out_dir>/impenv.yml`.
pub fn materialize_environment(rendered: &str, out_dir: &Path) -> Result<PathBuf, TemplateError> {
  let path = out_dir.join(ENV_FILE_NAME);
  fs::write(&path, rendered).map_err(|source| TemplateError::Write {
    path: path.clone(),
    source,
  })?;
  info!(path = %path.display(), "wrote environment definition");
  Ok(path)
}
