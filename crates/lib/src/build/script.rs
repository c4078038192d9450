use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use tracing::info;

use super::{BuildError, BuildRequest};
use crate::config::DisabledModules;
use crate::platform::Platform;

/// Bake the build parameters into a copy of a build script.
///
/// Lines referencing a positional parameter are replaced wholesale: `$1`
/// becomes the environment activation, `$2` is dropped, `$3` becomes the
/// disabled-module CMake flag and `$4` the parallel make call.
pub fn rewrite_build_script(
  source: &str,
  env_name: &str,
  disabled_modules: &DisabledModules,
  nproc: NonZeroUsize,
) -> String {
  source
    .split_inclusive('\n')
    .map(|line| {
      if line.contains("$1") {
        format!("conda activate {}\n", env_name)
      } else if line.contains("$2") {
        String::new()
      } else if line.contains("$3") {
        format!("     -DIMP_DISABLED_MODULES={}\n", disabled_modules.to_arg())
      } else if line.contains("$4") {
        format!("make -j{}\n", nproc)
      } else {
        line.to_string()
      }
    })
    .collect()
}

pub fn incremental_script_name(platform: Platform, timestamp: &str) -> String {
  format!("make_imp_{}_{}.sh", platform, timestamp)
}

/// Write the rewritten build script to `<out_dir>/make_imp_<platform>_<timestamp>.sh`.
pub fn write_incremental_script(request: &BuildRequest<'_>, timestamp: &str) -> Result<PathBuf, BuildError> {
  let script = request.script_path();
  let source = fs::read_to_string(&script).map_err(|source| BuildError::Io {
    path: script.clone(),
    source,
  })?;

  let rewritten = rewrite_build_script(&source, request.env_name, request.disabled_modules, request.nproc);
  let path = request
    .out_dir
    .join(incremental_script_name(request.platform, timestamp));
  fs::write(&path, rewritten).map_err(|source| BuildError::Io {
    path: path.clone(),
    source,
  })?;

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).map_err(|source| BuildError::Io {
      path: path.clone(),
      source,
    })?;
  }

  info!(path = %path.display(), "wrote incremental build script");
  Ok(path)
}
