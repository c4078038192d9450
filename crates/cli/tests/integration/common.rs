//! Shared test helpers for CLI integration tests.

use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const TEMPLATE: &str = "name: %(ENVNAME)s\nchannels:\n  - salilab\n  - conda-forge\ndependencies:\n  - cmake\n  - swig\n";

pub const BUILD_SCRIPT: &str = "#!/bin/bash\nsource activate $1\ncd $2/imp\ncmake .. -DIMP_DISABLED_MODULES=$3\nmake -j$4\nmake install && touch $2/.done\n";

const FAKE_GIT: &str = r#"#!/bin/sh
echo "git $*" >> "@LOG@"
case "$1" in
  --version) echo "git version 2.43.0" ;;
  clone) mkdir -p "$3" ;;
esac
exit 0
"#;

const FAKE_CONDA: &str = r#"#!/bin/sh
echo "conda $*" >> "@LOG@"
case "$1 $2" in
  "--version ") echo "conda 24.1.2" ;;
  "env list") echo '{"envs": ["/opt/conda"]}' ;;
esac
exit 0
"#;

const FAKE_PYTHON: &str = r#"#!/bin/sh
echo "python3 $*" >> "@LOG@"
if [ "$1" = "--version" ]; then echo "Python 3.11.4"; fi
exit 0
"#;

const FAKE_BASH: &str = r#"#!/bin/sh
echo "bash $*" >> "@LOG@"
if [ "$1" = "--version" ]; then echo "GNU bash, version 5.2.21"; exit 0; fi
touch "$3/.done"
exit 0
"#;

const FAILING_BASH: &str = r#"#!/bin/sh
echo "bash $*" >> "@LOG@"
if [ "$1" = "--version" ]; then echo "GNU bash, version 5.2.21"; exit 0; fi
echo "make: *** [all] Error 2" >&2
exit 2
"#;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding stand-in `git`,
/// `conda`, `python3` and `bash` executables, a home directory, the
/// environment template and the platform build scripts. Every stand-in
/// appends its command line to a shared log.
pub struct TestEnv {
  pub temp: TempDir,
  root: PathBuf,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();
    let env = Self { temp, root };

    env.write_tool("git", FAKE_GIT);
    env.write_tool("conda", FAKE_CONDA);
    env.write_tool("python3", FAKE_PYTHON);
    env.write_tool("bash", FAKE_BASH);
    env.write_file("impenv.yml.template", TEMPLATE);
    env.write_file("scripts/make_imp_linux.sh", BUILD_SCRIPT);
    env.write_file("scripts/make_imp_macosx.sh", BUILD_SCRIPT);
    fs::create_dir_all(env.home()).unwrap();
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.root.join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  fn write_tool(&self, name: &str, script: &str) {
    let path = self.bin_dir().join(name);
    self.write_file(&format!("bin/{}", name), &script.replace("@LOG@", &self.log_path().display().to_string()));
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
  }

  /// Make the stand-in build script fail.
  pub fn fail_build(&self) {
    self.write_tool("bash", FAILING_BASH);
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.root.join(relative_path)
  }

  pub fn bin_dir(&self) -> PathBuf {
    self.root.join("bin")
  }

  pub fn home(&self) -> PathBuf {
    self.root.join("home")
  }

  pub fn out_dir(&self) -> PathBuf {
    self.root.join("x")
  }

  pub fn log_path(&self) -> PathBuf {
    self.root.join("tools.log")
  }

  /// Command lines the stand-in tools were invoked with.
  pub fn tool_log(&self) -> String {
    fs::read_to_string(self.log_path()).unwrap_or_default()
  }

  /// Build log files in the output directory.
  pub fn build_logs(&self) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(self.out_dir()) else {
      return Vec::new();
    };
    entries
      .map(|e| e.unwrap().path())
      .filter(|p| file_name(p).starts_with("IMP_build_spec_"))
      .collect()
  }

  /// Get a pre-configured Command for the impforge binary.
  ///
  /// Puts the stand-in tools first on `PATH`, points `HOME` at the isolated
  /// home directory and passes the template, scripts and output locations.
  pub fn impforge_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("impforge");
    for (key, _) in std::env::vars_os() {
      if key.to_string_lossy().starts_with("IMPFORGE_") {
        cmd.env_remove(key);
      }
    }

    let mut path: Vec<PathBuf> = vec![self.bin_dir()];
    if let Some(existing) = std::env::var_os("PATH") {
      path.extend(std::env::split_paths(&existing));
    }
    let path: OsString = std::env::join_paths(path).unwrap();

    cmd.env("PATH", path);
    cmd.env("HOME", self.home());
    cmd.env("SHELL", "/bin/bash");
    cmd.env("CONDA_PREFIX", "/opt/conda");
    cmd.arg("--template").arg(self.path("impenv.yml.template"));
    cmd.arg("--scripts-dir").arg(self.path("scripts"));
    cmd.arg("--out-dir").arg(self.out_dir());
    cmd.args(["--shell", "bash"]);
    cmd
  }
}

pub fn file_name(path: &Path) -> &str {
  path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}
