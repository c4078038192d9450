//! Test utilities for impforge-lib.
//!
//! [`RecordingRunner`] stands in for git, conda, python and bash. It records
//! every invocation and answers with canned output. [`init_repository`]
//! creates real checkouts for the code paths that read them with gix.

use std::cell::RefCell;
use std::path::Path;

use crate::consts::BUILD_DONE_MARKER;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec, ExecError};

type Responder = Box<dyn Fn(&CommandSpec) -> Result<CommandOutput, ExecError>>;

pub struct RecordingRunner {
  calls: RefCell<Vec<CommandSpec>>,
  responder: Responder,
  missing: Vec<String>,
}

impl RecordingRunner {
  /// Every tool succeeds the way a healthy host would answer.
  pub fn new() -> Self {
    Self::with_responder(default_response)
  }

  pub fn with_responder<F>(responder: F) -> Self
  where
    F: Fn(&CommandSpec) -> Result<CommandOutput, ExecError> + 'static,
  {
    Self {
      calls: RefCell::new(Vec::new()),
      responder: Box::new(responder),
      missing: Vec::new(),
    }
  }

  /// Pretend `program` is not installed.
  pub fn fail_program(mut self, program: &str) -> Self {
    self.missing.push(program.to_string());
    self
  }

  pub fn calls(&self) -> Vec<CommandSpec> {
    self.calls.borrow().clone()
  }

  /// Calls to `program`, excluding `--version` probes.
  pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
    self
      .calls
      .borrow()
      .iter()
      .filter(|c| c.program == program && c.args.first().map(String::as_str) != Some("--version"))
      .cloned()
      .collect()
  }
}

impl CommandRunner for RecordingRunner {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
    self.calls.borrow_mut().push(spec.clone());
    if self.missing.contains(&spec.program) {
      return Err(ExecError::NotFound {
        program: spec.program.clone(),
      });
    }
    (self.responder)(spec)
  }
}

/// Canned answers of a working host.
///
/// `bash <script> <env> <out_dir> ...` leaves the build's done-marker in
/// `out_dir`, like the real build scripts do after installing.
pub fn default_response(spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
  let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();
  let stdout = match (spec.program.as_str(), args.as_slice()) {
    ("python3", ["--version"]) => "Python 3.11.4\n",
    ("git", ["--version"]) => "git version 2.43.0\n",
    ("conda", ["--version"]) => "conda 24.1.2\n",
    ("conda", ["env", "list", "--json"]) => "{\"envs\": [\"/opt/conda\"]}\n",
    ("bash", [_script, _env, out_dir, ..]) => {
      std::fs::write(Path::new(out_dir).join(BUILD_DONE_MARKER), "").map_err(|source| ExecError::Spawn {
        command: spec.to_string(),
        source,
      })?;
      ""
    }
    _ => "",
  };
  Ok(CommandOutput::ok(stdout))
}

/// Create a repository at `path` holding one empty commit and return its id.
pub fn init_repository(path: &Path) -> String {
  let repo = gix::init(path).expect("init repository");
  let signature = gix::actor::SignatureRef {
    name: "impforge".into(),
    email: "impforge@example.com".into(),
    time: "1760000000 +0000",
  };
  let tree = gix::ObjectId::empty_tree(repo.object_hash());
  let id = repo
    .commit_as(signature, signature, "HEAD", "initial", tree, gix::commit::NO_PARENT_IDS)
    .expect("commit");
  id.to_string()
}
