//! Source manifest: which repositories each mode retrieves, and where to.

use serde::Serialize;

use crate::config::Mode;
use crate::consts::{
  IMP_DIR, IMP_REPO_URL, IMP_SAMPCON_DIR, IMP_SAMPCON_REPO_URL, PMI_ANALYSIS_DIR, PMI_ANALYSIS_REPO_URL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  /// The IMP library itself; needs submodules and a one-time setup after cloning.
  Main,
  /// Analysis tools cloned as-is.
  Auxiliary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceEntry {
  pub url: &'static str,
  /// Directory name under the output directory.
  pub dir: &'static str,
  pub kind: SourceKind,
}

const IMP: SourceEntry = SourceEntry {
  url: IMP_REPO_URL,
  dir: IMP_DIR,
  kind: SourceKind::Main,
};

const PMI_ANALYSIS: SourceEntry = SourceEntry {
  url: PMI_ANALYSIS_REPO_URL,
  dir: PMI_ANALYSIS_DIR,
  kind: SourceKind::Auxiliary,
};

const IMP_SAMPCON: SourceEntry = SourceEntry {
  url: IMP_SAMPCON_REPO_URL,
  dir: IMP_SAMPCON_DIR,
  kind: SourceKind::Auxiliary,
};

/// Ordered list of repositories to retrieve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceManifest {
  entries: Vec<SourceEntry>,
}

impl SourceManifest {
  pub fn resolve(mode: Mode) -> Self {
    let entries = match mode {
      Mode::Development => vec![IMP, PMI_ANALYSIS, IMP_SAMPCON],
      Mode::Production => vec![PMI_ANALYSIS, IMP_SAMPCON],
    };
    Self { entries }
  }

  pub fn entries(&self) -> &[SourceEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn dirs(&self) -> Vec<&'static str> {
    self.entries.iter().map(|e| e.dir).collect()
  }
}
