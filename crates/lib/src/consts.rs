//! Fixed names, locations and defaults.

pub const APP_NAME: &str = "impforge";

/// Modules disabled by `--minimal-install`.
pub const HEAVY_MODULES: [&str; 6] = ["multifit", "membrane", "spb", "npc", "foxs", "saxs_merge"];

pub const IMP_REPO_URL: &str = "https://github.com/tanmoy7989/imp.git";
pub const PMI_ANALYSIS_REPO_URL: &str = "https://github.com/tanmoy7989/PMI_analysis.git";
pub const IMP_SAMPCON_REPO_URL: &str = "https://github.com/tanmoy7989/imp-sampcon.git";

pub const IMP_DIR: &str = "imp";
pub const PMI_ANALYSIS_DIR: &str = "pmi_analysis";
pub const IMP_SAMPCON_DIR: &str = "imp_sampcon";

pub const DEFAULT_ENV_NAME: &str = "impenv";
pub const DEFAULT_OUT_DIR: &str = "salilab";
pub const DEFAULT_TEMPLATE: &str = "impenv.yml.template";
pub const DEFAULT_SCRIPTS_DIR: &str = ".";

pub const LINUX_BUILD_SCRIPT: &str = "make_imp_linux.sh";
pub const MACOS_BUILD_SCRIPT: &str = "make_imp_macosx.sh";

/// Marker file the build scripts leave in the output directory once `make install` finished.
pub const BUILD_DONE_MARKER: &str = ".done";
pub const BUILD_LOG_PREFIX: &str = "IMP_build_spec_";

/// Stand-in for an empty disabled-module list; the build scripts choke on a bare empty argument.
pub const EMPTY_MODULES_TOKEN: &str = "\"\"";
