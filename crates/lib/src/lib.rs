//! impforge-lib: installation orchestrator for IMP.
//!
//! This crate provides the pieces the `impforge` binary sequences:
//! - `config`: the immutable install configuration and mode selection
//! - `manifest`: which repositories a mode retrieves
//! - `fetch`, `conda`, `build`: wrappers over git, conda and the platform build scripts
//! - `buildlog`, `profile`: bookkeeping written after the build
//! - `install`: the orchestrator state machine tying it all together

pub mod build;
pub mod buildlog;
pub mod conda;
pub mod config;
pub mod consts;
pub mod exec;
pub mod fetch;
pub mod install;
pub mod manifest;
pub mod platform;
pub mod prereq;
pub mod profile;
pub mod template;
pub mod util;
