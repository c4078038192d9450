//! Shared utilities.
//!
//! Test helpers live here so every module's tests can drive the orchestrator
//! pieces without spawning real tools.

#[cfg(test)]
pub mod testutil;
