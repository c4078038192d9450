//! End-to-end tests driving the impforge binary against stand-in tools.

#![cfg(unix)]

mod common;
mod install_tests;
