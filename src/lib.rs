//! Terminal health dashboard for a local multi-container stack.
//!
//! Every refresh the monitor lists the Docker containers once, resolves the
//! state and health of each tracked service concurrently, classifies it and
//! draws a grouped summary with ratatui.

pub mod app;
pub mod cli;
pub mod core;
pub mod screens;
pub mod utils;
