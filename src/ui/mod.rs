//! Terminal User Interface module.
//!
//! This module provides the TUI for the dashboard, including:
//! - Main event loop (`run`)
//! - Keyboard input handling
//! - Rendering of the control column, widget panels and status bar
//! - Background refresh event processing
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - Layout and render dispatch
//! - `helpers` - Background task spawning and panic capture
//! - `controls` - Group and widget checkbox column
//! - `panels` - Widget panel rendering
//! - `status` - Status bar widget

mod controls;
mod events;
mod helpers;
mod input;
mod loop_runner;
mod panels;
mod render;
mod status;

// Re-export the public API
pub use loop_runner::{run, Action};
