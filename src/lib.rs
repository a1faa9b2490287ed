//! stormwatch: a terminal dashboard of toggleable SPC severe-weather widgets.
//!
//! - [`feed`]: RSS and storm-report CSV deserialization, plus the fetch seam
//! - [`widget`]: the four widget variants and their refresh lifecycle
//! - [`dashboard`]: widget and group toggles kept consistent with each other
//! - [`storage`]: SQLite-backed persistence of toggle state
//! - [`config`]: optional TOML configuration
//!
//! The terminal front end lives in the binary.

pub mod config;
pub mod dashboard;
pub mod feed;
pub mod storage;
pub mod util;
pub mod widget;
