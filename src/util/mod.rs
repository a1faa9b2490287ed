//! Small helpers shared by the parsers, widgets and the terminal layer.
//!
//! - **Date keys**: compact `YYMMDD` keys used in feed item ids and URL templates
//! - **Text processing**: display width and terminal-safe rendering of feed text
//! - **Links**: scheme checks before handing a URL to the system browser

mod date_key;
mod open_url;
mod text;

pub use date_key::{format_date_key, resolve_url_template, DATE_PLACEHOLDER};
pub use open_url::{validate_url_for_open, OpenUrlError};
pub use text::{display_width, sanitize_for_terminal, strip_markup};
