//! Rich terminal display utilities for CLI output.
//!
//! Provides styled tables, progress bars, and formatted output
//! for the build and query commands.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{create_progress_bar, create_spinner, with_spinner};
pub use tables::{TableBuilder, create_evaluation_table, create_index_info_table};
pub use theme::{THEME, Theme};
