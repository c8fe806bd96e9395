//! Output handling for the command-line tools.
//!
//! This module provides:
//! - Unified output formatting (text, JSON)
//! - Consistent exit codes derived from `RecommendError`

pub mod exit_code;
pub mod format;

pub use exit_code::ExitCode;
pub use format::{ErrorDetails, JsonResponse, OutputFormat};
