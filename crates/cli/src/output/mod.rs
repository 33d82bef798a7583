//! Output formatting utilities
//!
//! This module provides formatters for CLI output in both human-readable
//! and JSON formats. It also handles progress spinners and colored output.

mod formatter;
mod progress;
mod table;

pub use formatter::Formatter;
pub use progress::ProgressBar;
pub use table::object_table;

/// Color handling for human-readable output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Color when the terminal supports it
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Parse the `color` value of the config file; unknown values mean auto
    pub fn from_config(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "always" => Self::Always,
            "never" => Self::Never,
            _ => Self::Auto,
        }
    }
}

/// Output configuration derived from CLI flags and config defaults
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Color mode
    pub color: ColorMode,
    /// Disable progress spinners
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mode_from_config() {
        assert_eq!(ColorMode::from_config("always"), ColorMode::Always);
        assert_eq!(ColorMode::from_config("NEVER"), ColorMode::Never);
        assert_eq!(ColorMode::from_config("auto"), ColorMode::Auto);
        assert_eq!(ColorMode::from_config("sometimes"), ColorMode::Auto);
    }
}
