//! Kernel command-line options
//!
//! The bootloader forwards whatever the operator typed after the kernel path;
//! the boot sequence parses it from the `Cmdline` tag and applies it before
//! reporting the rest of the boot information. Whitespace-separated
//! `key=value` tokens; anything unrecognized is ignored (other consumers may
//! claim it later).

use log::LevelFilter;

/// Options recognized on the kernel command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootOptions {
    /// Diagnostic verbosity, `loglevel=` (or `quiet` for errors only).
    pub log_level: LevelFilter,
}

impl BootOptions {
    pub const DEFAULT: BootOptions = BootOptions {
        log_level: LevelFilter::Info,
    };

    /// Parse one command line. Never fails: unknown tokens are skipped and a
    /// malformed value falls back to the default for that option.
    pub fn parse(line: &str) -> Self {
        let mut options = Self::DEFAULT;
        for token in line.split_whitespace() {
            match token.split_once('=') {
                _ if token == "quiet" => options.log_level = LevelFilter::Error,
                Some(("loglevel", value)) => match level_filter(value) {
                    Some(level) => options.log_level = level,
                    None => log::warn!("unknown loglevel '{}', keeping default", value),
                },
                _ => log::debug!("ignoring boot option '{}'", token),
            }
        }
        options
    }

    /// Apply the options to the diagnostic sink.
    pub fn apply(&self) {
        crate::logger::set_level(self.log_level);
        log::info!("log level set to {}", self.log_level);
    }
}

impl Default for BootOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn level_filter(value: &str) -> Option<LevelFilter> {
    match value {
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}
