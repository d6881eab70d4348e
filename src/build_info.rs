//! Build information module
//!
//! Compile-time build number and timestamp, reported by the status tool and the
//! startup banner.

use std::fmt;

use serde::Serialize;

/// Build number, from the release pipeline or the local rebuild counter
pub const BUILD_NUMBER: u64 = match option_env!("BREWLAB_BUILD_NUMBER") {
    Some(s) => match parse_u64(s) {
        Some(n) => n,
        None => 0,
    },
    None => 0,
};

/// Build timestamp in ISO 8601 format
pub const BUILD_TIMESTAMP: &str = match option_env!("BREWLAB_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Parse a decimal u64 in const context; None on any non-digit
const fn parse_u64(s: &str) -> Option<u64> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let mut result: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            return None;
        }
        result = result * 10 + (b - b'0') as u64;
        i += 1;
    }
    Some(result)
}

/// Build information structure for serialization
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub description: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: BUILD_NUMBER,
            build_timestamp: BUILD_TIMESTAMP,
            description: DESCRIPTION,
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (build {}, {})",
            self.name, self.version, self.build_number, self.build_timestamp
        )
    }
}

/// Print the startup banner to stderr
pub fn print_startup_banner() {
    let info = BuildInfo::current();
    eprintln!("===============================================");
    eprintln!("  Brewlab - Homebrew Recipe Lab");
    eprintln!("  Version: {} | Build: {}", info.version, info.build_number);
    eprintln!("  Compiled: {}", info.build_timestamp);
    eprintln!("===============================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("42"), Some(42));
        assert_eq!(parse_u64("0"), Some(0));
        assert_eq!(parse_u64(""), None);
        assert_eq!(parse_u64("12a"), None);
    }

    #[test]
    fn test_display() {
        let info = BuildInfo {
            name: "brewlab",
            version: "1.0.0",
            build_number: 7,
            build_timestamp: "2026-01-01T00:00:00Z",
            description: "",
        };
        assert_eq!(info.to_string(), "brewlab 1.0.0 (build 7, 2026-01-01T00:00:00Z)");
    }
}
