use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::RunnerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOsX,
    Linux,
    Unix,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::MacOsX => "macosx",
            Self::Linux => "linux",
            Self::Unix => "unix",
        };
        f.write_str(name)
    }
}

fn patterns() -> &'static [(Regex, Platform)] {
    static PATTERNS: OnceLock<Vec<(Regex, Platform)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                r"(?i)mswin|msys|mingw|cygwin|bccwin|wince|emc|windows",
                Platform::Windows,
            ),
            (r"(?i)darwin|mac os", Platform::MacOsX),
            (r"(?i)linux", Platform::Linux),
            (r"(?i)solaris|bsd", Platform::Unix),
        ]
        .into_iter()
        .map(|(pattern, platform)| {
            (
                Regex::new(pattern).expect("platform patterns are valid regexes"),
                platform,
            )
        })
        .collect()
    })
}

/// Maps a host identifier such as `x86_64-linux` or `Windows_NT` to a platform
/// tag. Patterns are tried in order and the first match wins.
pub fn classify_platform(raw: &str) -> Result<Platform, RunnerError> {
    patterns()
        .iter()
        .find(|(pattern, _)| pattern.is_match(raw))
        .map(|(_, platform)| *platform)
        .ok_or_else(|| RunnerError::UnknownPlatform(raw.to_string()))
}

/// Host identifier for the platform this binary was compiled for.
pub fn host_os() -> &'static str {
    if cfg!(target_os = "macos") {
        "darwin"
    } else {
        std::env::consts::OS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_platform_tags() {
        assert_eq!(Platform::MacOsX.to_string(), "macosx");
        assert_eq!(classify_platform("FreeBSD").unwrap().to_string(), "unix");
    }

    #[test]
    fn classifies_windows_family() {
        assert_eq!(classify_platform("Windows_NT").unwrap(), Platform::Windows);
        assert_eq!(classify_platform("mingw32").unwrap(), Platform::Windows);
        assert_eq!(classify_platform("cygwin").unwrap(), Platform::Windows);
        assert_eq!(classify_platform("windows").unwrap(), Platform::Windows);
    }

    #[test]
    fn classifies_mac_variants() {
        assert_eq!(classify_platform("darwin13.0").unwrap(), Platform::MacOsX);
        assert_eq!(classify_platform("Mac OS X").unwrap(), Platform::MacOsX);
    }

    #[test]
    fn classifies_unix_variants() {
        assert_eq!(classify_platform("linux-gnu").unwrap(), Platform::Linux);
        assert_eq!(classify_platform("solaris").unwrap(), Platform::Unix);
        assert_eq!(classify_platform("freebsd").unwrap(), Platform::Unix);
        assert_eq!(classify_platform("openbsd").unwrap(), Platform::Unix);
    }

    #[test]
    fn unknown_platform_is_an_error() {
        let err = classify_platform("plan9").unwrap_err();
        assert!(matches!(err, RunnerError::UnknownPlatform(ref raw) if raw == "plan9"));
        assert_eq!(err.to_string(), "unknown os: \"plan9\"");
    }

    #[test]
    fn host_os_is_classifiable() {
        if cfg!(any(
            target_os = "linux",
            target_os = "macos",
            target_os = "windows",
            target_os = "freebsd"
        )) {
            assert!(classify_platform(host_os()).is_ok());
        }
    }
}
