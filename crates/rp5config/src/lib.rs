//! Reads and writes the per-user `.rp5rc` settings file that tells `rp5` where
//! Processing is installed and which JRuby runtime to launch sketches with.
//!
//! Types:
//!
//! - `Rp5Config` mirrors the YAML mapping (`PROCESSING_ROOT`, `JRUBY`, `java_args`).
//! - `ConfigError` classifies I/O and parse failures.
//!
//! Functions:
//!
//! - `Rp5Config::from_yaml_str`, `load`, and `load_or_default` parse settings.
//! - `Rp5Config::persist` writes the mapping back out as YAML.
//! - Accessors such as `jruby_disabled` and `java_args` interpret raw values.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write configuration at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Rp5Config {
    #[serde(rename = "PROCESSING_ROOT", skip_serializing_if = "Option::is_none")]
    pub processing_root: Option<String>,
    #[serde(
        rename = "JRUBY",
        deserialize_with = "deserialize_flag_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub jruby: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_args: Option<String>,
}

fn deserialize_flag_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a boolean or a string flag")
        }

        fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.trim().to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl Rp5Config {
    /// Builds the two-key mapping written by `rp5 setup install`.
    pub fn with_root(processing_root: impl Into<String>) -> Self {
        Self {
            processing_root: Some(processing_root.into()),
            jruby: Some(true.to_string()),
            java_args: None,
        }
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn persist(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let serialized = serde_yaml::to_string(self)?;
        fs::write(path, serialized).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// True only when `JRUBY` is explicitly `false`. Any other value, or an
    /// unset flag, keeps the installed JRuby as the default runtime.
    pub fn jruby_disabled(&self) -> bool {
        self.jruby.as_deref() == Some("false")
    }

    pub fn java_args(&self) -> Option<Vec<String>> {
        self.java_args
            .as_ref()
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
    }
}
