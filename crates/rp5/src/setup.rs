use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use rp5config::Rp5Config;
use tracing::{debug, info, warn};

use crate::paths::InstallPaths;
use crate::platform::Platform;

pub const SAMPLES_TARGET: &str = "rp_samples";
pub const USAGE: &str = "Usage: rp5 setup [check | install | unpack_samples]";

const PROCESSING_VERSION: &str = "2.2.1";
const MAC_PROCESSING_ROOT: &str = "/Applications/Processing.app/Contents/Java";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupChoice {
    Check,
    Install,
    UnpackSamples,
    Usage,
}

impl SetupChoice {
    pub fn from_choice(choice: &str) -> Self {
        if choice.contains("check") {
            Self::Check
        } else if choice.contains("install") {
            Self::Install
        } else if choice.contains("unpack_samples") {
            Self::UnpackSamples
        } else {
            Self::Usage
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub version: String,
    pub processing_root: Option<String>,
    pub jruby: Option<String>,
    pub jruby_complete_installed: bool,
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", version_line(&self.version))?;
        match &self.processing_root {
            Some(root) => writeln!(f, "  PROCESSING_ROOT = {root}")?,
            None => writeln!(f, "  PROCESSING_ROOT = Not Set!!!")?,
        }
        if let Some(jruby) = &self.jruby {
            writeln!(f, "  JRUBY = {jruby}")?;
        }
        write!(
            f,
            "  jruby-complete installed = {}",
            self.jruby_complete_installed
        )
    }
}

pub fn version_line(version: &str) -> String {
    format!("Ruby-Processing version {version}")
}

/// Reports the current setup without touching the filesystem.
pub fn check(paths: &InstallPaths, config: &Rp5Config) -> CheckReport {
    let config_present = paths.config_file().is_some_and(Path::exists);
    let processing_root = if config_present {
        config.processing_root.clone()
    } else {
        None
    };

    CheckReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        processing_root,
        jruby: config.jruby.clone(),
        jruby_complete_installed: paths.jruby_complete_jar().exists(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub vendors_built: bool,
    pub written_config: Option<PathBuf>,
}

pub fn install(paths: &InstallPaths, platform: Platform) -> Result<InstallReport> {
    let mut report = InstallReport {
        vendors_built: build_vendors(&paths.vendors_dir()),
        written_config: None,
    };

    let Some(config_file) = paths.config_file() else {
        warn!("no home directory found; skipping .rp5rc creation");
        return Ok(report);
    };
    if config_file.exists() {
        debug!(path = %config_file.display(), "keeping existing configuration");
        return Ok(report);
    }

    let root = default_processing_root(platform, paths.home_dir());
    Rp5Config::with_root(root)
        .persist(config_file)
        .with_context(|| format!("failed to write default config {}", config_file.display()))?;
    warn!("PROCESSING_ROOT set optimistically, run check to confirm");
    report.written_config = Some(config_file.to_path_buf());
    Ok(report)
}

fn build_vendors(vendors: &Path) -> bool {
    info!(path = %vendors.display(), "installing vendored dependencies");
    match Command::new("rake").current_dir(vendors).status() {
        Ok(status) if status.success() => true,
        Ok(status) => {
            warn!(%status, "vendor install finished unsuccessfully");
            false
        }
        Err(err) => {
            warn!(error = %err, path = %vendors.display(), "failed to run rake for vendors");
            false
        }
    }
}

pub fn default_processing_root(platform: Platform, home: Option<&Path>) -> String {
    if platform == Platform::MacOsX {
        return MAC_PROCESSING_ROOT.to_string();
    }
    let dir = format!("processing-{PROCESSING_VERSION}");
    match home {
        Some(home) => home.join(dir).display().to_string(),
        None => dir,
    }
}

/// Copies the bundled samples into `<dest_parent>/rp_samples`.
pub fn unpack_samples(paths: &InstallPaths, dest_parent: &Path) -> Result<PathBuf> {
    let source = paths.samples_dir();
    if !source.is_dir() {
        bail!("bundled samples not found at {}", source.display());
    }

    let target = dest_parent.join(SAMPLES_TARGET);
    let files = copy_tree(&source, &target).with_context(|| {
        format!(
            "failed to unpack samples {} -> {}",
            source.display(),
            target.display()
        )
    })?;
    info!(target = %target.display(), files, "unpacked samples");
    Ok(target)
}

/// Mirrors the tree under `src` into `dst`, overwriting files that already
/// exist there. Returns the number of files copied.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    let mut pending = vec![(src.to_path_buf(), dst.to_path_buf())];
    let mut copied = 0;

    while let Some((from, to)) = pending.pop() {
        fs::create_dir_all(&to).with_context(|| format!("cannot create {}", to.display()))?;
        let listing =
            fs::read_dir(&from).with_context(|| format!("cannot list {}", from.display()))?;

        for entry in listing {
            let entry = entry.with_context(|| format!("cannot list {}", from.display()))?;
            let source = entry.path();
            let target = to.join(entry.file_name());
            let kind = entry.file_type()?;

            if kind.is_dir() {
                pending.push((source, target));
            } else if kind.is_file() {
                fs::copy(&source, &target).with_context(|| {
                    format!("cannot copy {} to {}", source.display(), target.display())
                })?;
                copied += 1;
            } else {
                debug!(path = %source.display(), "not copying special file");
            }
        }
    }

    Ok(copied)
}
