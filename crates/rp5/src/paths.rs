//! Locates the Ruby-Processing installation root and the per-user `.rp5rc`,
//! honouring environment overrides so packaged installs, development checkouts,
//! and tests all resolve the bundled jar, starter scripts, and samples the same way.
//!
//! Types:
//!
//! - `InstallPaths` captures the resolved root, home, and config file locations.
//!
//! Functions:
//!
//! - `InstallPaths::discover` probes environment variables and the executable location.
//! - Accessors like `jruby_complete_jar` and `runner_script` encode the fixed layout
//!   under the installation root.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::BaseDirs;

pub const ENV_ROOT_DIR: &str = "RP5_ROOT";
pub const ENV_CONFIG_FILE: &str = "RP5_CONFIG";

const CONFIG_FILE_NAME: &str = ".rp5rc";
const RUNNERS_DIR: &str = "lib/ruby-processing/runners";

#[derive(Debug, Clone)]
pub struct InstallPaths {
    root: PathBuf,
    home_dir: Option<PathBuf>,
    config_file: Option<PathBuf>,
}

impl InstallPaths {
    pub fn discover() -> Result<Self> {
        let root = match env_override(ENV_ROOT_DIR) {
            Some(root) => root,
            None => detect_install_root()?,
        };
        let home_dir = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        let config_file = env_override(ENV_CONFIG_FILE)
            .or_else(|| home_dir.as_ref().map(|home| home.join(CONFIG_FILE_NAME)));

        Ok(Self {
            root,
            home_dir,
            config_file,
        })
    }

    pub fn from_raw(root: PathBuf, home_dir: PathBuf) -> Self {
        let config_file = Some(home_dir.join(CONFIG_FILE_NAME));
        Self {
            root,
            home_dir: Some(home_dir),
            config_file,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn jruby_complete_jar(&self) -> PathBuf {
        self.root.join("lib/ruby/jruby-complete.jar")
    }

    pub fn runners_dir(&self) -> PathBuf {
        self.root.join(RUNNERS_DIR)
    }

    pub fn runner_script(&self, starter: &str) -> PathBuf {
        self.runners_dir().join(starter)
    }

    pub fn samples_dir(&self) -> PathBuf {
        self.root.join("samples")
    }

    pub fn vendors_dir(&self) -> PathBuf {
        self.root.join("vendors")
    }

    pub fn application_template_dir(&self) -> PathBuf {
        self.root.join("lib/templates/application")
    }

    pub fn dock_icon(&self) -> PathBuf {
        self.application_template_dir()
            .join("Contents/Resources/sketch.icns")
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

fn detect_install_root() -> Result<PathBuf> {
    let exe = env::current_exe().context("failed to locate the rp5 executable")?;
    let exe = exe.canonicalize().unwrap_or(exe);

    if let Some(root) = exe
        .ancestors()
        .skip(1)
        .find(|dir| dir.join(RUNNERS_DIR).is_dir())
    {
        return Ok(root.to_path_buf());
    }

    // Packaged layout: <root>/bin/rp5
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            anyhow!(
                "failed to determine installation root from {}; set {ENV_ROOT_DIR}",
                exe.display()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::Mutex;
    use tempfile::TempDir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Process environment changes that are undone, newest first, on drop.
    #[derive(Default)]
    struct ScopedEnv {
        saved: Vec<(&'static str, Option<OsString>)>,
    }

    impl ScopedEnv {
        fn set(&mut self, key: &'static str, value: &Path) -> &mut Self {
            self.saved.push((key, env::var_os(key)));
            env::set_var(key, value);
            self
        }

        fn unset(&mut self, key: &'static str) -> &mut Self {
            self.saved.push((key, env::var_os(key)));
            env::remove_var(key);
            self
        }
    }

    impl Drop for ScopedEnv {
        fn drop(&mut self) {
            while let Some((key, value)) = self.saved.pop() {
                match value {
                    Some(value) => env::set_var(key, value),
                    None => env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn env_overrides_take_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let root = TempDir::new().unwrap();
        let install_root = root.path().join("ruby-processing");
        let config_file = root.path().join("custom.rp5rc");

        let mut scoped = ScopedEnv::default();
        scoped
            .set(ENV_ROOT_DIR, &install_root)
            .set(ENV_CONFIG_FILE, &config_file);

        let paths = InstallPaths::discover().unwrap();

        assert_eq!(paths.root(), install_root.as_path());
        assert_eq!(paths.config_file(), Some(config_file.as_path()));
    }

    #[cfg(target_family = "unix")]
    #[test]
    fn config_file_defaults_to_home() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let root = TempDir::new().unwrap();
        let home = root.path().join("home");

        let mut scoped = ScopedEnv::default();
        scoped
            .set(ENV_ROOT_DIR, root.path())
            .unset(ENV_CONFIG_FILE)
            .set("HOME", &home);

        let paths = InstallPaths::discover().unwrap();

        assert_eq!(paths.config_file(), Some(home.join(".rp5rc").as_path()));
        assert_eq!(paths.home_dir(), Some(home.as_path()));
    }

    #[test]
    fn layout_is_relative_to_root() {
        let paths = InstallPaths::from_raw(PathBuf::from("/opt/rp5"), PathBuf::from("/home/p5"));

        assert_eq!(
            paths.jruby_complete_jar(),
            Path::new("/opt/rp5/lib/ruby/jruby-complete.jar")
        );
        assert_eq!(
            paths.runner_script("watch.rb"),
            Path::new("/opt/rp5/lib/ruby-processing/runners/watch.rb")
        );
        assert_eq!(paths.samples_dir(), Path::new("/opt/rp5/samples"));
        assert_eq!(paths.vendors_dir(), Path::new("/opt/rp5/vendors"));
        assert_eq!(
            paths.dock_icon(),
            Path::new("/opt/rp5/lib/templates/application/Contents/Resources/sketch.icns")
        );
        assert_eq!(paths.config_file(), Some(Path::new("/home/p5/.rp5rc")));
    }
}
