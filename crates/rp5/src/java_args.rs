use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rp5config::Rp5Config;
use tracing::debug;

use crate::launch::Runtime;
use crate::paths::InstallPaths;
use crate::platform::Platform;

const JRUBY_PASSTHROUGH: &str = "-J";

/// Location of the per-sketch VM flags file.
pub fn java_args_file(sketch: &Path) -> PathBuf {
    sketch
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("data/java_args.txt")
}

/// Collects extra VM flags for a sketch: platform flags first, then the
/// sketch's `data/java_args.txt` or, failing that, the configured `java_args`.
pub fn discover_java_args(
    sketch: &Path,
    config: &Rp5Config,
    platform: Platform,
    paths: &InstallPaths,
    runtime: Runtime,
) -> Result<Vec<String>> {
    let mut args = dock_icon(platform, paths);

    let arg_file = java_args_file(sketch);
    if arg_file.is_file() {
        let contents = fs::read_to_string(&arg_file)
            .with_context(|| format!("failed to read java args from {}", arg_file.display()))?;
        debug!(path = %arg_file.display(), "using sketch java_args.txt");
        args.extend(contents.split_whitespace().map(str::to_string));
    } else if let Some(configured) = config.java_args() {
        debug!(count = configured.len(), "using java_args from configuration");
        args.extend(configured);
    }

    if runtime == Runtime::InstalledJruby {
        args = args
            .into_iter()
            .map(|arg| format!("{JRUBY_PASSTHROUGH}{arg}"))
            .collect();
    }

    Ok(args)
}

fn dock_icon(platform: Platform, paths: &InstallPaths) -> Vec<String> {
    if platform != Platform::MacOsX {
        return Vec::new();
    }
    vec![
        "-Xdock:name=Ruby-Processing".to_string(),
        format!("-Xdock:icon={}", paths.dock_icon().display()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        sketch: PathBuf,
        paths: InstallPaths,
    }

    fn fixture(java_args: Option<&str>) -> Fixture {
        let root = TempDir::new().unwrap();
        let sketch_dir = root.path().join("sketch");
        fs::create_dir_all(sketch_dir.join("data")).unwrap();
        let sketch = sketch_dir.join("fire.rb");
        fs::write(&sketch, "def setup; end").unwrap();
        if let Some(contents) = java_args {
            fs::write(sketch_dir.join("data/java_args.txt"), contents).unwrap();
        }
        let paths = InstallPaths::from_raw(root.path().join("rp5"), root.path().join("home"));
        Fixture {
            _root: root,
            sketch,
            paths,
        }
    }

    fn config_with_args(raw: &str) -> Rp5Config {
        Rp5Config {
            java_args: Some(raw.to_string()),
            ..Rp5Config::default()
        }
    }

    #[test]
    fn reads_sketch_java_args_file() {
        let fixture = fixture(Some("-Xmx512m -Xms256m"));
        let args = discover_java_args(
            &fixture.sketch,
            &Rp5Config::default(),
            Platform::Linux,
            &fixture.paths,
            Runtime::JrubyComplete,
        )
        .unwrap();
        assert_eq!(args, vec!["-Xmx512m".to_string(), "-Xms256m".to_string()]);
    }

    #[test]
    fn file_takes_precedence_over_config() {
        let fixture = fixture(Some("-Xmx512m\n-Xms256m\n"));
        let args = discover_java_args(
            &fixture.sketch,
            &config_with_args("-Xmx2g"),
            Platform::Linux,
            &fixture.paths,
            Runtime::JrubyComplete,
        )
        .unwrap();
        assert_eq!(args, vec!["-Xmx512m".to_string(), "-Xms256m".to_string()]);
    }

    #[test]
    fn falls_back_to_config() {
        let fixture = fixture(None);
        let args = discover_java_args(
            &fixture.sketch,
            &config_with_args("-Xmx2g -Dsun.java2d.opengl=true"),
            Platform::Unix,
            &fixture.paths,
            Runtime::JrubyComplete,
        )
        .unwrap();
        assert_eq!(
            args,
            vec!["-Xmx2g".to_string(), "-Dsun.java2d.opengl=true".to_string()]
        );
    }

    #[test]
    fn empty_without_any_source() {
        let fixture = fixture(None);
        let args = discover_java_args(
            &fixture.sketch,
            &Rp5Config::default(),
            Platform::Windows,
            &fixture.paths,
            Runtime::InstalledJruby,
        )
        .unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn installed_jruby_prefixes_every_flag() {
        let fixture = fixture(Some("-Xmx512m -Xms256m"));
        let args = discover_java_args(
            &fixture.sketch,
            &Rp5Config::default(),
            Platform::Linux,
            &fixture.paths,
            Runtime::InstalledJruby,
        )
        .unwrap();
        assert_eq!(args, vec!["-J-Xmx512m".to_string(), "-J-Xms256m".to_string()]);
    }

    #[test]
    fn mac_dock_flags_come_first() {
        let fixture = fixture(Some("-Xmx512m"));
        let args = discover_java_args(
            &fixture.sketch,
            &Rp5Config::default(),
            Platform::MacOsX,
            &fixture.paths,
            Runtime::InstalledJruby,
        )
        .unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(args[0], "-J-Xdock:name=Ruby-Processing");
        assert!(args[1].starts_with("-J-Xdock:icon="));
        assert!(args[1].ends_with("sketch.icns"));
        assert_eq!(args[2], "-J-Xmx512m");
    }

    #[test]
    fn bare_sketch_name_looks_in_working_directory() {
        assert_eq!(
            java_args_file(Path::new("fire.rb")),
            Path::new("data/java_args.txt")
        );
    }
}
