//! Packages a sketch into a self-contained `<Title>.app` bundle next to the
//! sketch: the sketch and its `data/`/`lib/` folders, the starter runners, the
//! bundled JRuby jar, and a launch script that runs them with plain `java`.
//!
//! Functions:
//!
//! - `export_app` builds (or rebuilds) the bundle and returns its path.
//! - `info_plist` and `launch_script` render the generated text files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::sketch_name;
use crate::create::{camelize, titleize};
use crate::launch::Starter;
use crate::paths::InstallPaths;
use crate::setup::copy_tree;

const BUNDLED_JAR: &str = "jruby-complete.jar";
const RUNNERS_TARGET: &str = "ruby-processing/runners";

pub fn export_app(paths: &InstallPaths, sketch: &Path, java_args: &[String]) -> Result<PathBuf> {
    let name = sketch_name(&sketch.display().to_string());
    let title = titleize(&name);
    let executable = camelize(&name);
    let sketch_dir = sketch
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let sketch_file = sketch
        .file_name()
        .map(|file| file.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{name}.rb"));

    let bundle = sketch_dir.join(format!("{title}.app"));
    if bundle.exists() {
        fs::remove_dir_all(&bundle)
            .with_context(|| format!("failed to replace {}", bundle.display()))?;
    }

    let contents = bundle.join("Contents");
    let java_dir = contents.join("Java");
    let macos_dir = contents.join("MacOS");
    let resources_dir = contents.join("Resources");
    for dir in [&java_dir, &macos_dir, &resources_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    fs::copy(sketch, java_dir.join(&sketch_file))
        .with_context(|| format!("failed to copy sketch {}", sketch.display()))?;
    for folder in ["data", "lib"] {
        let source = sketch_dir.join(folder);
        if source.is_dir() {
            copy_tree(&source, &java_dir.join(folder))?;
        }
    }

    let runners = paths.runners_dir();
    if runners.is_dir() {
        copy_tree(&runners, &java_dir.join(RUNNERS_TARGET))?;
    } else {
        warn!(path = %runners.display(), "starter runners missing; bundle will not launch");
    }

    let jar = paths.jruby_complete_jar();
    if jar.is_file() {
        fs::copy(&jar, java_dir.join(BUNDLED_JAR))
            .with_context(|| format!("failed to copy {}", jar.display()))?;
    } else {
        warn!(path = %jar.display(), "jruby-complete not installed; run `rp5 setup install`");
    }

    let icon = paths.dock_icon();
    if icon.is_file() {
        fs::copy(&icon, resources_dir.join("sketch.icns"))
            .with_context(|| format!("failed to copy {}", icon.display()))?;
    }

    fs::write(contents.join("Info.plist"), info_plist(&title, &executable))?;
    let script = macos_dir.join(&executable);
    fs::write(&script, launch_script(&sketch_file, java_args))?;
    mark_executable(&script)?;

    info!(bundle = %bundle.display(), "exported application");
    Ok(bundle)
}

pub fn info_plist(title: &str, executable: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>CFBundleName</key>
  <string>{title}</string>
  <key>CFBundleExecutable</key>
  <string>{executable}</string>
  <key>CFBundleIdentifier</key>
  <string>org.ruby-processing.{executable}</string>
  <key>CFBundleIconFile</key>
  <string>sketch.icns</string>
  <key>CFBundlePackageType</key>
  <string>APPL</string>
</dict>
</plist>
"#
    )
}

pub fn launch_script(sketch_file: &str, java_args: &[String]) -> String {
    let runner = format!("{RUNNERS_TARGET}/{}", Starter::Run.script());
    let words = java_args
        .iter()
        .map(String::as_str)
        .chain(["-cp", BUNDLED_JAR, "org.jruby.Main", runner.as_str(), sketch_file]);

    let mut command = String::from("exec java");
    for word in words {
        command.push(' ');
        command.push_str(&shell_quote(word));
    }
    format!(
        "#!/bin/sh\ncd \"$(dirname \"$0\")/../Java\" || exit 1\n{command} \"$@\"\n"
    )
}

/// Quotes `word` for `/bin/sh`. Words made only of safe characters stay bare.
fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
fn mark_executable(_: &Path) -> Result<()> {
    Ok(())
}
