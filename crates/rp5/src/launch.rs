//! Builds the command a sketch is handed off to, either the installed `jruby`
//! or `java` running the bundled `jruby-complete.jar`, and performs the final
//! process replacement once `main` decides to launch.
//!
//! Types:
//!
//! - `Starter` names the runner script (`run.rb`, `watch.rb`, `live.rb`).
//! - `Runtime` selects between the installed JRuby and the bundled jar.
//! - `Handoff` is the program plus argv the process becomes.
//!
//! Functions:
//!
//! - `build_handoff` assembles argv for a starter, sketch, and runtime.
//! - `Handoff::exec` replaces the current process.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::RunnerError;
use crate::paths::InstallPaths;

const JAVA_BINARY: &str = "java";
const JRUBY_BINARY: &str = "jruby";
const JRUBY_MAIN_CLASS: &str = "org.jruby.Main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Starter {
    Run,
    Watch,
    Live,
}

impl Starter {
    pub fn script(self) -> &'static str {
        match self {
            Self::Run => "run.rb",
            Self::Watch => "watch.rb",
            Self::Live => "live.rb",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    /// `jruby` found on the user's PATH.
    InstalledJruby,
    /// `java -cp jruby-complete.jar org.jruby.Main`.
    JrubyComplete,
}

impl Runtime {
    pub fn from_nojruby(nojruby: bool) -> Self {
        if nojruby {
            Self::JrubyComplete
        } else {
            Self::InstalledJruby
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub program: String,
    pub args: Vec<String>,
}

impl Handoff {
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Replaces the running process. Only returns if the replacement could
    /// not be started.
    #[cfg(unix)]
    pub fn exec(self) -> io::Error {
        use std::os::unix::process::CommandExt;

        info!(command = %self, "handing off to sketch runtime");
        Command::new(&self.program).args(&self.args).exec()
    }

    /// Without `execve`, run the child to completion and exit with its status.
    #[cfg(not(unix))]
    pub fn exec(self) -> io::Error {
        info!(command = %self, "handing off to sketch runtime");
        match Command::new(&self.program).args(&self.args).status() {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(err) => err,
        }
    }
}

impl fmt::Display for Handoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv().join(" "))
    }
}

pub fn build_handoff(
    paths: &InstallPaths,
    starter: Starter,
    sketch: &Path,
    sketch_args: &[String],
    runtime: Runtime,
    java_args: Vec<String>,
) -> Result<Handoff, RunnerError> {
    let runner = paths.runner_script(starter.script());
    let mut args = java_args;

    let program = match runtime {
        Runtime::JrubyComplete => {
            let jar = paths.jruby_complete_jar();
            if !jar.exists() {
                return Err(RunnerError::JarMissing(jar));
            }
            args.push("-cp".to_string());
            args.push(jar.display().to_string());
            args.push(JRUBY_MAIN_CLASS.to_string());
            JAVA_BINARY
        }
        Runtime::InstalledJruby => JRUBY_BINARY,
    };

    args.push(runner.display().to_string());
    args.push(sketch.display().to_string());
    args.extend(sketch_args.iter().cloned());

    Ok(Handoff {
        program: program.to_string(),
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn install(with_jar: bool) -> (TempDir, InstallPaths) {
        let root = TempDir::new().unwrap();
        let paths = InstallPaths::from_raw(root.path().join("rp5"), root.path().join("home"));
        if with_jar {
            let jar = paths.jruby_complete_jar();
            fs::create_dir_all(jar.parent().unwrap()).unwrap();
            fs::write(&jar, b"PK").unwrap();
        }
        (root, paths)
    }

    #[test]
    fn installed_jruby_argv() {
        let (_root, paths) = install(false);
        let handoff = build_handoff(
            &paths,
            Starter::Watch,
            Path::new("fire.rb"),
            &["a".to_string(), "b".to_string()],
            Runtime::InstalledJruby,
            vec!["-J-Xmx512m".to_string()],
        )
        .unwrap();

        let runner = paths.runner_script("watch.rb").display().to_string();
        assert_eq!(handoff.program, "jruby");
        assert_eq!(
            handoff.argv(),
            vec!["jruby", "-J-Xmx512m", runner.as_str(), "fire.rb", "a", "b"]
        );
    }

    #[test]
    fn bundled_jar_argv() {
        let (_root, paths) = install(true);
        let handoff = build_handoff(
            &paths,
            Starter::Run,
            Path::new("fire.rb"),
            &[],
            Runtime::JrubyComplete,
            vec!["-Xmx512m".to_string()],
        )
        .unwrap();

        let jar = paths.jruby_complete_jar().display().to_string();
        let runner = paths.runner_script("run.rb").display().to_string();
        assert_eq!(
            handoff.argv(),
            vec![
                "java",
                "-Xmx512m",
                "-cp",
                jar.as_str(),
                "org.jruby.Main",
                runner.as_str(),
                "fire.rb",
            ]
        );
    }

    #[test]
    fn missing_jar_refuses_to_launch() {
        let (_root, paths) = install(false);
        let err = build_handoff(
            &paths,
            Starter::Live,
            Path::new("fire.rb"),
            &[],
            Runtime::JrubyComplete,
            Vec::new(),
        )
        .unwrap_err();

        assert!(matches!(err, RunnerError::JarMissing(ref jar) if jar == &paths.jruby_complete_jar()));
        assert!(err.to_string().contains("rp5 setup install"));
    }

    #[test]
    fn starter_scripts() {
        assert_eq!(Starter::Run.script(), "run.rb");
        assert_eq!(Starter::Watch.script(), "watch.rb");
        assert_eq!(Starter::Live.script(), "live.rb");
    }

    #[test]
    fn runtime_follows_nojruby() {
        assert_eq!(Runtime::from_nojruby(true), Runtime::JrubyComplete);
        assert_eq!(Runtime::from_nojruby(false), Runtime::InstalledJruby);
    }
}
