use std::cell::OnceCell;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rp5config::Rp5Config;
use tracing::{debug, warn};

use crate::cli::{CreateArgs, Options};
use crate::create::create_sketch;
use crate::error::RunnerError;
use crate::export::export_app;
use crate::java_args::discover_java_args;
use crate::launch::{build_handoff, Handoff, Runtime, Starter};
use crate::paths::InstallPaths;
use crate::platform::{classify_platform, Platform};
use crate::setup::{self, SetupChoice};

pub const HELP_MESSAGE: &str = "
  Ruby-Processing is a little shim between Processing and JRuby that helps
  you create sketches of code art.

  Usage:
    rp5 [choice] path/to/sketch

    choice:-
    run:              run sketch once
    watch:            watch for changes on the file and relaunch it on the fly
    live:             launch sketch and give an interactive IRB shell
    create [width height][mode][--wrap]:  create a new sketch
    app:              create an application version of the sketch
    setup:            check setup, install jruby-complete or unpack samples

    Common options:
    --nojruby:  use jruby-complete in place of an installed version of jruby
                (Set [JRUBY: 'false'] in .rp5rc to make using jruby-complete default)
    --p3d:      create a sketch using the P3D renderer

  Examples:
    rp5 setup unpack_samples
    cd rp_samples/contributed
    rp5 run jwishy.rb
    rp5 create some_new_sketch 640 480 p3d (P3D mode example)
    rp5 create some_new_sketch 640 480 --wrap (a class wrapped default sketch)
    rp5 watch some_new_sketch.rb
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Run,
    Watch,
    Live,
    Create,
    App,
    Setup,
    Version,
    Help,
}

impl Action {
    /// Every keyword maps to an action; anything unrecognised shows help.
    pub fn from_keyword(keyword: Option<&str>) -> Self {
        let Some(keyword) = keyword else {
            return Self::Help;
        };
        match keyword {
            "run" => Self::Run,
            "watch" => Self::Watch,
            "live" => Self::Live,
            "create" => Self::Create,
            "app" => Self::App,
            "setup" => Self::Setup,
            other if other.contains("-v") => Self::Version,
            other if other.contains("-h") => Self::Help,
            _ => Self::Help,
        }
    }

    /// Help, version and `create` never consult `.rp5rc`, so a broken file
    /// must not stop them.
    pub fn reads_config(self) -> bool {
        !matches!(self, Self::Help | Self::Version | Self::Create)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Replace this process with the given command.
    Handoff(Handoff),
    Done,
}

pub struct Runner {
    options: Options,
    config: Rp5Config,
    paths: InstallPaths,
    cwd: PathBuf,
    host_os: String,
    platform: OnceCell<Platform>,
}

impl Runner {
    pub fn new(
        options: Options,
        config: Rp5Config,
        paths: InstallPaths,
        cwd: PathBuf,
        host_os: impl Into<String>,
    ) -> Self {
        Self {
            options,
            config,
            paths,
            cwd,
            host_os: host_os.into(),
            platform: OnceCell::new(),
        }
    }

    pub fn execute(&mut self, out: &mut impl Write) -> Result<Outcome> {
        let action = Action::from_keyword(self.options.action.as_deref());
        debug!(?action, path = %self.options.path, "dispatching");

        match action {
            Action::Run => self.launch(Starter::Run).map(Outcome::Handoff),
            Action::Watch => self.launch(Starter::Watch).map(Outcome::Handoff),
            Action::Live => self.launch(Starter::Live).map(Outcome::Handoff),
            Action::Create => self.create(out).map(|_| Outcome::Done),
            Action::App => self.app(out).map(|_| Outcome::Done),
            Action::Setup => self.setup(out).map(|_| Outcome::Done),
            Action::Version => {
                writeln!(out, "{}", setup::version_line(env!("CARGO_PKG_VERSION")))?;
                Ok(Outcome::Done)
            }
            Action::Help => {
                write!(out, "{HELP_MESSAGE}")?;
                Ok(Outcome::Done)
            }
        }
    }

    fn platform(&self) -> Result<Platform, RunnerError> {
        if let Some(platform) = self.platform.get() {
            return Ok(*platform);
        }
        let platform = classify_platform(&self.host_os)?;
        debug!(%platform, host = %self.host_os, "classified host platform");
        let _ = self.platform.set(platform);
        Ok(platform)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.cwd.join(path)
    }

    fn ensure_exists(&self) -> Result<PathBuf, RunnerError> {
        let sketch = self.resolve(&self.options.path);
        if sketch.exists() {
            Ok(sketch)
        } else {
            Err(RunnerError::SketchNotFound(PathBuf::from(&self.options.path)))
        }
    }

    fn launch(&mut self, starter: Starter) -> Result<Handoff> {
        let sketch = self.ensure_exists()?;
        self.spin_up(starter, &sketch)
    }

    fn spin_up(&mut self, starter: Starter, sketch: &Path) -> Result<Handoff> {
        if self.options.jruby {
            warn!("The --jruby flag is no longer required");
        }
        if self.config.jruby_disabled() {
            debug!("JRUBY is false in configuration; using jruby-complete");
            self.options.nojruby = true;
        }

        let runtime = Runtime::from_nojruby(self.options.nojruby);
        let platform = self.platform()?;
        let java_args = discover_java_args(sketch, &self.config, platform, &self.paths, runtime)?;
        let handoff = build_handoff(
            &self.paths,
            starter,
            Path::new(&self.options.path),
            &self.options.args,
            runtime,
            java_args,
        )?;
        Ok(handoff)
    }

    fn create(&self, out: &mut impl Write) -> Result<()> {
        let args =
            CreateArgs::parse_args(&self.options.args).map_err(RunnerError::InvalidCreateArgs)?;
        let created = create_sketch(&self.cwd, &self.options.path, &args, self.options.p3d)?;
        writeln!(out, "Created {}", created.display())?;
        Ok(())
    }

    fn app(&self, out: &mut impl Write) -> Result<()> {
        let sketch = self.ensure_exists()?;
        let platform = self.platform()?;
        let java_args = discover_java_args(
            &sketch,
            &self.config,
            platform,
            &self.paths,
            Runtime::JrubyComplete,
        )?;
        let bundle = export_app(&self.paths, &sketch, &java_args)
            .with_context(|| format!("failed to export {}", self.options.path))?;
        writeln!(out, "Exported {}", bundle.display())?;
        Ok(())
    }

    fn setup(&self, out: &mut impl Write) -> Result<()> {
        match SetupChoice::from_choice(&self.options.path) {
            SetupChoice::Check => {
                writeln!(out, "{}", setup::check(&self.paths, &self.config))?;
            }
            SetupChoice::Install => {
                let report = setup::install(&self.paths, self.platform()?)?;
                if !report.vendors_built {
                    writeln!(
                        out,
                        "Vendored dependencies were not installed; run `rake` in {}",
                        self.paths.vendors_dir().display()
                    )?;
                }
                if let Some(path) = report.written_config {
                    writeln!(out, "Wrote default configuration to {}", path.display())?;
                }
            }
            SetupChoice::UnpackSamples => {
                let target = setup::unpack_samples(&self.paths, &self.cwd)?;
                writeln!(out, "Unpacked samples to {}", target.display())?;
            }
            SetupChoice::Usage => {
                writeln!(out, "{}", setup::USAGE)?;
            }
        }
        Ok(())
    }
}
