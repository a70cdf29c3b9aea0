use std::env;
use std::ffi::OsString;
use std::path::Path;

use clap::Parser;

use crate::error::RunnerError;

const FLAG_P3D: &str = "--p3d";
const FLAG_JRUBY: &str = "--jruby";
const FLAG_NOJRUBY: &str = "--nojruby";

/// Parsed command line for one `rp5` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub action: Option<String>,
    pub path: String,
    pub args: Vec<String>,
    pub p3d: bool,
    pub jruby: bool,
    pub nojruby: bool,
}

impl Options {
    /// Strips the global flags from anywhere in `args`, then reads the
    /// remaining words as `action path sketch-args...`. A missing path falls
    /// back to `<basename of cwd>.rb`.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::parse_with_default(args, default_sketch_path)
    }

    fn parse_with_default<I, S>(args: I, default_path: impl FnOnce() -> String) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut p3d = false;
        let mut jruby = false;
        let mut nojruby = false;
        let mut words = Vec::new();

        for arg in args.into_iter().map(Into::into) {
            match arg.as_str() {
                FLAG_P3D => p3d = true,
                FLAG_JRUBY => jruby = true,
                FLAG_NOJRUBY => nojruby = true,
                _ => words.push(arg),
            }
        }

        let mut words = words.into_iter();
        let action = words.next();
        let path = words.next().unwrap_or_else(default_path);
        let args = words.collect();

        Self {
            action,
            path,
            args,
            p3d,
            jruby,
            nojruby,
        }
    }
}

/// Converts raw process arguments to strings, rejecting the first one that is
/// not valid UTF-8.
pub fn decode_args<I>(args: I) -> Result<Vec<String>, RunnerError>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| arg.into_string().map_err(RunnerError::NonUtf8Argument))
        .collect()
}

fn default_sketch_path() -> String {
    let name = env::current_dir()
        .ok()
        .and_then(|dir| {
            dir.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_default();
    format!("{name}.rb")
}

/// Trailing arguments accepted by `rp5 create <name> ...`.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "rp5 create",
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct CreateArgs {
    /// Sketch width in pixels.
    #[arg(value_name = "WIDTH", default_value_t = 640, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Sketch height in pixels.
    #[arg(value_name = "HEIGHT", default_value_t = 480, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// Renderer passed to `size`, e.g. `p2d` or `p3d`.
    #[arg(value_name = "MODE")]
    pub mode: Option<String>,

    /// Wrap the sketch in a `Processing::App` subclass.
    #[arg(long)]
    pub wrap: bool,
}

impl CreateArgs {
    pub fn parse_args(args: &[String]) -> Result<Self, String> {
        Self::try_parse_from(args).map_err(|err| err.to_string().trim_end().to_string())
    }
}

pub fn sketch_name(path: &str) -> String {
    let file = Path::new(path);
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
