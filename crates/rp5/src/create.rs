use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::{sketch_name, CreateArgs};
use crate::error::RunnerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SketchTemplate {
    pub class_name: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub mode: Option<String>,
    pub wrap: bool,
}

impl SketchTemplate {
    pub fn new(name: &str, args: &CreateArgs, p3d: bool) -> Self {
        let mode = args
            .mode
            .as_ref()
            .map(|mode| mode.to_ascii_uppercase())
            .or_else(|| p3d.then(|| "P3D".to_string()));
        Self {
            class_name: camelize(name),
            title: titleize(name),
            width: args.width,
            height: args.height,
            mode,
            wrap: args.wrap,
        }
    }

    fn size_call(&self) -> String {
        match &self.mode {
            Some(mode) => format!("size {}, {}, {mode}", self.width, self.height),
            None => format!("size {}, {}", self.width, self.height),
        }
    }

    pub fn render(&self) -> String {
        let size = self.size_call();
        if self.wrap {
            format!(
                "# {title}\nclass {class} < Processing::App\n  def setup\n    {size}\n  end\n\n  def draw\n\n  end\nend\n\n{class}.new(title: '{title}')\n",
                title = self.title,
                class = self.class_name,
            )
        } else {
            format!(
                "# {title}\ndef setup\n  {size}\nend\n\ndef draw\n\nend\n",
                title = self.title,
            )
        }
    }
}

/// Writes `<name>.rb` under `base`, refusing to overwrite an existing sketch.
pub fn create_sketch(
    base: &Path,
    path: &str,
    args: &CreateArgs,
    p3d: bool,
) -> Result<PathBuf, RunnerError> {
    let name = sketch_name(path);
    let parent = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
    let target = base.join(parent).join(format!("{name}.rb"));
    if target.exists() {
        return Err(RunnerError::SketchExists(target));
    }

    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir)?;
    }
    let template = SketchTemplate::new(&name, args, p3d);
    fs::write(&target, template.render())?;
    info!(path = %target.display(), wrap = template.wrap, "created sketch");
    Ok(target)
}

fn words(name: &str) -> impl Iterator<Item = &str> {
    name.split(['_', '-', ' ']).filter(|word| !word.is_empty())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn camelize(name: &str) -> String {
    words(name).map(capitalize).collect()
}

pub fn titleize(name: &str) -> String {
    words(name).map(capitalize).collect::<Vec<_>>().join(" ")
}
