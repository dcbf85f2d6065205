//! Recipe templates.
//!
//! A profile command is a whitespace separated template with `$name$`
//! placeholders:
//!
//! - `$input_file$`, `$output_file$` - temp file paths
//! - `$resolution_and_padding$` - expands to `-s WxH` plus crop/pad flags
//! - `$video_filter$` - the same geometry as a filter chain
//! - `$width$`, `$height$` - final frame size
//!
//! Templates are split before substitution, so a path containing spaces
//! stays a single argument.

use super::geometry::GeometryOptions;
use regex::{Captures, Regex};
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const RESOLUTION_AND_PADDING: &str = "$resolution_and_padding$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeOptions {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub geometry: GeometryOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeError {
    #[error("recipe is empty")]
    Empty,
    #[error("unknown recipe variable ${0}$")]
    UnknownVariable(String),
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$([a-z_]+)\$").expect("valid placeholder regex"))
}

impl RecipeOptions {
    fn variable(&self, name: &str) -> Option<String> {
        let value = match name {
            "input_file" => self.input_file.to_string_lossy().into_owned(),
            "output_file" => self.output_file.to_string_lossy().into_owned(),
            "resolution_and_padding" => self.geometry.to_string(),
            "video_filter" => self.geometry.to_filter(),
            "width" => self.geometry.width.to_string(),
            "height" => self.geometry.height.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Expand `template` into a program and its arguments.
    pub fn render(&self, template: &str) -> Result<Vec<String>, RecipeError> {
        let mut args = Vec::new();

        for token in template.split_whitespace() {
            if token == RESOLUTION_AND_PADDING {
                args.extend(self.geometry.to_args());
                continue;
            }

            let mut unknown = None;
            let rendered = placeholder().replace_all(token, |caps: &Captures| {
                let name = &caps[1];
                self.variable(name).unwrap_or_else(|| {
                    unknown.get_or_insert_with(|| name.to_string());
                    String::new()
                })
            });
            if let Some(name) = unknown {
                return Err(RecipeError::UnknownVariable(name));
            }
            args.push(rendered.into_owned());
        }

        if args.is_empty() {
            return Err(RecipeError::Empty);
        }
        Ok(args)
    }
}
