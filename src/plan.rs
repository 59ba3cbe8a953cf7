use std::fmt;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr, eyre};
use log::debug;

/// Separator between the post id and the title in output filenames
pub const ID_TITLE_SEPARATOR: &str = " - ";

/// Output filename pattern, expanded by the engine once it knows the post's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    template: String,
    max_title_len: usize,
}

impl NamingTemplate {
    /// `<id> - <title truncated to max_title_len>.<ext>`, optionally under `directory`
    pub fn new(directory: Option<&str>, max_title_len: usize) -> Self {
        let file = format!("%(id)s{ID_TITLE_SEPARATOR}%(title).{max_title_len}s.%(ext)s");
        let template = match directory {
            Some(dir) => {
                // `%` in the directory would otherwise be read as a placeholder
                let mut prefix = dir.replace('%', "%%");
                if !prefix.is_empty() && !prefix.ends_with(std::path::is_separator) {
                    prefix.push(std::path::MAIN_SEPARATOR);
                }
                prefix + &file
            }
            None => file,
        };
        Self { template, max_title_len }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn max_title_len(&self) -> usize {
        self.max_title_len
    }
}

impl fmt::Display for NamingTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Where the download lands and how the engine should name it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    pub directory: PathBuf,
    pub template: NamingTemplate,
}

/// Prepare the output directory and build the naming template.
///
/// A given directory is created along with any missing parents. Without one, files go to
/// the current working directory and the template carries no directory prefix.
pub fn plan(output_dir: Option<&Path>, max_title_len: usize) -> Result<OutputPlan> {
    // The engine only sees the template string, so the directory must round-trip through it
    let prefix = output_dir
        .map(|dir| {
            dir.to_str()
                .ok_or_else(|| eyre!("output directory is not valid UTF-8: {}", dir.display()))
        })
        .transpose()?;

    let directory = match output_dir {
        Some(dir) => {
            if !dir.is_dir() {
                debug!("Creating output directory {}", dir.display());
            }
            std::fs::create_dir_all(dir)
                .wrap_err_with(|| format!("failed to create output directory {}", dir.display()))?;
            dir.to_path_buf()
        }
        None => std::env::current_dir().wrap_err("failed to resolve current directory")?,
    };

    let template = NamingTemplate::new(prefix, max_title_len);
    debug!("Naming template: {template}");

    Ok(OutputPlan { directory, template })
}
