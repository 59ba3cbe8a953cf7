pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod plan;
pub mod sanitize;

use std::path::PathBuf;
use std::sync::LazyLock;

use eyre::Result;
use log::{error, info};
use regex::Regex;

use engine::{DownloadEngine, DownloadOptions, EngineFlags, Fetched};
use error::DownloadError;
use plan::OutputPlan;

/// Title length used when neither the CLI nor the config file sets one
pub const DEFAULT_MAX_LENGTH: usize = 100;

/// Host that the download engine recognizes for Twitter/X posts
pub const CANONICAL_HOST: &str = "twitter.com";

static ALIAS_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<head>(?:[a-z][a-z0-9+.-]*://)?(?:[^/?#@\s]*@)?(?:[a-z0-9-]+\.)*)x\.com(?P<tail>[:/?#]|$)")
        .unwrap()
});

static STATUS_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/status(?:es)?/(\d+)").unwrap());

/// A single download, as requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub output_dir: Option<PathBuf>,
    pub max_filename_length: usize,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, output_dir: Option<PathBuf>, max_filename_length: usize) -> Self {
        Self {
            url: url.into(),
            output_dir,
            max_filename_length,
        }
    }
}

/// Everything known about a finished run
#[derive(Debug)]
pub struct Report {
    pub input_url: String,
    pub url: String,
    pub post_id: Option<String>,
    pub plan: OutputPlan,
    pub result: std::result::Result<Fetched, DownloadError>,
}

impl Report {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Process exit status for this run: 0 on success, otherwise one code per failure cause
    pub fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(_) => 0,
            Err(e) => e.exit_code(),
        }
    }
}

/// Rewrite the `x.com` alias host (and its subdomains) to `twitter.com`.
///
/// Only the host is touched; scheme, userinfo, port, path, query and fragment are kept
/// as-is. Anything that does not look like such a URL comes back unchanged.
pub fn normalize_url(url: &str) -> String {
    ALIAS_HOST
        .replace(url, format!("${{head}}{CANONICAL_HOST}${{tail}}"))
        .into_owned()
}

/// Extract the numeric post id from a `/status/<id>` URL
pub fn post_id(url: &str) -> Option<String> {
    STATUS_ID.captures(url).map(|caps| caps[1].to_string())
}

/// Normalize, plan the output, and hand the post to the engine.
///
/// A failure to prepare the output directory is returned as an error before the engine
/// is touched. Engine failures are carried in the report.
pub async fn download<E: DownloadEngine>(engine: &E, request: &DownloadRequest, flags: &EngineFlags) -> Result<Report> {
    let url = normalize_url(&request.url);
    if url != request.url {
        info!("Normalized {} -> {url}", request.url);
    }

    let plan = plan::plan(request.output_dir.as_deref(), request.max_filename_length)?;
    info!("Output directory: {}", plan.directory.display());

    let options = DownloadOptions::new(plan.template.clone(), flags);
    let result = engine.fetch(&url, &options).await;

    match &result {
        Ok(fetched) => match &fetched.file {
            Some(file) => info!("Downloaded {url} to {}", file.display()),
            None => info!("Downloaded {url}"),
        },
        Err(e) => error!("Download of {url} failed ({}): {e}", e.kind()),
    }

    Ok(Report {
        input_url: request.url.clone(),
        post_id: post_id(&url),
        url,
        plan,
        result,
    })
}
