use clap::Parser;
use std::path::PathBuf;

use xdl::config::Config;
use xdl::engine::EngineFlags;
use xdl::{DEFAULT_MAX_LENGTH, DownloadRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "xdl",
    about = "Download Twitter/X videos",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Twitter/X video URL
    pub url: String,

    /// Output directory for downloaded video (created if missing)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum title length in the output filename [default: 100]
    #[arg(short, long, value_parser = parse_max_length)]
    pub max_length: Option<usize>,

    /// Cookie file passed to yt-dlp for posts that need a login
    #[arg(short, long)]
    pub cookies: Option<PathBuf>,

    /// Skip TLS certificate validation
    #[arg(long)]
    pub no_check_certificate: bool,

    /// Report format: text (default), json
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// yt-dlp executable to run
    #[arg(long, value_name = "PATH")]
    pub yt_dlp: Option<PathBuf>,

    /// Verbose yt-dlp output
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_max_length(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Whether the raw arguments ask for the long help text
pub fn wants_help(args: &[String]) -> bool {
    args.iter()
        .skip(1)
        .take_while(|a| *a != "--")
        .any(|a| a == "-h" || a == "--help")
}

/// `--yt-dlp` value from the raw arguments, before clap has run
pub fn engine_from_args(args: &[String]) -> Option<PathBuf> {
    let mut iter = args.iter().skip(1).take_while(|a| *a != "--");
    while let Some(arg) = iter.next() {
        if arg == "--yt-dlp" {
            return iter.next().map(PathBuf::from);
        }
        if let Some(value) = arg.strip_prefix("--yt-dlp=") {
            return Some(PathBuf::from(value));
        }
    }
    None
}

impl Cli {
    /// Build the download request, falling back to config values for unset flags
    pub fn request(&self, config: &Config) -> DownloadRequest {
        let max_length = self
            .max_length
            .or(config.max_length.filter(|n| *n > 0))
            .unwrap_or(DEFAULT_MAX_LENGTH);
        DownloadRequest::new(
            self.url.trim(),
            self.output.clone().or_else(|| config.output_dir.clone()),
            max_length,
        )
    }

    pub fn engine_flags(&self, config: &Config) -> EngineFlags {
        EngineFlags {
            verbose: self.verbose || config.verbose.unwrap_or(false),
            skip_certificate_validation: self.no_check_certificate || config.no_check_certificate.unwrap_or(false),
            cookie_file: self.cookies.clone().or_else(|| config.cookies.clone()),
        }
    }

    pub fn engine_program(&self, config: &Config) -> PathBuf {
        self.yt_dlp
            .clone()
            .or_else(|| config.yt_dlp.clone())
            .unwrap_or_else(|| PathBuf::from("yt-dlp"))
    }
}
