use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::error::DownloadError;
use crate::plan::NamingTemplate;

/// Longest raw engine output carried into an error message
const MAX_ERROR_CHARS: usize = 300;

/// Format selection passed to the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Highest available combined audio+video quality
    #[default]
    Best,
}

impl Format {
    pub fn as_arg(&self) -> &'static str {
        match self {
            Format::Best => "best",
        }
    }
}

/// Per-run switches that come from the CLI or config rather than from planning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineFlags {
    pub verbose: bool,
    pub skip_certificate_validation: bool,
    pub cookie_file: Option<PathBuf>,
}

/// Everything the engine is told about a single download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub format: Format,
    pub output_template: NamingTemplate,
    pub verbose: bool,
    pub skip_certificate_validation: bool,
    pub cookie_file: Option<PathBuf>,
}

impl DownloadOptions {
    pub fn new(output_template: NamingTemplate, flags: &EngineFlags) -> Self {
        Self {
            format: Format::Best,
            output_template,
            verbose: flags.verbose,
            skip_certificate_validation: flags.skip_certificate_validation,
            cookie_file: flags.cookie_file.clone(),
        }
    }
}

/// What a successful fetch left on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fetched {
    /// Final media path, when the engine announced one
    pub file: Option<PathBuf>,
}

/// Resolves a post URL to media and writes it to disk
#[allow(async_fn_in_trait)]
pub trait DownloadEngine {
    async fn fetch(&self, url: &str, options: &DownloadOptions) -> Result<Fetched, DownloadError>;
}

/// Download engine backed by the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl DownloadEngine for YtDlp {
    async fn fetch(&self, url: &str, options: &DownloadOptions) -> Result<Fetched, DownloadError> {
        let args = build_args(url, options);
        debug!("Running {} {:?}", self.program.display(), args);

        let mut child = match Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DownloadError::EngineNotFound(self.program.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("engine stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("engine stderr was not captured"))?;

        // Engine output goes to our stderr so stdout stays reserved for the report
        let read_stdout = async move {
            let mut file = None;
            for_each_line(stdout, |line| {
                debug!("yt-dlp: {line}");
                eprintln!("{line}");
                if let Some(path) = parse_destination_line(line) {
                    file = Some(PathBuf::from(path));
                }
            })
            .await;
            file
        };

        let read_stderr = async move {
            let mut captured = Vec::new();
            for_each_line(stderr, |line| {
                debug!("yt-dlp stderr: {line}");
                eprintln!("{line}");
                captured.push(line.to_string());
            })
            .await;
            captured
        };

        // Only the exit status decides the outcome; the readers never abort the wait
        let (file, stderr_lines, status) = tokio::join!(read_stdout, read_stderr, child.wait());
        let status = status?;

        if status.success() {
            Ok(Fetched { file })
        } else {
            Err(classify(&stderr_lines.join("\n"), status.code()))
        }
    }
}

/// Feed every line of `reader` to `f`, decoding lossily so odd bytes in titles survive
async fn for_each_line<R, F>(reader: R, mut f: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                f(line.trim_end_matches(['\n', '\r']));
            }
            Err(e) => {
                debug!("Stopped reading engine output: {e}");
                break;
            }
        }
    }
}

/// Command-line arguments for a single `yt-dlp` run
pub fn build_args(url: &str, options: &DownloadOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-f".into(),
        options.format.as_arg().into(),
        "-o".into(),
        options.output_template.as_str().into(),
        "--no-playlist".into(),
        "--newline".into(),
    ];

    if options.verbose {
        args.push("--verbose".into());
    }
    if options.skip_certificate_validation {
        args.push("--no-check-certificates".into());
    }
    if let Some(ref cookies) = options.cookie_file {
        args.push("--cookies".into());
        args.push(cookies.as_os_str().to_owned());
    }

    // Keep a URL starting with `-` from being read as an option
    args.push("--".into());
    args.push(url.into());
    args
}

/// Pull the output path out of a `yt-dlp` progress line
fn parse_destination_line(line: &str) -> Option<String> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("[download] Destination:") {
        let path = rest.trim();
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }

    if let Some(rest) = line.strip_prefix("[Merger] Merging formats into \"") {
        let path = rest.trim_end_matches('"');
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }

    if let Some(rest) = line.strip_prefix("[download] ") {
        if let Some(path) = rest.strip_suffix(" has already been downloaded") {
            let path = path.trim();
            if !path.is_empty() {
                return Some(path.to_string());
            }
        }
    }

    None
}

/// Map a failed run's stderr to a failure cause
fn classify(stderr: &str, code: Option<i32>) -> DownloadError {
    let message = error_message(stderr, code);

    // Verbose runs echo their own arguments on stderr; only ERROR lines say what went wrong
    let error_lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| is_error_line(l)).collect();
    let lower = if error_lines.is_empty() {
        stderr.to_lowercase()
    } else {
        error_lines.join("\n").to_lowercase()
    };

    if lower.contains("permission denied") || lower.contains("read-only file system") || lower.contains("errno 13") {
        DownloadError::Permission(message)
    } else if lower.contains("http error 429") || lower.contains("rate limit") || lower.contains("too many requests") {
        DownloadError::RateLimited(message)
    } else if lower.contains("login")
        || lower.contains("log in")
        || lower.contains("sign in")
        || lower.contains("authentication")
        || lower.contains("--cookies")
        || lower.contains("nsfw")
    {
        DownloadError::AuthRequired(message)
    } else if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        DownloadError::Unsupported(message)
    } else if lower.contains("no video could be found")
        || lower.contains("private")
        || lower.contains("protected")
        || lower.contains("suspended")
        || lower.contains("unavailable")
        || lower.contains("http error 403")
        || lower.contains("http error 404")
        || lower.contains("does not exist")
    {
        DownloadError::Unavailable(message)
    } else if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection")
        || lower.contains("name resolution")
        || lower.contains("getaddrinfo")
        || lower.contains("network is unreachable")
        || lower.contains("certificate verify failed")
        || lower.contains("unable to download webpage")
    {
        DownloadError::Network(message)
    } else {
        DownloadError::Extraction(message)
    }
}

fn is_error_line(line: &str) -> bool {
    line.get(..6).is_some_and(|prefix| prefix.eq_ignore_ascii_case("error:"))
}

fn error_message(stderr: &str, code: Option<i32>) -> String {
    let last_error_line = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| is_error_line(l))
        .unwrap_or("");

    if !last_error_line.is_empty() {
        return last_error_line[6..].trim().to_string();
    }

    let trimmed = stderr.trim();
    if !trimmed.is_empty() {
        return trimmed.chars().take(MAX_ERROR_CHARS).collect();
    }

    match code {
        Some(code) => format!("yt-dlp exited with status {code}"),
        None => "yt-dlp was terminated by a signal".to_string(),
    }
}
