use std::path::{Path, PathBuf};
use std::process::Command;

use eyre::Result;
use log::{debug, info, warn};

mod cli;

use cli::{Cli, OutputFormat};
use xdl::config::Config;
use xdl::engine::YtDlp;

fn setup_logging() {
    let log_file = log_dir().join("xdl.log");
    let (target, fallback) = log_target(&log_file);

    env_logger::Builder::from_default_env().target(target).init();

    match fallback {
        None => info!("Logging initialized: {}", log_file.display()),
        Some(e) => warn!("Cannot write {}, logging to stderr: {e}", log_file.display()),
    }
}

/// Append to `log_file`, or fall back to stderr when it cannot be opened
fn log_target(log_file: &Path) -> (env_logger::Target, Option<std::io::Error>) {
    let opened = match log_file.parent() {
        Some(dir) => std::fs::create_dir_all(dir),
        None => Ok(()),
    }
    .and_then(|_| std::fs::OpenOptions::new().create(true).append(true).open(log_file));

    match opened {
        Ok(file) => (env_logger::Target::Pipe(Box::new(file)), None),
        Err(e) => (env_logger::Target::Stderr, Some(e)),
    }
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("xdl")
        .join("logs")
}

fn engine_version(program: &Path) -> Option<String> {
    Command::new(program)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8_lossy(&o.stdout).lines().next().map(|l| l.trim().to_string()))
}

fn build_after_help(program: &Path) -> String {
    let engine_line = match engine_version(program) {
        Some(v) => format!("  \x1b[32m✅\x1b[0m {}  {v}", program.display()),
        None => format!("  \x1b[31m❌\x1b[0m {}  (not found — required for downloads)", program.display()),
    };

    format!(
        "\nREQUIRED TOOLS:\n{engine_line}\n\nConfig is read from: {}\nLogs are written to: {}",
        xdl::config::config_path().display(),
        log_dir().join("xdl.log").display()
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup_logging();

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        debug!("Ignoring config file: {e}");
        Config::default()
    });

    // Probing the engine is only worth it when the help text will be shown
    let args: Vec<String> = std::env::args_os().map(|a| a.to_string_lossy().into_owned()).collect();
    let mut cmd = <Cli as clap::CommandFactory>::command();
    if cli::wants_help(&args) {
        let program = cli::engine_from_args(&args)
            .or_else(|| config.yt_dlp.clone())
            .unwrap_or_else(|| PathBuf::from("yt-dlp"));
        cmd = cmd.after_help(build_after_help(&program));
    }
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    let request = cli.request(&config);
    let flags = cli.engine_flags(&config);
    let engine = YtDlp::new(cli.engine_program(&config));

    if flags.verbose {
        let config_path = xdl::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!("Engine: {}", engine.program().display());
    }
    debug!("Request: {request:?}");

    let report = xdl::download(&engine, &request, &flags).await?;

    match cli.format {
        OutputFormat::Text if report.succeeded() => println!("{}", xdl::output::render_text(&report)),
        OutputFormat::Text => eprintln!("{}", xdl::output::render_text(&report)),
        OutputFormat::Json => println!("{}", xdl::output::render_json(&report)?),
    }

    let code = report.exit_code();
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_target_opens_file() {
        let tmp = tempfile::tempdir().unwrap();
        let log_file = tmp.path().join("logs").join("xdl.log");

        let (target, fallback) = log_target(&log_file);

        assert!(matches!(target, env_logger::Target::Pipe(_)));
        assert!(fallback.is_none());
        assert!(log_file.exists());
    }

    #[test]
    fn test_log_target_falls_back_to_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let (target, fallback) = log_target(&blocker.join("logs").join("xdl.log"));

        assert!(matches!(target, env_logger::Target::Stderr));
        assert!(fallback.is_some());
    }
}
