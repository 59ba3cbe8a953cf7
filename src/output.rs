use std::path::PathBuf;

use eyre::Result;
use serde::Serialize;

use crate::Report;

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    success: bool,
    input_url: &'a str,
    url: &'a str,
    post_id: Option<&'a str>,
    directory: &'a PathBuf,
    template: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

#[derive(Debug, Serialize)]
struct JsonError {
    kind: &'static str,
    message: String,
    exit_code: i32,
}

/// Render the run result as a single human-readable line
pub fn render_text(report: &Report) -> String {
    match &report.result {
        Ok(fetched) => match &fetched.file {
            Some(file) => format!(
                "Successfully downloaded video from {} to {}",
                report.url,
                file.display()
            ),
            None => format!("Successfully downloaded video from {}", report.url),
        },
        Err(e) => format!("Error downloading video: {e}"),
    }
}

/// Render the run result as pretty-printed JSON
pub fn render_json(report: &Report) -> Result<String> {
    let json = JsonReport {
        success: report.succeeded(),
        input_url: &report.input_url,
        url: &report.url,
        post_id: report.post_id.as_deref(),
        directory: &report.plan.directory,
        template: report.plan.template.as_str(),
        file: report.result.as_ref().ok().and_then(|f| f.file.as_ref()),
        error: report.result.as_ref().err().map(|e| JsonError {
            kind: e.kind(),
            message: e.to_string(),
            exit_code: e.exit_code(),
        }),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Fetched;
    use crate::error::DownloadError;
    use crate::plan::{NamingTemplate, OutputPlan};

    fn sample_report(result: std::result::Result<Fetched, DownloadError>) -> Report {
        Report {
            input_url: "https://x.com/a/status/1".to_string(),
            url: "https://twitter.com/a/status/1".to_string(),
            post_id: Some("1".to_string()),
            plan: OutputPlan {
                directory: PathBuf::from("out"),
                template: NamingTemplate::new(Some("out"), 100),
            },
            result,
        }
    }

    #[test]
    fn test_render_text_success() {
        let report = sample_report(Ok(Fetched {
            file: Some(PathBuf::from("out/1 - clip.mp4")),
        }));
        assert_eq!(
            render_text(&report),
            "Successfully downloaded video from https://twitter.com/a/status/1 to out/1 - clip.mp4"
        );
    }

    #[test]
    fn test_render_text_success_without_file() {
        let report = sample_report(Ok(Fetched::default()));
        assert_eq!(
            render_text(&report),
            "Successfully downloaded video from https://twitter.com/a/status/1"
        );
    }

    #[test]
    fn test_render_text_failure() {
        let report = sample_report(Err(DownloadError::Unsupported("Unsupported URL: x".to_string())));
        assert_eq!(render_text(&report), "Error downloading video: unsupported URL: Unsupported URL: x");
    }

    #[test]
    fn test_render_json_success() {
        let report = sample_report(Ok(Fetched {
            file: Some(PathBuf::from("out/1 - clip.mp4")),
        }));
        let value: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["url"], "https://twitter.com/a/status/1");
        assert_eq!(value["input_url"], "https://x.com/a/status/1");
        assert_eq!(value["post_id"], "1");
        assert_eq!(value["file"], "out/1 - clip.mp4");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_render_json_failure() {
        let report = sample_report(Err(DownloadError::RateLimited("HTTP Error 429".to_string())));
        let value: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["kind"], "rate-limited");
        assert_eq!(value["error"]["exit_code"], 7);
        assert!(value.get("file").is_none());
    }
}
