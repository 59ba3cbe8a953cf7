use thiserror::Error;

/// Why the download engine failed, classified from what it reported
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download engine not found: {0}")]
    EngineNotFound(String),

    #[error("failed to run download engine: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported URL: {0}")]
    Unsupported(String),

    #[error("video unavailable: {0}")]
    Unavailable(String),

    #[error("authentication required: {0}")]
    AuthRequired(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("extraction failed: {0}")]
    Extraction(String),
}

impl DownloadError {
    /// Short machine-readable cause tag
    pub fn kind(&self) -> &'static str {
        match self {
            DownloadError::EngineNotFound(_) => "engine-not-found",
            DownloadError::Io(_) => "io",
            DownloadError::Unsupported(_) => "unsupported",
            DownloadError::Unavailable(_) => "unavailable",
            DownloadError::AuthRequired(_) => "auth-required",
            DownloadError::RateLimited(_) => "rate-limited",
            DownloadError::Network(_) => "network",
            DownloadError::Permission(_) => "permission",
            DownloadError::Extraction(_) => "extraction",
        }
    }

    /// Process exit status for this cause. 1 and 2 stay reserved for fatal errors and usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            DownloadError::Extraction(_) => 3,
            DownloadError::Unsupported(_) => 4,
            DownloadError::Unavailable(_) => 5,
            DownloadError::AuthRequired(_) => 6,
            DownloadError::RateLimited(_) => 7,
            DownloadError::Network(_) => 8,
            DownloadError::Permission(_) => 9,
            DownloadError::Io(_) => 10,
            DownloadError::EngineNotFound(_) => 127,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_and_nonzero() {
        let errors = [
            DownloadError::EngineNotFound("yt-dlp".into()),
            DownloadError::Io(std::io::Error::other("broken pipe")),
            DownloadError::Unsupported(String::new()),
            DownloadError::Unavailable(String::new()),
            DownloadError::AuthRequired(String::new()),
            DownloadError::RateLimited(String::new()),
            DownloadError::Network(String::new()),
            DownloadError::Permission(String::new()),
            DownloadError::Extraction(String::new()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(DownloadError::exit_code).collect();
        assert!(codes.iter().all(|c| *c > 2));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display_includes_cause() {
        let err = DownloadError::RateLimited("HTTP Error 429: Too Many Requests".into());
        assert_eq!(err.to_string(), "rate limited: HTTP Error 429: Too Many Requests");
        assert_eq!(err.kind(), "rate-limited");
    }
}
