use std::env;
use std::path::PathBuf;

const DEFAULT_MATCH_LIMIT: usize = 100;
const DEFAULT_MATCH_POLL_SECS: u64 = 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_EXPORT_PATH: &str = "lineups.xlsx";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Match service root, e.g. `http://localhost:8000`. Unset means the mock
    /// service is used.
    pub api_base: Option<String>,
    pub api_token: Option<String>,
    pub match_limit: usize,
    pub match_poll_secs: u64,
    pub http_timeout_secs: u64,
    pub log_file: Option<PathBuf>,
    pub export_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            api_token: None,
            match_limit: DEFAULT_MATCH_LIMIT,
            match_poll_secs: DEFAULT_MATCH_POLL_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            log_file: None,
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let api_base = non_empty("LINEUP_API_BASE").map(|s| s.trim_end_matches('/').to_string());
        let match_limit = non_empty("LINEUP_MATCH_LIMIT")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MATCH_LIMIT)
            .clamp(1, 500);
        let match_poll_secs = non_empty("LINEUP_MATCH_POLL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MATCH_POLL_SECS)
            .max(10);
        let http_timeout_secs = non_empty("LINEUP_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .max(1);

        Self {
            api_base,
            api_token: non_empty("LINEUP_API_TOKEN"),
            match_limit,
            match_poll_secs,
            http_timeout_secs,
            log_file: non_empty("LINEUP_LOG_FILE").map(PathBuf::from),
            export_path: non_empty("LINEUP_EXPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH)),
        }
    }

    pub fn uses_mock_service(&self) -> bool {
        self.api_base.is_none()
    }
}
