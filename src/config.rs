use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub debounce: Duration,
    pub request_timeout: Duration,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        let api_url = std::env::var("TOOLNEST_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let data_dir = match std::env::var("TOOLNEST_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => {
                let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home_dir).join(".toolnest")
            }
        };

        let debounce_ms = std::env::var("TOOLNEST_DEBOUNCE_MS")
            .ok()
            .and_then(|ms| ms.parse::<u64>().ok())
            .unwrap_or(DEFAULT_DEBOUNCE_MS);

        let timeout_secs = std::env::var("TOOLNEST_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let log_filter =
            std::env::var("TOOLNEST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Config {
            api_url: normalize_base_url(&api_url),
            data_dir,
            debounce: Duration::from_millis(debounce_ms),
            request_timeout: Duration::from_secs(timeout_secs),
            log_filter,
        }
    }

    pub fn with_base_url(api_url: impl Into<String>) -> Self {
        Config {
            api_url: normalize_base_url(&api_url.into()),
            data_dir: PathBuf::from(".toolnest"),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("toolnest.db")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("toolnest.log")
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let config = Config::with_base_url("http://api.example.com/");
        assert_eq!(config.api_url, "http://api.example.com");
    }

    #[test]
    fn paths_live_under_data_dir() {
        let mut config = Config::with_base_url(DEFAULT_API_URL);
        config.data_dir = PathBuf::from("/tmp/tn");
        assert_eq!(config.db_path(), PathBuf::from("/tmp/tn/toolnest.db"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/tn/toolnest.log"));
        assert_eq!(config.debounce, Duration::from_millis(200));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }
}
