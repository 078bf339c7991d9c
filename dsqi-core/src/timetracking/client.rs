//! HTTP client for the WakaTime summaries API.

use std::fs;
use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::config::TimeTrackingConfig;
use crate::error::{Error, Result};

/// Read `api_key = ...` from a WakaTime credentials file.
pub fn read_api_key(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|e| {
        Error::TimeTracking(format!(
            "credentials not readable at {}: {}",
            path.display(),
            e
        ))
    })?;

    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("api_key"))
        .find_map(|line| line.split_once('=').map(|(_, key)| key.trim().to_string()))
        .filter(|key| !key.is_empty())
        .ok_or_else(|| Error::TimeTracking(format!("no api_key in {}", path.display())))
}

/// Async WakaTime client.
pub struct TimeTrackingClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl TimeTrackingClient {
    /// Create a client authenticating with `api_key`.
    pub fn new(config: &TimeTrackingConfig, api_key: &str) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let encoded = base64::engine::general_purpose::STANDARD.encode(api_key.as_bytes());
        let auth_value = format!("Basic {}", encoded);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the one-day summaries query for a project.
    pub fn summaries_url(&self, project: &str, date: &str) -> String {
        format!(
            "{}/users/current/summaries?start={}&end={}&project={}",
            self.base_url,
            urlencoding::encode(date),
            urlencoding::encode(date),
            urlencoding::encode(project)
        )
    }

    /// Fetch the raw summaries response for one project and day.
    pub async fn fetch_summaries(&self, project: &str, date: &str) -> Result<serde_json::Value> {
        let url = self.summaries_url(project, date);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::TimeTracking(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::TimeTracking(format!("failed to parse response: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::TimeTracking(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }
}

/// Blocking wrapper around [`TimeTrackingClient`].
pub struct SyncTimeTrackingClient {
    inner: TimeTrackingClient,
    runtime: tokio::runtime::Runtime,
}

impl SyncTimeTrackingClient {
    /// Build from configuration, reading the API key from the configured
    /// credentials file.
    pub fn from_config(config: &TimeTrackingConfig) -> Result<Self> {
        let api_key = read_api_key(&config.credentials_path())?;
        Self::new(config, &api_key)
    }

    pub fn new(config: &TimeTrackingConfig, api_key: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::TimeTracking(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            inner: TimeTrackingClient::new(config, api_key)?,
            runtime,
        })
    }

    /// Fetch one day of a project (blocking).
    pub fn fetch_day(&self, project: &str, date: &str) -> Result<serde_json::Value> {
        self.runtime
            .block_on(self.inner.fetch_summaries(project, date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    fn config(api_base: String) -> TimeTrackingConfig {
        TimeTrackingConfig {
            api_base,
            timeout_secs: 5,
            ..Default::default()
        }
    }

    /// Serve one canned response and hand back the request head.
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/api/v1", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    break;
                }
                head.push(line);
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            head
        });
        (base, handle)
    }

    #[test]
    fn test_read_api_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".wakatime.cfg");
        fs::write(&path, "[settings]\ndebug = false\napi_key = waka_0000-1111\n").unwrap();
        assert_eq!(read_api_key(&path).unwrap(), "waka_0000-1111");
    }

    #[test]
    fn test_read_api_key_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".wakatime.cfg");
        assert!(matches!(read_api_key(&path), Err(Error::TimeTracking(_))));

        fs::write(&path, "[settings]\ndebug = true\n").unwrap();
        assert!(matches!(read_api_key(&path), Err(Error::TimeTracking(_))));
    }

    #[test]
    fn test_summaries_url() {
        let client =
            TimeTrackingClient::new(&config("https://wakatime.com/api/v1/".to_string()), "key").unwrap();
        assert_eq!(
            client.summaries_url("01 quiz", "2026-02-18"),
            "https://wakatime.com/api/v1/users/current/summaries?start=2026-02-18&end=2026-02-18&project=01%20quiz"
        );
    }

    #[test]
    fn test_fetch_day_sends_basic_auth() {
        let (base, server) = serve_once("200 OK", r#"{"data": []}"#);
        let client = SyncTimeTrackingClient::new(&config(base), "waka_key").unwrap();

        let raw = client.fetch_day("01-quiz", "2026-02-18").unwrap();
        assert_eq!(raw, serde_json::json!({"data": []}));

        let head = server.join().unwrap();
        assert!(head[0].starts_with(
            "GET /api/v1/users/current/summaries?start=2026-02-18&end=2026-02-18&project=01-quiz "
        ));
        // base64("waka_key")
        assert!(head
            .iter()
            .any(|h| h.eq_ignore_ascii_case("authorization: Basic d2FrYV9rZXk=")));
    }

    #[test]
    fn test_fetch_day_reports_api_errors() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"error": "bad key"}"#);
        let client = SyncTimeTrackingClient::new(&config(base), "waka_key").unwrap();

        let err = client.fetch_day("01-quiz", "2026-02-18").unwrap_err();
        assert!(matches!(err, Error::TimeTracking(ref msg) if msg.contains("401")));
        server.join().unwrap();
    }
}
