use crate::utils::error::ArgusResult;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Upper bound on a single probe, including connect time.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One HTTP attempt. Ephemeral; scanners build one per candidate.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
    pub follow_redirects: bool,
}

impl ProbeRequest {
    pub fn get(url: impl Into<String>) -> Self {
        ProbeRequest {
            url: url.into(),
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            follow_redirects: true,
        }
    }

    /// Disables redirect following. Fuzzers use this so a redirect cannot
    /// mask the behavior of the parameter under test.
    pub fn no_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Normalized result of one probe.
///
/// Exactly one of (`status` + `body`) or `error` is populated: a target that
/// refuses the connection or times out is a valid outcome, not a failure of
/// the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub status: Option<u16>,
    pub body: Option<String>,
    pub error: Option<String>,
    pub latency: Duration,
}

impl ProbeOutcome {
    pub fn response(status: u16, body: String, latency: Duration) -> Self {
        ProbeOutcome {
            status: Some(status),
            body: Some(body),
            error: None,
            latency,
        }
    }

    pub fn failure(error: String, latency: Duration) -> Self {
        ProbeOutcome {
            status: None,
            body: None,
            error: Some(error),
            latency,
        }
    }

    pub fn is_status(&self, code: u16) -> bool {
        self.status == Some(code)
    }

    /// The response body when the target answered, empty otherwise.
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

/// The single seam between the scanners and the network. Tests substitute
/// deterministic implementations; production uses [`HttpProber`].
#[async_trait]
pub trait Prober: Send + Sync {
    /// Performs exactly one network attempt. Never fails: network-level
    /// errors come back inside the outcome.
    async fn probe(&self, request: &ProbeRequest) -> ProbeOutcome;
}

/// reqwest-backed prober holding one redirect-following client and one that
/// reports redirects as-is.
pub struct HttpProber {
    client: Client,
    no_redirect_client: Client,
}

impl HttpProber {
    pub fn new() -> ArgusResult<Self> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> ArgusResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);

        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers.clone())
            .danger_accept_invalid_certs(true)
            .build()?;

        let no_redirect_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers)
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(HttpProber {
            client,
            no_redirect_client,
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, request: &ProbeRequest) -> ProbeOutcome {
        let started = Instant::now();
        let client = if request.follow_redirects {
            &self.client
        } else {
            &self.no_redirect_client
        };

        let mut builder = client
            .request(request.method.clone(), request.url.as_str())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        match builder.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(body) => ProbeOutcome::response(status, body, started.elapsed()),
                    Err(e) => ProbeOutcome::failure(e.to_string(), started.elapsed()),
                }
            }
            Err(e) => ProbeOutcome::failure(e.to_string(), started.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_outcome_has_status_and_body() {
        let outcome = ProbeOutcome::response(200, "ok".to_string(), Duration::from_millis(3));
        assert!(outcome.is_status(200));
        assert_eq!(outcome.body_text(), "ok");
        assert!(outcome.error.is_none());
    }

    #[test]
    fn failure_outcome_has_only_error() {
        let outcome = ProbeOutcome::failure("connection refused".to_string(), Duration::ZERO);
        assert!(outcome.status.is_none());
        assert!(outcome.body.is_none());
        assert_eq!(outcome.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn get_request_defaults() {
        let request = ProbeRequest::get("https://example.com");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.timeout, DEFAULT_TIMEOUT);
        assert!(request.follow_redirects);
        assert!(!request.no_redirects().follow_redirects);
    }
}
