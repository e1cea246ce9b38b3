pub mod aggregate;
pub mod idor_scanner;
pub mod path_scanner;
pub mod sqli_scanner;

use crate::probe::{ProbeOutcome, Prober, DEFAULT_TIMEOUT};
use crate::resources::ResourceLoader;
use crate::target::Target;
use crate::utils::error::{ArgusError, ArgusResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use aggregate::ScanSummary;

/// One trial input of a fuzzing round: a path fragment, a replacement
/// parameter value, or an injection payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Candidate {
    Path(String),
    ParamValue(String),
    Payload(String),
}

impl Candidate {
    pub fn as_str(&self) -> &str {
        match self {
            Candidate::Path(s) | Candidate::ParamValue(s) | Candidate::Payload(s) => s,
        }
    }
}

/// How a probed candidate was classified.
///
/// Classifications come from substring keyword matching and are hypotheses
/// for human triage, not proof of a vulnerability (or of its absence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Open,
    SensitiveDataExposed,
    SqlErrorDetected,
    Clean,
}

/// One classified result of testing one candidate against the target.
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub url: String,
    pub candidate: Candidate,
    pub classification: Classification,
    pub evidence: Vec<String>,
    pub outcome: ProbeOutcome,
}

/// The result of one engine invocation, owned by the caller. The engine
/// keeps no state across runs; persistence is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRun {
    pub target: Target,
    pub findings: Vec<Finding>,
    pub summary: ScanSummary,
    pub fuzzed_parameter: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Per-scan tuning. One concurrency limit applies to every phase.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub concurrency: usize,
    pub timeout: Duration,
    /// Query parameter to fuzz; defaults to the target's first parameter.
    pub parameter: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            concurrency: 10,
            timeout: DEFAULT_TIMEOUT,
            parameter: None,
        }
    }
}

/// Cooperative cancellation shared between the caller and a running scan.
/// Cancelling stops the submission of new probes; in-flight probes run to
/// completion (or their timeout) and their findings are kept.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs one scan against `raw_url`.
///
/// API-style URLs carrying query parameters get the IDOR and SQL-injection
/// fuzzers, run concurrently over their candidate sets; any other URL gets
/// wordlist path discovery. Candidate lists come from `resources`; a
/// malformed URL is rejected before any probe is sent.
pub async fn run_scan(
    prober: &dyn Prober,
    raw_url: &str,
    resources: &ResourceLoader,
    options: &ScanOptions,
    cancel: &CancelToken,
) -> ArgusResult<ScanRun> {
    let target = Target::decompose(raw_url)?;
    let started_at = Utc::now();

    let fuzz_param = options
        .parameter
        .clone()
        .or_else(|| target.first_param().map(|p| p.to_string()));

    let (phases, tried, fuzzed_parameter) = if target.is_api_style() && fuzz_param.is_some() {
        let parameter = fuzz_param.unwrap_or_default();
        if options.parameter.is_some() && target.param_values(&parameter).is_none() {
            return Err(ArgusError::ScanError(format!(
                "parameter {:?} not present in target query string",
                parameter
            )));
        }

        let candidates = resources.load_idor_candidates()?;
        let sensitive_keywords = resources.load_sensitive_keywords()?;
        let payloads = resources.load_sql_payloads()?;
        let error_keywords = resources.load_sql_error_keywords()?;

        let ((idor_findings, idor_tried), (sqli_findings, sqli_tried)) = tokio::join!(
            idor_scanner::fuzz_parameter(
                prober,
                &target,
                &parameter,
                &candidates,
                &sensitive_keywords,
                options.concurrency,
                options.timeout,
                cancel,
            ),
            sqli_scanner::fuzz_parameter(
                prober,
                &target,
                &parameter,
                &payloads,
                &error_keywords,
                options.concurrency,
                options.timeout,
                cancel,
            ),
        );

        (
            vec![idor_findings, sqli_findings],
            idor_tried + sqli_tried,
            Some(parameter),
        )
    } else {
        let wordlist = resources.load_wordlist()?;
        let (findings, tried) = path_scanner::discover_paths(
            prober,
            &target.base_url,
            &wordlist,
            options.concurrency,
            options.timeout,
            cancel,
        )
        .await;

        (vec![findings], tried, None)
    };

    let findings = aggregate::combine(phases);
    let summary = aggregate::summarize(&findings, tried);

    log::info!(
        "scan of {} finished: {} candidates tried, {} open, {} vulnerable",
        target.raw_url,
        summary.candidates_tried,
        summary.endpoints_open,
        summary.vulnerability_count(),
    );

    Ok(ScanRun {
        target,
        findings,
        summary,
        fuzzed_parameter,
        started_at,
        completed_at: Utc::now(),
    })
}
