use argus_scan::probe::{ProbeOutcome, ProbeRequest, Prober};
use argus_scan::resources::ResourceLoader;
use argus_scan::scanners::{
    self, idor_scanner, path_scanner, sqli_scanner, CancelToken, Classification, ScanOptions,
};
use argus_scan::target::Target;
use argus_scan::ArgusError;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Prober answering from a deterministic function of the request.
struct FnProber<F>(F);

#[async_trait]
impl<F> Prober for FnProber<F>
where
    F: Fn(&ProbeRequest) -> ProbeOutcome + Send + Sync,
{
    async fn probe(&self, request: &ProbeRequest) -> ProbeOutcome {
        (self.0)(request)
    }
}

fn ok(body: &str) -> ProbeOutcome {
    ProbeOutcome::response(200, body.to_string(), Duration::from_millis(1))
}

fn status(code: u16) -> ProbeOutcome {
    ProbeOutcome::response(code, String::new(), Duration::from_millis(1))
}

fn refused() -> ProbeOutcome {
    ProbeOutcome::failure("connection refused".to_string(), Duration::from_millis(1))
}

fn words(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn path_discovery_keeps_only_reachable_entries_at_any_concurrency() {
    let wordlist = words(&["admin", "config", "missing", "broken", "gone", "lost"]);
    let prober = FnProber(|request: &ProbeRequest| {
        if request.url.ends_with("/admin") || request.url.ends_with("/config") {
            ok("<html>ok</html>")
        } else {
            refused()
        }
    });

    for concurrency in [1, 2, 3, wordlist.len()] {
        let (findings, tried) = path_scanner::discover_paths(
            &prober,
            "https://example.com",
            &wordlist,
            concurrency,
            Duration::from_secs(1),
            &CancelToken::new(),
        )
        .await;

        assert_eq!(tried, wordlist.len());
        assert_eq!(findings.len(), 2, "concurrency {}", concurrency);
        assert!(findings
            .iter()
            .all(|f| f.classification == Classification::Open));

        let found: BTreeSet<&str> = findings.iter().map(|f| f.candidate.as_str()).collect();
        assert_eq!(found, BTreeSet::from(["admin", "config"]));
    }
}

#[tokio::test]
async fn path_discovery_with_empty_wordlist_yields_nothing() {
    let prober = FnProber(|_: &ProbeRequest| ok(""));
    let (findings, tried) = path_scanner::discover_paths(
        &prober,
        "https://example.com",
        &[],
        10,
        Duration::from_secs(1),
        &CancelToken::new(),
    )
    .await;

    assert!(findings.is_empty());
    assert_eq!(tried, 0);
}

#[tokio::test]
async fn path_discovery_respects_the_status_allow_list() {
    let wordlist = words(&["a", "b", "c", "d"]);
    let prober = FnProber(|request: &ProbeRequest| {
        if request.url.ends_with("/a") {
            status(403)
        } else if request.url.ends_with("/b") {
            status(301)
        } else if request.url.ends_with("/c") {
            status(404)
        } else {
            status(500)
        }
    });

    let (findings, _) = path_scanner::discover_paths(
        &prober,
        "https://example.com",
        &wordlist,
        10,
        Duration::from_secs(1),
        &CancelToken::new(),
    )
    .await;

    let found: BTreeSet<&str> = findings.iter().map(|f| f.candidate.as_str()).collect();
    assert_eq!(found, BTreeSet::from(["a", "b"]));
}

#[tokio::test]
async fn idor_flags_every_candidate_when_bodies_leak() {
    let target = Target::decompose("https://example.com/api/users?id=1").unwrap();
    let candidates = words(&["1", "2", "9999999"]);
    let keywords = words(&["username", "password"]);
    let prober = FnProber(|_: &ProbeRequest| ok("{\"password\": \"hunter2\"}"));

    let (findings, tried) = idor_scanner::fuzz_parameter(
        &prober,
        &target,
        "id",
        &candidates,
        &keywords,
        10,
        Duration::from_secs(1),
        &CancelToken::new(),
    )
    .await;

    assert_eq!(tried, 3);
    assert_eq!(findings.len(), 3);
    for finding in &findings {
        assert_eq!(finding.classification, Classification::SensitiveDataExposed);
        assert!(finding.evidence.contains(&"password".to_string()));
    }
}

#[tokio::test]
async fn idor_substitutes_each_candidate_into_the_request() {
    let target = Target::decompose("https://example.com/api/users?id=1").unwrap();
    let candidates = words(&["2", "9999999"]);
    let keywords = words(&["password"]);
    let prober = FnProber(|request: &ProbeRequest| ok(&format!("probed {}", request.url)));

    let (findings, _) = idor_scanner::fuzz_parameter(
        &prober,
        &target,
        "id",
        &candidates,
        &keywords,
        1,
        Duration::from_secs(1),
        &CancelToken::new(),
    )
    .await;

    let urls: BTreeSet<String> = findings.iter().map(|f| f.url.clone()).collect();
    assert_eq!(
        urls,
        BTreeSet::from([
            "https://example.com/api/users?id=2".to_string(),
            "https://example.com/api/users?id=9999999".to_string(),
        ])
    );
}

#[tokio::test]
async fn idor_treats_non_200_as_weak_negative() {
    let target = Target::decompose("https://example.com/api/users?id=1").unwrap();
    let candidates = words(&["1", "2", "3"]);
    let keywords = words(&["password"]);
    let prober = FnProber(|_: &ProbeRequest| status(403));

    let (findings, _) = idor_scanner::fuzz_parameter(
        &prober,
        &target,
        "id",
        &candidates,
        &keywords,
        10,
        Duration::from_secs(1),
        &CancelToken::new(),
    )
    .await;

    assert_eq!(findings.len(), 3);
    for finding in &findings {
        assert_eq!(finding.classification, Classification::Clean);
        assert!(finding.evidence.is_empty());
    }
}

#[tokio::test]
async fn sqli_reports_first_keyword_for_the_triggering_payload_only() {
    let target = Target::decompose("https://example.com/api/items?id=1").unwrap();
    let payloads = ResourceLoader::embedded().load_sql_payloads().unwrap();
    let error_keywords = ResourceLoader::embedded().load_sql_error_keywords().unwrap();

    let trigger = target.url_with_param("id", "' OR '1'='1");
    let prober = FnProber(move |request: &ProbeRequest| {
        if request.url == trigger {
            ok("SQL syntax error near ''1'='1'")
        } else {
            ok("<html>all fine</html>")
        }
    });

    let (findings, tried) = sqli_scanner::fuzz_parameter(
        &prober,
        &target,
        "id",
        &payloads,
        &error_keywords,
        10,
        Duration::from_secs(1),
        &CancelToken::new(),
    )
    .await;

    assert_eq!(tried, payloads.len());
    let detected: Vec<_> = findings
        .iter()
        .filter(|f| f.classification == Classification::SqlErrorDetected)
        .collect();
    assert_eq!(detected.len(), 1);
    assert_eq!(detected[0].candidate.as_str(), "' OR '1'='1");
    assert_eq!(detected[0].evidence, ["sql"]);
    assert!(findings
        .iter()
        .filter(|f| f.classification == Classification::Clean)
        .count()
        == payloads.len() - 1);
}

#[tokio::test]
async fn cancellation_returns_the_findings_collected_so_far() {
    let wordlist: Vec<String> = (0..1000).map(|i| format!("path{}", i)).collect();
    let cancel = CancelToken::new();
    let completed = AtomicUsize::new(0);

    let cancel_clone = cancel.clone();
    let prober = FnProber(move |_: &ProbeRequest| {
        if completed.fetch_add(1, Ordering::SeqCst) + 1 >= 10 {
            cancel_clone.cancel();
        }
        ok("")
    });

    let (findings, tried) = path_scanner::discover_paths(
        &prober,
        "https://example.com",
        &wordlist,
        5,
        Duration::from_secs(1),
        &cancel,
    )
    .await;

    assert!(!findings.is_empty());
    assert!(findings.len() < wordlist.len());
    assert_eq!(findings.len(), tried);
    for finding in &findings {
        assert_eq!(finding.classification, Classification::Open);
        assert!(finding.outcome.is_status(200));
        assert!(finding.candidate.as_str().starts_with("path"));
    }
}

#[tokio::test]
async fn repeated_runs_produce_an_identical_finding_set() {
    let wordlist: Vec<String> = (0..500).map(|i| format!("entry{}", i)).collect();
    let prober = FnProber(|request: &ProbeRequest| {
        if request.url.ends_with('7') {
            ok("found")
        } else {
            status(404)
        }
    });

    let mut previous: Option<BTreeSet<String>> = None;
    for _ in 0..5 {
        let (findings, _) = path_scanner::discover_paths(
            &prober,
            "https://example.com",
            &wordlist,
            50,
            Duration::from_secs(1),
            &CancelToken::new(),
        )
        .await;

        let set: BTreeSet<String> = findings
            .iter()
            .map(|f| f.candidate.as_str().to_string())
            .collect();
        if let Some(prev) = &previous {
            assert_eq!(&set, prev);
        }
        previous = Some(set);
    }

    assert_eq!(previous.unwrap().len(), 50);
}

#[tokio::test]
async fn run_scan_routes_api_urls_to_the_fuzzers() {
    let resources = ResourceLoader::embedded();
    let prober = FnProber(|_: &ProbeRequest| status(404));

    let run = scanners::run_scan(
        &prober,
        "https://example.com/api/users?id=1",
        &resources,
        &ScanOptions::default(),
        &CancelToken::new(),
    )
    .await
    .unwrap();

    let candidates = resources.load_idor_candidates().unwrap().len();
    let payloads = resources.load_sql_payloads().unwrap().len();
    assert_eq!(run.summary.candidates_tried, candidates + payloads);
    assert_eq!(run.summary.endpoints_open, 0);
    assert_eq!(run.summary.clean, candidates + payloads);
    assert_eq!(run.fuzzed_parameter.as_deref(), Some("id"));
}

#[tokio::test]
async fn run_scan_routes_generic_urls_to_path_discovery() {
    let resources = ResourceLoader::embedded();
    let prober = FnProber(|request: &ProbeRequest| {
        if request.url.ends_with("/admin") {
            ok("")
        } else {
            status(404)
        }
    });

    let run = scanners::run_scan(
        &prober,
        "https://example.com",
        &resources,
        &ScanOptions::default(),
        &CancelToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(run.summary.endpoints_open, 1);
    assert!(run.fuzzed_parameter.is_none());
    assert_eq!(
        run.summary.candidates_tried,
        resources.load_wordlist().unwrap().len()
    );
}

#[tokio::test]
async fn run_scan_rejects_malformed_urls_before_probing() {
    let probes = std::sync::Arc::new(AtomicUsize::new(0));
    let probes_seen = probes.clone();
    let prober = FnProber(move |_: &ProbeRequest| {
        probes_seen.fetch_add(1, Ordering::SeqCst);
        ok("")
    });

    let result = scanners::run_scan(
        &prober,
        "not a url",
        &ResourceLoader::embedded(),
        &ScanOptions::default(),
        &CancelToken::new(),
    )
    .await;

    assert!(matches!(result, Err(ArgusError::InvalidUrl(_))));
    assert_eq!(probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn run_scan_rejects_a_requested_parameter_the_target_lacks() {
    let prober = FnProber(|_: &ProbeRequest| ok(""));
    let options = ScanOptions {
        parameter: Some("user_id".to_string()),
        ..Default::default()
    };

    let result = scanners::run_scan(
        &prober,
        "https://example.com/api/users?id=1",
        &ResourceLoader::embedded(),
        &options,
        &CancelToken::new(),
    )
    .await;

    assert!(matches!(result, Err(ArgusError::ScanError(_))));
}

#[tokio::test]
async fn zero_reachable_candidates_is_a_valid_outcome() {
    let prober = FnProber(|_: &ProbeRequest| refused());

    let run = scanners::run_scan(
        &prober,
        "https://example.com",
        &ResourceLoader::embedded(),
        &ScanOptions::default(),
        &CancelToken::new(),
    )
    .await
    .unwrap();

    assert!(run.findings.is_empty());
    assert_eq!(run.summary.endpoints_open, 0);
    assert!(run.summary.candidates_tried > 0);
}
