use crate::probe::{ProbeRequest, Prober};
use crate::scanners::{CancelToken, Candidate, Classification, Finding};
use futures::stream::{self, StreamExt};
use std::time::Duration;

/// Status codes treated as "endpoint exists" during discovery.
pub const ALLOWED_STATUS: &[u16] = &[200, 201, 301, 302, 403];

/// Probes `base_url + "/" + word` for every wordlist entry, keeping the
/// responses whose status is on the allow-list.
///
/// Probes run through a bounded concurrent stream so one hung path cannot
/// stall the rest; results are collected in completion order. A probe that
/// errors out is excluded from the findings entirely: no response is not
/// evidence of anything. Cancellation stops submitting new probes and lets
/// the in-flight ones finish.
///
/// Returns the findings plus the number of probes dispatched.
pub async fn discover_paths(
    prober: &dyn Prober,
    base_url: &str,
    wordlist: &[String],
    concurrency: usize,
    timeout: Duration,
    cancel: &CancelToken,
) -> (Vec<Finding>, usize) {
    let base = base_url.trim_end_matches('/');

    let probed: Vec<Option<Finding>> = stream::iter(wordlist)
        .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
        .map(|word| {
            let url = format!("{}/{}", base, word.trim_start_matches('/'));
            async move {
                let request = ProbeRequest::get(&url).with_timeout(timeout);
                let outcome = prober.probe(&request).await;
                match outcome.status {
                    Some(code) if ALLOWED_STATUS.contains(&code) => Some(Finding {
                        url,
                        candidate: Candidate::Path(word.clone()),
                        classification: Classification::Open,
                        evidence: Vec::new(),
                        outcome,
                    }),
                    _ => None,
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let tried = probed.len();
    (probed.into_iter().flatten().collect(), tried)
}
