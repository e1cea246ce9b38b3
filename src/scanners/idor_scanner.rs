use crate::probe::{ProbeRequest, Prober};
use crate::scanners::{CancelToken, Candidate, Classification, Finding};
use crate::target::Target;
use futures::stream::{self, StreamExt};
use std::time::Duration;

/// Replaces the fuzzed parameter with each candidate value and inspects
/// 200 responses for sensitive-keyword markers.
///
/// A keyword hit classifies the finding as `SensitiveDataExposed`, with the
/// full set of matched keywords as evidence. A non-200 response or a probe
/// error yields `Clean` with no evidence. That is a weak negative signal,
/// not proof the object reference is safe.
///
/// Redirects are disabled so a redirect response cannot mask the behavior
/// of the parameter under test.
pub async fn fuzz_parameter(
    prober: &dyn Prober,
    target: &Target,
    parameter: &str,
    candidates: &[String],
    keywords: &[String],
    concurrency: usize,
    timeout: Duration,
    cancel: &CancelToken,
) -> (Vec<Finding>, usize) {
    let findings: Vec<Finding> = stream::iter(candidates)
        .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
        .map(|candidate| {
            let url = target.url_with_param(parameter, candidate);
            async move {
                let request = ProbeRequest::get(&url).with_timeout(timeout).no_redirects();
                let outcome = prober.probe(&request).await;

                let evidence = if outcome.is_status(200) {
                    matched_keywords(outcome.body_text(), keywords)
                } else {
                    Vec::new()
                };
                let classification = if evidence.is_empty() {
                    Classification::Clean
                } else {
                    Classification::SensitiveDataExposed
                };

                Finding {
                    url,
                    candidate: Candidate::ParamValue(candidate.clone()),
                    classification,
                    evidence,
                    outcome,
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let tried = findings.len();
    (findings, tried)
}

/// All keywords present in the body, case-insensitive substring match.
fn matched_keywords(body: &str, keywords: &[String]) -> Vec<String> {
    let haystack = body.to_lowercase();
    keywords
        .iter()
        .filter(|keyword| haystack.contains(&keyword.to_lowercase()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_are_case_insensitive_and_complete() {
        let keywords: Vec<String> = ["username", "password", "token"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let matched = matched_keywords("{\"UserName\": \"bob\", \"PASSWORD\": \"x\"}", &keywords);
        assert_eq!(matched, ["username", "password"]);
    }

    #[test]
    fn clean_body_matches_nothing() {
        let keywords = vec!["password".to_string()];
        assert!(matched_keywords("<html>hello</html>", &keywords).is_empty());
    }
}
