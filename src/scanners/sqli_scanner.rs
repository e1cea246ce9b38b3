use crate::probe::{ProbeRequest, Prober};
use crate::scanners::{CancelToken, Candidate, Classification, Finding};
use crate::target::Target;
use futures::stream::{self, StreamExt};
use std::time::Duration;

/// Sets the fuzzed parameter to each injection payload and inspects 200
/// responses for database-error keywords.
///
/// Evidence is the first matching keyword only, keeping the mapping between
/// payload and evidence 1:1. A non-200 response or probe error yields
/// `Clean`: absence of an error message is a weak negative, not proof the
/// parameter is safe.
pub async fn fuzz_parameter(
    prober: &dyn Prober,
    target: &Target,
    parameter: &str,
    payloads: &[String],
    error_keywords: &[String],
    concurrency: usize,
    timeout: Duration,
    cancel: &CancelToken,
) -> (Vec<Finding>, usize) {
    let findings: Vec<Finding> = stream::iter(payloads)
        .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
        .map(|payload| {
            let url = target.url_with_param(parameter, payload);
            async move {
                let request = ProbeRequest::get(&url).with_timeout(timeout).no_redirects();
                let outcome = prober.probe(&request).await;

                let evidence: Vec<String> = if outcome.is_status(200) {
                    first_error_keyword(outcome.body_text(), error_keywords)
                        .into_iter()
                        .collect()
                } else {
                    Vec::new()
                };
                let classification = if evidence.is_empty() {
                    Classification::Clean
                } else {
                    Classification::SqlErrorDetected
                };

                Finding {
                    url,
                    candidate: Candidate::Payload(payload.clone()),
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

/// First keyword present in the body, case-insensitive substring match.
fn first_error_keyword(body: &str, keywords: &[String]) -> Option<String> {
    let haystack = body.to_lowercase();
    keywords
        .iter()
        .find(|keyword| haystack.contains(&keyword.to_lowercase()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_only_the_first_matching_keyword() {
        let keywords: Vec<String> = ["sql", "syntax", "query"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            first_error_keyword("SQL syntax error near ''", &keywords),
            Some("sql".to_string())
        );
    }

    #[test]
    fn no_keyword_means_no_evidence() {
        let keywords = vec!["sql".to_string()];
        assert_eq!(first_error_keyword("all good", &keywords), None);
    }
}
