use crate::scanners::{Candidate, Classification, Finding};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Counts summarizing one scan run. `candidates_tried` includes probes that
/// produced no finding; a run with zero findings and a nonzero tried count
/// is a valid outcome, distinct from a rejected input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    pub candidates_tried: usize,
    pub endpoints_open: usize,
    pub sensitive_exposures: usize,
    pub sql_errors: usize,
    pub clean: usize,
}

impl ScanSummary {
    pub fn vulnerability_count(&self) -> usize {
        self.sensitive_exposures + self.sql_errors
    }
}

/// Normalizes per-phase results into one finding sequence.
///
/// Path-discovery findings are deduplicated by candidate, enforcing that
/// every finding traces back to exactly one wordlist entry. Fuzzer findings
/// legitimately retest the same parameter with different values, so their
/// candidates pass through untouched.
pub fn combine(phases: Vec<Vec<Finding>>) -> Vec<Finding> {
    let mut seen_paths: HashSet<String> = HashSet::new();
    let mut findings = Vec::new();

    for phase in phases {
        for finding in phase {
            if let Candidate::Path(word) = &finding.candidate {
                if !seen_paths.insert(word.clone()) {
                    continue;
                }
            }
            findings.push(finding);
        }
    }

    findings
}

/// Classification counts over a finding sequence.
pub fn summarize(findings: &[Finding], candidates_tried: usize) -> ScanSummary {
    let mut summary = ScanSummary {
        candidates_tried,
        ..Default::default()
    };

    for finding in findings {
        match finding.classification {
            Classification::Open => summary.endpoints_open += 1,
            Classification::SensitiveDataExposed => summary.sensitive_exposures += 1,
            Classification::SqlErrorDetected => summary.sql_errors += 1,
            Classification::Clean => summary.clean += 1,
        }
    }

    summary
}
