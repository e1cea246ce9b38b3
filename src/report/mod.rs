use crate::scanners::{Candidate, Classification, ScanRun, ScanSummary};
use crate::utils::error::ArgusResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Overall risk of the scanned target, derived from finding counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSummary {
    pub level: RiskLevel,
    pub score: f64,
}

/// A discovered endpoint with the status code it answered with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub url: String,
    pub status_code: Option<u16>,
}

/// One candidate vulnerability in persistence shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub vuln_type: String,
    pub owasp_category: String,
    pub severity: Severity,
    pub location: String,
    pub parameter: Option<String>,
    pub payload: Option<String>,
    pub evidence: Vec<String>,
    pub description: String,
    pub remediation: String,
}

/// The complete record handed to the persistence collaborator per scan.
/// Field names follow the renderer contract (`original_url`,
/// `open_endpoints`, `vulnerabilities_found`, `timestamp`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub original_url: String,
    pub open_endpoints: Vec<EndpointRecord>,
    pub vulnerabilities_found: Vec<VulnerabilityRecord>,
    pub summary: ScanSummary,
    pub risk: RiskSummary,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<i64>,
}

/// Builds the persistence record from a completed run. Pure transform; the
/// caller decides where (and whether) the record is stored.
pub fn build_record(run: &ScanRun, user_id: Option<i64>) -> ScanRecord {
    let mut open_endpoints = Vec::new();
    let mut vulnerabilities_found = Vec::new();

    for finding in &run.findings {
        match finding.classification {
            Classification::Open => open_endpoints.push(EndpointRecord {
                url: finding.url.clone(),
                status_code: finding.outcome.status,
            }),
            Classification::SensitiveDataExposed => {
                vulnerabilities_found.push(VulnerabilityRecord {
                    vuln_type: "Insecure Direct Object Reference".to_string(),
                    owasp_category: "A01:2021 - Broken Access Control".to_string(),
                    severity: Severity::High,
                    location: finding.url.clone(),
                    parameter: run.fuzzed_parameter.clone(),
                    payload: Some(finding.candidate.as_str().to_string()),
                    evidence: finding.evidence.clone(),
                    description: format!(
                        "Substituting the object identifier returned a response containing sensitive markers ({}). The endpoint may serve other users' data without an authorization check.",
                        finding.evidence.join(", ")
                    ),
                    remediation: "Verify object ownership on every request and use indirect or non-guessable identifiers.".to_string(),
                });
            }
            Classification::SqlErrorDetected => {
                let payload = finding.candidate.as_str();
                vulnerabilities_found.push(VulnerabilityRecord {
                    vuln_type: "SQL Injection".to_string(),
                    owasp_category: "A03:2021 - Injection".to_string(),
                    severity: Severity::Critical,
                    location: finding.url.clone(),
                    parameter: run.fuzzed_parameter.clone(),
                    payload: Some(payload.to_string()),
                    evidence: finding.evidence.clone(),
                    description: format!(
                        "Payload {:?} produced a response containing database error text. The parameter appears to reach a SQL query unsanitized.",
                        payload
                    ),
                    remediation: "Use parameterized queries and suppress database error details in responses.".to_string(),
                });
            }
            Classification::Clean => {}
        }
    }

    let risk = assess_risk(&open_endpoints, &vulnerabilities_found);

    ScanRecord {
        original_url: run.target.raw_url.clone(),
        open_endpoints,
        vulnerabilities_found,
        summary: run.summary.clone(),
        risk,
        timestamp: run.completed_at,
        user_id,
    }
}

/// Weighted count model capped at 10. Injection errors weigh most and each
/// discovered endpoint adds a small amount of attack surface.
fn assess_risk(
    endpoints: &[EndpointRecord],
    vulnerabilities: &[VulnerabilityRecord],
) -> RiskSummary {
    let critical = vulnerabilities
        .iter()
        .filter(|v| v.severity == Severity::Critical)
        .count() as f64;
    let high = vulnerabilities
        .iter()
        .filter(|v| v.severity == Severity::High)
        .count() as f64;
    let surface = endpoints.len() as f64;

    let score = (critical * 4.0 + high * 2.5 + surface * 0.25).min(10.0);
    let level = if score >= 7.5 {
        RiskLevel::Critical
    } else if score >= 5.0 {
        RiskLevel::High
    } else if score >= 2.5 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskSummary { level, score }
}

/// Writes the record as pretty JSON. Kept separate from record building so
/// a failed save never loses computed findings.
pub fn save_record(record: &ScanRecord, path: &Path) -> ArgusResult<()> {
    use std::fs::File;
    use std::io::Write;

    let json = serde_json::to_string_pretty(record)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;

    Ok(())
}

/// Short human-readable line per finding class, used by the CLI listing.
pub fn classification_label(candidate: &Candidate, classification: Classification) -> String {
    match classification {
        Classification::Open => format!("open endpoint ({})", candidate.as_str()),
        Classification::SensitiveDataExposed => {
            format!("sensitive data exposure (value {})", candidate.as_str())
        }
        Classification::SqlErrorDetected => {
            format!("sql error response (payload {})", candidate.as_str())
        }
        Classification::Clean => format!("clean ({})", candidate.as_str()),
    }
}
