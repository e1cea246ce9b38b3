use crate::utils::error::{ArgusError, ArgusResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

const EMBEDDED_WORDLIST: &str = include_str!("wordlist.json");
const EMBEDDED_PAYLOADS: &str = include_str!("payloads.json");

/// What to do when a required candidate list cannot be loaded.
///
/// `Fail` surfaces a `ResourceError` to the caller; `Degrade` logs a warning
/// and scans with an empty candidate set, matching the reference behavior of
/// treating a missing wordlist as "no findings".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingListPolicy {
    Fail,
    Degrade,
}

/// Loads wordlists and payload lists for the scanners.
///
/// Constructed by the caller and handed to the engine, so no file path is
/// baked into scan code. With no directory configured, the lists compiled
/// into the binary are used.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    dir: Option<PathBuf>,
    policy: MissingListPolicy,
}

impl ResourceLoader {
    /// Loader backed by the lists compiled into the binary.
    pub fn embedded() -> Self {
        ResourceLoader {
            dir: None,
            policy: MissingListPolicy::Fail,
        }
    }

    /// Loader reading JSON resource files from `dir`.
    pub fn from_dir(dir: impl Into<PathBuf>, policy: MissingListPolicy) -> Self {
        ResourceLoader {
            dir: Some(dir.into()),
            policy,
        }
    }

    pub fn with_policy(mut self, policy: MissingListPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Path-discovery wordlist.
    pub fn load_wordlist(&self) -> ArgusResult<Vec<String>> {
        self.load_list("wordlist.json", "common_paths")
    }

    /// Replacement values tried against the fuzzed parameter.
    pub fn load_idor_candidates(&self) -> ArgusResult<Vec<String>> {
        self.load_list("payloads.json", "idor_candidates")
    }

    /// Keywords whose presence in a response body marks exposed data.
    pub fn load_sensitive_keywords(&self) -> ArgusResult<Vec<String>> {
        self.load_list("payloads.json", "sensitive_keywords")
    }

    /// Keywords whose presence in a response body marks a database error.
    pub fn load_sql_error_keywords(&self) -> ArgusResult<Vec<String>> {
        self.load_list("payloads.json", "sql_error_keywords")
    }

    pub fn load_sql_payloads(&self) -> ArgusResult<Vec<String>> {
        self.load_list("payloads.json", "sql_injection_payloads")
    }

    fn load_list(&self, filename: &str, key: &str) -> ArgusResult<Vec<String>> {
        match self.read_list(filename, key) {
            Ok(list) => Ok(list),
            Err(e) => match self.policy {
                MissingListPolicy::Fail => Err(e),
                MissingListPolicy::Degrade => {
                    log::warn!("scanning with empty {} list: {}", key, e);
                    Ok(Vec::new())
                }
            },
        }
    }

    fn read_list(&self, filename: &str, key: &str) -> ArgusResult<Vec<String>> {
        let value = self.read_value(filename)?;
        let entries = value[key].as_array().ok_or_else(|| {
            ArgusError::ResourceError(format!("missing list {:?} in {}", key, filename))
        })?;

        Ok(entries
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect())
    }

    fn read_value(&self, filename: &str) -> ArgusResult<Value> {
        match &self.dir {
            Some(dir) => {
                let path = dir.join(filename);
                let content = fs::read_to_string(&path).map_err(|e| {
                    ArgusError::ResourceError(format!(
                        "failed to read resource file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                serde_json::from_str(&content).map_err(|e| {
                    ArgusError::ResourceError(format!(
                        "failed to parse resource file {}: {}",
                        path.display(),
                        e
                    ))
                })
            }
            None => Ok(embedded_value(filename)?.clone()),
        }
    }
}

impl Default for ResourceLoader {
    fn default() -> Self {
        ResourceLoader::embedded()
    }
}

fn embedded_value(filename: &str) -> ArgusResult<&'static Value> {
    static WORDLIST: OnceLock<Value> = OnceLock::new();
    static PAYLOADS: OnceLock<Value> = OnceLock::new();

    match filename {
        "wordlist.json" => Ok(WORDLIST.get_or_init(|| {
            serde_json::from_str(EMBEDDED_WORDLIST).unwrap_or(Value::Null)
        })),
        "payloads.json" => Ok(PAYLOADS.get_or_init(|| {
            serde_json::from_str(EMBEDDED_PAYLOADS).unwrap_or(Value::Null)
        })),
        _ => Err(ArgusError::ResourceError(format!(
            "unknown embedded resource: {}",
            filename
        ))),
    }
}
