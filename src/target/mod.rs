use crate::utils::error::{ArgusError, ArgusResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// Path fragments that mark a URL as an API-style target. Matching any of
/// these routes the scan to the parameter fuzzers instead of path discovery.
const API_PATH_MARKERS: &[&str] = &["/api/", "/v1/", "/v2/", "/rest/"];

/// A scan target, decomposed once per scan and immutable afterwards.
///
/// `query_params` groups values by parameter name, preserving both the
/// multiplicity of repeated parameters and their order of first appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub raw_url: String,
    pub base_url: String,
    pub query_params: Vec<(String, Vec<String>)>,
}

impl Target {
    /// Splits a URL into base URL and query parameter map.
    ///
    /// Fails with `InvalidUrl` when the input has no recognizable scheme or
    /// host. Pure string work, no network access.
    pub fn decompose(raw: &str) -> ArgusResult<Target> {
        let parsed = Url::parse(raw).map_err(|e| ArgusError::InvalidUrl(e.to_string()))?;

        if parsed.host_str().is_none() {
            return Err(ArgusError::InvalidUrl(
                "URL does not contain a valid host".to_string(),
            ));
        }

        let mut query_params: Vec<(String, Vec<String>)> = Vec::new();
        for (name, value) in parsed.query_pairs() {
            match query_params.iter_mut().find(|(n, _)| *n == name) {
                Some((_, values)) => values.push(value.into_owned()),
                None => query_params.push((name.into_owned(), vec![value.into_owned()])),
            }
        }

        let mut base = parsed.clone();
        base.set_query(None);
        base.set_fragment(None);

        Ok(Target {
            raw_url: raw.to_string(),
            base_url: base.to_string(),
            query_params,
        })
    }

    /// All values observed for the given parameter, in query-string order.
    pub fn param_values(&self, name: &str) -> Option<&[String]> {
        self.query_params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Name of the first query parameter, if any.
    pub fn first_param(&self) -> Option<&str> {
        self.query_params.first().map(|(name, _)| name.as_str())
    }

    /// Reconstructs the query string from the decomposed parameters.
    pub fn query(&self) -> String {
        let mut pairs = Vec::new();
        for (name, values) in &self.query_params {
            for value in values {
                pairs.push(format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                ));
            }
        }
        pairs.join("&")
    }

    /// Full URL with every value of `name` replaced by the single `value`.
    /// Parameters the target already carries are kept; a missing parameter
    /// is appended.
    pub fn url_with_param(&self, name: &str, value: &str) -> String {
        let mut pairs = Vec::new();
        let mut replaced = false;

        for (param, values) in &self.query_params {
            if param == name {
                if !replaced {
                    pairs.push(format!(
                        "{}={}",
                        urlencoding::encode(param),
                        urlencoding::encode(value)
                    ));
                    replaced = true;
                }
            } else {
                for v in values {
                    pairs.push(format!(
                        "{}={}",
                        urlencoding::encode(param),
                        urlencoding::encode(v)
                    ));
                }
            }
        }

        if !replaced {
            pairs.push(format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            ));
        }

        format!("{}?{}", self.base_url, pairs.join("&"))
    }

    /// Whether the target path looks like an API endpoint.
    pub fn is_api_style(&self) -> bool {
        let path = match Url::parse(&self.base_url) {
            Ok(url) => format!("{}/", url.path().to_lowercase()),
            Err(_) => return false,
        };
        API_PATH_MARKERS.iter().any(|marker| path.contains(marker))
    }
}

/// Ensures a target string carries a scheme before decomposition.
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}
