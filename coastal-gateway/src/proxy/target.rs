use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use url::Url;

use super::error::ProxyError;
use crate::config::BackendConfig;

/// Logical path used when the request carries none
pub const DEFAULT_PATH: &str = "/health";

/// Turn the `path` query value into a backend-relative path.
///
/// `raw` is the already form-decoded query value. It is percent-decoded a
/// second time only when it still looks over-encoded (see
/// [`is_over_encoded`]); otherwise escapes inside query values such as
/// `%2B` or `%26` reach the backend untouched. An absolute `http(s)://`
/// URL is reduced to its path and query so the host can never be chosen
/// by the caller. Leading slashes and backslashes
/// collapse to a single `/`, which also rules out protocol-relative
/// `//host` forms.
pub fn normalize_logical_path(raw: &str) -> Result<String, ProxyError> {
    let decoded = if is_over_encoded(raw) {
        percent_decode_str(raw)
            .decode_utf8()
            .map_err(|e| ProxyError::Decode(e.to_string()))?
    } else {
        Cow::Borrowed(raw)
    };
    let decoded = decoded.trim();

    let path_with_query = if has_http_scheme(decoded) {
        let url = Url::parse(decoded).map_err(|e| ProxyError::InvalidPath {
            path: decoded.to_string(),
            reason: e.to_string(),
        })?;
        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        }
    } else {
        decoded.to_string()
    };

    Ok(format!(
        "/{}",
        path_with_query.trim_start_matches(['/', '\\'])
    ))
}

/// True when a path value carries no literal `/` or `?` but escapes one,
/// or escapes the `:` of an `http(s)` scheme.
pub fn is_over_encoded(raw: &str) -> bool {
    let lower = raw.trim().to_ascii_lowercase();
    let escaped_separator =
        !lower.contains(['/', '?']) && (lower.contains("%2f") || lower.contains("%3f"));
    escaped_separator || lower.starts_with("http%3a") || lower.starts_with("https%3a")
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Absolute upstream URL for a raw `path` value.
pub fn resolve_target(backend: &BackendConfig, raw: &str) -> Result<Url, ProxyError> {
    let logical = normalize_logical_path(raw)?;
    backend.join(&logical).map_err(|e| ProxyError::InvalidPath {
        path: logical,
        reason: e.to_string(),
    })
}
