//! Push-channel target URL.

use super::error::ConnectionError;
use url::Url;

/// Query parameter carrying the bearer token.
pub const TOKEN_PARAM: &str = "token";

/// Build the push URL for `base` with `token` attached.
///
/// Fails when the base is not a `ws`/`wss` URL or no token is available;
/// the connection manager stays idle in both cases.
pub fn target_url(base: &str, token: Option<&str>) -> Result<Url, ConnectionError> {
    let mut url = Url::parse(base).map_err(|e| ConnectionError::InvalidUrl(e.to_string()))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(ConnectionError::UnsupportedScheme(url.scheme().to_string()));
    }

    let token = token
        .filter(|t| !t.is_empty())
        .ok_or(ConnectionError::MissingCredentials)?;

    // Replace any token already present in the configured URL
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != TOKEN_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(TOKEN_PARAM, token);
    }

    Ok(url)
}

/// URL with the token value masked, for logs.
pub fn redacted(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == TOKEN_PARAM {
                (k.into_owned(), "***".to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();
    if !pairs.is_empty() {
        masked.query_pairs_mut().clear().extend_pairs(pairs);
    }
    masked.to_string()
}
