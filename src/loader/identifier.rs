//! Identifier helpers
//!
//! URL construction hints and origin checks for resource identifiers.

use tracing::debug;
use url::Url;

use crate::error::{FetchError, Result};
use crate::models::LoadOptions;

/// Whether credentials may accompany a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsMode {
    /// Same origin as the page; credentials are attached
    SameOrigin,
    /// Cross-origin; the request is made without credentials
    Anonymous,
}

/// Parses an identifier as an absolute URL.
pub fn parse_identifier(id: &str) -> Result<Url> {
    Url::parse(id).map_err(|e| FetchError::InvalidIdentifier(format!("{}: {}", id, e)))
}

// == Optimized Identifier ==
/// Appends `quality`, `w` and `h` query parameters for the requested hints.
///
/// Identifiers that do not parse as absolute URLs get the parameters
/// appended textually.
pub fn create_optimized_identifier(id: &str, options: &LoadOptions) -> String {
    if !options.has_url_hints() {
        return id.to_string();
    }

    let mut params: Vec<(&str, String)> = Vec::with_capacity(3);
    if let Some(quality) = options.quality {
        params.push(("quality", quality.value().to_string()));
    }
    if let Some(width) = options.max_width {
        params.push(("w", width.to_string()));
    }
    if let Some(height) = options.max_height {
        params.push(("h", height.to_string()));
    }

    match parse_identifier(id) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
            url.into()
        }
        Err(err) => {
            debug!(error = %err, "appending hints to unparsed identifier");
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            let separator = if id.contains('?') { '&' } else { '?' };
            format!("{}{}{}", id, separator, query)
        }
    }
}

// == Credentials Mode ==
/// Decides whether a request for `id` is same-origin with `origin`.
///
/// Relative or malformed identifiers are treated as same-origin. With no
/// page origin every absolute identifier is cross-origin.
pub fn credentials_mode(id: &str, origin: Option<&Url>) -> CredentialsMode {
    let url = match parse_identifier(id) {
        Ok(url) => url,
        Err(err) => {
            debug!(error = %err, "treating identifier as same-origin");
            return CredentialsMode::SameOrigin;
        }
    };

    match origin {
        Some(origin) if origin.origin() == url.origin() => CredentialsMode::SameOrigin,
        _ => CredentialsMode::Anonymous,
    }
}
