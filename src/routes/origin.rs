use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::HOST, request::Parts},
};

use crate::services::media::RequestOrigin;

/// Scheme and host as the client saw them, honoring reverse-proxy headers.
///
/// These headers are caller-controlled. Archive fetches follow this origin
/// unless `BLOB_BASE_URL` is set, so deployments that must not issue outbound
/// requests to arbitrary hosts should set it.
impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let scheme = header("x-forwarded-proto")
            .or_else(|| parts.uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());
        let host = header("x-forwarded-host")
            .or_else(|| header(HOST.as_str()))
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        Ok(RequestOrigin::new(scheme, host))
    }
}

/// Every `filenames` value in a raw query string, percent- and `+`-decoded.
/// Repeated keys are kept in order.
pub fn parse_filenames(raw_query: Option<&str>) -> Vec<String> {
    let Some(query) = raw_query else {
        return Vec::new();
    };

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| *key == "filenames")
        .filter_map(|(_, value)| {
            let value = value.replace('+', " ");
            match urlencoding::decode(&value) {
                Ok(decoded) => Some(decoded.into_owned()),
                Err(e) => {
                    log::warn!("Ignoring undecodable filenames value {value:?}: {e}");
                    None
                }
            }
        })
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
