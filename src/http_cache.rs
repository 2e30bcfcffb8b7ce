use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT};

use crate::matches::MatchServiceError;

pub const CLIENT_USER_AGENT: &str = concat!("lineup_terminal/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
}

/// Conditional-GET cache keyed by URL. Lives in memory only.
#[derive(Debug, Default)]
pub struct HttpCache {
    entries: HashMap<String, CacheEntry>,
}

impl HttpCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_json_cached(
        &mut self,
        client: &Client,
        url: &str,
        extra_headers: &[(&str, &str)],
    ) -> Result<String> {
        let cached_entry = self.entries.get(url).cloned();

        let mut req = client.get(url).header(USER_AGENT, CLIENT_USER_AGENT);
        for (name, value) in extra_headers {
            req = req.header(*name, *value);
        }
        if let Some(entry) = cached_entry.as_ref() {
            if let Some(etag) = entry.etag.as_ref() {
                req = req.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = entry.last_modified.as_ref() {
                req = req.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let resp = req.send().context("request failed")?;
        let status = resp.status();
        let headers = resp.headers().clone();
        if status == StatusCode::NOT_MODIFIED {
            if let Some(entry) = cached_entry {
                tracing::debug!(url, "not modified, serving cached body");
                return Ok(entry.body);
            }
            return Err(anyhow::anyhow!("received 304 without cache body"));
        }

        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(status_error(status, body).into());
        }

        let etag = headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let last_modified = headers
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        self.entries.insert(
            url.to_string(),
            CacheEntry {
                body: body.clone(),
                etag,
                last_modified,
            },
        );
        Ok(body)
    }

    /// Forgets every entry whose URL starts with `prefix`; returns how many.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|url, _| !url.starts_with(prefix));
        before - self.entries.len()
    }
}

pub fn status_error(status: StatusCode, body: String) -> MatchServiceError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return MatchServiceError::Unauthorized;
    }
    MatchServiceError::Status {
        status: status.as_u16(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_unauthorized() {
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, String::new()),
            MatchServiceError::Unauthorized
        ));
        match status_error(StatusCode::BAD_GATEWAY, "upstream".to_string()) {
            MatchServiceError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalidating_an_empty_cache_drops_nothing() {
        let mut cache = HttpCache::new();
        assert_eq!(cache.invalidate_prefix("http://api.local/"), 0);
    }
}
