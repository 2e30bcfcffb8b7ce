use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, USER_AGENT};

use crate::config::AppConfig;
use crate::http_cache::{CLIENT_USER_AGENT, HttpCache, status_error};
use crate::http_client::http_client;
use crate::matches::{Match, MatchServiceError, MatchesService, SimulationTicket};

const MATCHES_PATH: &str = "/api/v1/matches/";

pub struct HttpMatchesService {
    client: &'static Client,
    base: String,
    token: Option<String>,
    cache: HttpCache,
}

impl HttpMatchesService {
    pub fn new(base: &str, token: Option<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base: base.trim_end_matches('/').to_string(),
            token,
            cache: HttpCache::new(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        let Some(base) = config.api_base.as_deref() else {
            return Ok(None);
        };
        Self::new(base, config.api_token.clone(), config.http_timeout_secs).map(Some)
    }

    fn matches_root(&self) -> String {
        format!("{}{MATCHES_PATH}", self.base)
    }

    fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }
}

impl MatchesService for HttpMatchesService {
    fn read_matches(&mut self, skip: usize, limit: usize) -> Result<Vec<Match>> {
        let url = matches_url(&self.base, skip, limit);
        let bearer = self.bearer();
        let headers: Vec<(&str, &str)> = bearer
            .as_deref()
            .map(|b| vec![(AUTHORIZATION.as_str(), b)])
            .unwrap_or_default();
        let body = self
            .cache
            .fetch_json_cached(self.client, &url, &headers)
            .with_context(|| format!("read matches skip={skip} limit={limit}"))?;
        parse_matches_json(&body)
    }

    fn trigger_simulation(&mut self, match_id: &str) -> Result<SimulationTicket> {
        let url = simulate_url(&self.base, match_id);
        let mut req = self
            .client
            .post(&url)
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if let Some(bearer) = self.bearer() {
            req = req.header(AUTHORIZATION, bearer);
        }

        let resp = req.send().context("simulate request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if status == StatusCode::NOT_FOUND {
            return Err(MatchServiceError::NotFound {
                match_id: match_id.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            return Err(status_error(status, body).into());
        }
        parse_simulation_ticket_json(&body)
    }

    fn invalidate_matches(&mut self) {
        let root = self.matches_root();
        let dropped = self.cache.invalidate_prefix(&root);
        tracing::debug!(dropped, "match cache invalidated");
    }
}

pub fn matches_url(base: &str, skip: usize, limit: usize) -> String {
    format!(
        "{}{MATCHES_PATH}?skip={skip}&limit={limit}",
        base.trim_end_matches('/')
    )
}

pub fn simulate_url(base: &str, match_id: &str) -> String {
    format!(
        "{}{MATCHES_PATH}{}/simulate",
        base.trim_end_matches('/'),
        match_id.trim()
    )
}

pub fn parse_matches_json(raw: &str) -> Result<Vec<Match>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("invalid matches json")
}

pub fn parse_simulation_ticket_json(raw: &str) -> Result<SimulationTicket> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(SimulationTicket {
            message: "Simulation triggered".to_string(),
            task_id: None,
        });
    }
    serde_json::from_str(trimmed).context("invalid simulate response json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_backend_routes() {
        assert_eq!(
            matches_url("http://api.local/", 0, 100),
            "http://api.local/api/v1/matches/?skip=0&limit=100"
        );
        assert_eq!(
            simulate_url("http://api.local", "abc-123"),
            "http://api.local/api/v1/matches/abc-123/simulate"
        );
    }
}
