// src/probe/result.rs
// =============================================================================
// One ProbeResult per dispatched task, success or not.
//
// A transport failure fills `error` and leaves every header-derived field
// empty; the cache status is then the literal "error".
// =============================================================================

use serde::Serialize;
use std::fmt::Display;

use super::task::ProbeTask;
use crate::classify::{classify, CacheClass};
use crate::config::Variant;
use crate::fetch::FetchResponse;

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub task_id: usize,
    pub url: String,
    pub variant: Variant,
    pub pass: u32,
    /// None when no response arrived
    pub http_status: Option<u16>,
    pub elapsed_ms: u64,
    pub cache_status: String,
    pub cache_class: CacheClass,
    pub server: Option<String>,
    pub cf_cache_status: Option<String>,
    pub origin_unverifiable: bool,
    pub vary: Option<String>,
    pub x_litespeed_cache_control: Option<String>,
    pub cache_control: Option<String>,
    pub age: Option<String>,
    /// Final URL, only when a redirect moved us somewhere else
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_url: Option<String>,
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn from_response(task: &ProbeTask, elapsed_ms: u64, response: &FetchResponse) -> Self {
        let c = classify(&response.headers);

        let effective_url = (!response.effective_url.is_empty()
            && response.effective_url != task.url)
            .then(|| response.effective_url.clone());

        Self {
            task_id: task.id,
            url: task.url.clone(),
            variant: task.variant,
            pass: task.pass,
            http_status: Some(response.status),
            elapsed_ms,
            cache_status: c.cache_status,
            cache_class: c.cache_class,
            server: c.server,
            cf_cache_status: c.cf_cache_status,
            origin_unverifiable: c.origin_unverifiable,
            vary: c.vary,
            x_litespeed_cache_control: c.x_litespeed_cache_control,
            cache_control: c.cache_control,
            age: c.age,
            effective_url,
            error: None,
        }
    }

    pub fn from_error(task: &ProbeTask, elapsed_ms: u64, error: impl Display) -> Self {
        Self {
            task_id: task.id,
            url: task.url.clone(),
            variant: task.variant,
            pass: task.pass,
            http_status: None,
            elapsed_ms,
            cache_status: "error".to_string(),
            cache_class: CacheClass::Na,
            server: None,
            cf_cache_status: None,
            origin_unverifiable: false,
            vary: None,
            x_litespeed_cache_control: None,
            cache_control: None,
            age: None,
            effective_url: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;

    fn task() -> ProbeTask {
        ProbeTask {
            id: 7,
            url: "https://example.com/a".to_string(),
            variant: Variant::Mobile,
            pass: 2,
        }
    }

    #[test]
    fn test_response_fields_are_extracted() {
        let response = FetchResponse {
            status: 200,
            effective_url: "https://example.com/a/".to_string(),
            headers: "HTTP/1.1 200 OK\r\nserver: LiteSpeed\r\nx-litespeed-cache: hit\r\nvary: User-Agent\r\nage: 30\r\n".to_string(),
            body: String::new(),
        };

        let result = ProbeResult::from_response(&task(), 120, &response);

        assert_eq!(result.task_id, 7);
        assert_eq!(result.http_status, Some(200));
        assert_eq!(result.cache_status, "hit");
        assert_eq!(result.cache_class, CacheClass::Hit);
        assert_eq!(result.server.as_deref(), Some("LiteSpeed"));
        assert_eq!(result.vary.as_deref(), Some("User-Agent"));
        assert_eq!(result.age.as_deref(), Some("30"));
        assert_eq!(result.effective_url.as_deref(), Some("https://example.com/a/"));
        assert!(!result.is_error());
    }

    #[test]
    fn test_error_result_has_no_header_fields() {
        let result = ProbeResult::from_error(&task(), 20_000, FetchError::Timeout);

        assert!(result.is_error());
        assert_eq!(result.error.as_deref(), Some("request timed out"));
        assert_eq!(result.cache_status, "error");
        assert_eq!(result.http_status, None);
        assert!(result.server.is_none() && result.cache_control.is_none());
    }
}
