//! # Funnel Analytics
//!
//! Read-only PostHog client. Each funnel event is counted with one call to
//! the project events endpoint; the five counts are fetched concurrently and
//! folded into [`FunnelMetrics`].
//!
//! ```text
//! GET {base_url}/api/projects/{project_id}/events/?event=<name>&limit=1000
//! Authorization: Bearer <personal api key>
//!
//! { "results": [ ... ] }   count = results.len()
//! ```
//!
//! Connection failures and 5xx answers are retried with exponential backoff.
//! 4xx answers fail immediately.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ServiceError, ServiceResult};
use crate::config::PostHogSettings;
use kiosk_core::reports::{FunnelCounts, FunnelEvent, FunnelMetrics};

/// Page size PostHog allows per events request.
const EVENTS_LIMIT: u32 = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct EventsPage {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct PostHogClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    project_id: String,
    initial_backoff: Duration,
    max_backoff: Duration,
    max_elapsed: Duration,
}

impl PostHogClient {
    /// `None` when no API key is configured.
    pub fn from_settings(settings: &PostHogSettings) -> Option<Self> {
        let api_key = settings.api_key.clone().filter(|k| !k.trim().is_empty())?;
        Some(PostHogClient {
            client: reqwest::Client::new(),
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            project_id: settings.project_id.clone(),
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            max_elapsed: Duration::from_secs(8),
        })
    }

    /// Overrides the retry schedule.
    pub fn with_backoff(mut self, initial: Duration, max: Duration, max_elapsed: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.max_elapsed = max_elapsed;
        self
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        }
    }

    fn events_url(&self) -> String {
        format!("{}/api/projects/{}/events/", self.base_url, self.project_id)
    }

    /// Number of recorded occurrences of `event`, capped at one page.
    pub async fn count_event(&self, event: FunnelEvent) -> ServiceResult<u64> {
        let mut backoff = self.create_backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.fetch_count(event).await {
                Ok(count) => {
                    debug!(event = %event, count, attempt, "Fetched event count");
                    return Ok(count);
                }
                Err(e) if is_transient(&e) => match backoff.next_backoff() {
                    Some(wait) => {
                        warn!(event = %event, attempt, ?wait, error = %e, "PostHog request failed, retrying");
                        tokio::time::sleep(wait).await;
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_count(&self, event: FunnelEvent) -> ServiceResult<u64> {
        let response = self
            .client
            .get(self.events_url())
            .query(&[("event", event.event_name().to_string()), ("limit", EVENTS_LIMIT.to_string())])
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream {
                provider: "PostHog",
                status: status.as_u16(),
                detail,
            });
        }

        let page: EventsPage = response.json().await?;
        Ok(page.results.len() as u64)
    }

    /// Counts every funnel event and derives the activation and conversion rates.
    pub async fn funnel_metrics(&self) -> ServiceResult<FunnelMetrics> {
        let [a, b, c, d, e] = FunnelEvent::ALL;
        let (pageviews, language, added, checkout, abandoned) = tokio::try_join!(
            self.count_event(a),
            self.count_event(b),
            self.count_event(c),
            self.count_event(d),
            self.count_event(e),
        )?;

        let mut counts = FunnelCounts::default();
        counts.set(a, pageviews);
        counts.set(b, language);
        counts.set(c, added);
        counts.set(d, checkout);
        counts.set(e, abandoned);

        Ok(FunnelMetrics::from_counts(counts))
    }
}

fn is_transient(err: &ServiceError) -> bool {
    match err {
        ServiceError::Request(e) => e.is_connect() || e.is_timeout(),
        ServiceError::Upstream { status, .. } => *status >= 500,
        ServiceError::NotConfigured(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct Fake {
        counts: Arc<HashMap<&'static str, usize>>,
        calls: Arc<AtomicUsize>,
        fail_first: usize,
    }

    async fn events(
        State(fake): State<Fake>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let call = fake.calls.fetch_add(1, Ordering::SeqCst);
        if call < fake.fail_first {
            return (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({})));
        }
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer phx_test") {
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "detail": "bad key" })));
        }
        assert_eq!(params.get("limit").map(String::as_str), Some("1000"));

        let event = params.get("event").cloned().unwrap_or_default();
        let n = fake.counts.get(event.as_str()).copied().unwrap_or(0);
        if n == 0 {
            // PostHog omits results for unknown events
            return (StatusCode::OK, Json(serde_json::json!({ "next": null })));
        }
        let results: Vec<_> = (0..n).map(|i| serde_json::json!({ "id": i })).collect();
        (StatusCode::OK, Json(serde_json::json!({ "results": results })))
    }

    async fn fake_posthog(counts: &[(&'static str, usize)], fail_first: usize) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fake = Fake {
            counts: Arc::new(counts.iter().copied().collect()),
            calls: calls.clone(),
            fail_first,
        };
        let app = Router::new()
            .route("/api/projects/{project}/events/", get(events))
            .with_state(fake);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), calls)
    }

    fn client(base_url: String, key: &str) -> PostHogClient {
        PostHogClient::from_settings(&PostHogSettings {
            api_key: Some(key.to_string()),
            base_url,
            ..Default::default()
        })
        .unwrap()
        .with_backoff(Duration::from_millis(5), Duration::from_millis(20), Duration::from_secs(2))
    }

    #[test]
    fn test_missing_key_disables_client() {
        assert!(PostHogClient::from_settings(&PostHogSettings::default()).is_none());
    }

    #[tokio::test]
    async fn test_funnel_metrics_from_counts() {
        let (base_url, _) = fake_posthog(
            &[
                ("$pageview", 10),
                ("language_selected", 8),
                ("product_added_to_cart", 5),
                ("checkout_started", 2),
                ("cart_abandoned", 1),
            ],
            0,
        )
        .await;

        let metrics = client(base_url, "phx_test").funnel_metrics().await.unwrap();
        assert_eq!(metrics.pageviews, 10);
        assert_eq!(metrics.language_selected, 8);
        assert_eq!(metrics.product_added, 5);
        assert_eq!(metrics.checkout_started, 2);
        assert_eq!(metrics.cart_abandoned, 1);
        assert_eq!(metrics.activation_rate, "80.0");
        assert_eq!(metrics.conversion_rate, "25.0");
    }

    #[tokio::test]
    async fn test_absent_results_count_as_zero() {
        let (base_url, _) = fake_posthog(&[], 0).await;
        let count = client(base_url, "phx_test")
            .count_event(FunnelEvent::CartAbandoned)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let (base_url, calls) = fake_posthog(&[("$pageview", 3)], 2).await;
        let count = client(base_url, "phx_test")
            .count_event(FunnelEvent::Pageview)
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_fail_fast() {
        let (base_url, calls) = fake_posthog(&[], 0).await;
        let err = client(base_url, "wrong")
            .count_event(FunnelEvent::Pageview)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Upstream { status: 401, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
