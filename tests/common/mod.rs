//! Common test utilities for taskfeed end-to-end tests

use serde_json::json;
use std::time::Duration;
use taskfeed::{Config, Event};
use tempfile::TempDir;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Catalog of `total` items (`cat_1` ..) paged by an offset cursor
pub struct PagedCatalog {
    total: usize,
}

impl Respond for PagedCatalog {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut limit = 0;
        let mut offset = 0;
        for (key, value) in request.url.query_pairs() {
            match key.as_ref() {
                "limit" => limit = value.parse().unwrap_or(0),
                "cursor" => offset = value.parse().unwrap_or(0),
                _ => {}
            }
        }

        let end = (offset + limit).min(self.total);
        let items: Vec<_> = (offset + 1..=end)
            .map(|n| json!({ "id": format!("cat_{}", n) }))
            .collect();
        let is_final = end >= self.total;

        ResponseTemplate::new(200).set_body_json(json!({
            "count": items.len(),
            "items": items,
            "final": is_final,
            "next_cursor": if is_final { None } else { Some(end.to_string()) },
        }))
    }
}

/// Start a mock catalog serving `total` items at `/scan`
pub async fn start_catalog(total: usize) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scan"))
        .respond_with(PagedCatalog { total })
        .mount(&server)
        .await;
    server
}

/// Config pointing at `catalog`, with its database inside `temp_dir`
///
/// The yearly schedule keeps scheduled runs out of the way; tests trigger
/// runs explicitly.
pub fn config_for(catalog: &MockServer, temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.catalog.base_url = format!("{}/scan", catalog.uri());
    config.persistence.database_path = temp_dir.path().join("taskfeed.db");
    config.tasks.poll_interval = Duration::from_millis(10);
    config.tasks.schedule = "0 0 1 1 *".to_string();
    config
}

/// Wait for an event matching `predicate`, panicking after 30 seconds
pub async fn wait_for_event<F>(rx: &mut broadcast::Receiver<Event>, mut predicate: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
