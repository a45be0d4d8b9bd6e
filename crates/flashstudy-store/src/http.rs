//! HTTP dataset provider and remote progress store.
//!
//! The dataset endpoint answers `GET {url}` with a JSON subjects map. The
//! progress endpoint answers `GET {url}?userId=...` with
//! `{subject, cardIndex, score}` and accepts the same shape (plus `userId`)
//! via `POST {url}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use flashstudy_core::model::{Catalog, Mode, ProgressSnapshot};
use flashstudy_core::parser::parse_dataset_json;
use flashstudy_core::traits::{DatasetProvider, ProgressStore};

use crate::error::StoreError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn build_client() -> Result<reqwest::Client, StoreError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| StoreError::NetworkError(format!("failed to build HTTP client: {e}")))
}

fn parse_url(url: &str) -> Result<Url, StoreError> {
    Url::parse(url).map_err(|e| StoreError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status().as_u16();
    if status >= 400 {
        let message = response.text().await.unwrap_or_default();
        return Err(StoreError::ApiError { status, message });
    }
    Ok(response)
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Fetches the catalog from an HTTP endpoint.
pub struct HttpDataset {
    url: Url,
    client: reqwest::Client,
}

impl HttpDataset {
    pub fn new(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            url: parse_url(url)?,
            client: build_client()?,
        })
    }
}

#[async_trait]
impl DatasetProvider for HttpDataset {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn load(&self) -> anyhow::Result<Catalog> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| StoreError::from_reqwest(e, DEFAULT_TIMEOUT_SECS))?;
        let response = error_for_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        parse_dataset_json(&body)
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress body as served by the endpoint. Every field is optional so that
/// an empty record (`{}` or `{"subject": null}`) reads as "no progress".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteProgress {
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    mode: Option<Mode>,
    #[serde(default)]
    card_index: Option<usize>,
    #[serde(default)]
    score: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteProgressUpdate<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    snapshot: &'a ProgressSnapshot,
}

/// Remote progress store keyed by user id.
pub struct HttpProgressStore {
    url: Url,
    user_id: String,
    client: reqwest::Client,
}

impl HttpProgressStore {
    pub fn new(url: &str, user_id: impl Into<String>) -> Result<Self, StoreError> {
        Ok(Self {
            url: parse_url(url)?,
            user_id: user_id.into(),
            client: build_client()?,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn user_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("userId", &self.user_id);
        url
    }
}

#[async_trait]
impl ProgressStore for HttpProgressStore {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn load(&self) -> anyhow::Result<Option<ProgressSnapshot>> {
        let response = self
            .client
            .get(self.user_url())
            .send()
            .await
            .map_err(|e| StoreError::from_reqwest(e, DEFAULT_TIMEOUT_SECS))?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let response = error_for_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }
        let remote: RemoteProgress = serde_json::from_str(&body)
            .map_err(|e| StoreError::InvalidResponse(format!("failed to parse progress: {e}")))?;

        Ok(remote.subject.map(|subject| ProgressSnapshot {
            subject,
            mode: remote.mode,
            card_index: remote.card_index.unwrap_or(0),
            score: remote.score.unwrap_or(0),
        }))
    }

    #[instrument(skip(self, snapshot), fields(user_id = %self.user_id, subject = %snapshot.subject))]
    async fn save(&self, snapshot: &ProgressSnapshot) -> anyhow::Result<()> {
        let body = RemoteProgressUpdate {
            user_id: &self.user_id,
            snapshot,
        };
        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::from_reqwest(e, DEFAULT_TIMEOUT_SECS))?;
        error_for_status(response).await?;
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        let response = self
            .client
            .delete(self.user_url())
            .send()
            .await
            .map_err(|e| StoreError::from_reqwest(e, DEFAULT_TIMEOUT_SECS))?;
        if response.status().as_u16() == 404 {
            return Ok(());
        }
        error_for_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn dataset_fetch() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "math": {
                "name": "Math",
                "flashcards": [
                    {"question": "2 + 2", "answer": "4", "options": ["3", "4", "5"], "hint": "Simple arithmetic"}
                ]
            }
        });
        Mock::given(method("GET"))
            .and(path("/subjects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let provider = HttpDataset::new(&format!("{}/subjects", server.uri())).unwrap();
        let catalog = provider.load().await.unwrap();
        assert_eq!(catalog.get("math").unwrap().flashcards[0].answer, "4");
    }

    #[tokio::test]
    async fn dataset_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/subjects"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let provider = HttpDataset::new(&format!("{}/subjects", server.uri())).unwrap();
        let err = provider.load().await.unwrap_err();
        assert!(err.to_string().contains("HTTP error (500)"));
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(matches!(
            HttpDataset::new("not a url"),
            Err(StoreError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn progress_load() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/progress"))
            .and(query_param("userId", "user-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "subject": "math",
                "cardIndex": 1,
                "score": 1
            })))
            .mount(&server)
            .await;

        let store = HttpProgressStore::new(&format!("{}/progress", server.uri()), "user-1").unwrap();
        let snapshot = store.load().await.unwrap().unwrap();
        assert_eq!(snapshot.subject, "math");
        assert_eq!(snapshot.card_index, 1);
        assert_eq!(snapshot.score, 1);
        assert_eq!(snapshot.mode, None);
    }

    #[tokio::test]
    async fn progress_missing_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/progress"))
            .and(query_param("userId", "new-user"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/progress"))
            .and(query_param("userId", "blank-user"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"subject": null})),
            )
            .mount(&server)
            .await;

        let url = format!("{}/progress", server.uri());
        let store = HttpProgressStore::new(&url, "new-user").unwrap();
        assert!(store.load().await.unwrap().is_none());
        let store = HttpProgressStore::new(&url, "blank-user").unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn progress_save_posts_user_and_snapshot() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/progress"))
            .and(body_json(serde_json::json!({
                "userId": "user-1",
                "subject": "math",
                "mode": "test",
                "cardIndex": 1,
                "score": 1
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpProgressStore::new(&format!("{}/progress", server.uri()), "user-1").unwrap();
        store
            .save(&ProgressSnapshot {
                subject: "math".into(),
                mode: Some(Mode::Test),
                card_index: 1,
                score: 1,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn progress_save_failure_surfaces_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/progress"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let store = HttpProgressStore::new(&format!("{}/progress", server.uri()), "u").unwrap();
        let err = store
            .save(&ProgressSnapshot {
                subject: "math".into(),
                mode: None,
                card_index: 0,
                score: 0,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        // Port 9 (discard) is closed on test machines.
        let store = HttpProgressStore::new("http://127.0.0.1:9/progress", "u").unwrap();
        let err = store.load().await.unwrap_err();
        assert!(err.downcast_ref::<StoreError>().is_some());
    }
}
