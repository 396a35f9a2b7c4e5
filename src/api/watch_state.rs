use async_trait::async_trait;
use serde::Serialize;

use super::client::ApiClient;
use super::errors::ApiError;
use crate::models::EpisodeId;

/// Remote per-user watch state.
#[async_trait]
pub trait WatchStateApi: Send + Sync {
    async fn mark_watching(&self, episode_id: &EpisodeId) -> Result<(), ApiError>;
    async fn mark_watched(
        &self,
        episode_id: &EpisodeId,
        watched_until_end: bool,
    ) -> Result<(), ApiError>;
}

#[derive(Debug, Serialize)]
struct MarkWatchedBody {
    watched_until_end: bool,
}

#[derive(Clone)]
pub struct HttpWatchStateApi {
    client: ApiClient,
}

impl HttpWatchStateApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WatchStateApi for HttpWatchStateApi {
    async fn mark_watching(&self, episode_id: &EpisodeId) -> Result<(), ApiError> {
        self.client
            .post::<()>(
                &["user", "episodes", episode_id.as_str(), "mark-watching"],
                None,
                "mark_watching",
            )
            .await
    }

    async fn mark_watched(
        &self,
        episode_id: &EpisodeId,
        watched_until_end: bool,
    ) -> Result<(), ApiError> {
        self.client
            .post(
                &["user", "episodes", episode_id.as_str(), "mark-watched"],
                Some(&MarkWatchedBody { watched_until_end }),
                "mark_watched",
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RetryPolicy;
    use crate::config::ApiConfig;
    use mockito::Matcher;

    fn api(server: &mockito::ServerGuard) -> HttpWatchStateApi {
        let config = ApiConfig {
            base_url: server.url(),
            auth_token: Some("token-1".to_string()),
            ..Default::default()
        };
        HttpWatchStateApi::new(
            ApiClient::new(&config)
                .unwrap()
                .with_retry_policy(RetryPolicy::none()),
        )
    }

    #[tokio::test]
    async fn test_mark_watching() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/user/episodes/ep-3/mark-watching")
            .match_header("authorization", "Bearer token-1")
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        api(&server).mark_watching(&EpisodeId::new("ep-3")).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_mark_watched_sends_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/user/episodes/ep-3/mark-watched")
            .match_body(Matcher::Json(serde_json::json!({ "watched_until_end": true })))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        api(&server)
            .mark_watched(&EpisodeId::new("ep-3"), true)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/user/episodes/ep-3/mark-watching")
            .with_status(401)
            .with_body(r#"{"message":"Unauthorized"}"#)
            .create_async()
            .await;

        let err = api(&server)
            .mark_watching(&EpisodeId::new("ep-3"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication { status: 401, .. }));
    }
}
