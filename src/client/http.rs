use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Response};
use serde::{Deserialize, de::IgnoredAny};
use uuid::Uuid;

use super::{
    SyncClientConfig,
    error::{ClientError, ClientResult},
    lifecycle::{MatchStateSink, StatePush},
    sync::EventSink,
};
use crate::events::{BatchIngestRequest, BatchIngestResult};

const BATCH_PATH: &str = "match-events/batch";

/// [`EventSink`] and [`MatchStateSink`] talking to the match tracker API.
#[derive(Clone)]
pub struct HttpEventSink {
    client: Client,
    base_url: Arc<str>,
    batch_url: Arc<str>,
}

#[derive(Deserialize)]
struct RejectionBody {
    message: String,
}

#[derive(Deserialize)]
struct SquadsBody {
    home: SquadBody,
    away: SquadBody,
}

#[derive(Deserialize)]
struct SquadBody {
    starting: Vec<IgnoredAny>,
}

impl HttpEventSink {
    pub fn new(config: &SyncClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let batch_url = Arc::<str>::from(format!("{base_url}/{BATCH_PATH}"));
        Ok(Self {
            client,
            base_url,
            batch_url,
        })
    }

    fn fixture_url(&self, fixture_id: Uuid, tail: &str) -> String {
        format!("{}/fixtures/{fixture_id}/{tail}", self.base_url)
    }

    async fn post_batch(&self, batch: BatchIngestRequest) -> ClientResult<BatchIngestResult> {
        let response = self
            .client
            .post(self.batch_url.as_ref())
            .json(&batch)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        read_json(success(response).await?).await
    }

    async fn put_state(&self, fixture_id: Uuid, push: StatePush) -> ClientResult<()> {
        let response = self
            .client
            .put(self.fixture_url(fixture_id, "match-state"))
            .json(&push)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        success(response).await.map(drop)
    }

    async fn get_starters(&self, fixture_id: Uuid) -> ClientResult<(usize, usize)> {
        let response = self
            .client
            .get(self.fixture_url(fixture_id, "squads"))
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        let squads: SquadsBody = read_json(success(response).await?).await?;
        Ok((squads.home.starting.len(), squads.away.starting.len()))
    }
}

/// Pass a 2xx response through, turn anything else into [`ClientError::Rejected`].
async fn success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<RejectionBody>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.to_string());
    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> ClientResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|err| ClientError::Transport(err.to_string()))
}

impl EventSink for HttpEventSink {
    fn submit(
        &self,
        batch: BatchIngestRequest,
    ) -> BoxFuture<'static, ClientResult<BatchIngestResult>> {
        let sink = self.clone();
        Box::pin(async move { sink.post_batch(batch).await })
    }
}

impl MatchStateSink for HttpEventSink {
    fn push_state(&self, fixture_id: Uuid, push: StatePush) -> BoxFuture<'static, ClientResult<()>> {
        let sink = self.clone();
        Box::pin(async move { sink.put_state(fixture_id, push).await })
    }

    fn starter_counts(&self, fixture_id: Uuid) -> BoxFuture<'static, ClientResult<(usize, usize)>> {
        let sink = self.clone();
        Box::pin(async move { sink.get_starters(fixture_id).await })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(base_url: &str, timeout: Duration) -> SyncClientConfig {
        SyncClientConfig {
            base_url: base_url.into(),
            queue_dir: "queue".into(),
            request_timeout: timeout,
        }
    }

    #[test]
    fn urls_ignore_trailing_slash() {
        let sink = HttpEventSink::new(&config("http://localhost:8080/", Duration::from_secs(2))).unwrap();
        assert_eq!(&*sink.batch_url, "http://localhost:8080/match-events/batch");
        assert_eq!(
            sink.fixture_url(Uuid::nil(), "match-state"),
            "http://localhost:8080/fixtures/00000000-0000-0000-0000-000000000000/match-state"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_retryable() {
        let sink = HttpEventSink::new(&config("http://127.0.0.1:9", Duration::from_millis(500))).unwrap();
        let err = sink
            .submit(BatchIngestRequest::new(Uuid::new_v4(), Vec::new()))
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        let err = sink
            .push_state(Uuid::new_v4(), StatePush::clock(10, crate::events::Half::H1))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
